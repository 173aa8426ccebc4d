//! # PID Controller Crate
//!
//! `pid` provides a PID (Proportional-Integral-Derivative) controller for
//! process-control loops such as valve positioning and variable-frequency
//! drive modulation.
//!
//! Unlike a self-contained controller object, the integrator state here is
//! **caller-owned**: the caller threads a [`PidState`] through successive
//! [`update`] calls. This makes the controller usable from engines that keep
//! all mutable state in a single serializable record and treat each control
//! cycle as a pure transform of that record.
//!
//! ## Features
//!
//! - **Output clamping**: the output is always within `[output_min, output_max]`.
//! - **Anti-windup**: the integral term is capped at `max_integral`.
//! - **Reverse-acting loops**: for processes where a rising measurement
//!   demands a rising output (e.g. fan speed against a supply temperature).
//! - **Term breakdown**: each update reports its P, I, and D contributions
//!   for diagnostics.

use thiserror::Error;

/// Errors returned by [`update`] when the request cannot produce a
/// meaningful control output.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PidError {
    /// The measured input was NaN or infinite.
    #[error("process input is not finite: {0}")]
    NonFiniteInput(f64),
    /// The setpoint was NaN or infinite.
    #[error("setpoint is not finite: {0}")]
    NonFiniteSetpoint(f64),
    /// The time delta must be strictly positive.
    #[error("non-positive dt: {0}")]
    InvalidDt(f64),
    /// `output_min` must not exceed `output_max`.
    #[error("inverted output bounds: min {min} > max {max}")]
    InvertedBounds { min: f64, max: f64 },
}

/// Tuning and bounds for a PID loop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidParams {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// The lower bound of the controller's output.
    pub output_min: f64,
    /// The upper bound of the controller's output.
    pub output_max: f64,
    /// When true the error sign is inverted (`input - setpoint`), so the
    /// output rises as the measurement rises above the setpoint.
    pub reverse_acting: bool,
    /// Cap on the absolute value of the accumulated integral.
    pub max_integral: f64,
}

impl PidParams {
    /// Creates a direct-acting parameter set with the given gains and bounds.
    pub fn new(kp: f64, ki: f64, kd: f64, output_min: f64, output_max: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            output_min,
            output_max,
            reverse_acting: false,
            max_integral: f64::INFINITY,
        }
    }

    /// Builder-style switch to a reverse-acting loop.
    pub fn reverse_acting(mut self) -> Self {
        self.reverse_acting = true;
        self
    }

    /// Builder-style integral cap for anti-windup.
    pub fn with_max_integral(mut self, max_integral: f64) -> Self {
        self.max_integral = max_integral;
        self
    }
}

/// The caller-owned integrator state threaded through successive updates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidState {
    /// Accumulated integral of the error, in error-seconds.
    pub integral: f64,
    /// The error observed on the previous update, for the derivative term.
    pub previous_error: f64,
    /// The last output produced. Callers use this for slew limiting and as
    /// the base value for fallback heuristics when an update fails.
    pub last_output: f64,
}

impl PidState {
    /// A zeroed state whose `last_output` rests at the given value.
    pub fn resting_at(output: f64) -> Self {
        Self {
            integral: 0.0,
            previous_error: 0.0,
            last_output: output,
        }
    }

    /// Clears the integrator and derivative memory, leaving `last_output` at
    /// the given value.
    pub fn reset_to(&mut self, output: f64) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.last_output = output;
    }
}

impl Default for PidState {
    fn default() -> Self {
        Self::resting_at(0.0)
    }
}

/// The result of a single PID update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidOutput {
    /// The clamped control output.
    pub output: f64,
    /// Proportional contribution.
    pub p_term: f64,
    /// Integral contribution.
    pub i_term: f64,
    /// Derivative contribution.
    pub d_term: f64,
    /// The (possibly sign-inverted) error this update acted on.
    pub error: f64,
}

/// Advances the controller by one step of `dt` seconds.
///
/// # Arguments
/// * `input` - The current measured value of the process.
/// * `setpoint` - The target value for the process.
/// * `params` - Gains and output bounds.
/// * `dt` - The time delta since the last update, in seconds.
/// * `state` - The caller-owned integrator state; mutated only on success.
///
/// # Returns
/// The clamped output together with its term breakdown, or a [`PidError`]
/// if the inputs cannot produce a meaningful result. On error the state is
/// left untouched so the caller's fallback can build on `last_output`.
pub fn update(
    input: f64,
    setpoint: f64,
    params: &PidParams,
    dt: f64,
    state: &mut PidState,
) -> Result<PidOutput, PidError> {
    if !input.is_finite() {
        return Err(PidError::NonFiniteInput(input));
    }
    if !setpoint.is_finite() {
        return Err(PidError::NonFiniteSetpoint(setpoint));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(PidError::InvalidDt(dt));
    }
    if params.output_min > params.output_max {
        return Err(PidError::InvertedBounds {
            min: params.output_min,
            max: params.output_max,
        });
    }

    let error = if params.reverse_acting {
        input - setpoint
    } else {
        setpoint - input
    };

    // Proportional term
    let p_term = params.kp * error;

    // Integral term with anti-windup
    let mut integral = state.integral + error * dt;
    if integral.abs() > params.max_integral {
        integral = params.max_integral.copysign(integral);
    }
    let i_term = params.ki * integral;

    // Derivative term
    let derivative = (error - state.previous_error) / dt;
    let d_term = params.kd * derivative;

    // Clamp output to the defined limits
    let output = (p_term + i_term + d_term)
        .max(params.output_min)
        .min(params.output_max);

    state.integral = integral;
    state.previous_error = error;
    state.last_output = output;

    Ok(PidOutput {
        output,
        p_term,
        i_term,
        d_term,
        error,
    })
}
