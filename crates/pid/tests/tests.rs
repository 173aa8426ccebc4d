use float_cmp::approx_eq;
use pid::{update, PidError, PidParams, PidState};

#[test]
fn test_proportional_only() {
    let params = PidParams::new(2.0, 0.0, 0.0, -100.0, 100.0);
    let mut state = PidState::default();
    let out = update(40.0, 50.0, &params, 1.0, &mut state).unwrap();
    // error = 10, kp = 2 -> output 20
    assert!(approx_eq!(f64, out.output, 20.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, out.p_term, 20.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, out.i_term, 0.0, epsilon = 1e-9));
}

#[test]
fn test_output_clamped_to_bounds() {
    let params = PidParams::new(10.0, 0.0, 0.0, 2.0, 10.0);
    let mut state = PidState::default();
    let high = update(0.0, 45.0, &params, 1.0, &mut state).unwrap();
    assert!(approx_eq!(f64, high.output, 10.0, epsilon = 1e-9));
    let low = update(90.0, 45.0, &params, 1.0, &mut state).unwrap();
    assert!(approx_eq!(f64, low.output, 2.0, epsilon = 1e-9));
}

#[test]
fn test_reverse_acting_inverts_error() {
    let params = PidParams::new(1.0, 0.0, 0.0, -100.0, 100.0).reverse_acting();
    let mut state = PidState::default();
    // Measurement above setpoint -> positive error -> positive output.
    let out = update(80.0, 75.0, &params, 1.0, &mut state).unwrap();
    assert!(approx_eq!(f64, out.error, 5.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, out.output, 5.0, epsilon = 1e-9));
}

#[test]
fn test_integral_accumulates_and_caps() {
    let params = PidParams::new(0.0, 1.0, 0.0, -100.0, 100.0).with_max_integral(5.0);
    let mut state = PidState::default();
    for _ in 0..10 {
        update(0.0, 2.0, &params, 1.0, &mut state).unwrap();
    }
    // 10 s of error 2 would integrate to 20; the cap holds it at 5.
    assert!(approx_eq!(f64, state.integral, 5.0, epsilon = 1e-9));
}

#[test]
fn test_derivative_term() {
    let params = PidParams::new(0.0, 0.0, 2.0, -100.0, 100.0);
    let mut state = PidState::default();
    update(10.0, 10.0, &params, 1.0, &mut state).unwrap();
    // Error steps from 0 to 4 over 2 s -> derivative 2, kd 2 -> d_term 4.
    let out = update(6.0, 10.0, &params, 2.0, &mut state).unwrap();
    assert!(approx_eq!(f64, out.d_term, 4.0, epsilon = 1e-9));
}

#[test]
fn test_errors_leave_state_untouched() {
    let params = PidParams::new(1.0, 1.0, 0.0, 0.0, 10.0);
    let mut state = PidState::resting_at(6.0);
    let before = state;

    assert!(matches!(
        update(f64::NAN, 45.0, &params, 1.0, &mut state),
        Err(PidError::NonFiniteInput(_))
    ));
    assert_eq!(state, before);

    assert_eq!(
        update(40.0, 45.0, &params, 0.0, &mut state),
        Err(PidError::InvalidDt(0.0))
    );
    assert_eq!(state, before);

    let bad = PidParams::new(1.0, 0.0, 0.0, 10.0, 2.0);
    assert_eq!(
        update(40.0, 45.0, &bad, 1.0, &mut state),
        Err(PidError::InvertedBounds { min: 10.0, max: 2.0 })
    );
    assert_eq!(state, before);
}

#[test]
fn test_converges_on_simple_plant() {
    // Simple first-order plant: a loop temperature pulled toward an ambient
    // of 30 by losses and pushed up by the control output.
    let params = PidParams::new(1.5, 0.2, 0.0, 0.0, 100.0).with_max_integral(400.0);
    let mut state = PidState::default();
    let mut temp = 30.0;
    let setpoint = 45.0;
    for _ in 0..300 {
        let out = update(temp, setpoint, &params, 1.0, &mut state).unwrap();
        temp += out.output * 0.02 - (temp - 30.0) * 0.05;
    }
    assert!(
        approx_eq!(f64, temp, setpoint, epsilon = 1.0),
        "final temp {temp} not near setpoint {setpoint}"
    );
}
