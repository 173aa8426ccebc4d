//! Equipment identifiers and status enumerations.
//!
//! Towers and pumps are addressed by small enums rather than string keys, so
//! per-unit data lives in plain arrays ([`PerTower`], [`PerPump`]) and a
//! mistyped key is a compile error instead of a silent `None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the three cooling towers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tower {
    One,
    Two,
    Three,
}

impl Tower {
    /// All towers in fixed declaration order.
    pub const ALL: [Tower; 3] = [Tower::One, Tower::Two, Tower::Three];

    /// Zero-based array index.
    pub fn index(self) -> usize {
        match self {
            Tower::One => 0,
            Tower::Two => 1,
            Tower::Three => 2,
        }
    }

    /// One-based equipment number, as used in fault strings and telemetry.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// The successor in rotation order (wraps 3 → 1).
    pub fn next(self) -> Tower {
        match self {
            Tower::One => Tower::Two,
            Tower::Two => Tower::Three,
            Tower::Three => Tower::One,
        }
    }

    /// Duty order starting from the given lead: `[lead, lag1, lag2]`.
    pub fn duty_order(lead: Tower) -> [Tower; 3] {
        [lead, lead.next(), lead.next().next()]
    }
}

impl fmt::Display for Tower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tower{}", self.number())
    }
}

/// One of the three circulation pumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pump {
    One,
    Two,
    Three,
}

impl Pump {
    /// All pumps in fixed declaration order.
    pub const ALL: [Pump; 3] = [Pump::One, Pump::Two, Pump::Three];

    /// Zero-based array index.
    pub fn index(self) -> usize {
        match self {
            Pump::One => 0,
            Pump::Two => 1,
            Pump::Three => 2,
        }
    }

    /// One-based equipment number.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// The successor in rotation order (wraps 3 → 1).
    pub fn next(self) -> Pump {
        match self {
            Pump::One => Pump::Two,
            Pump::Two => Pump::Three,
            Pump::Three => Pump::One,
        }
    }
}

impl fmt::Display for Pump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pump{}", self.number())
    }
}

/// The plant-wide alarm level reported with every command snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStatus {
    Normal,
    Warning,
    Critical,
    Error,
}

/// The supervisory control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    Auto,
    Manual,
    Error,
}

/// A value per tower, indexable by [`Tower`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerTower<T>(pub [T; 3]);

impl<T> PerTower<T> {
    /// Builds a map by evaluating `f` for each tower in order.
    pub fn from_fn(mut f: impl FnMut(Tower) -> T) -> Self {
        Self([f(Tower::One), f(Tower::Two), f(Tower::Three)])
    }

    /// Iterates `(tower, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Tower, &T)> {
        Tower::ALL.iter().map(move |&t| (t, &self.0[t.index()]))
    }
}

impl<T: Clone> PerTower<T> {
    /// A map holding the same value for every tower.
    pub fn uniform(value: T) -> Self {
        Self([value.clone(), value.clone(), value])
    }
}

impl<T> Index<Tower> for PerTower<T> {
    type Output = T;
    fn index(&self, tower: Tower) -> &T {
        &self.0[tower.index()]
    }
}

impl<T> IndexMut<Tower> for PerTower<T> {
    fn index_mut(&mut self, tower: Tower) -> &mut T {
        &mut self.0[tower.index()]
    }
}

/// A value per pump, indexable by [`Pump`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerPump<T>(pub [T; 3]);

impl<T> PerPump<T> {
    /// Builds a map by evaluating `f` for each pump in order.
    pub fn from_fn(mut f: impl FnMut(Pump) -> T) -> Self {
        Self([f(Pump::One), f(Pump::Two), f(Pump::Three)])
    }

    /// Iterates `(pump, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Pump, &T)> {
        Pump::ALL.iter().map(move |&p| (p, &self.0[p.index()]))
    }
}

impl<T: Clone> PerPump<T> {
    /// A map holding the same value for every pump.
    pub fn uniform(value: T) -> Self {
        Self([value.clone(), value.clone(), value])
    }
}

impl<T> Index<Pump> for PerPump<T> {
    type Output = T;
    fn index(&self, pump: Pump) -> &T {
        &self.0[pump.index()]
    }
}

impl<T> IndexMut<Pump> for PerPump<T> {
    fn index_mut(&mut self, pump: Pump) -> &mut T {
        &mut self.0[pump.index()]
    }
}
