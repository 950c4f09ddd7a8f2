//! Wire and breaker selections produced from the reference tables.
//!
//! These are values, not catalogue entries: a [`Wire`] is one row of a wire
//! table with the installation's correction factor applied, and a [`Breaker`]
//! is one rating of a curve family. Neither carries an identifier.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::catalog::{WireInsulation, WireMaterial};
use crate::tables::BreakerCurve;
use crate::units::{Amperes, Millimeters, SquareMillimeters};
use crate::WireTypeId;

/// A wire type at one cross section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub wire_type: WireTypeId,
    pub material: WireMaterial,
    pub insulation: WireInsulation,
    /// Conductor resistivity in Ω·m
    pub resistivity: f64,
    pub section: SquareMillimeters,
    pub uncorrected_capacity: Amperes,
    pub conductor_diameter: Millimeters,
    pub external_diameter: Millimeters,
    pub correction_factor: f64,
}

impl Wire {
    /// Ampacity under the installation conditions.
    pub fn capacity(&self) -> Amperes {
        self.uncorrected_capacity * self.correction_factor
    }

    /// Conductor resistance in Ω/m.
    pub fn resistance_per_meter(&self) -> f64 {
        self.resistivity / self.section.to_square_meters()
    }

    /// Area occupied inside a conduit, from the insulated diameter.
    pub fn external_section(&self) -> SquareMillimeters {
        self.external_diameter.circle_area()
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mm² {} {}", self.section.value(), self.material, self.insulation)
    }
}

/// A protective device rating within one curve family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breaker {
    pub current: Amperes,
    pub curve: BreakerCurve,
}

impl Breaker {
    pub fn new(current: Amperes, curve: BreakerCurve) -> Self {
        Self { current, curve }
    }
}

/// Breakers only compare within the same curve.
impl PartialOrd for Breaker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.curve != other.curve {
            return None;
        }
        self.current.partial_cmp(&other.current)
    }
}

impl fmt::Display for Breaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.curve, self.current.value())
    }
}

/// One of the four constraints a selected wire must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireCriterion {
    MinimumSection,
    CurrentCapacity,
    VoltageDrop,
    Breaker,
}

impl WireCriterion {
    pub const ALL: [WireCriterion; 4] = [
        WireCriterion::MinimumSection,
        WireCriterion::CurrentCapacity,
        WireCriterion::VoltageDrop,
        WireCriterion::Breaker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WireCriterion::MinimumSection => "minimum section",
            WireCriterion::CurrentCapacity => "current capacity",
            WireCriterion::VoltageDrop => "voltage drop",
            WireCriterion::Breaker => "breaker",
        }
    }
}

impl fmt::Display for WireCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
