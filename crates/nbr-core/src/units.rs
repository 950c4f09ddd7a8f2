//! Compile-time unit safety for installation quantities.
//!
//! Prevents mixing incompatible units like watts and volts, or a conductor
//! diameter with a cross-section area.
//!
//! # Design Philosophy
//!
//! Sizing a low-voltage circuit combines several physical quantities:
//! - Load power (W) and supply voltage (V), from which the design current (A) follows
//! - Circuit and conduit lengths (m)
//! - Conductor and conduit diameters (mm) and cross sections (mm²)
//! - Ambient temperature (°C)
//!
//! Using raw `f64` values throughout makes it easy to compare a section against
//! a diameter or to feed a power where a current is expected. The newtypes here
//! catch such mistakes at compile time.
//!
//! All types use `#[repr(transparent)]` and serialize as bare numbers.
//!
//! # Usage
//!
//! ```
//! use nbr_core::units::{Amperes, Millimeters, Volts, Watts};
//!
//! let current: Amperes = Watts(5000.0) / Volts(100.0);
//! assert_eq!(current, Amperes(50.0));
//!
//! let area = Millimeters(7.0).circle_area();
//! assert!((area.value() - 38.4845).abs() < 1e-4);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Mul<$type> for f64 {
            type Output = $type;
            fn mul(self, rhs: $type) -> Self::Output {
                <$type>::new(self * rhs.0)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match f.precision() {
                    Some(precision) => write!(f, "{:.*} {}", precision, self.0, $unit_name),
                    None => write!(f, "{:.2} {}", self.0, $unit_name),
                }
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Minimum of two values
            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// Maximum of two values
            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

// =============================================================================
// Electrical Units
// =============================================================================

/// Active power in watts (W)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Watts(pub f64);

impl_unit_ops!(Watts, "W");

/// Nominal supply voltage in volts (V)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Volts(pub f64);

impl_unit_ops!(Volts, "V");

/// Current in amperes (A)
///
/// Used for design currents, conductor ampacities and breaker ratings.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Amperes(pub f64);

impl_unit_ops!(Amperes, "A");

impl Div<Volts> for Watts {
    type Output = Amperes;
    fn div(self, rhs: Volts) -> Self::Output {
        Amperes(self.0 / rhs.0)
    }
}

// =============================================================================
// Geometric Units
// =============================================================================

/// Length in meters (m)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(pub f64);

impl_unit_ops!(Meters, "m");

/// Diameter in millimeters (mm)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Millimeters(pub f64);

impl_unit_ops!(Millimeters, "mm");

/// Cross-section area in square millimeters (mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SquareMillimeters(pub f64);

impl_unit_ops!(SquareMillimeters, "mm²");

impl Millimeters {
    /// Area of a circle with this diameter: π·(d/2)²
    #[inline]
    pub fn circle_area(self) -> SquareMillimeters {
        SquareMillimeters(std::f64::consts::PI * (self.0 / 2.0).powi(2))
    }
}

impl SquareMillimeters {
    /// Convert to square meters, as needed for resistance from resistivity.
    #[inline]
    pub fn to_square_meters(self) -> f64 {
        self.0 / 1_000_000.0
    }
}

// =============================================================================
// Thermal Units
// =============================================================================

/// Ambient temperature in degrees Celsius (°C)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Celsius(pub f64);

impl_unit_ops!(Celsius, "°C");

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watts_arithmetic() {
        let p1 = Watts(1000.0);
        let p2 = Watts(500.0);

        assert_eq!((p1 + p2).value(), 1500.0);
        assert_eq!((p1 - p2).value(), 500.0);
        assert_eq!((-p1).value(), -1000.0);
        assert_eq!((p1 * 2.0).value(), 2000.0);
        assert_eq!((2.0 * p1).value(), 2000.0);
        assert_eq!((p1 / 2.0).value(), 500.0);
        assert_eq!(p1 / p2, 2.0);
    }

    #[test]
    fn test_current_from_power() {
        let current = Watts(5000.0) / Volts(100.0);
        assert_eq!(current, Amperes(50.0));
    }

    #[test]
    fn test_circle_area() {
        // 23 mm internal diameter conduit
        let area = Millimeters(23.0).circle_area();
        assert!((area.value() - 415.475628).abs() < 1e-6);
    }

    #[test]
    fn test_square_meters() {
        assert!((SquareMillimeters(10.0).to_square_meters() - 1e-5).abs() < 1e-15);
    }

    #[test]
    fn test_sum_iterator() {
        let sections = vec![
            SquareMillimeters(10.0),
            SquareMillimeters(20.0),
            SquareMillimeters(30.0),
        ];
        let total: SquareMillimeters = sections.iter().sum();

        assert_eq!(total.value(), 60.0);
    }

    #[test]
    fn test_min_max() {
        let a = Amperes(50.0);
        let b = Amperes(63.0);

        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Amperes(50.0)), "50.00 A");
        assert_eq!(format!("{:.1}", SquareMillimeters(2.5)), "2.5 mm²");
        assert_eq!(format!("{:.0}", Celsius(30.0)), "30 °C");
    }
}
