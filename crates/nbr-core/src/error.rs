//! Unified error types for the calculator
//!
//! This module provides a common error type [`NbrError`] covering the whole
//! engine: reference-data problems, component selection failures, identity
//! conflicts while loading a project, and rejected edits.
//!
//! Selection failures are kept in a separate [`SelectionFailure`] enum. They,
//! rejected values and wire types without a reference table are reported per
//! circuit; anything else aborts the operation.
//!
//! # Example
//!
//! ```ignore
//! use nbr_core::{NbrError, NbrResult};
//!
//! fn size_everything(project: &Project) -> NbrResult<()> {
//!     for circuit in project.iter_circuits() {
//!         size_circuit(&ctx, circuit)?;
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{WireInsulation, WireMaterial};
use crate::components::WireCriterion;
use crate::tables::BreakerCurve;
use crate::units::{Amperes, Celsius, SquareMillimeters};

/// Unified error type for all calculator operations.
#[derive(Error, Debug)]
pub enum NbrError {
    /// Malformed or missing reference data
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ambient temperature above the correction table's domain
    #[error("Configuration error: temperature {temperature:.1} is above the correction table maximum of {max:.1}")]
    TemperatureOutOfRange { temperature: Celsius, max: Celsius },

    /// The reference data has no ampacity table for this wire type
    #[error("No reference table for {material} {insulation} wire")]
    UnsupportedWireType {
        material: WireMaterial,
        insulation: WireInsulation,
    },

    /// No catalogued component satisfies the constraints
    #[error(transparent)]
    Selection(#[from] SelectionFailure),

    /// Two payloads share an identifier but differ in content
    #[error("Identity conflict: {kind} {id} appears twice with different content")]
    IdentityConflict { kind: &'static str, id: Uuid },

    /// Rejected field mutation or tree edit
    #[error("Validation error: {0}")]
    Validation(String),

    /// An identifier that does not resolve within the project
    #[error("Unknown {kind} {id}")]
    UnknownReference { kind: &'static str, id: Uuid },

    /// I/O errors (project files, reference data directories)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),
}

impl NbrError {
    /// Whether the error should abort the surrounding operation.
    ///
    /// Selection failures, rejected values and wire types without a table
    /// concern one entity and can be reported per circuit; everything else
    /// cannot be worked around by the caller.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            NbrError::Selection(_) | NbrError::Validation(_) | NbrError::UnsupportedWireType { .. }
        )
    }

    /// The selection failure carried by this error, if any.
    pub fn as_selection(&self) -> Option<&SelectionFailure> {
        match self {
            NbrError::Selection(failure) => Some(failure),
            _ => None,
        }
    }
}

/// No breaker, wire, or conduit satisfies the constraints.
///
/// Carries the criterion that could not be met. The engine never falls back
/// to a smaller component.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionFailure {
    #[error("no curve {curve} breaker is rated for {current}")]
    NoSuitableBreaker { curve: BreakerCurve, current: Amperes },

    #[error("no catalogued wire satisfies the {criterion} criterion")]
    NoSuitableWire { criterion: WireCriterion },

    #[error("no catalogued conduit holds {filled_section:.2} at a fill factor of {max_fill_factor:.2}")]
    NoSuitableConduit {
        filled_section: SquareMillimeters,
        max_fill_factor: f64,
    },
}

/// Convenience type alias for Results using NbrError.
pub type NbrResult<T> = Result<T, NbrError>;

impl From<serde_json::Error> for NbrError {
    fn from(err: serde_json::Error) -> Self {
        NbrError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for NbrError {
    fn from(err: toml::de::Error) -> Self {
        NbrError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NbrError::Config("missing table".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing table"));
    }

    #[test]
    fn test_selection_failure_display() {
        let err: NbrError = SelectionFailure::NoSuitableWire {
            criterion: WireCriterion::VoltageDrop,
        }
        .into();
        assert!(err.to_string().contains("voltage drop"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_temperature_is_fatal() {
        let err = NbrError::TemperatureOutOfRange {
            temperature: Celsius(70.0),
            max: Celsius(60.0),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("70.0 °C"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NbrError = io_err.into();
        assert!(matches!(err, NbrError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> NbrResult<()> {
            Err(NbrError::Validation("test".into()))
        }

        fn outer() -> NbrResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
