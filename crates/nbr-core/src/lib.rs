//! # nbr-core: Installation Modeling Core
//!
//! Provides the entity model and reference tables for sizing low-voltage
//! installations according to NBR 5410.
//!
//! ## Design Philosophy
//!
//! A [`Project`] is the root aggregate. It owns:
//! - **Catalogues**: [`Supply`], [`LoadType`] and [`WireType`] entries shared by many circuits
//! - **A circuit forest**: terminal circuits carrying a load, and upstream circuits owning
//!   their downstream circuits
//! - **Conduit runs**: raceways grouping circuits, which fix installation conditions
//!
//! Shared entities are referenced by typed ID rather than by pointer. A circuit stores the
//! [`SupplyId`] it uses and the project resolves it, so one supply edited in the catalogue
//! is seen by every circuit using it, and the graph has no ownership cycles.
//!
//! ## Quick Start
//!
//! ```rust
//! use nbr_core::*;
//!
//! let mut project = Project::new("House");
//! let supply = project.add_supply(Supply::new(Volts(220.0), 1)).unwrap();
//! let load_type = project
//!     .add_load_type(LoadType::new("Outlets", SquareMillimeters(2.5), 1.0))
//!     .unwrap();
//! let wire_type = project
//!     .add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))
//!     .unwrap();
//!
//! let kitchen = Circuit::terminal(
//!     "Kitchen",
//!     supply,
//!     load_type,
//!     wire_type,
//!     Meters(12.0),
//!     Watts(3300.0),
//! );
//! let id = project.insert_circuit(None, 0, kitchen).unwrap();
//!
//! let circuit = project.circuit(id).unwrap();
//! assert_eq!(circuit.current(&project).unwrap(), Amperes(15.0));
//! ```
//!
//! ## ID System
//!
//! Every persisted entity carries a process-unique identifier (newtype around a v4 [`Uuid`]):
//! - IDs keep a supply identifier from being passed where a circuit identifier is expected
//! - IDs survive serialization, so shared references rehydrate as one entity
//!
//! ## Modules
//!
//! - [`tables`] - Reference data loader (ampacity, correction factors, breakers, conduits)
//! - [`components`] - Wire and breaker selections produced from the tables
//! - [`circuit`] - Terminal/upstream circuit sum type and power aggregation
//! - [`project`] - Root aggregate with catalogue, tree, and conduit-run editing
//! - [`fields`] - Field descriptors for presentation binding
//! - [`diagnostics`] - Warning/error collection for reports

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod catalog;
pub mod circuit;
pub mod components;
pub mod conduit;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fields;
pub mod project;
pub mod tables;
pub mod units;

pub use catalog::{LoadType, Supply, WireInsulation, WireMaterial, WireType};
pub use circuit::{Circuit, CircuitKind};
pub use components::{Breaker, Wire, WireCriterion};
pub use conduit::{Conduit, ConduitRun, ConduitType};
pub use config::{SizingSettings, StandaloneConditions};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{NbrError, NbrResult, SelectionFailure};
pub use fields::{
    validate_fields, Choice, ChoiceSource, FieldAccess, FieldDescriptor, FieldFormat, FieldValue,
};
pub use project::{accepts_child, ItemKind, Project};
pub use tables::{BreakerCurve, ReferenceData, ReferenceMethod};
pub use units::{Amperes, Celsius, Meters, Millimeters, SquareMillimeters, Volts, Watts};

// Newtype wrappers for IDs for type safety
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Human-readable entity kind, used in error messages
            pub const KIND: &'static str = $kind;

            /// Generate a fresh, process-unique identifier
            #[inline]
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }

            #[inline]
            pub fn from_uuid(value: Uuid) -> Self {
                $name(value)
            }

            #[inline]
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(ProjectId, "project");
entity_id!(SupplyId, "supply");
entity_id!(LoadTypeId, "load type");
entity_id!(WireTypeId, "wire type");
entity_id!(CircuitId, "circuit");
entity_id!(ConduitRunId, "conduit run");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = CircuitId::new();
        let b = CircuitId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_serializes_as_plain_uuid() {
        let uuid = Uuid::parse_str("13cb4131-69c7-4483-b23c-e820a18d7ebf").unwrap();
        let id = SupplyId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"13cb4131-69c7-4483-b23c-e820a18d7ebf\"");

        let back: SupplyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.uuid(), uuid);
    }

    #[test]
    fn test_id_display() {
        let uuid = Uuid::parse_str("e3f9a216-774e-46ee-986a-190abdb37b32").unwrap();
        assert_eq!(
            CircuitId::from_uuid(uuid).to_string(),
            "e3f9a216-774e-46ee-986a-190abdb37b32"
        );
        assert_eq!(CircuitId::KIND, "circuit");
    }
}
