//! # nbr-algo: Installation Sizing Algorithms
//!
//! Sizes the components of a low-voltage installation described by an
//! [`nbr_core::Project`]:
//!
//! | Step | Function | Result |
//! |------|----------|--------|
//! | Wire and breaker selection | [`size_circuit`] | [`CircuitSizing`] |
//! | Demand aggregation | [`demand_breakdown`] | [`DemandNode`] tree |
//! | Conduit selection | [`conduit_fill`] | [`ConduitFill`] |
//! | Whole project | [`size_project`] | [`ProjectReport`] |
//!
//! Every computation takes a [`SizingContext`] bundling the project, the
//! reference tables and the sizing settings. Nothing is cached between
//! calls and nothing in the project is mutated.
//!
//! ## Example
//!
//! ```
//! use nbr_algo::{size_circuit, SizingContext};
//! use nbr_core::*;
//!
//! let mut project = Project::new("Workshop");
//! project.add_supply(Supply::new(Volts(100.0), 1)).unwrap();
//! project
//!     .add_load_type(LoadType::new("Motors", SquareMillimeters(2.5), 1.0))
//!     .unwrap();
//! project
//!     .add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))
//!     .unwrap();
//! let id = project
//!     .create_terminal_circuit(None, "Lathe", Watts(5000.0))
//!     .unwrap();
//! project
//!     .set_circuit_field(id, "length", FieldValue::Number(10.0))
//!     .unwrap();
//!
//! let tables = ReferenceData::embedded();
//! let settings = SizingSettings::default();
//! let ctx = SizingContext::new(&project, &tables, &settings);
//!
//! let sizing = size_circuit(&ctx, project.circuit(id).unwrap()).unwrap();
//! assert_eq!(sizing.breaker.current, Amperes(50.0));
//! assert_eq!(sizing.wire.section, SquareMillimeters(10.0));
//! ```

pub mod demand;
pub mod fill;
pub mod report;
pub mod sizing;

pub use demand::{demand_breakdown, project_demand, DemandNode, DemandTotals};
pub use fill::{conduit_fill, fill_run, max_fill_factor, select_conduit, ConduitFill};
pub use report::{size_project, CircuitReport, ConduitReport, ProjectReport};
pub use sizing::{
    correction_factor, select_breaker, select_wire, size_circuit, voltage_drop, CircuitSizing,
    InstallationConditions, SizingContext, WireCandidates,
};
