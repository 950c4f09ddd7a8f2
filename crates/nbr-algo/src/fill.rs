//! Conduit selection for a conduit run.
//!
//! The occupied area is the external section of each circuit's selected wire
//! times the number of physical conductors of its supply. The allowed share
//! of the conduit's internal section depends on how many current-carrying
//! conductors the run holds:
//!
//! | Conductors | Max fill |
//! |-----------:|---------:|
//! | 1 | 53% |
//! | 2 | 31% |
//! | 3 or more | 40% |
//!
//! The selected conduit is the smallest of the run's family whose section
//! times the max fill factor covers the occupied area.

use serde::Serialize;
use tracing::debug;

use nbr_core::{Circuit, Conduit, ConduitRunId, NbrResult, SelectionFailure, SquareMillimeters};

use crate::sizing::{size_circuit, SizingContext};

/// Allowed fill factor for a number of current-carrying conductors.
pub fn max_fill_factor(conductors: usize) -> f64 {
    match conductors {
        1 => 0.53,
        2 => 0.31,
        _ => 0.40,
    }
}

/// Smallest conduit in `conduits` (ascending) holding `filled_section`.
pub fn select_conduit(
    conduits: &[Conduit],
    filled_section: SquareMillimeters,
    max_fill_factor: f64,
) -> NbrResult<&Conduit> {
    let conduit = conduits
        .iter()
        .find(|c| c.section() * max_fill_factor >= filled_section)
        .ok_or(SelectionFailure::NoSuitableConduit {
            filled_section,
            max_fill_factor,
        })?;
    Ok(conduit)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConduitFill {
    pub conduit_run: ConduitRunId,
    pub name: String,
    pub circuit_count: usize,
    pub conductor_count: usize,
    pub max_fill_factor: f64,
    pub filled_section: SquareMillimeters,
    pub conduit: Conduit,
    /// Share of the selected conduit's section actually occupied
    pub fill_factor: f64,
}

/// Size every circuit of a run and select its conduit.
pub fn conduit_fill(ctx: &SizingContext<'_>, run_id: ConduitRunId) -> NbrResult<ConduitFill> {
    fill_run(ctx, run_id, |circuit| {
        Ok(size_circuit(ctx, circuit)?.wire.external_section())
    })
}

/// Select the conduit of a run whose circuits are already sized.
///
/// `wire_section` returns the external section of the wire selected for a
/// member circuit.
pub fn fill_run(
    ctx: &SizingContext<'_>,
    run_id: ConduitRunId,
    mut wire_section: impl FnMut(&Circuit) -> NbrResult<SquareMillimeters>,
) -> NbrResult<ConduitFill> {
    let project = ctx.project;
    let run = project.conduit_run(run_id)?;

    let mut conductor_count = 0;
    let mut filled_section = SquareMillimeters(0.0);
    let circuits = project.conduit_run_circuits(run_id)?;
    for circuit in &circuits {
        let supply = project.supply(circuit.supply)?;
        conductor_count += supply.current_carrying_conductors();
        filled_section = filled_section + wire_section(circuit)? * supply.wire_count() as f64;
    }

    let max_fill = max_fill_factor(conductor_count);
    let conduit_type = run.conduit_type.unwrap_or(ctx.settings.conduit_type);
    let conduit = select_conduit(ctx.tables.conduits(conduit_type)?, filled_section, max_fill)?;
    let fill_factor = filled_section / conduit.section();

    debug!(
        "Run '{}': {} conductors, {:.2} filled, {} at {:.1}% (max {:.0}%)",
        run.name,
        conductor_count,
        filled_section,
        conduit,
        fill_factor * 100.0,
        max_fill * 100.0
    );

    Ok(ConduitFill {
        conduit_run: run_id,
        name: run.name.clone(),
        circuit_count: circuits.len(),
        conductor_count,
        max_fill_factor: max_fill,
        filled_section,
        conduit: conduit.clone(),
        fill_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbr_core::{
        Celsius, CircuitId, ConduitRun, ConduitType, FieldValue, LoadType, Millimeters, Project,
        ReferenceData, ReferenceMethod, SizingSettings, Supply, Volts, Watts, WireInsulation,
        WireMaterial, WireType,
    };

    fn project(supply: Supply) -> (Project, ConduitRunId) {
        let mut project = Project::new("Fill");
        project.add_supply(supply).unwrap();
        project
            .add_load_type(LoadType::new("General", SquareMillimeters(2.5), 1.0))
            .unwrap();
        project
            .add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))
            .unwrap();
        let run = project
            .add_conduit_run(ConduitRun::new("Run 1", ReferenceMethod::B1, Celsius(30.0)))
            .unwrap();
        project.set_default_conduit_run(Some(run)).unwrap();
        (project, run)
    }

    fn add_circuit(project: &mut Project) -> CircuitId {
        let id = project
            .create_terminal_circuit(None, "Load", Watts(5000.0))
            .unwrap();
        project
            .set_circuit_field(id, "length", FieldValue::Number(10.0))
            .unwrap();
        id
    }

    #[test]
    fn test_max_fill_factor() {
        assert_eq!(max_fill_factor(1), 0.53);
        assert_eq!(max_fill_factor(2), 0.31);
        assert_eq!(max_fill_factor(3), 0.40);
        assert_eq!(max_fill_factor(12), 0.40);
    }

    #[test]
    fn test_three_circuits() {
        let (mut p, run) = project(Supply::new(Volts(100.0), 1));
        for _ in 0..3 {
            add_circuit(&mut p);
        }
        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let ctx = SizingContext::new(&p, &tables, &settings);

        let fill = conduit_fill(&ctx, run).unwrap();
        assert_eq!(fill.circuit_count, 3);
        assert_eq!(fill.conductor_count, 6);
        assert_eq!(fill.max_fill_factor, 0.40);
        assert!((fill.filled_section.value() - 346.360590).abs() < 1e-5);
        assert_eq!(fill.conduit.internal_diameter, Millimeters(36.1));
        assert!((fill.fill_factor - 0.338395).abs() < 1e-6);
        assert!(fill.fill_factor <= fill.max_fill_factor);
    }

    #[test]
    fn test_single_circuit_without_ground() {
        let (mut p, run) = project(Supply::new(Volts(100.0), 1).with_ground(false));
        add_circuit(&mut p);
        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let ctx = SizingContext::new(&p, &tables, &settings);

        let fill = conduit_fill(&ctx, run).unwrap();
        assert_eq!(fill.conductor_count, 2);
        assert_eq!(fill.max_fill_factor, 0.31);
        assert!((fill.filled_section.value() - 54.679420).abs() < 1e-5);
        assert_eq!(fill.conduit.internal_diameter, Millimeters(16.4));
        assert!((fill.fill_factor - 0.258849).abs() < 1e-6);
    }

    #[test]
    fn test_run_family_overrides_settings() {
        let (mut p, run) = project(Supply::new(Volts(100.0), 1));
        add_circuit(&mut p);
        p.set_conduit_run_field(run, "conduit_type", FieldValue::Choice("flexible".into()))
            .unwrap();
        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let ctx = SizingContext::new(&p, &tables, &settings);

        let fill = conduit_fill(&ctx, run).unwrap();
        assert_eq!(fill.conduit.conduit_type, ConduitType::Flexible);
    }

    #[test]
    fn test_overfull_run_fails() {
        let tables = ReferenceData::embedded();
        let conduits = tables.conduits(ConduitType::Flexible).unwrap();
        let err = select_conduit(conduits, SquareMillimeters(10_000.0), 0.40).unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(
            err.as_selection(),
            Some(SelectionFailure::NoSuitableConduit { .. })
        ));
    }

    #[test]
    fn test_empty_run_gets_smallest_conduit() {
        let (p, run) = project(Supply::new(Volts(100.0), 1));
        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let ctx = SizingContext::new(&p, &tables, &settings);

        let fill = conduit_fill(&ctx, run).unwrap();
        assert_eq!(fill.circuit_count, 0);
        assert_eq!(fill.fill_factor, 0.0);
        assert_eq!(fill.conduit.nominal_diameter, "1/2\"");
    }
}
