//! Whole-project sizing report.
//!
//! [`size_project`] sizes every circuit of the forest and selects a conduit
//! for every conduit run. A circuit or run that cannot be served (no wire,
//! breaker or conduit large enough, or a rejected value such as a zero
//! voltage) is recorded in the report's diagnostics and left without a
//! result; the rest of the project is still sized. A conduit run is filled
//! from the wires already selected for its circuits, so a run with an unsized
//! member only gets a warning. Failures to read the reference tables abort
//! the report.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use nbr_core::{CircuitId, ConduitRunId, Diagnostics, NbrError, NbrResult, ProjectId, Watts};

use crate::demand::project_demand;
use crate::fill::{fill_run, ConduitFill};
use crate::sizing::{size_circuit, CircuitSizing, SizingContext};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitReport {
    /// Nesting depth, 0 for top-level circuits
    pub depth: usize,
    pub circuit: CircuitId,
    pub name: String,
    pub sizing: Option<CircuitSizing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConduitReport {
    pub conduit_run: ConduitRunId,
    pub name: String,
    pub fill: Option<ConduitFill>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectReport {
    pub project: ProjectId,
    pub name: String,
    pub installed_power: Watts,
    pub demanded_power: Watts,
    /// Depth-first, parents before children
    pub circuits: Vec<CircuitReport>,
    pub conduit_runs: Vec<ConduitReport>,
    pub diagnostics: Diagnostics,
}

impl ProjectReport {
    pub fn sized_circuits(&self) -> impl Iterator<Item = &CircuitSizing> {
        self.circuits.iter().filter_map(|c| c.sizing.as_ref())
    }

    pub fn circuit(&self, id: CircuitId) -> Option<&CircuitReport> {
        self.circuits.iter().find(|c| c.circuit == id)
    }

    pub fn conduit_run(&self, id: ConduitRunId) -> Option<&ConduitReport> {
        self.conduit_runs.iter().find(|r| r.conduit_run == id)
    }
}

/// Keep a non-fatal failure in `diag`, propagate the rest.
fn recover<T>(result: NbrResult<T>, entity: &str, diag: &mut Diagnostics) -> NbrResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if !err.is_fatal() => {
            warn!("Could not size '{}': {}", entity, err);
            diag.add_failure(entity, &err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Size every circuit and conduit run of the project.
pub fn size_project(ctx: &SizingContext<'_>) -> NbrResult<ProjectReport> {
    let project = ctx.project;
    ctx.settings.validate()?;

    let mut diagnostics = Diagnostics::new();
    project.validate_into(&mut diagnostics);

    let totals = project_demand(project)?;

    let mut circuits = Vec::with_capacity(project.circuit_count());
    for (depth, circuit) in project.iter_circuits() {
        let sizing = recover(size_circuit(ctx, circuit), &circuit.name, &mut diagnostics)?;
        circuits.push(CircuitReport {
            depth,
            circuit: circuit.id,
            name: circuit.name.clone(),
            sizing,
        });
    }

    let sized: HashMap<CircuitId, &CircuitSizing> = circuits
        .iter()
        .filter_map(|c| c.sizing.as_ref().map(|sizing| (c.circuit, sizing)))
        .collect();

    let mut conduit_runs = Vec::with_capacity(project.conduit_runs().len());
    for run in project.conduit_runs() {
        let members = project.conduit_run_circuits(run.id)?;
        let fill = match members.iter().find(|c| !sized.contains_key(&c.id)) {
            Some(unsized_circuit) => {
                let message = format!("No conduit selected: circuit '{}' is unsized", unsized_circuit.name);
                warn!("Run '{}': {}", run.name, message);
                diagnostics.add_warning_with_entity("installation", &message, &run.name);
                None
            }
            None => {
                let fill = fill_run(ctx, run.id, |circuit| {
                    sized
                        .get(&circuit.id)
                        .map(|sizing| sizing.wire.external_section())
                        .ok_or_else(|| {
                            NbrError::Validation(format!("circuit '{}' is unsized", circuit.name))
                        })
                });
                recover(fill, &run.name, &mut diagnostics)?
            }
        };
        conduit_runs.push(ConduitReport {
            conduit_run: run.id,
            name: run.name.clone(),
            fill,
        });
    }

    info!(
        "Sized project '{}': {} circuits, {} conduit runs ({})",
        project.name,
        circuits.len(),
        conduit_runs.len(),
        if diagnostics.has_issues() {
            diagnostics.summary()
        } else {
            "no issues".to_string()
        }
    );

    Ok(ProjectReport {
        project: project.id,
        name: project.name.clone(),
        installed_power: totals.installed_power,
        demanded_power: totals.demanded_power,
        circuits,
        conduit_runs,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbr_core::{
        Amperes, Celsius, ConduitRun, FieldValue, LoadType, Project, ReferenceData,
        ReferenceMethod, Severity, SizingSettings, SquareMillimeters, Supply, Volts,
        WireInsulation, WireMaterial, WireType,
    };

    fn project() -> Project {
        let mut project = Project::new("Report");
        project.add_supply(Supply::new(Volts(100.0), 1)).unwrap();
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
        project
    }

    #[test]
    fn test_report_covers_every_circuit() {
        let mut p = project();
        let panel = p.create_upstream_circuit(None, "Panel").unwrap();
        for (name, length) in [("Lights", 10.0), ("Sockets", 12.0)] {
            let id = p
                .create_terminal_circuit(Some(panel), name, Watts(1000.0))
                .unwrap();
            p.set_circuit_field(id, "length", FieldValue::Number(length))
                .unwrap();
        }
        p.set_circuit_field(panel, "length", FieldValue::Number(5.0))
            .unwrap();

        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let report = size_project(&SizingContext::new(&p, &tables, &settings)).unwrap();

        assert_eq!(report.circuits.len(), 3);
        assert_eq!(report.circuits[0].depth, 0);
        assert_eq!(report.circuits[1].depth, 1);
        assert_eq!(report.sized_circuits().count(), 3);
        assert_eq!(report.installed_power, Watts(2000.0));
        assert_eq!(report.demanded_power, Watts(2000.0));

        let panel_sizing = report.circuit(panel).unwrap().sizing.as_ref().unwrap();
        assert_eq!(panel_sizing.current, Amperes(20.0));

        assert_eq!(report.conduit_runs.len(), 1);
        let fill = report.conduit_runs[0].fill.as_ref().unwrap();
        assert_eq!(fill.circuit_count, 3);
        assert!(!report.diagnostics.has_errors());
    }

    #[test]
    fn test_unservable_circuit_is_reported() {
        let mut p = project();
        let ok = p.create_terminal_circuit(None, "Small", Watts(1000.0)).unwrap();
        p.set_circuit_field(ok, "length", FieldValue::Number(10.0))
            .unwrap();
        let huge = p
            .create_terminal_circuit(None, "Furnace", Watts(100_000.0))
            .unwrap();
        p.set_circuit_field(huge, "length", FieldValue::Number(10.0))
            .unwrap();

        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let report = size_project(&SizingContext::new(&p, &tables, &settings)).unwrap();

        assert!(report.circuit(ok).unwrap().sizing.is_some());
        assert!(report.circuit(huge).unwrap().sizing.is_none());
        assert!(report.diagnostics.has_errors());
        let issue = report.diagnostics.errors().next().unwrap();
        assert_eq!(issue.category, "selection");
        assert_eq!(issue.entity.as_deref(), Some("Furnace"));

        // The furnace is reported once; its run only warns
        assert!(report.conduit_runs[0].fill.is_none());
        assert_eq!(report.diagnostics.error_count(), 1);
        let run_issue = report.diagnostics.issues_for("Run 1").next().unwrap();
        assert_eq!(run_issue.severity, Severity::Warning);
        assert!(run_issue.message.contains("'Furnace' is unsized"));
    }

    #[test]
    fn test_structural_warnings_are_included() {
        let p = project();
        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let report = size_project(&SizingContext::new(&p, &tables, &settings)).unwrap();

        assert!(report.circuits.is_empty());
        assert!(report
            .diagnostics
            .warnings()
            .any(|w| w.message == "Project has no circuits"));
        assert!(!report.diagnostics.has_errors());
    }

    #[test]
    fn test_invalid_settings_abort() {
        let p = project();
        let tables = ReferenceData::embedded();
        let settings = SizingSettings {
            voltage_drop_limit: -1.0,
            ..SizingSettings::default()
        };
        assert!(size_project(&SizingContext::new(&p, &tables, &settings)).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let mut p = project();
        let id = p.create_terminal_circuit(None, "Lights", Watts(500.0)).unwrap();
        p.set_circuit_field(id, "length", FieldValue::Number(8.0))
            .unwrap();
        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let report = size_project(&SizingContext::new(&p, &tables, &settings)).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        let circuit = &json["circuits"][0];
        assert_eq!(circuit["name"], "Lights");
        assert_eq!(circuit["sizing"]["breaker"]["curve"], "C");
        assert_eq!(circuit["sizing"]["governing"], "minimum_section");
        assert_eq!(json["demanded_power"], 500.0);
    }

    #[test]
    fn test_zero_voltage_circuit_is_reported() {
        let mut p = Project::new("Dead");
        p.add_supply(Supply::new(Volts(0.0), 1)).unwrap();
        p.add_load_type(LoadType::new("General", SquareMillimeters(2.5), 1.0))
            .unwrap();
        p.add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))
            .unwrap();
        let id = p.create_terminal_circuit(None, "Dead", Watts(800.0)).unwrap();

        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let report = size_project(&SizingContext::new(&p, &tables, &settings)).unwrap();

        assert!(report.circuit(id).unwrap().sizing.is_none());
        let issue = report.diagnostics.errors().next().unwrap();
        assert_eq!(issue.category, "validation");
        assert!(issue.message.contains("has no voltage"));
        assert_eq!(report.demanded_power, Watts(800.0));
    }

    #[test]
    fn test_aluminium_circuit_does_not_abort_report() {
        let mut p = project();
        let aluminium = p
            .add_wire_type(WireType::new(WireMaterial::Aluminium, WireInsulation::Pvc))
            .unwrap();
        let copper = p.create_terminal_circuit(None, "Copper", Watts(1000.0)).unwrap();
        let alu = p.create_terminal_circuit(None, "Aluminium", Watts(1000.0)).unwrap();
        p.set_circuit_field(alu, "wire_type", FieldValue::Reference(aluminium.uuid()))
            .unwrap();

        let tables = ReferenceData::embedded();
        let settings = SizingSettings::default();
        let report = size_project(&SizingContext::new(&p, &tables, &settings)).unwrap();

        assert!(report.circuit(copper).unwrap().sizing.is_some());
        assert!(report.circuit(alu).unwrap().sizing.is_none());
        assert_eq!(report.diagnostics.error_count(), 1);
        let issue = report.diagnostics.issues_for("Aluminium").next().unwrap();
        assert_eq!(issue.category, "reference_data");
        assert!(issue.message.contains("aluminium pvc"));
    }
}
