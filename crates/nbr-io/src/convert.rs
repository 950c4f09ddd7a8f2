//! Conversion between [`Project`] and [`ProjectDocument`].

use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use tracing::debug;

use nbr_core::{
    validate_fields, Circuit, CircuitId, ConduitRun, FieldAccess, NbrError, NbrResult, Project,
};

use crate::document::{
    CircuitCommon, CircuitDocument, ConduitRunDocument, DefaultsDocument, ProjectDocument,
    FORMAT_VERSION,
};
use crate::identity::LoadContext;

/// Snapshot a project into its document form.
pub fn to_document(project: &Project) -> NbrResult<ProjectDocument> {
    let circuits = project
        .circuits()
        .iter()
        .map(|c| circuit_document(project, c))
        .collect::<NbrResult<Vec<_>>>()?;

    let conduit_runs = project
        .conduit_runs()
        .iter()
        .map(|run| ConduitRunDocument {
            id: run.id,
            name: run.name.clone(),
            length: run.length,
            reference_method: run.reference_method,
            temperature: run.temperature,
            conduit_type: run.conduit_type,
            circuits: run.circuits().to_vec(),
        })
        .collect();

    Ok(ProjectDocument {
        format_version: FORMAT_VERSION.to_string(),
        saved_at: Some(Utc::now()),
        id: project.id,
        name: project.name.clone(),
        supplies: project.supplies().to_vec(),
        load_types: project.load_types().to_vec(),
        wire_types: project.wire_types().to_vec(),
        defaults: DefaultsDocument {
            supply: project.default_supply(),
            load_type: project.default_load_type(),
            wire_type: project.default_wire_type(),
            conduit_run: project.default_conduit_run(),
        },
        circuits,
        conduit_runs,
    })
}

fn circuit_document(project: &Project, circuit: &Circuit) -> NbrResult<CircuitDocument> {
    let common = CircuitCommon {
        id: circuit.id,
        name: circuit.name.clone(),
        description: circuit.description.clone(),
        supply: project.supply(circuit.supply)?.clone(),
        load_type: project.load_type(circuit.load_type)?.clone(),
        wire_type: project.wire_type(circuit.wire_type)?.clone(),
        length: circuit.length,
    };

    Ok(match circuit.load_power() {
        Some(load_power) => CircuitDocument::Terminal { common, load_power },
        None => CircuitDocument::Upstream {
            common,
            circuits: circuit
                .children()
                .iter()
                .map(|child| circuit_document(project, child))
                .collect::<NbrResult<Vec<_>>>()?,
        },
    })
}

/// Rebuild a project from a document.
///
/// Shared entities are resolved through a fresh [`LoadContext`]: catalogue
/// entries first, then the copies embedded in circuits. An embedded entity
/// missing from the catalogue is appended to it. Every entity is held to the
/// same rules as its field setters; a value they would reject fails the load
/// with [`NbrError::Validation`].
pub fn from_document(doc: ProjectDocument) -> NbrResult<Project> {
    doc.check_version()?;

    let mut ctx = LoadContext::new();
    for supply in doc.supplies {
        ctx.supplies.resolve(supply)?;
    }
    for load_type in doc.load_types {
        ctx.load_types.resolve(load_type)?;
    }
    for wire_type in doc.wire_types {
        ctx.wire_types.resolve(wire_type)?;
    }
    let mut seen = HashSet::new();
    for circuit in &doc.circuits {
        register_circuit(&mut ctx, &mut seen, circuit)?;
    }

    let mut project = Project::new(doc.name).with_id(doc.id);
    for supply in ctx.supplies.into_items() {
        project.add_supply(checked("supply", supply.id, supply)?)?;
    }
    for load_type in ctx.load_types.into_items() {
        project.add_load_type(checked("load type", load_type.id, load_type)?)?;
    }
    for wire_type in ctx.wire_types.into_items() {
        project.add_wire_type(checked("wire type", wire_type.id, wire_type)?)?;
    }

    for (position, circuit) in doc.circuits.into_iter().enumerate() {
        insert_circuit(&mut project, None, position, circuit)?;
    }

    let mut assigned = HashSet::new();
    for run_doc in doc.conduit_runs {
        let mut run = ConduitRun::new(run_doc.name, run_doc.reference_method, run_doc.temperature)
            .with_length(run_doc.length);
        run.id = run_doc.id;
        run.conduit_type = run_doc.conduit_type;
        let run_id = project.add_conduit_run(checked("conduit run", run_doc.id, run)?)?;

        for member in run_doc.circuits {
            if project.find_circuit(member).is_none() {
                return Err(NbrError::Validation(format!(
                    "conduit run {} lists unknown circuit {}",
                    run_id, member
                )));
            }
            if !assigned.insert(member) {
                return Err(NbrError::Validation(format!(
                    "circuit {} is listed in more than one conduit run",
                    member
                )));
            }
            project.assign_to_conduit_run(member, run_id, None)?;
        }
    }

    project.set_default_supply(doc.defaults.supply)?;
    project.set_default_load_type(doc.defaults.load_type)?;
    project.set_default_wire_type(doc.defaults.wire_type)?;
    project.set_default_conduit_run(doc.defaults.conduit_run)?;

    debug!(
        "Rebuilt project '{}': {} supplies, {} circuits, {} conduit runs",
        project.name,
        project.supplies().len(),
        project.circuit_count(),
        project.conduit_runs().len()
    );
    Ok(project)
}

fn checked<T: FieldAccess + Clone>(kind: &str, id: impl fmt::Display, entity: T) -> NbrResult<T> {
    match validate_fields(&entity) {
        Ok(()) => Ok(entity),
        Err(NbrError::Validation(message)) => Err(NbrError::Validation(format!(
            "{} {}: {}",
            kind, id, message
        ))),
        Err(err) => Err(err),
    }
}

fn register_circuit(
    ctx: &mut LoadContext,
    seen: &mut HashSet<CircuitId>,
    circuit: &CircuitDocument,
) -> NbrResult<()> {
    let common = circuit.common();
    if !seen.insert(common.id) {
        return Err(NbrError::Validation(format!(
            "circuit id {} appears more than once",
            common.id
        )));
    }
    ctx.supplies.resolve(common.supply.clone())?;
    ctx.load_types.resolve(common.load_type.clone())?;
    ctx.wire_types.resolve(common.wire_type.clone())?;
    for child in circuit.children() {
        register_circuit(ctx, seen, child)?;
    }
    Ok(())
}

fn insert_circuit(
    project: &mut Project,
    parent: Option<CircuitId>,
    position: usize,
    circuit: CircuitDocument,
) -> NbrResult<()> {
    let (circuit, children) = match circuit {
        CircuitDocument::Terminal { common, load_power } => (
            Circuit::terminal(
                common.name,
                common.supply.id,
                common.load_type.id,
                common.wire_type.id,
                common.length,
                load_power,
            )
            .with_id(common.id)
            .with_description(common.description),
            Vec::new(),
        ),
        CircuitDocument::Upstream { common, circuits } => (
            Circuit::upstream(
                common.name,
                common.supply.id,
                common.load_type.id,
                common.wire_type.id,
                common.length,
            )
            .with_id(common.id)
            .with_description(common.description),
            circuits,
        ),
    };

    let id = project.insert_circuit(parent, position, checked("circuit", circuit.id, circuit)?)?;
    for (position, child) in children.into_iter().enumerate() {
        insert_circuit(project, Some(id), position, child)?;
    }
    Ok(())
}
