//! The project aggregate.
//!
//! [`Project`] owns every entity of one installation and is the only way to
//! edit the relationships between them. Its methods keep these invariants:
//!
//! - every supply, load type and wire type a circuit references is in the catalogue
//! - circuit identifiers are unique across the whole forest
//! - a circuit has at most one parent and is never inside its own subtree
//! - a circuit belongs to at most one conduit run, and the run's member list
//!   and the circuit's back-reference always agree

use serde::Serialize;
use tracing::debug;

use crate::catalog::{LoadType, Supply, WireType};
use crate::circuit::{Circuit, CircuitIter};
use crate::conduit::{ConduitRun, ConduitType};
use crate::diagnostics::Diagnostics;
use crate::error::{NbrError, NbrResult};
use crate::fields::{
    optional_reference, reference, Choice, ChoiceSource, FieldAccess, FieldDescriptor,
    FieldFormat, FieldValue,
};
use crate::tables::{ReferenceData, ReferenceMethod};
use crate::units::{Meters, Watts};
use crate::{CircuitId, ConduitRunId, LoadTypeId, ProjectId, SupplyId, WireTypeId};

/// Kinds of item that appear in the project tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemKind {
    Project,
    Supply,
    LoadType,
    WireType,
    TerminalCircuit,
    UpstreamCircuit,
    ConduitRun,
}

impl ItemKind {
    pub fn is_circuit(self) -> bool {
        matches!(self, ItemKind::TerminalCircuit | ItemKind::UpstreamCircuit)
    }
}

/// Whether an item of kind `child` may be placed under an item of kind `parent`.
///
/// Circuits go under the project, an upstream circuit, or a conduit run.
/// Conduit runs only go under the project.
pub fn accepts_child(parent: ItemKind, child: ItemKind) -> bool {
    match parent {
        ItemKind::Project => child.is_circuit() || child == ItemKind::ConduitRun,
        ItemKind::UpstreamCircuit | ItemKind::ConduitRun => child.is_circuit(),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    supplies: Vec<Supply>,
    load_types: Vec<LoadType>,
    wire_types: Vec<WireType>,
    default_supply: Option<SupplyId>,
    default_load_type: Option<LoadTypeId>,
    default_wire_type: Option<WireTypeId>,
    default_conduit_run: Option<ConduitRunId>,
    circuits: Vec<Circuit>,
    conduit_runs: Vec<ConduitRun>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            supplies: Vec::new(),
            load_types: Vec::new(),
            wire_types: Vec::new(),
            default_supply: None,
            default_load_type: None,
            default_wire_type: None,
            default_conduit_run: None,
            circuits: Vec::new(),
            conduit_runs: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: ProjectId) -> Self {
        self.id = id;
        self
    }

    // =========================================================================
    // Catalogues
    // =========================================================================

    pub fn supplies(&self) -> &[Supply] {
        &self.supplies
    }

    pub fn load_types(&self) -> &[LoadType] {
        &self.load_types
    }

    pub fn wire_types(&self) -> &[WireType] {
        &self.wire_types
    }

    pub fn supply(&self, id: SupplyId) -> NbrResult<&Supply> {
        self.supplies
            .iter()
            .find(|s| s.id == id)
            .ok_or(NbrError::UnknownReference {
                kind: SupplyId::KIND,
                id: id.uuid(),
            })
    }

    pub fn load_type(&self, id: LoadTypeId) -> NbrResult<&LoadType> {
        self.load_types
            .iter()
            .find(|l| l.id == id)
            .ok_or(NbrError::UnknownReference {
                kind: LoadTypeId::KIND,
                id: id.uuid(),
            })
    }

    pub fn wire_type(&self, id: WireTypeId) -> NbrResult<&WireType> {
        self.wire_types
            .iter()
            .find(|w| w.id == id)
            .ok_or(NbrError::UnknownReference {
                kind: WireTypeId::KIND,
                id: id.uuid(),
            })
    }

    /// Add a supply; the first one added becomes the default.
    pub fn add_supply(&mut self, supply: Supply) -> NbrResult<SupplyId> {
        if self.supply(supply.id).is_ok() {
            return Err(duplicate(SupplyId::KIND, supply.id.uuid()));
        }
        let id = supply.id;
        self.supplies.push(supply);
        self.default_supply.get_or_insert(id);
        Ok(id)
    }

    /// Add a load type; the first one added becomes the default.
    pub fn add_load_type(&mut self, load_type: LoadType) -> NbrResult<LoadTypeId> {
        if self.load_type(load_type.id).is_ok() {
            return Err(duplicate(LoadTypeId::KIND, load_type.id.uuid()));
        }
        let id = load_type.id;
        self.load_types.push(load_type);
        self.default_load_type.get_or_insert(id);
        Ok(id)
    }

    /// Add a wire type; the first one added becomes the default.
    pub fn add_wire_type(&mut self, wire_type: WireType) -> NbrResult<WireTypeId> {
        if self.wire_type(wire_type.id).is_ok() {
            return Err(duplicate(WireTypeId::KIND, wire_type.id.uuid()));
        }
        let id = wire_type.id;
        self.wire_types.push(wire_type);
        self.default_wire_type.get_or_insert(id);
        Ok(id)
    }

    /// Remove a supply no circuit uses.
    pub fn remove_supply(&mut self, id: SupplyId) -> NbrResult<Supply> {
        let index = position(&self.supplies, |s| s.id == id, SupplyId::KIND, id.uuid())?;
        if let Some((_, user)) = self.iter_circuits().find(|(_, c)| c.supply == id) {
            return Err(in_use(SupplyId::KIND, &self.supplies[index].to_string(), &user.name));
        }
        if self.default_supply == Some(id) {
            self.default_supply = None;
        }
        Ok(self.supplies.remove(index))
    }

    /// Remove a load type no circuit uses.
    pub fn remove_load_type(&mut self, id: LoadTypeId) -> NbrResult<LoadType> {
        let index = position(&self.load_types, |l| l.id == id, LoadTypeId::KIND, id.uuid())?;
        if let Some((_, user)) = self.iter_circuits().find(|(_, c)| c.load_type == id) {
            return Err(in_use(LoadTypeId::KIND, &self.load_types[index].name, &user.name));
        }
        if self.default_load_type == Some(id) {
            self.default_load_type = None;
        }
        Ok(self.load_types.remove(index))
    }

    /// Remove a wire type no circuit uses.
    pub fn remove_wire_type(&mut self, id: WireTypeId) -> NbrResult<WireType> {
        let index = position(&self.wire_types, |w| w.id == id, WireTypeId::KIND, id.uuid())?;
        if let Some((_, user)) = self.iter_circuits().find(|(_, c)| c.wire_type == id) {
            return Err(in_use(
                WireTypeId::KIND,
                &self.wire_types[index].to_string(),
                &user.name,
            ));
        }
        if self.default_wire_type == Some(id) {
            self.default_wire_type = None;
        }
        Ok(self.wire_types.remove(index))
    }

    pub fn set_supply_field(&mut self, id: SupplyId, name: &str, value: FieldValue) -> NbrResult<()> {
        let index = position(&self.supplies, |s| s.id == id, SupplyId::KIND, id.uuid())?;
        self.supplies[index].set_field(name, value)
    }

    pub fn set_load_type_field(
        &mut self,
        id: LoadTypeId,
        name: &str,
        value: FieldValue,
    ) -> NbrResult<()> {
        let index = position(&self.load_types, |l| l.id == id, LoadTypeId::KIND, id.uuid())?;
        self.load_types[index].set_field(name, value)
    }

    pub fn set_wire_type_field(
        &mut self,
        id: WireTypeId,
        name: &str,
        value: FieldValue,
    ) -> NbrResult<()> {
        let index = position(&self.wire_types, |w| w.id == id, WireTypeId::KIND, id.uuid())?;
        self.wire_types[index].set_field(name, value)
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    pub fn default_supply(&self) -> Option<SupplyId> {
        self.default_supply
    }

    pub fn default_load_type(&self) -> Option<LoadTypeId> {
        self.default_load_type
    }

    pub fn default_wire_type(&self) -> Option<WireTypeId> {
        self.default_wire_type
    }

    pub fn default_conduit_run(&self) -> Option<ConduitRunId> {
        self.default_conduit_run
    }

    pub fn set_default_supply(&mut self, id: Option<SupplyId>) -> NbrResult<()> {
        if let Some(id) = id {
            self.supply(id)?;
        }
        self.default_supply = id;
        Ok(())
    }

    pub fn set_default_load_type(&mut self, id: Option<LoadTypeId>) -> NbrResult<()> {
        if let Some(id) = id {
            self.load_type(id)?;
        }
        self.default_load_type = id;
        Ok(())
    }

    pub fn set_default_wire_type(&mut self, id: Option<WireTypeId>) -> NbrResult<()> {
        if let Some(id) = id {
            self.wire_type(id)?;
        }
        self.default_wire_type = id;
        Ok(())
    }

    pub fn set_default_conduit_run(&mut self, id: Option<ConduitRunId>) -> NbrResult<()> {
        if let Some(id) = id {
            self.conduit_run(id)?;
        }
        self.default_conduit_run = id;
        Ok(())
    }

    // =========================================================================
    // Circuit tree
    // =========================================================================

    /// Top-level circuits.
    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    /// Every circuit in the forest, depth-first, with its depth.
    pub fn iter_circuits(&self) -> CircuitIter<'_> {
        CircuitIter::over(&self.circuits)
    }

    pub fn circuit_count(&self) -> usize {
        self.iter_circuits().count()
    }

    pub fn find_circuit(&self, id: CircuitId) -> Option<&Circuit> {
        self.iter_circuits().map(|(_, c)| c).find(|c| c.id == id)
    }

    pub fn circuit(&self, id: CircuitId) -> NbrResult<&Circuit> {
        self.find_circuit(id).ok_or(NbrError::UnknownReference {
            kind: CircuitId::KIND,
            id: id.uuid(),
        })
    }

    fn find_circuit_mut(&mut self, id: CircuitId) -> Option<&mut Circuit> {
        fn walk(circuits: &mut [Circuit], id: CircuitId) -> Option<&mut Circuit> {
            for circuit in circuits {
                if circuit.id == id {
                    return Some(circuit);
                }
                if let Some(children) = circuit.children_mut() {
                    if let Some(found) = walk(children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        walk(&mut self.circuits, id)
    }

    fn circuit_mut(&mut self, id: CircuitId) -> NbrResult<&mut Circuit> {
        self.find_circuit_mut(id).ok_or(NbrError::UnknownReference {
            kind: CircuitId::KIND,
            id: id.uuid(),
        })
    }

    /// Parent of a circuit; `None` for a top-level circuit.
    pub fn parent_of(&self, id: CircuitId) -> NbrResult<Option<CircuitId>> {
        if self.circuits.iter().any(|c| c.id == id) {
            return Ok(None);
        }
        self.iter_circuits()
            .map(|(_, c)| c)
            .find(|c| c.children().iter().any(|child| child.id == id))
            .map(|parent| Some(parent.id))
            .ok_or(NbrError::UnknownReference {
                kind: CircuitId::KIND,
                id: id.uuid(),
            })
    }

    /// Child list the given parent owns, for reading.
    fn siblings(&self, parent: Option<CircuitId>) -> NbrResult<&[Circuit]> {
        match parent {
            None => Ok(&self.circuits),
            Some(parent_id) => {
                let parent = self.circuit(parent_id)?;
                if !accepts_child(parent.item_kind(), ItemKind::TerminalCircuit) {
                    return Err(NbrError::Validation(format!(
                        "terminal circuit '{}' cannot hold other circuits",
                        parent.name
                    )));
                }
                Ok(parent.children())
            }
        }
    }

    fn siblings_mut(&mut self, parent: Option<CircuitId>) -> NbrResult<&mut Vec<Circuit>> {
        match parent {
            None => Ok(&mut self.circuits),
            Some(parent_id) => {
                let parent = self.circuit_mut(parent_id)?;
                let name = parent.name.clone();
                parent.children_mut().ok_or_else(|| {
                    NbrError::Validation(format!(
                        "terminal circuit '{}' cannot hold other circuits",
                        name
                    ))
                })
            }
        }
    }

    /// Check that a subtree about to be inserted references known catalogue
    /// entries and introduces no duplicate identifier.
    fn check_insertable(&self, circuit: &Circuit) -> NbrResult<()> {
        let mut seen = std::collections::HashSet::new();
        for (_, c) in circuit.iter() {
            if !seen.insert(c.id) || self.find_circuit(c.id).is_some() {
                return Err(NbrError::Validation(format!(
                    "circuit id {} is already used in project '{}'",
                    c.id, self.name
                )));
            }
            self.supply(c.supply)?;
            self.load_type(c.load_type)?;
            self.wire_type(c.wire_type)?;
        }
        Ok(())
    }

    /// Insert a circuit subtree under `parent` (or at top level) at `position`.
    pub fn insert_circuit(
        &mut self,
        parent: Option<CircuitId>,
        position: usize,
        mut circuit: Circuit,
    ) -> NbrResult<CircuitId> {
        self.check_insertable(&circuit)?;
        let len = self.siblings(parent)?.len();
        check_position(position, len)?;

        clear_conduit_runs(&mut circuit);
        let id = circuit.id;
        debug!(circuit = %circuit.name, ?parent, position, "inserting circuit");
        self.siblings_mut(parent)?.insert(position, circuit);
        Ok(id)
    }

    /// Remove a circuit and its subtree, dropping their conduit run memberships.
    pub fn remove_circuit(&mut self, id: CircuitId) -> NbrResult<Circuit> {
        let parent = self.parent_of(id)?;
        let siblings = self.siblings_mut(parent)?;
        let index = position(siblings, |c| c.id == id, CircuitId::KIND, id.uuid())?;
        let mut removed = siblings.remove(index);

        let ids: Vec<CircuitId> = removed.iter().map(|(_, c)| c.id).collect();
        for run in &mut self.conduit_runs {
            run.circuits.retain(|member| !ids.contains(member));
        }
        clear_conduit_runs(&mut removed);
        debug!(circuit = %removed.name, "removed circuit");
        Ok(removed)
    }

    /// Move a circuit under a new parent, keeping its conduit run membership.
    ///
    /// `position` indexes the destination list after the circuit has been
    /// taken out of its current place.
    pub fn move_circuit(
        &mut self,
        id: CircuitId,
        new_parent: Option<CircuitId>,
        position: usize,
    ) -> NbrResult<()> {
        let circuit = self.circuit(id)?;
        if let Some(parent_id) = new_parent {
            if circuit.contains(parent_id) {
                return Err(NbrError::Validation(format!(
                    "circuit '{}' cannot be moved inside its own subtree",
                    circuit.name
                )));
            }
        }
        let old_parent = self.parent_of(id)?;
        let mut len = self.siblings(new_parent)?.len();
        if old_parent == new_parent {
            len -= 1;
        }
        check_position(position, len)?;

        let siblings = self.siblings_mut(old_parent)?;
        let index = position_of(siblings, id)?;
        let circuit = siblings.remove(index);
        self.siblings_mut(new_parent)?.insert(position, circuit);
        Ok(())
    }

    /// Build a terminal circuit from the project defaults and append it under
    /// `parent`, placing it in the default conduit run if one is set.
    pub fn create_terminal_circuit(
        &mut self,
        parent: Option<CircuitId>,
        name: impl Into<String>,
        load_power: Watts,
    ) -> NbrResult<CircuitId> {
        let (supply, load_type, wire_type) = self.defaults()?;
        let circuit = Circuit::terminal(name, supply, load_type, wire_type, Meters(0.0), load_power);
        self.append_with_defaults(parent, circuit)
    }

    /// Build an empty upstream circuit from the project defaults; see
    /// [`Project::create_terminal_circuit`].
    pub fn create_upstream_circuit(
        &mut self,
        parent: Option<CircuitId>,
        name: impl Into<String>,
    ) -> NbrResult<CircuitId> {
        let (supply, load_type, wire_type) = self.defaults()?;
        let circuit = Circuit::upstream(name, supply, load_type, wire_type, Meters(0.0));
        self.append_with_defaults(parent, circuit)
    }

    fn defaults(&self) -> NbrResult<(SupplyId, LoadTypeId, WireTypeId)> {
        let missing = |what: &str| {
            NbrError::Validation(format!("project '{}' has no default {}", self.name, what))
        };
        Ok((
            self.default_supply.ok_or_else(|| missing(SupplyId::KIND))?,
            self.default_load_type.ok_or_else(|| missing(LoadTypeId::KIND))?,
            self.default_wire_type.ok_or_else(|| missing(WireTypeId::KIND))?,
        ))
    }

    fn append_with_defaults(
        &mut self,
        parent: Option<CircuitId>,
        circuit: Circuit,
    ) -> NbrResult<CircuitId> {
        let end = self.siblings(parent)?.len();
        let id = self.insert_circuit(parent, end, circuit)?;
        if let Some(run) = self.default_conduit_run {
            self.assign_to_conduit_run(id, run, None)?;
        }
        Ok(id)
    }

    /// Set a circuit field, checking references against the catalogue and
    /// routing conduit run changes through the run membership lists.
    pub fn set_circuit_field(
        &mut self,
        id: CircuitId,
        name: &str,
        value: FieldValue,
    ) -> NbrResult<()> {
        match name {
            "supply" => {
                self.supply(SupplyId::from_uuid(reference(name, value.clone())?))?;
            }
            "load_type" => {
                self.load_type(LoadTypeId::from_uuid(reference(name, value.clone())?))?;
            }
            "wire_type" => {
                self.wire_type(WireTypeId::from_uuid(reference(name, value.clone())?))?;
            }
            "conduit_run" => {
                return match optional_reference(name, value)? {
                    Some(run) => self.assign_to_conduit_run(id, ConduitRunId::from_uuid(run), None),
                    None => self.unassign_from_conduit_run(id).map(|_| ()),
                };
            }
            _ => {}
        }
        self.circuit_mut(id)?.set_field(name, value)
    }

    // =========================================================================
    // Conduit runs
    // =========================================================================

    pub fn conduit_runs(&self) -> &[ConduitRun] {
        &self.conduit_runs
    }

    pub fn conduit_run(&self, id: ConduitRunId) -> NbrResult<&ConduitRun> {
        self.conduit_runs
            .iter()
            .find(|r| r.id == id)
            .ok_or(NbrError::UnknownReference {
                kind: ConduitRunId::KIND,
                id: id.uuid(),
            })
    }

    /// Add an empty conduit run. Circuits join it through
    /// [`Project::assign_to_conduit_run`].
    pub fn add_conduit_run(&mut self, run: ConduitRun) -> NbrResult<ConduitRunId> {
        if self.conduit_run(run.id).is_ok() {
            return Err(duplicate(ConduitRunId::KIND, run.id.uuid()));
        }
        if !run.circuits.is_empty() {
            return Err(NbrError::Validation(format!(
                "conduit run '{}' must be added empty",
                run.name
            )));
        }
        let id = run.id;
        self.conduit_runs.push(run);
        Ok(id)
    }

    /// Remove a conduit run, leaving its circuits unassigned.
    pub fn remove_conduit_run(&mut self, id: ConduitRunId) -> NbrResult<ConduitRun> {
        let index = position(&self.conduit_runs, |r| r.id == id, ConduitRunId::KIND, id.uuid())?;
        let mut run = self.conduit_runs.remove(index);
        for member in std::mem::take(&mut run.circuits) {
            if let Some(circuit) = self.find_circuit_mut(member) {
                circuit.conduit_run = None;
            }
        }
        if self.default_conduit_run == Some(id) {
            self.default_conduit_run = None;
        }
        Ok(run)
    }

    pub fn set_conduit_run_field(
        &mut self,
        id: ConduitRunId,
        name: &str,
        value: FieldValue,
    ) -> NbrResult<()> {
        let index = position(&self.conduit_runs, |r| r.id == id, ConduitRunId::KIND, id.uuid())?;
        self.conduit_runs[index].set_field(name, value)
    }

    /// Place a circuit in a conduit run at `position` (appended when `None`).
    ///
    /// A circuit already in another run is moved out of it first.
    pub fn assign_to_conduit_run(
        &mut self,
        circuit: CircuitId,
        run: ConduitRunId,
        position: Option<usize>,
    ) -> NbrResult<()> {
        self.circuit(circuit)?;
        let target = self.conduit_run(run)?;
        let mut len = target.circuits.len();
        if target.contains(circuit) {
            len -= 1;
        }
        let position = position.unwrap_or(len);
        check_position(position, len)?;

        self.unassign_from_conduit_run(circuit)?;
        let index = position_of_run(&self.conduit_runs, run)?;
        self.conduit_runs[index].circuits.insert(position, circuit);
        self.circuit_mut(circuit)?.conduit_run = Some(run);
        Ok(())
    }

    /// Take a circuit out of its conduit run, returning the run it left.
    pub fn unassign_from_conduit_run(
        &mut self,
        circuit: CircuitId,
    ) -> NbrResult<Option<ConduitRunId>> {
        let entry = self.circuit_mut(circuit)?;
        let Some(run) = entry.conduit_run.take() else {
            return Ok(None);
        };
        if let Some(r) = self.conduit_runs.iter_mut().find(|r| r.id == run) {
            r.circuits.retain(|member| *member != circuit);
        }
        Ok(Some(run))
    }

    /// Circuits in no conduit run, depth-first.
    pub fn unassigned_circuits(&self) -> Vec<&Circuit> {
        self.iter_circuits()
            .map(|(_, c)| c)
            .filter(|c| c.conduit_run.is_none())
            .collect()
    }

    /// Member circuits of a run, in installation order.
    pub fn conduit_run_circuits(&self, id: ConduitRunId) -> NbrResult<Vec<&Circuit>> {
        self.conduit_run(id)?
            .circuits
            .iter()
            .map(|member| self.circuit(*member))
            .collect()
    }

    // =========================================================================
    // Presentation support
    // =========================================================================

    /// Allowed values for a choice field.
    ///
    /// Materials and insulations are limited to those `tables` publishes an
    /// ampacity table for.
    pub fn choices(&self, source: ChoiceSource, tables: &ReferenceData) -> Vec<Choice> {
        fn choice(value: FieldValue, label: impl ToString) -> Choice {
            Choice {
                value,
                label: label.to_string(),
            }
        }

        match source {
            ChoiceSource::Supplies => self
                .supplies
                .iter()
                .map(|s| choice(FieldValue::Reference(s.id.uuid()), s))
                .collect(),
            ChoiceSource::LoadTypes => self
                .load_types
                .iter()
                .map(|l| choice(FieldValue::Reference(l.id.uuid()), &l.name))
                .collect(),
            ChoiceSource::WireTypes => self
                .wire_types
                .iter()
                .map(|w| choice(FieldValue::Reference(w.id.uuid()), w))
                .collect(),
            ChoiceSource::ConduitRuns => self
                .conduit_runs
                .iter()
                .map(|r| choice(FieldValue::Reference(r.id.uuid()), &r.name))
                .collect(),
            ChoiceSource::ReferenceMethods => ReferenceMethod::ALL
                .iter()
                .map(|m| choice(FieldValue::Choice(m.as_str().into()), m))
                .collect(),
            ChoiceSource::Materials => tables
                .wire_materials()
                .iter()
                .map(|m| choice(FieldValue::Choice(m.as_str().into()), m))
                .collect(),
            ChoiceSource::Insulations => tables
                .wire_insulations()
                .iter()
                .map(|i| choice(FieldValue::Choice(i.as_str().into()), i))
                .collect(),
            ChoiceSource::ConduitTypes => ConduitType::ALL
                .iter()
                .map(|t| choice(FieldValue::Choice(t.as_str().into()), t))
                .collect(),
        }
    }

    /// Report structural issues that do not prevent sizing.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        if self.supplies.is_empty() {
            diag.add_warning("catalogue", "Project has no supplies");
        }
        if self.load_types.is_empty() {
            diag.add_warning("catalogue", "Project has no load types");
        }
        if self.wire_types.is_empty() {
            diag.add_warning("catalogue", "Project has no wire types");
        }
        if self.circuits.is_empty() {
            diag.add_warning("structure", "Project has no circuits");
        }

        for (_, circuit) in self.iter_circuits() {
            if circuit.is_upstream() && circuit.children().is_empty() {
                diag.add_warning_with_entity(
                    "structure",
                    "Upstream circuit feeds no circuits",
                    &circuit.name,
                );
            }
            if circuit.conduit_run.is_none() {
                diag.add_warning_with_entity(
                    "installation",
                    "Circuit is not in any conduit run; standalone conditions apply",
                    &circuit.name,
                );
            }
            if circuit.length.value() == 0.0 {
                diag.add_warning_with_entity("installation", "Circuit length is zero", &circuit.name);
            }
        }

        for run in &self.conduit_runs {
            if run.circuits.is_empty() {
                diag.add_warning_with_entity("installation", "Conduit run holds no circuits", &run.name);
            }
        }
    }
}

pub static PROJECT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("name", "Name", FieldFormat::Text),
    FieldDescriptor::new("default_supply", "Default supply", FieldFormat::Choice)
        .choices(ChoiceSource::Supplies),
    FieldDescriptor::new("default_load_type", "Default load type", FieldFormat::Choice)
        .choices(ChoiceSource::LoadTypes),
    FieldDescriptor::new("default_wire_type", "Default wire type", FieldFormat::Choice)
        .choices(ChoiceSource::WireTypes),
    FieldDescriptor::new("default_conduit_run", "Default conduit run", FieldFormat::Choice)
        .choices(ChoiceSource::ConduitRuns),
];

impl FieldAccess for Project {
    fn fields(&self) -> &'static [FieldDescriptor] {
        PROJECT_FIELDS
    }

    fn field(&self, name: &str) -> NbrResult<FieldValue> {
        let optional = |id: Option<uuid::Uuid>| id.map(FieldValue::Reference).unwrap_or(FieldValue::Empty);
        Ok(match name {
            "name" => FieldValue::Text(self.name.clone()),
            "default_supply" => optional(self.default_supply.map(|id| id.uuid())),
            "default_load_type" => optional(self.default_load_type.map(|id| id.uuid())),
            "default_wire_type" => optional(self.default_wire_type.map(|id| id.uuid())),
            "default_conduit_run" => optional(self.default_conduit_run.map(|id| id.uuid())),
            _ => {
                return Err(NbrError::Validation(format!("project has no field '{}'", name)))
            }
        })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> NbrResult<()> {
        match name {
            "name" => match value {
                FieldValue::Text(text) if !text.trim().is_empty() => self.name = text,
                other => {
                    return Err(NbrError::Validation(format!(
                        "project name must be non-empty text, got {:?}",
                        other
                    )))
                }
            },
            "default_supply" => {
                let id = optional_reference(name, value)?.map(SupplyId::from_uuid);
                self.set_default_supply(id)?
            }
            "default_load_type" => {
                let id = optional_reference(name, value)?.map(LoadTypeId::from_uuid);
                self.set_default_load_type(id)?
            }
            "default_wire_type" => {
                let id = optional_reference(name, value)?.map(WireTypeId::from_uuid);
                self.set_default_wire_type(id)?
            }
            "default_conduit_run" => {
                let id = optional_reference(name, value)?.map(ConduitRunId::from_uuid);
                self.set_default_conduit_run(id)?
            }
            _ => return Err(NbrError::Validation(format!("project has no field '{}'", name))),
        }
        Ok(())
    }
}

fn duplicate(kind: &str, id: uuid::Uuid) -> NbrError {
    NbrError::Validation(format!("{} {} is already in the project", kind, id))
}

fn in_use(kind: &str, entity: &str, user: &str) -> NbrError {
    NbrError::Validation(format!(
        "{} '{}' is still used by circuit '{}'",
        kind, entity, user
    ))
}

fn position<T>(
    items: &[T],
    pred: impl Fn(&T) -> bool,
    kind: &'static str,
    id: uuid::Uuid,
) -> NbrResult<usize> {
    items
        .iter()
        .position(pred)
        .ok_or(NbrError::UnknownReference { kind, id })
}

fn position_of(circuits: &[Circuit], id: CircuitId) -> NbrResult<usize> {
    position(circuits, |c| c.id == id, CircuitId::KIND, id.uuid())
}

fn position_of_run(runs: &[ConduitRun], id: ConduitRunId) -> NbrResult<usize> {
    position(runs, |r| r.id == id, ConduitRunId::KIND, id.uuid())
}

fn check_position(position: usize, len: usize) -> NbrResult<()> {
    if position > len {
        return Err(NbrError::Validation(format!(
            "position {} is past the end of a list of {}",
            position, len
        )));
    }
    Ok(())
}

fn clear_conduit_runs(circuit: &mut Circuit) {
    circuit.conduit_run = None;
    if let Some(children) = circuit.children_mut() {
        children.iter_mut().for_each(clear_conduit_runs);
    }
}
