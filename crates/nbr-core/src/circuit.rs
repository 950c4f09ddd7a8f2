//! Terminal and upstream circuits.
//!
//! A [`Circuit`] holds the fields common to every circuit and a
//! [`CircuitKind`] saying whether it feeds a load directly or feeds other
//! circuits. Upstream circuits own their children, so the hierarchy is a
//! tree: a child cannot have two parents and cannot contain its ancestor.
//!
//! References to the supply, load type and wire type are catalogue IDs,
//! resolved against a [`Project`] by the operations that need them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{NbrError, NbrResult};
use crate::project::{ItemKind, Project};
use crate::units::{Amperes, Meters, Watts};
use crate::{CircuitId, ConduitRunId, LoadTypeId, SupplyId, WireTypeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CircuitKind {
    /// Feeds one load
    Terminal { load_power: Watts },
    /// Feeds downstream circuits, in order
    Upstream { circuits: Vec<Circuit> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: CircuitId,
    pub name: String,
    pub description: String,
    pub supply: SupplyId,
    pub load_type: LoadTypeId,
    pub wire_type: WireTypeId,
    pub length: Meters,
    pub(crate) conduit_run: Option<ConduitRunId>,
    pub(crate) kind: CircuitKind,
}

impl Circuit {
    fn with_kind(
        name: impl Into<String>,
        supply: SupplyId,
        load_type: LoadTypeId,
        wire_type: WireTypeId,
        length: Meters,
        kind: CircuitKind,
    ) -> Self {
        Self {
            id: CircuitId::new(),
            name: name.into(),
            description: String::new(),
            supply,
            load_type,
            wire_type,
            length,
            conduit_run: None,
            kind,
        }
    }

    pub fn terminal(
        name: impl Into<String>,
        supply: SupplyId,
        load_type: LoadTypeId,
        wire_type: WireTypeId,
        length: Meters,
        load_power: Watts,
    ) -> Self {
        Self::with_kind(
            name,
            supply,
            load_type,
            wire_type,
            length,
            CircuitKind::Terminal { load_power },
        )
    }

    /// An upstream circuit with no children yet.
    ///
    /// Children are added with [`Project::insert_circuit`] once the circuit
    /// is part of a project.
    pub fn upstream(
        name: impl Into<String>,
        supply: SupplyId,
        load_type: LoadTypeId,
        wire_type: WireTypeId,
        length: Meters,
    ) -> Self {
        Self::with_kind(
            name,
            supply,
            load_type,
            wire_type,
            length,
            CircuitKind::Upstream { circuits: Vec::new() },
        )
    }

    /// Replace the generated identifier, as done when loading a saved project.
    pub fn with_id(mut self, id: CircuitId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn kind(&self) -> &CircuitKind {
        &self.kind
    }

    pub fn item_kind(&self) -> ItemKind {
        match self.kind {
            CircuitKind::Terminal { .. } => ItemKind::TerminalCircuit,
            CircuitKind::Upstream { .. } => ItemKind::UpstreamCircuit,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, CircuitKind::Terminal { .. })
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self.kind, CircuitKind::Upstream { .. })
    }

    /// Stored load power of a terminal circuit.
    pub fn load_power(&self) -> Option<Watts> {
        match self.kind {
            CircuitKind::Terminal { load_power } => Some(load_power),
            CircuitKind::Upstream { .. } => None,
        }
    }

    /// Direct children; empty for a terminal circuit.
    pub fn children(&self) -> &[Circuit] {
        match &self.kind {
            CircuitKind::Terminal { .. } => &[],
            CircuitKind::Upstream { circuits } => circuits.as_slice(),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Circuit>> {
        match &mut self.kind {
            CircuitKind::Terminal { .. } => None,
            CircuitKind::Upstream { circuits } => Some(circuits),
        }
    }

    /// Conduit run holding this circuit, if any.
    pub fn conduit_run(&self) -> Option<ConduitRunId> {
        self.conduit_run
    }

    /// This circuit and all its descendants, depth-first, with their depth
    /// relative to this circuit.
    pub fn iter(&self) -> CircuitIter<'_> {
        CircuitIter {
            stack: vec![(0, self)],
        }
    }

    pub fn contains(&self, id: CircuitId) -> bool {
        self.iter().any(|(_, c)| c.id == id)
    }

    /// Demanded power.
    ///
    /// A terminal circuit reports its load power. An upstream circuit sums
    /// each child's power weighted by the child's load-type demand factor.
    pub fn power(&self, project: &Project) -> NbrResult<Watts> {
        match &self.kind {
            CircuitKind::Terminal { load_power } => Ok(*load_power),
            CircuitKind::Upstream { circuits } => {
                let mut total = Watts(0.0);
                for child in circuits {
                    let demand_factor = project.load_type(child.load_type)?.demand_factor;
                    total = total + child.power(project)? * demand_factor;
                }
                Ok(total)
            }
        }
    }

    /// Design current, `P / (V × phase factor)`.
    pub fn current(&self, project: &Project) -> NbrResult<Amperes> {
        self.current_for(project, self.power(project)?)
    }

    /// Current this circuit's supply draws to deliver `power`.
    pub fn current_for(&self, project: &Project, power: Watts) -> NbrResult<Amperes> {
        let supply = project.supply(self.supply)?;
        if !(supply.voltage.value() > 0.0) {
            return Err(NbrError::Validation(format!(
                "supply {} of circuit '{}' has no voltage",
                supply, self.name
            )));
        }
        Ok(power / (supply.voltage * supply.phase_factor()))
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Depth-first traversal over a circuit subtree.
pub struct CircuitIter<'a> {
    stack: Vec<(usize, &'a Circuit)>,
}

impl<'a> CircuitIter<'a> {
    pub(crate) fn over(roots: &'a [Circuit]) -> Self {
        Self {
            stack: roots.iter().rev().map(|c| (0, c)).collect(),
        }
    }
}

impl<'a> Iterator for CircuitIter<'a> {
    type Item = (usize, &'a Circuit);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, circuit) = self.stack.pop()?;
        self.stack
            .extend(circuit.children().iter().rev().map(|c| (depth + 1, c)));
        Some((depth, circuit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LoadType, Supply, WireInsulation, WireMaterial, WireType};
    use crate::units::{SquareMillimeters, Volts};

    struct Fixture {
        project: Project,
        supply: SupplyId,
        full: LoadTypeId,
        half: LoadTypeId,
        wire: WireTypeId,
    }

    fn fixture() -> Fixture {
        let mut project = Project::new("Test");
        let supply = project.add_supply(Supply::new(Volts(100.0), 1)).unwrap();
        let full = project
            .add_load_type(LoadType::new("General", SquareMillimeters(2.5), 1.0))
            .unwrap();
        let half = project
            .add_load_type(LoadType::new("Lighting", SquareMillimeters(1.5), 0.5))
            .unwrap();
        let wire = project
            .add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))
            .unwrap();
        Fixture {
            project,
            supply,
            full,
            half,
            wire,
        }
    }

    fn terminal(f: &Fixture, load_type: LoadTypeId, power: f64) -> Circuit {
        Circuit::terminal("load", f.supply, load_type, f.wire, Meters(10.0), Watts(power))
    }

    #[test]
    fn test_terminal_current() {
        let mut f = fixture();
        let id = f
            .project
            .insert_circuit(None, 0, terminal(&f, f.full, 5000.0))
            .unwrap();
        let circuit = f.project.circuit(id).unwrap();
        assert_eq!(circuit.power(&f.project).unwrap(), Watts(5000.0));
        assert_eq!(circuit.current(&f.project).unwrap(), Amperes(50.0));
    }

    #[test]
    fn test_three_phase_current() {
        let mut f = fixture();
        let three = f
            .project
            .add_supply(Supply::new(Volts(380.0), 3))
            .unwrap();
        let mut circuit = terminal(&f, f.full, 10_000.0);
        circuit.supply = three;
        let id = f.project.insert_circuit(None, 0, circuit).unwrap();

        let current = f.project.circuit(id).unwrap().current(&f.project).unwrap();
        assert!((current.value() - 15.193428).abs() < 1e-6);
    }

    #[test]
    fn test_upstream_power_flat() {
        let mut f = fixture();
        let up = Circuit::upstream("Panel", f.supply, f.full, f.wire, Meters(5.0));
        let up = f.project.insert_circuit(None, 0, up).unwrap();
        for _ in 0..3 {
            let child = terminal(&f, f.full, 5000.0);
            f.project.insert_circuit(Some(up), 0, child).unwrap();
        }
        let upstream = f.project.circuit(up).unwrap();
        assert_eq!(upstream.power(&f.project).unwrap(), Watts(15000.0));
        assert_eq!(upstream.children().len(), 3);
    }

    #[test]
    fn test_upstream_power_applies_demand_factor() {
        let mut f = fixture();
        let up = Circuit::upstream("Panel", f.supply, f.full, f.wire, Meters(5.0));
        let up = f.project.insert_circuit(None, 0, up).unwrap();
        let child = terminal(&f, f.half, 15000.0);
        f.project.insert_circuit(Some(up), 0, child).unwrap();

        let power = f.project.circuit(up).unwrap().power(&f.project).unwrap();
        assert_eq!(power, Watts(7500.0));
    }

    #[test]
    fn test_upstream_power_nested() {
        let mut f = fixture();
        let main = Circuit::upstream("Main", f.supply, f.full, f.wire, Meters(5.0));
        let main = f.project.insert_circuit(None, 0, main).unwrap();
        // sub-panel weighted by 0.5 at the main level
        let sub = Circuit::upstream("Sub", f.supply, f.half, f.wire, Meters(5.0));
        let sub = f.project.insert_circuit(Some(main), 0, sub).unwrap();
        f.project
            .insert_circuit(Some(sub), 0, terminal(&f, f.full, 2000.0))
            .unwrap();
        f.project
            .insert_circuit(Some(sub), 1, terminal(&f, f.half, 2000.0))
            .unwrap();
        f.project
            .insert_circuit(Some(main), 1, terminal(&f, f.full, 1000.0))
            .unwrap();

        let sub_power = f.project.circuit(sub).unwrap().power(&f.project).unwrap();
        assert_eq!(sub_power, Watts(3000.0));
        let main_power = f.project.circuit(main).unwrap().power(&f.project).unwrap();
        assert_eq!(main_power, Watts(3000.0 * 0.5 + 1000.0));
    }

    #[test]
    fn test_empty_upstream_has_no_power() {
        let mut f = fixture();
        let up = Circuit::upstream("Panel", f.supply, f.full, f.wire, Meters(5.0));
        let up = f.project.insert_circuit(None, 0, up).unwrap();
        assert_eq!(
            f.project.circuit(up).unwrap().power(&f.project).unwrap(),
            Watts(0.0)
        );
    }

    #[test]
    fn test_iter_depth_first() {
        let mut f = fixture();
        let a = Circuit::upstream("A", f.supply, f.full, f.wire, Meters(1.0));
        let a = f.project.insert_circuit(None, 0, a).unwrap();
        let mut b = terminal(&f, f.full, 1.0);
        b.name = "B".into();
        f.project.insert_circuit(Some(a), 0, b).unwrap();
        let mut c = terminal(&f, f.full, 1.0);
        c.name = "C".into();
        f.project.insert_circuit(None, 1, c).unwrap();

        let visited: Vec<_> = f
            .project
            .iter_circuits()
            .map(|(depth, c)| (depth, c.name.as_str()))
            .collect();
        assert_eq!(visited, vec![(0, "A"), (1, "B"), (0, "C")]);
    }
}
