//! Power demand aggregation through the circuit hierarchy.
//!
//! Each upstream circuit demands the sum of its children's power, each
//! weighted by the child's load-type demand factor:
//!
//! ```text
//! P(upstream) = Σ P(child) × demand_factor(child)
//! ```
//!
//! [`demand_breakdown`] walks the forest once, bottom-up, and records for
//! every circuit both the installed power (plain sum of the terminal loads
//! below it) and the demanded power used for sizing.

use serde::Serialize;

use nbr_core::{Amperes, Circuit, CircuitId, NbrResult, Project, Watts};

/// Demand figures for one circuit and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandNode {
    pub circuit: CircuitId,
    pub name: String,
    /// Sum of terminal load powers in the subtree
    pub installed_power: Watts,
    /// Power the circuit is sized for
    pub power: Watts,
    pub demand_factor: f64,
    /// What this circuit adds to its parent's power
    pub contribution: Watts,
    pub current: Amperes,
    pub children: Vec<DemandNode>,
}

impl DemandNode {
    fn build(project: &Project, circuit: &Circuit) -> NbrResult<Self> {
        let children = circuit
            .children()
            .iter()
            .map(|child| Self::build(project, child))
            .collect::<NbrResult<Vec<_>>>()?;

        let (installed_power, power) = match circuit.load_power() {
            Some(load_power) => (load_power, load_power),
            None => (
                children.iter().map(|c| c.installed_power).sum(),
                children.iter().map(|c| c.contribution).sum(),
            ),
        };

        let demand_factor = project.load_type(circuit.load_type)?.demand_factor;
        let current = circuit.current_for(project, power)?;

        Ok(Self {
            circuit: circuit.id,
            name: circuit.name.clone(),
            installed_power,
            power,
            demand_factor,
            contribution: power * demand_factor,
            current,
            children,
        })
    }

    /// This node and all nodes below it, depth-first.
    pub fn iter(&self) -> impl Iterator<Item = &DemandNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Demand tree for every top-level circuit of the project.
pub fn demand_breakdown(project: &Project) -> NbrResult<Vec<DemandNode>> {
    project
        .circuits()
        .iter()
        .map(|circuit| DemandNode::build(project, circuit))
        .collect()
}

/// Project-level totals, treating top-level circuits as fed by one main board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DemandTotals {
    pub installed_power: Watts,
    pub demanded_power: Watts,
}

impl DemandTotals {
    pub fn from_nodes(nodes: &[DemandNode]) -> Self {
        Self {
            installed_power: nodes.iter().map(|n| n.installed_power).sum(),
            demanded_power: nodes.iter().map(|n| n.contribution).sum(),
        }
    }

    /// Demanded over installed power; 1 for an empty project.
    pub fn diversity(&self) -> f64 {
        if self.installed_power.value() > 0.0 {
            self.demanded_power / self.installed_power
        } else {
            1.0
        }
    }
}

/// Installed and demanded power of the whole project.
///
/// Only powers are involved, so a supply without voltage does not prevent
/// the totals.
pub fn project_demand(project: &Project) -> NbrResult<DemandTotals> {
    let installed_power = project
        .iter_circuits()
        .filter_map(|(_, circuit)| circuit.load_power())
        .sum();
    let demanded_power = project
        .circuits()
        .iter()
        .map(|circuit| {
            let demand_factor = project.load_type(circuit.load_type)?.demand_factor;
            Ok(circuit.power(project)? * demand_factor)
        })
        .sum::<NbrResult<Watts>>()?;

    Ok(DemandTotals {
        installed_power,
        demanded_power,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbr_core::{
        LoadType, LoadTypeId, SquareMillimeters, Supply, Volts, WireInsulation, WireMaterial,
        WireType,
    };

    fn project() -> (Project, LoadTypeId, LoadTypeId) {
        let mut project = Project::new("Demand");
        project.add_supply(Supply::new(Volts(100.0), 1)).unwrap();
        let full = project
            .add_load_type(LoadType::new("General", SquareMillimeters(2.5), 1.0))
            .unwrap();
        let half = project
            .add_load_type(LoadType::new("Heating", SquareMillimeters(2.5), 0.5))
            .unwrap();
        project
            .add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))
            .unwrap();
        (project, full, half)
    }

    fn set_load_type(project: &mut Project, id: CircuitId, load_type: LoadTypeId) {
        project
            .set_circuit_field(
                id,
                "load_type",
                nbr_core::FieldValue::Reference(load_type.uuid()),
            )
            .unwrap();
    }

    #[test]
    fn test_flat_tree_matches_circuit_power() {
        let (mut p, _, half) = project();
        let panel = p.create_upstream_circuit(None, "Panel").unwrap();
        for i in 0..3 {
            let id = p
                .create_terminal_circuit(Some(panel), format!("Load {}", i), Watts(5000.0))
                .unwrap();
            if i == 0 {
                set_load_type(&mut p, id, half);
            }
        }

        let nodes = demand_breakdown(&p).unwrap();
        assert_eq!(nodes.len(), 1);
        let panel_node = &nodes[0];
        assert_eq!(panel_node.installed_power, Watts(15000.0));
        assert_eq!(panel_node.power, Watts(12500.0));
        assert_eq!(panel_node.power, p.circuit(panel).unwrap().power(&p).unwrap());
        assert_eq!(panel_node.current, Amperes(125.0));
    }

    #[test]
    fn test_nested_tree_matches_circuit_power() {
        let (mut p, _, half) = project();
        let main = p.create_upstream_circuit(None, "Main").unwrap();
        let sub = p.create_upstream_circuit(Some(main), "Sub").unwrap();
        set_load_type(&mut p, sub, half);
        p.create_terminal_circuit(Some(sub), "A", Watts(4000.0)).unwrap();
        let b = p.create_terminal_circuit(Some(sub), "B", Watts(2000.0)).unwrap();
        set_load_type(&mut p, b, half);
        p.create_terminal_circuit(Some(main), "C", Watts(1000.0)).unwrap();

        let nodes = demand_breakdown(&p).unwrap();
        for node in nodes.iter().flat_map(|n| n.iter()) {
            let expected = p.circuit(node.circuit).unwrap().power(&p).unwrap();
            assert!((node.power.value() - expected.value()).abs() < 1e-9);
        }

        let main_node = &nodes[0];
        // Sub: 4000 + 2000·0.5 = 5000, weighted 0.5 at Main
        assert_eq!(main_node.children[0].power, Watts(5000.0));
        assert_eq!(main_node.power, Watts(3500.0));
        assert_eq!(main_node.installed_power, Watts(7000.0));
        assert_eq!(main_node.iter().count(), 5);
    }

    #[test]
    fn test_project_totals() {
        let (mut p, _, half) = project();
        p.create_terminal_circuit(None, "A", Watts(3000.0)).unwrap();
        let b = p.create_terminal_circuit(None, "B", Watts(2000.0)).unwrap();
        set_load_type(&mut p, b, half);

        let totals = project_demand(&p).unwrap();
        assert_eq!(totals.installed_power, Watts(5000.0));
        assert_eq!(totals.demanded_power, Watts(4000.0));
        assert!((totals.diversity() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_empty_project() {
        let (p, _, _) = project();
        let totals = project_demand(&p).unwrap();
        assert_eq!(totals.installed_power, Watts(0.0));
        assert_eq!(totals.diversity(), 1.0);
    }

    #[test]
    fn test_zero_voltage_is_rejected() {
        let mut p = Project::new("Dead");
        p.add_supply(Supply::new(Volts(0.0), 1)).unwrap();
        p.add_load_type(LoadType::new("General", SquareMillimeters(2.5), 1.0))
            .unwrap();
        p.add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))
            .unwrap();
        p.create_terminal_circuit(None, "A", Watts(1000.0)).unwrap();

        let err = demand_breakdown(&p).unwrap_err();
        assert!(matches!(err, nbr_core::NbrError::Validation(_)));
        assert!(err.to_string().contains("has no voltage"));

        let totals = project_demand(&p).unwrap();
        assert_eq!(totals.demanded_power, Watts(1000.0));
    }
}
