//! Wire and breaker selection for a single circuit.
//!
//! ## Algorithm
//!
//! 1. Design current `I = P / (V × phase factor)`.
//! 2. Breaker: smallest rating of the configured curve with `In ≥ I`.
//! 3. Enumerate the wires of the circuit's wire type for its reference method
//!    and loaded-conductor count, each ampacity scaled by
//!    `f = temperature factor × grouping factor`.
//! 4. One candidate per [`WireCriterion`], each the smallest section that:
//!    - meets the load type's minimum section
//!    - carries `I`
//!    - keeps the voltage drop within the limit
//!    - carries the breaker's rated current
//! 5. The selected wire is the candidate with the largest section, so it
//!    satisfies all four at once.
//!
//! The breaker never depends on the wire; the breaker criterion makes the
//! wire depend on the breaker.
//!
//! ## Voltage Drop
//!
//! ```text
//! ΔV/V = I × (ρ / S) × 2L / V
//! ```
//!
//! The factor 2 counts the outgoing and return conductors.

use serde::Serialize;
use tracing::debug;

use nbr_core::{
    Amperes, Breaker, BreakerCurve, Celsius, Circuit, CircuitId, ConduitRunId, Meters, NbrResult,
    Project, ReferenceData, ReferenceMethod, SelectionFailure, SizingSettings, SquareMillimeters,
    Volts, Watts, Wire, WireCriterion, WireInsulation,
};

/// Everything a sizing computation reads.
#[derive(Debug, Clone, Copy)]
pub struct SizingContext<'a> {
    pub project: &'a Project,
    pub tables: &'a ReferenceData,
    pub settings: &'a SizingSettings,
}

impl<'a> SizingContext<'a> {
    pub fn new(
        project: &'a Project,
        tables: &'a ReferenceData,
        settings: &'a SizingSettings,
    ) -> Self {
        Self {
            project,
            tables,
            settings,
        }
    }

    /// Installation conditions of a circuit.
    ///
    /// The loaded-conductor count comes from the circuit's supply. The
    /// reference method, ambient temperature and grouping come from its
    /// conduit run, or from the standalone settings when it has none.
    pub fn conditions(&self, circuit: &Circuit) -> NbrResult<InstallationConditions> {
        let supply = self.project.supply(circuit.supply)?;
        let loaded_wire_count = supply.loaded_wire_count();

        let conditions = match circuit.conduit_run() {
            Some(run_id) => {
                let run = self.project.conduit_run(run_id)?;
                InstallationConditions {
                    reference_method: run.reference_method,
                    temperature: run.temperature,
                    grouping: run.grouping().max(1),
                    loaded_wire_count,
                    conduit_run: Some(run_id),
                }
            }
            None => {
                let standalone = &self.settings.standalone;
                InstallationConditions {
                    reference_method: standalone.reference_method,
                    temperature: standalone.temperature,
                    grouping: standalone.grouping,
                    loaded_wire_count,
                    conduit_run: None,
                }
            }
        };
        Ok(conditions)
    }
}

/// Conditions under which a circuit's conductors are installed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallationConditions {
    pub reference_method: ReferenceMethod,
    pub temperature: Celsius,
    /// Circuits sharing the raceway
    pub grouping: u32,
    pub loaded_wire_count: usize,
    pub conduit_run: Option<ConduitRunId>,
}

/// Ampacity correction for temperature and grouping.
pub fn correction_factor(
    tables: &ReferenceData,
    insulation: WireInsulation,
    temperature: Celsius,
    grouping: u32,
) -> NbrResult<f64> {
    let temperature_factor = tables.temperature_factor(insulation, temperature)?;
    let grouping_factor = tables.grouping_factor(grouping)?;
    Ok(temperature_factor * grouping_factor)
}

/// Smallest rating of `curve` that is at least `current`.
pub fn select_breaker(
    tables: &ReferenceData,
    curve: BreakerCurve,
    current: Amperes,
) -> NbrResult<Breaker> {
    let rating = tables
        .breakers(curve)?
        .iter()
        .copied()
        .find(|rating| *rating >= current)
        .ok_or(SelectionFailure::NoSuitableBreaker { curve, current })?;
    Ok(Breaker::new(rating, curve))
}

/// Relative voltage drop (fraction of `voltage`) along a circuit.
pub fn voltage_drop(wire: &Wire, current: Amperes, length: Meters, voltage: Volts) -> f64 {
    let resistance = wire.resistance_per_meter() * 2.0 * length.value();
    current.value() * resistance / voltage.value()
}

/// The smallest wire satisfying each criterion on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireCandidates {
    pub minimum_section: Wire,
    pub current_capacity: Wire,
    pub voltage_drop: Wire,
    pub breaker: Wire,
}

impl WireCandidates {
    pub fn get(&self, criterion: WireCriterion) -> &Wire {
        match criterion {
            WireCriterion::MinimumSection => &self.minimum_section,
            WireCriterion::CurrentCapacity => &self.current_capacity,
            WireCriterion::VoltageDrop => &self.voltage_drop,
            WireCriterion::Breaker => &self.breaker,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (WireCriterion, &Wire)> {
        WireCriterion::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// The largest candidate and the first criterion that demands it.
    pub fn governing(&self) -> (WireCriterion, &Wire) {
        let mut best = (WireCriterion::MinimumSection, &self.minimum_section);
        for (criterion, wire) in self.iter() {
            if wire.section > best.1.section {
                best = (criterion, wire);
            }
        }
        best
    }
}

/// Pick the per-criterion candidates from `wires`, which must be ascending
/// by section.
pub fn select_wire(
    wires: &[Wire],
    minimum_section: SquareMillimeters,
    current: Amperes,
    breaker: &Breaker,
    length: Meters,
    voltage: Volts,
    voltage_drop_limit: f64,
) -> NbrResult<WireCandidates> {
    let smallest = |criterion: WireCriterion, ok: &dyn Fn(&Wire) -> bool| {
        wires
            .iter()
            .find(|&w| ok(w))
            .cloned()
            .ok_or(SelectionFailure::NoSuitableWire { criterion })
    };

    Ok(WireCandidates {
        minimum_section: smallest(WireCriterion::MinimumSection, &|w: &Wire| {
            w.section >= minimum_section
        })?,
        current_capacity: smallest(WireCriterion::CurrentCapacity, &|w: &Wire| {
            w.capacity() >= current
        })?,
        voltage_drop: smallest(WireCriterion::VoltageDrop, &|w: &Wire| {
            voltage_drop(w, current, length, voltage) <= voltage_drop_limit
        })?,
        breaker: smallest(WireCriterion::Breaker, &|w: &Wire| w.capacity() >= breaker.current)?,
    })
}

/// Full sizing result for one circuit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSizing {
    pub circuit: CircuitId,
    pub name: String,
    pub power: Watts,
    pub current: Amperes,
    pub conditions: InstallationConditions,
    pub correction_factor: f64,
    pub breaker: Breaker,
    pub candidates: WireCandidates,
    /// Criterion that fixed the selected section
    pub governing: WireCriterion,
    pub wire: Wire,
    /// Fraction of the supply voltage
    pub voltage_drop: f64,
}

/// Select the breaker and wire of a circuit.
///
/// Upstream circuits are sized on their aggregated power, like terminal ones.
pub fn size_circuit(ctx: &SizingContext<'_>, circuit: &Circuit) -> NbrResult<CircuitSizing> {
    let project = ctx.project;
    let supply = project.supply(circuit.supply)?;
    let load_type = project.load_type(circuit.load_type)?;
    let wire_type = project.wire_type(circuit.wire_type)?;

    let power = circuit.power(project)?;
    let current = circuit.current(project)?;
    let conditions = ctx.conditions(circuit)?;
    let factor = correction_factor(
        ctx.tables,
        wire_type.insulation,
        conditions.temperature,
        conditions.grouping,
    )?;

    let breaker = select_breaker(ctx.tables, ctx.settings.breaker_curve, current)?;

    let wires = ctx
        .tables
        .wire_table(wire_type.material, wire_type.insulation)?
        .wires(
            wire_type,
            conditions.reference_method,
            conditions.loaded_wire_count,
            factor,
        )?;
    let candidates = select_wire(
        &wires,
        load_type.minimum_wire_section,
        current,
        &breaker,
        circuit.length,
        supply.voltage,
        ctx.settings.voltage_drop_limit,
    )?;

    let (governing, wire) = candidates.governing();
    let wire = wire.clone();
    let drop = voltage_drop(&wire, current, circuit.length, supply.voltage);

    debug!(
        "Sized '{}': I={:.2}, f={:.3}, breaker {}, {:.1} set by {}, ΔV={:.2}%",
        circuit.name,
        current,
        factor,
        breaker,
        wire.section,
        governing,
        drop * 100.0
    );

    Ok(CircuitSizing {
        circuit: circuit.id,
        name: circuit.name.clone(),
        power,
        current,
        conditions,
        correction_factor: factor,
        breaker,
        candidates,
        governing,
        wire,
        voltage_drop: drop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbr_core::{
        ConduitRun, FieldValue, LoadType, NbrError, Supply, WireMaterial, WireType,
    };

    struct Setup {
        project: Project,
        tables: ReferenceData,
        settings: SizingSettings,
    }

    impl Setup {
        fn new() -> Self {
            let mut project = Project::new("Test");
            project.add_supply(Supply::new(Volts(100.0), 1)).unwrap();
            project
                .add_load_type(LoadType::new("General", SquareMillimeters(2.5), 1.0))
                .unwrap();
            project
                .add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))
                .unwrap();
            Self {
                project,
                tables: ReferenceData::embedded(),
                settings: SizingSettings::default(),
            }
        }

        fn circuit(&mut self, power: f64, length: f64) -> CircuitId {
            let id = self
                .project
                .create_terminal_circuit(None, "Load", Watts(power))
                .unwrap();
            self.project
                .set_circuit_field(id, "length", FieldValue::Number(length))
                .unwrap();
            id
        }

        fn size(&self, id: CircuitId) -> NbrResult<CircuitSizing> {
            let ctx = SizingContext::new(&self.project, &self.tables, &self.settings);
            size_circuit(&ctx, self.project.circuit(id)?)
        }
    }

    #[test]
    fn test_reference_circuit() {
        let mut s = Setup::new();
        let id = s.circuit(5000.0, 10.0);
        let sizing = s.size(id).unwrap();

        assert_eq!(sizing.current, Amperes(50.0));
        assert_eq!(sizing.breaker, Breaker::new(Amperes(50.0), BreakerCurve::C));
        assert_eq!(sizing.wire.section, SquareMillimeters(10.0));
        assert_eq!(sizing.wire.uncorrected_capacity, Amperes(57.0));
        assert!((sizing.voltage_drop - 0.0172).abs() < 1e-9);
        assert_eq!(sizing.correction_factor, 1.0);
        assert_eq!(sizing.conditions.reference_method, ReferenceMethod::B1);
        assert_eq!(sizing.conditions.loaded_wire_count, 2);
    }

    #[test]
    fn test_candidates() {
        let mut s = Setup::new();
        let id = s.circuit(5000.0, 10.0);
        let sizing = s.size(id).unwrap();
        let c = &sizing.candidates;

        assert_eq!(c.minimum_section.section, SquareMillimeters(2.5));
        assert_eq!(c.current_capacity.section, SquareMillimeters(10.0));
        assert_eq!(c.voltage_drop.section, SquareMillimeters(6.0));
        assert_eq!(c.breaker.section, SquareMillimeters(10.0));
        assert_eq!(sizing.governing, WireCriterion::CurrentCapacity);
        for (_, candidate) in c.iter() {
            assert!(sizing.wire.section >= candidate.section);
        }
    }

    #[test]
    fn test_small_load_uses_minimum_section() {
        let mut s = Setup::new();
        let id = s.circuit(1000.0, 10.0);
        let sizing = s.size(id).unwrap();
        assert_eq!(sizing.wire.section, SquareMillimeters(2.5));
        assert_eq!(sizing.governing, WireCriterion::MinimumSection);
        assert_eq!(sizing.breaker.current, Amperes(10.0));
    }

    #[test]
    fn test_long_circuit_governed_by_voltage_drop() {
        let mut s = Setup::new();
        let id = s.circuit(5000.0, 25.0);
        let sizing = s.size(id).unwrap();
        assert_eq!(sizing.wire.section, SquareMillimeters(16.0));
        assert_eq!(sizing.governing, WireCriterion::VoltageDrop);
        assert!(sizing.voltage_drop <= 0.04);
    }

    #[test]
    fn test_breaker_drives_wire() {
        let mut s = Setup::new();
        let id = s.circuit(5500.0, 10.0);
        let sizing = s.size(id).unwrap();
        assert_eq!(sizing.breaker.current, Amperes(63.0));
        assert_eq!(sizing.wire.section, SquareMillimeters(16.0));
        assert!(sizing.wire.capacity() >= sizing.breaker.current);
    }

    #[test]
    fn test_hot_grouped_run() {
        let mut s = Setup::new();
        let run = s
            .project
            .add_conduit_run(ConduitRun::new("Run", ReferenceMethod::B1, Celsius(40.0)))
            .unwrap();
        let first = s.circuit(5000.0, 10.0);
        let second = s.circuit(5000.0, 10.0);
        s.project.assign_to_conduit_run(first, run, None).unwrap();
        s.project.assign_to_conduit_run(second, run, None).unwrap();

        let sizing = s.size(second).unwrap();
        assert_eq!(sizing.conditions.grouping, 2);
        assert!((sizing.correction_factor - 0.696).abs() < 1e-9);
        assert_eq!(sizing.wire.section, SquareMillimeters(16.0));
        assert_eq!(sizing.wire.uncorrected_capacity, Amperes(76.0));
        assert!((sizing.wire.capacity().value() - 52.896).abs() < 1e-9);
    }

    #[test]
    fn test_correction_factor() {
        let tables = ReferenceData::embedded();
        let f = |t| correction_factor(&tables, WireInsulation::Pvc, Celsius(t), 3);

        assert!((f(30.0).unwrap() - 0.70).abs() < 1e-9);
        assert!((f(55.0).unwrap() - 0.427).abs() < 1e-9);
        assert!((f(58.0).unwrap() - 0.3808).abs() < 1e-9);
        assert!((f(-10.0).unwrap() - 0.854).abs() < 1e-9);
        assert!(matches!(
            f(70.0),
            Err(NbrError::TemperatureOutOfRange { .. })
        ));
    }

    #[test]
    fn test_select_breaker() {
        let tables = ReferenceData::embedded();
        let pick = |i| select_breaker(&tables, BreakerCurve::C, Amperes(i)).unwrap().current;
        assert_eq!(pick(50.0), Amperes(50.0));
        assert_eq!(pick(50.1), Amperes(63.0));
        assert_eq!(pick(0.5), Amperes(1.0));

        let err = select_breaker(&tables, BreakerCurve::C, Amperes(200.0)).unwrap_err();
        assert_eq!(
            err.as_selection(),
            Some(&SelectionFailure::NoSuitableBreaker {
                curve: BreakerCurve::C,
                current: Amperes(200.0),
            })
        );
    }

    #[test]
    fn test_breaker_is_smallest_adequate_rating() {
        let tables = ReferenceData::embedded();
        let ratings = tables.breakers(BreakerCurve::C).unwrap();
        for step in 1..250 {
            let current = Amperes(step as f64 * 0.5);
            let breaker = select_breaker(&tables, BreakerCurve::C, current).unwrap();
            assert!(breaker.current >= current);
            assert!(ratings
                .iter()
                .filter(|r| **r >= current)
                .all(|r| *r >= breaker.current));
        }
    }

    #[test]
    fn test_wire_failure_names_criterion() {
        let mut s = Setup::new();
        // 100 A fits a breaker but no 2.5 mm²+ wire keeps 1 km under 4%
        let id = s.circuit(10_000.0, 1000.0);
        let err = s.size(id).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(
            err.as_selection(),
            Some(&SelectionFailure::NoSuitableWire {
                criterion: WireCriterion::VoltageDrop
            })
        );
    }

    #[test]
    fn test_section_is_monotonic_in_power() {
        let mut s = Setup::new();
        let id = s.circuit(100.0, 15.0);
        let mut previous = SquareMillimeters(0.0);
        for step in 1..=120 {
            let power = step as f64 * 100.0;
            s.project
                .set_circuit_field(id, "load_power", FieldValue::Number(power))
                .unwrap();
            let Ok(sizing) = s.size(id) else { break };
            assert!(
                sizing.wire.section >= previous,
                "section dropped at {} W",
                power
            );
            previous = sizing.wire.section;
        }
        assert!(previous > SquareMillimeters(2.5));
    }

    #[test]
    fn test_voltage_drop_formula() {
        let tables = ReferenceData::embedded();
        let wire_type = WireType::new(WireMaterial::Copper, WireInsulation::Pvc);
        let wires = tables
            .wire_table(WireMaterial::Copper, WireInsulation::Pvc)
            .unwrap()
            .wires(&wire_type, ReferenceMethod::B1, 2, 1.0)
            .unwrap();
        let ten = wires
            .iter()
            .find(|w| w.section == SquareMillimeters(10.0))
            .unwrap();
        let drop = voltage_drop(ten, Amperes(50.0), Meters(10.0), Volts(100.0));
        assert!((drop - 0.0172).abs() < 1e-9);
    }
}
