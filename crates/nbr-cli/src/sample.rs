//! Sample project written by `nbr new`.

use nbr_core::{
    Celsius, Circuit, ConduitRun, LoadType, Meters, NbrResult, Project, ReferenceMethod,
    SquareMillimeters, Supply, Volts, Watts, WireInsulation, WireMaterial, WireType,
};

/// A small house: one panel feeding three circuits, plus a three-phase pump.
pub fn sample_project(name: &str) -> NbrResult<Project> {
    let mut project = Project::new(name);

    let mains = project.add_supply(Supply::new(Volts(220.0), 1))?;
    let three_phase = project.add_supply(Supply::new(Volts(380.0), 3))?;

    let lighting = project.add_load_type(LoadType::new("Lighting", SquareMillimeters(1.5), 1.0))?;
    let outlets = project.add_load_type(LoadType::new("Outlets", SquareMillimeters(2.5), 0.8))?;
    let heating = project.add_load_type(LoadType::new("Heating", SquareMillimeters(2.5), 1.0))?;
    let motors = project.add_load_type(LoadType::new("Motors", SquareMillimeters(2.5), 1.0))?;

    let pvc = project.add_wire_type(WireType::new(WireMaterial::Copper, WireInsulation::Pvc))?;

    let ground_floor = project.add_conduit_run(
        ConduitRun::new("Ground floor", ReferenceMethod::B1, Celsius(30.0))
            .with_length(Meters(20.0)),
    )?;
    let utility = project.add_conduit_run(
        ConduitRun::new("Utility room", ReferenceMethod::B1, Celsius(35.0))
            .with_length(Meters(25.0)),
    )?;
    project.set_default_conduit_run(Some(ground_floor))?;

    let panel = project.insert_circuit(
        None,
        0,
        Circuit::upstream("Panel", mains, outlets, pvc, Meters(6.0))
            .with_description("Main distribution board"),
    )?;
    let branches = [
        ("Lighting", lighting, 18.0, 800.0),
        ("Kitchen", outlets, 12.0, 3300.0),
        ("Shower", heating, 9.0, 5500.0),
    ];
    let mut members = vec![panel];
    for (position, (name, load_type, length, power)) in branches.into_iter().enumerate() {
        let circuit = Circuit::terminal(name, mains, load_type, pvc, Meters(length), Watts(power));
        members.push(project.insert_circuit(Some(panel), position, circuit)?);
    }
    for member in members {
        project.assign_to_conduit_run(member, ground_floor, None)?;
    }

    let pump = project.insert_circuit(
        None,
        1,
        Circuit::terminal("Pump", three_phase, motors, pvc, Meters(25.0), Watts(3700.0)),
    )?;
    project.assign_to_conduit_run(pump, utility, None)?;

    Ok(project)
}
