use anyhow::Result;
use nbr_cli::{CalculatorConfig, TablesCommands};
use nbr_core::{
    BreakerCurve, ConduitType, ReferenceData, ReferenceMethod, WireInsulation, WireMaterial,
    WireType,
};
use std::io::{self, Write};
use tabwriter::TabWriter;

use crate::commands::util::parse_choice;

pub fn handle(
    command: &TablesCommands,
    config: &CalculatorConfig,
    tables: &ReferenceData,
) -> Result<()> {
    let decimals = config.display.decimals;
    let mut writer = TabWriter::new(io::stdout());

    match command {
        TablesCommands::Temperature { insulation } => {
            let insulation = parse_insulation(insulation)?;
            writeln!(writer, "TEMPERATURE\tFACTOR ({})", insulation)?;
            for point in tables.temperature_table(insulation)?.points() {
                writeln!(writer, "{:.0}\t{:.3}", point.temperature, point.value)?;
            }
        }
        TablesCommands::Grouping => {
            writeln!(writer, "CIRCUITS\tFACTOR")?;
            for (count, factor) in tables.grouping_table()?.entries() {
                writeln!(writer, "{}\t{:.2}", count, factor)?;
            }
        }
        TablesCommands::Breakers { curve } => {
            let curves = match curve {
                Some(curve) => vec![parse_choice(
                    "breaker curve",
                    curve,
                    BreakerCurve::from_str,
                    &BreakerCurve::ALL.map(|c| c.as_str()),
                )?],
                None => BreakerCurve::ALL.to_vec(),
            };
            writeln!(writer, "CURVE\tRATINGS (A)")?;
            for curve in curves {
                let ratings: Vec<String> = tables
                    .breakers(curve)?
                    .iter()
                    .map(|r| format!("{:.0}", r.value()))
                    .collect();
                writeln!(writer, "{}\t{}", curve, ratings.join(" "))?;
            }
        }
        TablesCommands::Conduits { conduit_type } => {
            let types = match conduit_type {
                Some(t) => vec![parse_choice(
                    "conduit type",
                    t,
                    ConduitType::from_str,
                    &ConduitType::ALL.map(|c| c.as_str()),
                )?],
                None => ConduitType::ALL.to_vec(),
            };
            writeln!(writer, "TYPE\tNOMINAL\tEXTERNAL\tINTERNAL\tSECTION")?;
            for conduit_type in types {
                for conduit in tables.conduits(conduit_type)? {
                    writeln!(
                        writer,
                        "{}\t{}\t{:.1}\t{:.1}\t{:.*}",
                        conduit.conduit_type,
                        conduit.nominal_diameter,
                        conduit.external_diameter,
                        conduit.internal_diameter,
                        decimals,
                        conduit.section()
                    )?;
                }
            }
        }
        TablesCommands::Wires {
            material,
            insulation,
            method,
            loaded,
        } => {
            let material = parse_choice(
                "material",
                material,
                WireMaterial::from_str,
                &WireMaterial::ALL.map(|m| m.as_str()),
            )?;
            let insulation = parse_insulation(insulation)?;
            let method = parse_choice(
                "reference method",
                method,
                ReferenceMethod::from_str,
                &ReferenceMethod::ALL.map(|m| m.as_str()),
            )?;

            let wire_type = WireType::new(material, insulation);
            let wires = tables
                .wire_table(material, insulation)?
                .wires(&wire_type, method, *loaded, 1.0)?;
            writeln!(
                writer,
                "SECTION\tCAPACITY ({} {}, {} loaded)\tEXTERNAL DIAMETER",
                wire_type, method, loaded
            )?;
            for wire in wires {
                writeln!(
                    writer,
                    "{:.1}\t{:.0}\t{:.1}",
                    wire.section, wire.uncorrected_capacity, wire.external_diameter
                )?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

fn parse_insulation(value: &str) -> Result<WireInsulation> {
    parse_choice(
        "insulation",
        value,
        WireInsulation::from_str,
        &WireInsulation::ALL.map(|i| i.as_str()),
    )
}
