use anyhow::Result;
use nbr_algo::{size_project, ProjectReport, SizingContext};
use nbr_cli::{CalculatorConfig, OutputFormat};
use nbr_core::ReferenceData;
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;
use tracing::info;

use crate::commands::util::{load_project, print_diagnostics, print_json};

pub fn handle(
    path: &Path,
    format: OutputFormat,
    config: &CalculatorConfig,
    tables: &ReferenceData,
) -> Result<()> {
    let project = load_project(path)?;
    info!("Sizing {} circuits of '{}'", project.circuit_count(), project.name);

    let ctx = SizingContext::new(&project, tables, &config.sizing);
    let report = size_project(&ctx)?;

    match format {
        OutputFormat::Plain => print_table(&report, config.display.decimals),
        OutputFormat::Json => print_json(&report),
    }
}

fn print_table(report: &ProjectReport, decimals: usize) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "CIRCUIT\tPOWER\tCURRENT\tBREAKER\tWIRE\tGOVERNED BY\tVOLTAGE DROP"
    )?;
    for entry in &report.circuits {
        let name = format!("{}{}", "  ".repeat(entry.depth), entry.name);
        match &entry.sizing {
            Some(sizing) => writeln!(
                writer,
                "{}\t{:.*}\t{:.*}\t{}\t{:.1}\t{}\t{:.*}%",
                name,
                decimals,
                sizing.power,
                decimals,
                sizing.current,
                sizing.breaker,
                sizing.wire.section,
                sizing.governing,
                decimals,
                sizing.voltage_drop * 100.0
            )?,
            None => writeln!(writer, "{}\t-\t-\t-\t-\t-\t-", name)?,
        }
    }
    writer.flush()?;

    println!();
    println!(
        "Installed power: {:.*}  Demanded power: {:.*}",
        decimals, report.installed_power, decimals, report.demanded_power
    );
    print_diagnostics(&report.diagnostics);
    Ok(())
}
