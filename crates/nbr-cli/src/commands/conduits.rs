use anyhow::Result;
use nbr_algo::{conduit_fill, ConduitReport, SizingContext};
use nbr_cli::{CalculatorConfig, OutputFormat};
use nbr_core::{Diagnostics, ReferenceData};
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;
use tracing::warn;

use crate::commands::util::{load_project, print_diagnostics, print_json};

pub fn handle(
    path: &Path,
    format: OutputFormat,
    config: &CalculatorConfig,
    tables: &ReferenceData,
) -> Result<()> {
    let project = load_project(path)?;
    let ctx = SizingContext::new(&project, tables, &config.sizing);

    let mut diag = Diagnostics::new();
    let mut runs = Vec::with_capacity(project.conduit_runs().len());
    for run in project.conduit_runs() {
        let fill = match conduit_fill(&ctx, run.id) {
            Ok(fill) => Some(fill),
            Err(err) if !err.is_fatal() => {
                warn!("Could not fill '{}': {}", run.name, err);
                diag.add_failure(&run.name, &err);
                None
            }
            Err(err) => return Err(err.into()),
        };
        runs.push(ConduitReport {
            conduit_run: run.id,
            name: run.name.clone(),
            fill,
        });
    }

    match format {
        OutputFormat::Plain => {
            print_table(&runs, config.display.decimals)?;
            print_diagnostics(&diag);
            Ok(())
        }
        OutputFormat::Json => print_json(&runs),
    }
}

fn print_table(runs: &[ConduitReport], decimals: usize) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "RUN\tCIRCUITS\tCONDUCTORS\tFILLED\tCONDUIT\tFILL\tMAX FILL"
    )?;
    for run in runs {
        match &run.fill {
            Some(fill) => writeln!(
                writer,
                "{}\t{}\t{}\t{:.*}\t{}\t{:.*}%\t{:.0}%",
                run.name,
                fill.circuit_count,
                fill.conductor_count,
                decimals,
                fill.filled_section,
                fill.conduit,
                decimals,
                fill.fill_factor * 100.0,
                fill.max_fill_factor * 100.0
            )?,
            None => writeln!(writer, "{}\t-\t-\t-\t-\t-\t-", run.name)?,
        }
    }
    writer.flush()?;
    Ok(())
}
