use anyhow::{anyhow, Context, Result};
use nbr_core::{Diagnostics, Project};
use serde::Serialize;
use std::io;
use std::path::Path;

pub fn load_project(path: &Path) -> Result<Project> {
    nbr_io::load_project(path).with_context(|| format!("loading project {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer_pretty(io::stdout(), value)
        .map_err(|err| anyhow!("serializing output to JSON: {err}"))?;
    println!();
    Ok(())
}

pub fn print_diagnostics(diag: &Diagnostics) {
    if !diag.has_issues() {
        return;
    }
    println!();
    for issue in &diag.issues {
        println!("{issue}");
    }
    println!("{}", diag.summary());
}

/// Parse a value with an inherent `from_str`, listing the accepted names on failure.
pub fn parse_choice<T>(
    what: &str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
    accepted: &[&str],
) -> Result<T> {
    parse(value).ok_or_else(|| {
        anyhow!(
            "unknown {what} '{value}' (expected one of: {})",
            accepted.join(", ")
        )
    })
}
