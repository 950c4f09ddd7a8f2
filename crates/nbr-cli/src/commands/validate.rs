use anyhow::Result;
use nbr_core::Diagnostics;
use std::path::Path;

use crate::commands::util::{load_project, print_diagnostics};

pub fn handle(path: &Path) -> Result<()> {
    let project = load_project(path)?;
    let mut diag = Diagnostics::new();
    project.validate_into(&mut diag);

    if diag.has_issues() {
        println!("Project '{}':", project.name);
        print_diagnostics(&diag);
    } else {
        println!(
            "Project '{}' has no issues ({} circuits, {} conduit runs)",
            project.name,
            project.circuit_count(),
            project.conduit_runs().len()
        );
    }
    Ok(())
}
