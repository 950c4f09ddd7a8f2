use anyhow::{bail, Context, Result};
use nbr_cli::sample::sample_project;
use std::path::Path;

pub fn handle(out: &Path, name: &str, force: bool) -> Result<()> {
    if out.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", out.display());
    }
    let project = sample_project(name)?;
    nbr_io::save_project(&project, out)
        .with_context(|| format!("writing project {}", out.display()))?;
    println!(
        "Wrote sample project '{}' to {} ({} circuits)",
        project.name,
        out.display(),
        project.circuit_count()
    );
    Ok(())
}
