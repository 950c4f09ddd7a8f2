//! # nbr-io: Project Persistence
//!
//! Saves and loads [`nbr_core::Project`]s as human-diffable JSON documents.
//!
//! ## Design Philosophy
//!
//! **Identity preservation**: every supply, load type and wire type carries a
//! UUID. A supply used by many circuits is written with each of them and
//! still loads back as one catalogue entry. Two copies with the same UUID
//! but different content make the load fail with
//! [`nbr_core::NbrError::IdentityConflict`].
//!
//! **Scoped resolution**: identities are resolved through a
//! [`identity::LoadContext`] created for each load call. Nothing leaks from
//! one load into another, so loading the same file twice gives two
//! independent projects.
//!
//! **Versioned format**: documents carry a semver `format_version`; files
//! from a newer major version are refused with a parse error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nbr_io::{load_project, save_project};
//!
//! fn main() -> nbr_core::NbrResult<()> {
//!     let project = load_project("house.json")?;
//!     println!("{} circuits", project.circuit_count());
//!     save_project(&project, "house-copy.json")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`document`] - Serialized document layout
//! - [`identity`] - Per-load identity registries
//! - [`convert`] - Project/document conversion

use std::fs;
use std::path::Path;

use tracing::info;

use nbr_core::{NbrResult, Project};

pub mod convert;
pub mod document;
pub mod identity;

pub use convert::{from_document, to_document};
pub use document::{ProjectDocument, FORMAT_VERSION};
pub use identity::{Identified, LoadContext, Registry};

/// Serialize a project to pretty-printed JSON.
pub fn to_json_string(project: &Project) -> NbrResult<String> {
    Ok(serde_json::to_string_pretty(&to_document(project)?)?)
}

/// Parse a project from JSON text.
pub fn from_json_str(text: &str) -> NbrResult<Project> {
    let doc: ProjectDocument = serde_json::from_str(text)?;
    from_document(doc)
}

pub fn save_project(project: &Project, path: impl AsRef<Path>) -> NbrResult<()> {
    let path = path.as_ref();
    let json = to_json_string(project)?;
    fs::write(path, json)?;
    info!("Saved project '{}' to {}", project.name, path.display());
    Ok(())
}

pub fn load_project(path: impl AsRef<Path>) -> NbrResult<Project> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let project = from_json_str(&text)?;
    info!(
        "Loaded project '{}' from {} ({} circuits)",
        project.name,
        path.display(),
        project.circuit_count()
    );
    Ok(project)
}
