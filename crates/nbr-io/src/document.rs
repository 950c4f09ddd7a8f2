//! On-disk project document.
//!
//! A saved project is a single pretty-printed JSON object:
//!
//! ```json
//! {
//!   "format_version": "1.0.0",
//!   "saved_at": "2026-03-02T14:07:11Z",
//!   "id": "…",
//!   "name": "House",
//!   "supplies": [ … ],
//!   "load_types": [ … ],
//!   "wire_types": [ … ],
//!   "defaults": { "supply": "…", "load_type": "…", "wire_type": "…", "conduit_run": null },
//!   "circuits": [ { "type": "upstream", "id": "…", "supply": { … }, "circuits": [ … ] } ],
//!   "conduit_runs": [ { "id": "…", "name": "Run 1", "circuits": ["…", "…"] } ]
//! }
//! ```
//!
//! Circuits embed the full payload of the supply, load type and wire type
//! they use, so a circuit copied out of one document still carries what it
//! needs. The catalogue lists are the authoritative order; embedded copies
//! are resolved back to one shared entry on load (see [`crate::identity`]).
//!
//! Conduit runs list member circuit IDs in installation order. The circuit's
//! own back-reference is not stored.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

use nbr_core::{
    Celsius, CircuitId, ConduitRunId, ConduitType, LoadType, LoadTypeId, Meters, NbrError,
    NbrResult, ProjectId, ReferenceMethod, Supply, SupplyId, Watts, WireType, WireTypeId,
};

/// Current document format version (semver)
pub const FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Format version for compatibility checks (e.g., "1.0.0")
    pub format_version: String,

    /// When the document was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,

    pub id: ProjectId,
    pub name: String,

    #[serde(default)]
    pub supplies: Vec<Supply>,
    #[serde(default)]
    pub load_types: Vec<LoadType>,
    #[serde(default)]
    pub wire_types: Vec<WireType>,

    #[serde(default)]
    pub defaults: DefaultsDocument,

    #[serde(default)]
    pub circuits: Vec<CircuitDocument>,
    #[serde(default)]
    pub conduit_runs: Vec<ConduitRunDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsDocument {
    #[serde(default)]
    pub supply: Option<SupplyId>,
    #[serde(default)]
    pub load_type: Option<LoadTypeId>,
    #[serde(default)]
    pub wire_type: Option<WireTypeId>,
    #[serde(default)]
    pub conduit_run: Option<ConduitRunId>,
}

/// Fields shared by both circuit variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitCommon {
    pub id: CircuitId,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub supply: Supply,
    pub load_type: LoadType,
    pub wire_type: WireType,
    #[serde(default)]
    pub length: Meters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CircuitDocument {
    Terminal {
        #[serde(flatten)]
        common: CircuitCommon,
        load_power: Watts,
    },
    Upstream {
        #[serde(flatten)]
        common: CircuitCommon,
        #[serde(default)]
        circuits: Vec<CircuitDocument>,
    },
}

impl CircuitDocument {
    pub fn common(&self) -> &CircuitCommon {
        match self {
            CircuitDocument::Terminal { common, .. } | CircuitDocument::Upstream { common, .. } => {
                common
            }
        }
    }

    pub fn children(&self) -> &[CircuitDocument] {
        match self {
            CircuitDocument::Terminal { .. } => &[],
            CircuitDocument::Upstream { circuits, .. } => circuits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConduitRunDocument {
    pub id: ConduitRunId,
    pub name: String,
    #[serde(default)]
    pub length: Meters,
    pub reference_method: ReferenceMethod,
    pub temperature: Celsius,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conduit_type: Option<ConduitType>,
    /// Member circuits, in installation order
    #[serde(default)]
    pub circuits: Vec<CircuitId>,
}

impl ProjectDocument {
    /// Check the document's format version against [`FORMAT_VERSION`].
    ///
    /// Documents from the same or an older major version are accepted.
    pub fn check_version(&self) -> NbrResult<()> {
        let version = Version::parse(&self.format_version).map_err(|e| {
            NbrError::Parse(format!(
                "invalid format version '{}': {}",
                self.format_version, e
            ))
        })?;
        let current = Version::parse(FORMAT_VERSION)
            .map_err(|e| NbrError::Parse(format!("invalid built-in format version: {}", e)))?;

        if version.major > current.major {
            return Err(NbrError::Parse(format!(
                "format v{} is too new (this version reads up to v{})",
                self.format_version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Total number of circuits in the document's forest.
    pub fn circuit_count(&self) -> usize {
        fn count(circuits: &[CircuitDocument]) -> usize {
            circuits.iter().map(|c| 1 + count(c.children())).sum()
        }
        count(&self.circuits)
    }
}
