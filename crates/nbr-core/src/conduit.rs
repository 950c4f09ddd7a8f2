//! Conduits and conduit runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tables::ReferenceMethod;
use crate::units::{Celsius, Meters, Millimeters, SquareMillimeters};
use crate::{CircuitId, ConduitRunId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConduitType {
    Rigid,
    Flexible,
}

impl ConduitType {
    pub const ALL: [ConduitType; 2] = [ConduitType::Rigid, ConduitType::Flexible];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConduitType::Rigid => "rigid",
            ConduitType::Flexible => "flexible",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "rigid" => Some(ConduitType::Rigid),
            "flexible" | "corrugated" => Some(ConduitType::Flexible),
            _ => None,
        }
    }
}

impl fmt::Display for ConduitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalogued conduit size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conduit {
    pub conduit_type: ConduitType,
    /// Trade size as printed in the catalogue (`1 1/4"`, `25`)
    pub nominal_diameter: String,
    pub external_diameter: Millimeters,
    pub internal_diameter: Millimeters,
    pub brand: String,
    pub model: String,
}

impl Conduit {
    /// Usable cross section, from the internal diameter.
    pub fn section(&self) -> SquareMillimeters {
        self.internal_diameter.circle_area()
    }
}

impl fmt::Display for Conduit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.conduit_type, self.nominal_diameter)
    }
}

/// A raceway grouping circuits under common installation conditions.
///
/// The run fixes the reference method and ambient temperature of every
/// circuit it holds, and the number of circuits drives the grouping
/// correction. Membership is edited through [`crate::Project`], which keeps
/// each circuit's back-reference in sync with this list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConduitRun {
    pub id: ConduitRunId,
    pub name: String,
    pub length: Meters,
    pub reference_method: ReferenceMethod,
    pub temperature: Celsius,
    /// Conduit family; the configured default applies when unset
    pub conduit_type: Option<ConduitType>,
    pub(crate) circuits: Vec<CircuitId>,
}

impl ConduitRun {
    pub fn new(name: impl Into<String>, reference_method: ReferenceMethod, temperature: Celsius) -> Self {
        Self {
            id: ConduitRunId::new(),
            name: name.into(),
            length: Meters(0.0),
            reference_method,
            temperature,
            conduit_type: None,
            circuits: Vec::new(),
        }
    }

    pub fn with_conduit_type(mut self, conduit_type: ConduitType) -> Self {
        self.conduit_type = Some(conduit_type);
        self
    }

    pub fn with_length(mut self, length: Meters) -> Self {
        self.length = length;
        self
    }

    /// Member circuits, in installation order.
    pub fn circuits(&self) -> &[CircuitId] {
        &self.circuits
    }

    /// Number of grouped circuits.
    pub fn grouping(&self) -> u32 {
        self.circuits.len() as u32
    }

    pub fn contains(&self, circuit: CircuitId) -> bool {
        self.circuits.contains(&circuit)
    }
}

impl fmt::Display for ConduitRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
