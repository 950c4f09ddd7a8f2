//! Catalogue entities shared by many circuits: supplies, load types and wire types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::{SquareMillimeters, Volts};
use crate::{LoadTypeId, SupplyId, WireTypeId};

/// Voltage and conductor arrangement feeding a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub id: SupplyId,
    pub voltage: Volts,
    pub phases: u8,
    pub has_neutral: bool,
    pub has_ground: bool,
}

impl Supply {
    /// Single-phase-with-neutral supply with a protective earth, the most common case.
    pub fn new(voltage: Volts, phases: u8) -> Self {
        Self {
            id: SupplyId::new(),
            voltage,
            phases,
            has_neutral: true,
            has_ground: true,
        }
    }

    pub fn with_neutral(mut self, has_neutral: bool) -> Self {
        self.has_neutral = has_neutral;
        self
    }

    pub fn with_ground(mut self, has_ground: bool) -> Self {
        self.has_ground = has_ground;
        self
    }

    /// Divisor applied to `P / V` when computing a design current.
    pub fn phase_factor(&self) -> f64 {
        if self.phases == 3 {
            3f64.sqrt()
        } else {
            1.0
        }
    }

    /// Phases plus neutral, as counted for the conduit fill cutoffs.
    pub fn current_carrying_conductors(&self) -> usize {
        self.phases as usize + usize::from(self.has_neutral)
    }

    /// Loaded conductor column used in the ampacity tables.
    ///
    /// The tables only publish 2 and 3 loaded conductors, so the count is
    /// clamped into that range.
    pub fn loaded_wire_count(&self) -> usize {
        self.current_carrying_conductors().clamp(2, 3)
    }

    /// Every physical conductor, including the protective earth.
    pub fn wire_count(&self) -> usize {
        self.current_carrying_conductors() + usize::from(self.has_ground)
    }
}

impl fmt::Display for Supply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} V {}P", self.voltage.value(), self.phases)?;
        if self.has_neutral {
            write!(f, "+N")?;
        }
        if self.has_ground {
            write!(f, "+PE")?;
        }
        Ok(())
    }
}

/// Kind of load, fixing the regulatory minimum section and the demand factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadType {
    pub id: LoadTypeId,
    pub name: String,
    pub minimum_wire_section: SquareMillimeters,
    /// Fraction of installed power assumed simultaneously active upstream (0..=1)
    pub demand_factor: f64,
}

impl LoadType {
    pub fn new(name: impl Into<String>, minimum_wire_section: SquareMillimeters, demand_factor: f64) -> Self {
        Self {
            id: LoadTypeId::new(),
            name: name.into(),
            minimum_wire_section,
            demand_factor,
        }
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireMaterial {
    Copper,
    Aluminium,
}

impl WireMaterial {
    pub const ALL: [WireMaterial; 2] = [WireMaterial::Copper, WireMaterial::Aluminium];

    pub fn as_str(&self) -> &'static str {
        match self {
            WireMaterial::Copper => "copper",
            WireMaterial::Aluminium => "aluminium",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "copper" | "cu" => Some(WireMaterial::Copper),
            "aluminium" | "aluminum" | "al" => Some(WireMaterial::Aluminium),
            _ => None,
        }
    }
}

impl fmt::Display for WireMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireInsulation {
    Pvc,
    Epr,
    Xlpe,
}

impl WireInsulation {
    pub const ALL: [WireInsulation; 3] =
        [WireInsulation::Pvc, WireInsulation::Epr, WireInsulation::Xlpe];

    pub fn as_str(&self) -> &'static str {
        match self {
            WireInsulation::Pvc => "pvc",
            WireInsulation::Epr => "epr",
            WireInsulation::Xlpe => "xlpe",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pvc" => Some(WireInsulation::Pvc),
            "epr" => Some(WireInsulation::Epr),
            "xlpe" => Some(WireInsulation::Xlpe),
            _ => None,
        }
    }
}

impl fmt::Display for WireInsulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Material and insulation pair selecting one ampacity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireType {
    pub id: WireTypeId,
    pub material: WireMaterial,
    pub insulation: WireInsulation,
}

impl WireType {
    pub fn new(material: WireMaterial, insulation: WireInsulation) -> Self {
        Self {
            id: WireTypeId::new(),
            material,
            insulation,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.material, self.insulation)
    }
}
