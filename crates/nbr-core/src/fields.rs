//! Field descriptors for presentation binding.
//!
//! Each entity variant publishes a static table of [`FieldDescriptor`]s and
//! implements [`FieldAccess`] to read and write those fields as
//! [`FieldValue`]s. A presentation layer can build editors from the
//! descriptors alone: label, format hint, whether the field is editable, and
//! where its choices come from ([`ChoiceSource`], resolved by
//! [`crate::Project::choices`]).
//!
//! Setters validate before mutating. A rejected value returns
//! [`NbrError::Validation`] and leaves the entity unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::catalog::{LoadType, Supply, WireInsulation, WireMaterial, WireType};
use crate::circuit::{Circuit, CircuitKind};
use crate::conduit::{ConduitRun, ConduitType};
use crate::error::{NbrError, NbrResult};
use crate::tables::ReferenceMethod;
use crate::units::{Celsius, Meters, SquareMillimeters, Volts, Watts};
use crate::{LoadTypeId, SupplyId, WireTypeId};

/// Display hint for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldFormat {
    Text,
    Integer,
    Number { unit: &'static str, decimals: u8 },
    Flag,
    Choice,
}

/// Where the allowed values of a choice field come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChoiceSource {
    Supplies,
    LoadTypes,
    WireTypes,
    ConduitRuns,
    ReferenceMethods,
    Materials,
    Insulations,
    ConduitTypes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub format: FieldFormat,
    pub editable: bool,
    pub choices: Option<ChoiceSource>,
}

impl FieldDescriptor {
    pub(crate) const fn new(name: &'static str, label: &'static str, format: FieldFormat) -> Self {
        Self {
            name,
            label,
            format,
            editable: true,
            choices: None,
        }
    }

    pub(crate) const fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub(crate) const fn choices(mut self, source: ChoiceSource) -> Self {
        self.format = FieldFormat::Choice;
        self.choices = Some(source);
        self
    }
}

/// A field value crossing the presentation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Flag(bool),
    /// Identifier of a catalogue entry or conduit run
    Reference(Uuid),
    /// Key of a static enumeration
    Choice(String),
    /// Unset optional reference
    Empty,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) | FieldValue::Choice(text) => f.write_str(text),
            FieldValue::Integer(value) => write!(f, "{}", value),
            FieldValue::Number(value) => write!(f, "{}", value),
            FieldValue::Flag(value) => write!(f, "{}", value),
            FieldValue::Reference(id) => write!(f, "{}", id),
            FieldValue::Empty => Ok(()),
        }
    }
}

/// One entry offered by a choice field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub value: FieldValue,
    pub label: String,
}

/// Uniform field-level read/write access.
pub trait FieldAccess {
    fn fields(&self) -> &'static [FieldDescriptor];

    fn field(&self, name: &str) -> NbrResult<FieldValue>;

    /// Validate and store `value`, leaving the entity unchanged on error.
    fn set_field(&mut self, name: &str, value: FieldValue) -> NbrResult<()>;

    fn descriptor(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields().iter().find(|d| d.name == name)
    }
}

/// Check every editable field of `entity` against the rules of its setter.
///
/// For entities built without [`FieldAccess::set_field`], such as those read
/// from a project file. Fields the owning project edits (a circuit's conduit
/// run) are skipped.
pub fn validate_fields<T: FieldAccess + Clone>(entity: &T) -> NbrResult<()> {
    let mut scratch = entity.clone();
    for descriptor in entity.fields().iter().filter(|d| d.editable) {
        if descriptor.choices == Some(ChoiceSource::ConduitRuns) {
            continue;
        }
        scratch.set_field(descriptor.name, entity.field(descriptor.name)?)?;
    }
    Ok(())
}

// =============================================================================
// Value conversion helpers
// =============================================================================

fn unknown_field(entity: &str, name: &str) -> NbrError {
    NbrError::Validation(format!("{} has no field '{}'", entity, name))
}

fn read_only(entity: &str, name: &str) -> NbrError {
    NbrError::Validation(format!("{} field '{}' is read-only", entity, name))
}

fn wrong_kind(name: &str, expected: &str, value: &FieldValue) -> NbrError {
    NbrError::Validation(format!("field '{}' expects {}, got {:?}", name, expected, value))
}

fn text(name: &str, value: FieldValue) -> NbrResult<String> {
    match value {
        FieldValue::Text(text) => Ok(text),
        other => Err(wrong_kind(name, "text", &other)),
    }
}

fn name_text(name: &str, value: FieldValue) -> NbrResult<String> {
    let text = text(name, value)?;
    if text.trim().is_empty() {
        return Err(NbrError::Validation(format!("field '{}' cannot be empty", name)));
    }
    Ok(text)
}

fn number(name: &str, value: FieldValue) -> NbrResult<f64> {
    let number = match value {
        FieldValue::Number(number) => number,
        FieldValue::Integer(integer) => integer as f64,
        other => return Err(wrong_kind(name, "a number", &other)),
    };
    if !number.is_finite() {
        return Err(NbrError::Validation(format!("field '{}' must be finite", name)));
    }
    Ok(number)
}

fn non_negative(name: &str, value: FieldValue) -> NbrResult<f64> {
    let number = number(name, value)?;
    if number < 0.0 {
        return Err(NbrError::Validation(format!(
            "field '{}' cannot be negative, got {}",
            name, number
        )));
    }
    Ok(number)
}

fn positive(name: &str, value: FieldValue) -> NbrResult<f64> {
    let number = number(name, value)?;
    if number <= 0.0 {
        return Err(NbrError::Validation(format!(
            "field '{}' must be positive, got {}",
            name, number
        )));
    }
    Ok(number)
}

fn flag(name: &str, value: FieldValue) -> NbrResult<bool> {
    match value {
        FieldValue::Flag(flag) => Ok(flag),
        other => Err(wrong_kind(name, "a flag", &other)),
    }
}

pub(crate) fn reference(name: &str, value: FieldValue) -> NbrResult<Uuid> {
    match value {
        FieldValue::Reference(id) => Ok(id),
        other => Err(wrong_kind(name, "a reference", &other)),
    }
}

pub(crate) fn optional_reference(name: &str, value: FieldValue) -> NbrResult<Option<Uuid>> {
    match value {
        FieldValue::Reference(id) => Ok(Some(id)),
        FieldValue::Empty => Ok(None),
        other => Err(wrong_kind(name, "a reference", &other)),
    }
}

fn choice<T>(name: &str, value: FieldValue, parse: impl Fn(&str) -> Option<T>) -> NbrResult<T> {
    match value {
        FieldValue::Choice(key) | FieldValue::Text(key) => parse(&key).ok_or_else(|| {
            NbrError::Validation(format!("'{}' is not a valid choice for '{}'", key, name))
        }),
        other => Err(wrong_kind(name, "a choice", &other)),
    }
}

fn optional_id(id: Option<Uuid>) -> FieldValue {
    id.map(FieldValue::Reference).unwrap_or(FieldValue::Empty)
}

// =============================================================================
// Supply
// =============================================================================

pub static SUPPLY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("id", "Identifier", FieldFormat::Text).read_only(),
    FieldDescriptor::new("voltage", "Voltage", FieldFormat::Number { unit: "V", decimals: 0 }),
    FieldDescriptor::new("phases", "Phases", FieldFormat::Integer),
    FieldDescriptor::new("has_neutral", "Neutral", FieldFormat::Flag),
    FieldDescriptor::new("has_ground", "Ground", FieldFormat::Flag),
];

impl FieldAccess for Supply {
    fn fields(&self) -> &'static [FieldDescriptor] {
        SUPPLY_FIELDS
    }

    fn field(&self, name: &str) -> NbrResult<FieldValue> {
        Ok(match name {
            "id" => FieldValue::Reference(self.id.uuid()),
            "voltage" => FieldValue::Number(self.voltage.value()),
            "phases" => FieldValue::Integer(i64::from(self.phases)),
            "has_neutral" => FieldValue::Flag(self.has_neutral),
            "has_ground" => FieldValue::Flag(self.has_ground),
            _ => return Err(unknown_field("supply", name)),
        })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> NbrResult<()> {
        match name {
            "id" => return Err(read_only("supply", name)),
            "voltage" => self.voltage = Volts(positive(name, value)?),
            "phases" => {
                let phases = match value {
                    FieldValue::Integer(phases) => phases,
                    other => return Err(wrong_kind(name, "an integer", &other)),
                };
                if !(1..=3).contains(&phases) {
                    return Err(NbrError::Validation(format!(
                        "a supply has 1 to 3 phases, got {}",
                        phases
                    )));
                }
                self.phases = phases as u8;
            }
            "has_neutral" => self.has_neutral = flag(name, value)?,
            "has_ground" => self.has_ground = flag(name, value)?,
            _ => return Err(unknown_field("supply", name)),
        }
        Ok(())
    }
}

// =============================================================================
// LoadType
// =============================================================================

pub static LOAD_TYPE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("name", "Name", FieldFormat::Text),
    FieldDescriptor::new(
        "minimum_wire_section",
        "Minimum section",
        FieldFormat::Number { unit: "mm²", decimals: 1 },
    ),
    FieldDescriptor::new(
        "demand_factor",
        "Demand factor",
        FieldFormat::Number { unit: "", decimals: 2 },
    ),
];

impl FieldAccess for LoadType {
    fn fields(&self) -> &'static [FieldDescriptor] {
        LOAD_TYPE_FIELDS
    }

    fn field(&self, name: &str) -> NbrResult<FieldValue> {
        Ok(match name {
            "name" => FieldValue::Text(self.name.clone()),
            "minimum_wire_section" => FieldValue::Number(self.minimum_wire_section.value()),
            "demand_factor" => FieldValue::Number(self.demand_factor),
            _ => return Err(unknown_field("load type", name)),
        })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> NbrResult<()> {
        match name {
            "name" => self.name = name_text(name, value)?,
            "minimum_wire_section" => {
                self.minimum_wire_section = SquareMillimeters(positive(name, value)?)
            }
            "demand_factor" => {
                let factor = non_negative(name, value)?;
                if factor > 1.0 {
                    return Err(NbrError::Validation(format!(
                        "demand factor must be between 0 and 1, got {}",
                        factor
                    )));
                }
                self.demand_factor = factor;
            }
            _ => return Err(unknown_field("load type", name)),
        }
        Ok(())
    }
}

// =============================================================================
// WireType
// =============================================================================

pub static WIRE_TYPE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("material", "Material", FieldFormat::Choice)
        .choices(ChoiceSource::Materials),
    FieldDescriptor::new("insulation", "Insulation", FieldFormat::Choice)
        .choices(ChoiceSource::Insulations),
];

impl FieldAccess for WireType {
    fn fields(&self) -> &'static [FieldDescriptor] {
        WIRE_TYPE_FIELDS
    }

    fn field(&self, name: &str) -> NbrResult<FieldValue> {
        Ok(match name {
            "material" => FieldValue::Choice(self.material.as_str().to_string()),
            "insulation" => FieldValue::Choice(self.insulation.as_str().to_string()),
            _ => return Err(unknown_field("wire type", name)),
        })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> NbrResult<()> {
        match name {
            "material" => self.material = choice(name, value, WireMaterial::from_str)?,
            "insulation" => self.insulation = choice(name, value, WireInsulation::from_str)?,
            _ => return Err(unknown_field("wire type", name)),
        }
        Ok(())
    }
}

// =============================================================================
// Circuit
// =============================================================================

const CIRCUIT_COMMON: [FieldDescriptor; 7] = [
    FieldDescriptor::new("name", "Name", FieldFormat::Text),
    FieldDescriptor::new("description", "Description", FieldFormat::Text),
    FieldDescriptor::new("supply", "Supply", FieldFormat::Choice)
        .choices(ChoiceSource::Supplies),
    FieldDescriptor::new("load_type", "Load type", FieldFormat::Choice)
        .choices(ChoiceSource::LoadTypes),
    FieldDescriptor::new("wire_type", "Wire type", FieldFormat::Choice)
        .choices(ChoiceSource::WireTypes),
    FieldDescriptor::new("length", "Length", FieldFormat::Number { unit: "m", decimals: 1 }),
    FieldDescriptor::new("conduit_run", "Conduit run", FieldFormat::Choice)
        .choices(ChoiceSource::ConduitRuns),
];

pub static TERMINAL_CIRCUIT_FIELDS: &[FieldDescriptor] = &[
    CIRCUIT_COMMON[0],
    CIRCUIT_COMMON[1],
    CIRCUIT_COMMON[2],
    CIRCUIT_COMMON[3],
    CIRCUIT_COMMON[4],
    CIRCUIT_COMMON[5],
    CIRCUIT_COMMON[6],
    FieldDescriptor::new("load_power", "Load power", FieldFormat::Number { unit: "W", decimals: 0 }),
];

pub static UPSTREAM_CIRCUIT_FIELDS: &[FieldDescriptor] = &[
    CIRCUIT_COMMON[0],
    CIRCUIT_COMMON[1],
    CIRCUIT_COMMON[2],
    CIRCUIT_COMMON[3],
    CIRCUIT_COMMON[4],
    CIRCUIT_COMMON[5],
    CIRCUIT_COMMON[6],
    FieldDescriptor::new("circuit_count", "Circuits", FieldFormat::Integer).read_only(),
];

impl FieldAccess for Circuit {
    fn fields(&self) -> &'static [FieldDescriptor] {
        match self.kind {
            CircuitKind::Terminal { .. } => TERMINAL_CIRCUIT_FIELDS,
            CircuitKind::Upstream { .. } => UPSTREAM_CIRCUIT_FIELDS,
        }
    }

    fn field(&self, name: &str) -> NbrResult<FieldValue> {
        Ok(match (name, &self.kind) {
            ("name", _) => FieldValue::Text(self.name.clone()),
            ("description", _) => FieldValue::Text(self.description.clone()),
            ("supply", _) => FieldValue::Reference(self.supply.uuid()),
            ("load_type", _) => FieldValue::Reference(self.load_type.uuid()),
            ("wire_type", _) => FieldValue::Reference(self.wire_type.uuid()),
            ("length", _) => FieldValue::Number(self.length.value()),
            ("conduit_run", _) => optional_id(self.conduit_run.map(|id| id.uuid())),
            ("load_power", CircuitKind::Terminal { load_power }) => {
                FieldValue::Number(load_power.value())
            }
            ("circuit_count", CircuitKind::Upstream { circuits }) => {
                FieldValue::Integer(circuits.len() as i64)
            }
            _ => return Err(unknown_field("circuit", name)),
        })
    }

    /// Reference fields are stored without checking the catalogue; use
    /// [`crate::Project::set_circuit_field`] to have them checked. The
    /// conduit run can only be changed through the project.
    fn set_field(&mut self, name: &str, value: FieldValue) -> NbrResult<()> {
        match name {
            "name" => self.name = name_text(name, value)?,
            "description" => self.description = text(name, value)?,
            "supply" => self.supply = SupplyId::from_uuid(reference(name, value)?),
            "load_type" => self.load_type = LoadTypeId::from_uuid(reference(name, value)?),
            "wire_type" => self.wire_type = WireTypeId::from_uuid(reference(name, value)?),
            "length" => self.length = Meters(non_negative(name, value)?),
            "conduit_run" => {
                return Err(NbrError::Validation(
                    "a circuit's conduit run is assigned through its project".into(),
                ))
            }
            "load_power" => {
                let power = non_negative(name, value)?;
                match &mut self.kind {
                    CircuitKind::Terminal { load_power } => *load_power = Watts(power),
                    CircuitKind::Upstream { .. } => {
                        return Err(NbrError::Validation(
                            "an upstream circuit's power follows from its children".into(),
                        ))
                    }
                }
            }
            "circuit_count" => return Err(read_only("circuit", name)),
            _ => return Err(unknown_field("circuit", name)),
        }
        Ok(())
    }
}

// =============================================================================
// ConduitRun
// =============================================================================

pub static CONDUIT_RUN_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("name", "Name", FieldFormat::Text),
    FieldDescriptor::new("length", "Length", FieldFormat::Number { unit: "m", decimals: 1 }),
    FieldDescriptor::new("reference_method", "Reference method", FieldFormat::Choice)
        .choices(ChoiceSource::ReferenceMethods),
    FieldDescriptor::new(
        "temperature",
        "Ambient temperature",
        FieldFormat::Number { unit: "°C", decimals: 0 },
    ),
    FieldDescriptor::new("conduit_type", "Conduit type", FieldFormat::Choice)
        .choices(ChoiceSource::ConduitTypes),
    FieldDescriptor::new("circuit_count", "Circuits", FieldFormat::Integer).read_only(),
];

impl FieldAccess for ConduitRun {
    fn fields(&self) -> &'static [FieldDescriptor] {
        CONDUIT_RUN_FIELDS
    }

    fn field(&self, name: &str) -> NbrResult<FieldValue> {
        Ok(match name {
            "name" => FieldValue::Text(self.name.clone()),
            "length" => FieldValue::Number(self.length.value()),
            "reference_method" => FieldValue::Choice(self.reference_method.as_str().to_string()),
            "temperature" => FieldValue::Number(self.temperature.value()),
            "conduit_type" => self
                .conduit_type
                .map(|t| FieldValue::Choice(t.as_str().to_string()))
                .unwrap_or(FieldValue::Empty),
            "circuit_count" => FieldValue::Integer(self.circuits.len() as i64),
            _ => return Err(unknown_field("conduit run", name)),
        })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> NbrResult<()> {
        match name {
            "name" => self.name = name_text(name, value)?,
            "length" => self.length = Meters(non_negative(name, value)?),
            "reference_method" => {
                self.reference_method = choice(name, value, ReferenceMethod::from_str)?
            }
            "temperature" => self.temperature = Celsius(number(name, value)?),
            "conduit_type" => {
                self.conduit_type = match value {
                    FieldValue::Empty => None,
                    value => Some(choice(name, value, ConduitType::from_str)?),
                }
            }
            "circuit_count" => return Err(read_only("conduit run", name)),
            _ => return Err(unknown_field("conduit run", name)),
        }
        Ok(())
    }
}
