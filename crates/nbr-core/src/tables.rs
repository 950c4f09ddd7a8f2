//! # Reference Data Loader
//!
//! Immutable NBR 5410 tables, loaded lazily and memoized per key:
//!
//! | Key | Content |
//! |-----|---------|
//! | `wire_types/<material>-<insulation>.json` | resistivity, sections, diameters, ampacity matrix |
//! | `temperature_correction/<insulation>.json` | ordered (temperature, factor) points |
//! | `grouping_correction.json` | factor per number of grouped circuits |
//! | `breakers.json` | rated currents per curve |
//! | `conduits/<type>.json` | nominal/external/internal diameters |
//!
//! Tables come from a [`TableSource`]. [`EmbeddedTables`] compiles the
//! bundled JSON into the binary; [`DirectoryTables`] reads the same keys from
//! a directory so a designer can substitute manufacturer data.
//!
//! ## Caching
//!
//! [`ReferenceData`] allocates one [`OnceCell`] per key up front. The first
//! lookup of a key parses and validates its table; later lookups read the
//! populated cell without locking. Concurrent first lookups of the same key
//! block on the cell, so each table is parsed at most once.
//!
//! ```
//! use nbr_core::tables::{ReferenceData, BreakerCurve};
//! use nbr_core::Celsius;
//! use nbr_core::WireInsulation;
//!
//! let tables = ReferenceData::embedded();
//! let factor = tables.temperature_factor(WireInsulation::Pvc, Celsius(40.0)).unwrap();
//! assert!((factor - 0.87).abs() < 1e-9);
//! assert_eq!(tables.breakers(BreakerCurve::C).unwrap().first().map(|a| a.value()), Some(1.0));
//! ```

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::catalog::{WireInsulation, WireMaterial, WireType};
use crate::components::Wire;
use crate::conduit::{Conduit, ConduitType};
use crate::error::{NbrError, NbrResult};
use crate::units::{Amperes, Celsius, Millimeters, SquareMillimeters};

// =============================================================================
// Keys
// =============================================================================

/// Standardized installation method selecting an ampacity column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceMethod {
    A1,
    A2,
    B1,
    B2,
    C,
    D,
}

impl ReferenceMethod {
    pub const ALL: [ReferenceMethod; 6] = [
        ReferenceMethod::A1,
        ReferenceMethod::A2,
        ReferenceMethod::B1,
        ReferenceMethod::B2,
        ReferenceMethod::C,
        ReferenceMethod::D,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceMethod::A1 => "A1",
            ReferenceMethod::A2 => "A2",
            ReferenceMethod::B1 => "B1",
            ReferenceMethod::B2 => "B2",
            ReferenceMethod::C => "C",
            ReferenceMethod::D => "D",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for ReferenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip curve family of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BreakerCurve {
    B,
    C,
    D,
}

impl BreakerCurve {
    pub const ALL: [BreakerCurve; 3] = [BreakerCurve::B, BreakerCurve::C, BreakerCurve::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerCurve::B => "B",
            BreakerCurve::C => "C",
            BreakerCurve::D => "D",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|curve| curve.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for BreakerCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn wire_table_key(material: WireMaterial, insulation: WireInsulation) -> String {
    format!("wire_types/{}-{}.json", material.as_str(), insulation.as_str())
}

pub fn temperature_table_key(insulation: WireInsulation) -> String {
    format!("temperature_correction/{}.json", insulation.as_str())
}

pub const GROUPING_TABLE_KEY: &str = "grouping_correction.json";
pub const BREAKER_TABLE_KEY: &str = "breakers.json";

pub fn conduit_table_key(conduit_type: ConduitType) -> String {
    format!("conduits/{}.json", conduit_type.as_str())
}

// =============================================================================
// Sources
// =============================================================================

/// Where raw table text comes from.
pub trait TableSource: Send + Sync + fmt::Debug {
    /// Read the table stored under `key`.
    fn read(&self, key: &str) -> NbrResult<Cow<'static, str>>;

    /// Whether a table is stored under `key`, without reading it.
    fn contains(&self, key: &str) -> bool;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Tables bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTables;

impl EmbeddedTables {
    fn lookup(key: &str) -> Option<&'static str> {
        Some(match key {
            "wire_types/copper-pvc.json" => include_str!("../data/wire_types/copper-pvc.json"),
            "wire_types/copper-epr.json" => include_str!("../data/wire_types/copper-epr.json"),
            "wire_types/copper-xlpe.json" => include_str!("../data/wire_types/copper-xlpe.json"),
            "temperature_correction/pvc.json" => {
                include_str!("../data/temperature_correction/pvc.json")
            }
            "temperature_correction/epr.json" => {
                include_str!("../data/temperature_correction/epr.json")
            }
            "temperature_correction/xlpe.json" => {
                include_str!("../data/temperature_correction/xlpe.json")
            }
            "grouping_correction.json" => include_str!("../data/grouping_correction.json"),
            "breakers.json" => include_str!("../data/breakers.json"),
            "conduits/rigid.json" => include_str!("../data/conduits/rigid.json"),
            "conduits/flexible.json" => include_str!("../data/conduits/flexible.json"),
            _ => return None,
        })
    }
}

impl TableSource for EmbeddedTables {
    fn read(&self, key: &str) -> NbrResult<Cow<'static, str>> {
        Self::lookup(key).map(Cow::Borrowed).ok_or_else(|| {
            NbrError::Config(format!("no embedded reference table for '{}'", key))
        })
    }

    fn contains(&self, key: &str) -> bool {
        Self::lookup(key).is_some()
    }

    fn describe(&self) -> String {
        "embedded".to_string()
    }
}

/// Tables read from a directory using the same relative keys.
#[derive(Debug, Clone)]
pub struct DirectoryTables {
    root: PathBuf,
}

impl DirectoryTables {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TableSource for DirectoryTables {
    fn read(&self, key: &str) -> NbrResult<Cow<'static, str>> {
        let path = self.root.join(key);
        std::fs::read_to_string(&path)
            .map(Cow::Owned)
            .map_err(|err| {
                NbrError::Config(format!("cannot read reference table {}: {}", path.display(), err))
            })
    }

    fn contains(&self, key: &str) -> bool {
        self.root.join(key).is_file()
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Deserialize)]
struct WireTableFile {
    resistivity: f64,
    conductor_sections: Vec<f64>,
    conductor_diameters: Vec<f64>,
    external_diameters: Vec<Option<f64>>,
    reference_methods: BTreeMap<ReferenceMethod, BTreeMap<usize, Vec<f64>>>,
}

/// Ampacity and geometry for one material and insulation.
#[derive(Debug, Clone, PartialEq)]
pub struct WireTable {
    pub material: WireMaterial,
    pub insulation: WireInsulation,
    /// Ω·m
    pub resistivity: f64,
    pub sections: Vec<SquareMillimeters>,
    pub conductor_diameters: Vec<Millimeters>,
    /// `None` where the manufacturer publishes no insulated diameter
    pub external_diameters: Vec<Option<Millimeters>>,
    capacities: BTreeMap<ReferenceMethod, BTreeMap<usize, Vec<Amperes>>>,
}

impl WireTable {
    fn from_file(
        material: WireMaterial,
        insulation: WireInsulation,
        file: WireTableFile,
    ) -> NbrResult<Self> {
        let table = Self {
            material,
            insulation,
            resistivity: file.resistivity,
            sections: file.conductor_sections.into_iter().map(SquareMillimeters).collect(),
            conductor_diameters: file.conductor_diameters.into_iter().map(Millimeters).collect(),
            external_diameters: file
                .external_diameters
                .into_iter()
                .map(|d| d.map(Millimeters))
                .collect(),
            capacities: file
                .reference_methods
                .into_iter()
                .map(|(method, columns)| {
                    let columns = columns
                        .into_iter()
                        .map(|(count, row)| (count, row.into_iter().map(Amperes).collect()))
                        .collect();
                    (method, columns)
                })
                .collect(),
        };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> NbrResult<()> {
        let name = format!("{} {}", self.material, self.insulation);
        let n = self.sections.len();
        if n == 0 {
            return Err(NbrError::Config(format!("wire table {} has no sections", name)));
        }
        if !(self.resistivity > 0.0) {
            return Err(NbrError::Config(format!(
                "wire table {} has a non-positive resistivity",
                name
            )));
        }
        if self.conductor_diameters.len() != n || self.external_diameters.len() != n {
            return Err(NbrError::Config(format!(
                "wire table {} has {} sections but {} conductor and {} external diameters",
                name,
                n,
                self.conductor_diameters.len(),
                self.external_diameters.len()
            )));
        }
        if self.sections.windows(2).any(|w| w[0] >= w[1]) {
            return Err(NbrError::Config(format!(
                "wire table {} sections are not strictly ascending",
                name
            )));
        }
        for (method, columns) in &self.capacities {
            for (count, row) in columns {
                if row.len() != n {
                    return Err(NbrError::Config(format!(
                        "wire table {} method {} with {} loaded conductors has {} capacities for {} sections",
                        name,
                        method,
                        count,
                        row.len(),
                        n
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn reference_methods(&self) -> impl Iterator<Item = ReferenceMethod> + '_ {
        self.capacities.keys().copied()
    }

    /// Uncorrected ampacities for one installation method and loaded-conductor column.
    pub fn capacities(
        &self,
        method: ReferenceMethod,
        loaded_wire_count: usize,
    ) -> NbrResult<&[Amperes]> {
        self.capacities
            .get(&method)
            .and_then(|columns| columns.get(&loaded_wire_count))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                NbrError::Config(format!(
                    "wire table {} {} has no capacities for method {} with {} loaded conductors",
                    self.material, self.insulation, method, loaded_wire_count
                ))
            })
    }

    /// Every catalogued wire for the given conditions, ascending by section.
    ///
    /// Sections without a published external diameter are skipped, since
    /// they cannot take part in a conduit fill calculation.
    pub fn wires(
        &self,
        wire_type: &WireType,
        method: ReferenceMethod,
        loaded_wire_count: usize,
        correction_factor: f64,
    ) -> NbrResult<Vec<Wire>> {
        let capacities = self.capacities(method, loaded_wire_count)?;
        let wires = self
            .sections
            .iter()
            .zip(&self.conductor_diameters)
            .zip(&self.external_diameters)
            .zip(capacities)
            .filter_map(|(((section, conductor), external), capacity)| {
                external.map(|external_diameter| Wire {
                    wire_type: wire_type.id,
                    material: self.material,
                    insulation: self.insulation,
                    resistivity: self.resistivity,
                    section: *section,
                    uncorrected_capacity: *capacity,
                    conductor_diameter: *conductor,
                    external_diameter,
                    correction_factor,
                })
            })
            .collect();
        Ok(wires)
    }
}

/// One point of the temperature correction curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePoint {
    pub temperature: Celsius,
    pub value: f64,
}

/// Ordered temperature correction curve with linear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureTable {
    points: Vec<TemperaturePoint>,
}

impl TemperatureTable {
    pub fn new(points: Vec<TemperaturePoint>) -> NbrResult<Self> {
        if points.is_empty() {
            return Err(NbrError::Config("temperature correction table is empty".into()));
        }
        if points
            .windows(2)
            .any(|w| w[0].temperature >= w[1].temperature)
        {
            return Err(NbrError::Config(
                "temperature correction table is not sorted by temperature".into(),
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[TemperaturePoint] {
        &self.points
    }

    /// Correction factor at `temperature`.
    ///
    /// Temperatures at or below the first point use its factor. Temperatures
    /// above the last point are outside the table's domain.
    pub fn factor(&self, temperature: Celsius) -> NbrResult<f64> {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if temperature <= first.temperature {
            return Ok(first.value);
        }
        if temperature > last.temperature {
            return Err(NbrError::TemperatureOutOfRange {
                temperature,
                max: last.temperature,
            });
        }

        let upper = self
            .points
            .iter()
            .position(|p| p.temperature >= temperature)
            .unwrap_or(self.points.len() - 1);
        let (p0, p1) = (self.points[upper - 1], self.points[upper]);
        let ratio = (temperature - p0.temperature) / (p1.temperature - p0.temperature);
        Ok(p0.value + ratio * (p1.value - p0.value))
    }
}

/// Correction factor per number of circuits grouped in one raceway.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingTable {
    factors: BTreeMap<u32, f64>,
}

impl GroupingTable {
    pub fn new(factors: BTreeMap<u32, f64>) -> NbrResult<Self> {
        if factors.is_empty() {
            return Err(NbrError::Config("grouping correction table is empty".into()));
        }
        Ok(Self { factors })
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.factors.iter().map(|(k, v)| (*k, *v))
    }

    /// Factor of the largest tabulated count not above `count`.
    pub fn factor(&self, count: u32) -> f64 {
        self.factors
            .range(..=count)
            .next_back()
            .or_else(|| self.factors.iter().next())
            .map(|(_, factor)| *factor)
            .unwrap_or(1.0)
    }
}

#[derive(Deserialize)]
struct ConduitTableFile {
    conduit_type: ConduitType,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    model: String,
    nominal_diameters: Vec<String>,
    external_diameters: Vec<f64>,
    internal_diameters: Vec<f64>,
}

fn conduits_from_file(expected: ConduitType, file: ConduitTableFile) -> NbrResult<Vec<Conduit>> {
    if file.conduit_type != expected {
        return Err(NbrError::Config(format!(
            "conduit table for {} declares type {}",
            expected, file.conduit_type
        )));
    }
    let n = file.nominal_diameters.len();
    if n == 0 || file.external_diameters.len() != n || file.internal_diameters.len() != n {
        return Err(NbrError::Config(format!(
            "conduit table {} has mismatched diameter lists",
            expected
        )));
    }
    if file.internal_diameters.windows(2).any(|w| w[0] >= w[1]) {
        return Err(NbrError::Config(format!(
            "conduit table {} internal diameters are not ascending",
            expected
        )));
    }

    Ok(file
        .nominal_diameters
        .into_iter()
        .zip(file.external_diameters)
        .zip(file.internal_diameters)
        .map(|((nominal, external), internal)| Conduit {
            conduit_type: expected,
            nominal_diameter: nominal,
            external_diameter: Millimeters(external),
            internal_diameter: Millimeters(internal),
            brand: file.brand.clone(),
            model: file.model.clone(),
        })
        .collect())
}

// =============================================================================
// Loader
// =============================================================================

/// Memoizing access to every reference table.
#[derive(Debug)]
pub struct ReferenceData {
    source: Box<dyn TableSource>,
    wires: HashMap<(WireMaterial, WireInsulation), OnceCell<WireTable>>,
    temperatures: HashMap<WireInsulation, OnceCell<TemperatureTable>>,
    grouping: OnceCell<GroupingTable>,
    breakers: OnceCell<BTreeMap<BreakerCurve, Vec<Amperes>>>,
    conduits: HashMap<ConduitType, OnceCell<Vec<Conduit>>>,
}

impl ReferenceData {
    pub fn new(source: Box<dyn TableSource>) -> Self {
        let wires = WireMaterial::ALL
            .into_iter()
            .flat_map(|m| WireInsulation::ALL.into_iter().map(move |i| (m, i)))
            .map(|key| (key, OnceCell::new()))
            .collect();
        let temperatures = WireInsulation::ALL
            .into_iter()
            .map(|i| (i, OnceCell::new()))
            .collect();
        let conduits = ConduitType::ALL
            .into_iter()
            .map(|t| (t, OnceCell::new()))
            .collect();

        Self {
            source,
            wires,
            temperatures,
            grouping: OnceCell::new(),
            breakers: OnceCell::new(),
            conduits,
        }
    }

    /// Tables bundled with the crate.
    pub fn embedded() -> Self {
        Self::new(Box::new(EmbeddedTables))
    }

    /// Tables read from `root`, using the same keys as the bundled data.
    pub fn from_directory(root: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(DirectoryTables::new(root)))
    }

    pub fn source(&self) -> &dyn TableSource {
        self.source.as_ref()
    }

    fn parse<T: serde::de::DeserializeOwned>(&self, key: &str) -> NbrResult<T> {
        let text = self.source.read(key)?;
        let value = serde_json::from_str(&text).map_err(|err| {
            NbrError::Config(format!("malformed reference table {}: {}", key, err))
        })?;
        debug!(key, source = %self.source.describe(), "loaded reference table");
        Ok(value)
    }

    /// Whether the source publishes a table for this material and insulation.
    pub fn has_wire_table(&self, material: WireMaterial, insulation: WireInsulation) -> bool {
        self.source.contains(&wire_table_key(material, insulation))
    }

    /// Materials with a table for at least one insulation.
    pub fn wire_materials(&self) -> Vec<WireMaterial> {
        WireMaterial::ALL
            .into_iter()
            .filter(|m| WireInsulation::ALL.iter().any(|i| self.has_wire_table(*m, *i)))
            .collect()
    }

    /// Insulations with a table for at least one material.
    pub fn wire_insulations(&self) -> Vec<WireInsulation> {
        WireInsulation::ALL
            .into_iter()
            .filter(|i| WireMaterial::ALL.iter().any(|m| self.has_wire_table(*m, *i)))
            .collect()
    }

    /// Ampacity table of one wire type.
    ///
    /// A wire type the source has no table for fails with the recoverable
    /// [`NbrError::UnsupportedWireType`]; a table that exists but cannot be
    /// read or parsed is a configuration error.
    pub fn wire_table(
        &self,
        material: WireMaterial,
        insulation: WireInsulation,
    ) -> NbrResult<&WireTable> {
        let cell = self.wires.get(&(material, insulation)).ok_or_else(|| {
            NbrError::Config(format!("no wire table slot for {} {}", material, insulation))
        })?;
        if cell.get().is_none() && !self.has_wire_table(material, insulation) {
            return Err(NbrError::UnsupportedWireType {
                material,
                insulation,
            });
        }
        cell.get_or_try_init(|| {
            let file = self.parse(&wire_table_key(material, insulation))?;
            WireTable::from_file(material, insulation, file)
        })
    }

    pub fn temperature_table(&self, insulation: WireInsulation) -> NbrResult<&TemperatureTable> {
        let cell = self.temperatures.get(&insulation).ok_or_else(|| {
            NbrError::Config(format!("no temperature table slot for {}", insulation))
        })?;
        cell.get_or_try_init(|| TemperatureTable::new(self.parse(&temperature_table_key(insulation))?))
    }

    pub fn temperature_factor(
        &self,
        insulation: WireInsulation,
        temperature: Celsius,
    ) -> NbrResult<f64> {
        self.temperature_table(insulation)?.factor(temperature)
    }

    pub fn grouping_table(&self) -> NbrResult<&GroupingTable> {
        self.grouping
            .get_or_try_init(|| GroupingTable::new(self.parse(GROUPING_TABLE_KEY)?))
    }

    pub fn grouping_factor(&self, count: u32) -> NbrResult<f64> {
        Ok(self.grouping_table()?.factor(count))
    }

    /// Ascending rated currents of one curve family.
    pub fn breakers(&self, curve: BreakerCurve) -> NbrResult<&[Amperes]> {
        let table = self.breakers.get_or_try_init(|| {
            let raw: BTreeMap<BreakerCurve, Vec<f64>> = self.parse(BREAKER_TABLE_KEY)?;
            let mut table = BTreeMap::new();
            for (curve, ratings) in raw {
                if ratings.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(NbrError::Config(format!(
                        "breaker ratings for curve {} are not ascending",
                        curve
                    )));
                }
                table.insert(curve, ratings.into_iter().map(Amperes).collect());
            }
            Ok(table)
        })?;
        table
            .get(&curve)
            .map(Vec::as_slice)
            .ok_or_else(|| NbrError::Config(format!("no breaker ratings for curve {}", curve)))
    }

    /// Conduit catalogue of one family, ascending by internal diameter.
    pub fn conduits(&self, conduit_type: ConduitType) -> NbrResult<&[Conduit]> {
        let cell = self.conduits.get(&conduit_type).ok_or_else(|| {
            NbrError::Config(format!("no conduit table slot for {}", conduit_type))
        })?;
        cell.get_or_try_init(|| {
            let file = self.parse(&conduit_table_key(conduit_type))?;
            conduits_from_file(conduit_type, file)
        })
        .map(Vec::as_slice)
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_copper_pvc_table() {
        let tables = ReferenceData::embedded();
        let table = tables
            .wire_table(WireMaterial::Copper, WireInsulation::Pvc)
            .unwrap();
        assert!(close(table.resistivity, 1.72e-8));

        let b1 = table.capacities(ReferenceMethod::B1, 2).unwrap();
        let ten = table
            .sections
            .iter()
            .position(|s| *s == SquareMillimeters(10.0))
            .unwrap();
        assert_eq!(b1[ten], Amperes(57.0));
        assert_eq!(b1[ten + 1], Amperes(76.0));
    }

    #[test]
    fn test_wires_skip_missing_external_diameter() {
        let tables = ReferenceData::embedded();
        let table = tables
            .wire_table(WireMaterial::Copper, WireInsulation::Pvc)
            .unwrap();
        let wire_type = WireType::new(WireMaterial::Copper, WireInsulation::Pvc);
        let wires = table.wires(&wire_type, ReferenceMethod::B1, 2, 0.8).unwrap();

        assert!(wires.len() < table.sections.len());
        assert_eq!(wires.last().unwrap().section, SquareMillimeters(240.0));
        assert!(wires.iter().all(|w| w.correction_factor == 0.8));
        assert!(wires.windows(2).all(|w| w[0].section < w[1].section));
    }

    #[test]
    fn test_missing_column_is_config_error() {
        let tables = ReferenceData::embedded();
        let table = tables
            .wire_table(WireMaterial::Copper, WireInsulation::Pvc)
            .unwrap();
        let err = table.capacities(ReferenceMethod::B1, 4).unwrap_err();
        assert!(matches!(err, NbrError::Config(_)));
    }

    #[test]
    fn test_missing_material_is_unsupported() {
        let tables = ReferenceData::embedded();
        assert!(!tables.has_wire_table(WireMaterial::Aluminium, WireInsulation::Pvc));
        let err = tables
            .wire_table(WireMaterial::Aluminium, WireInsulation::Pvc)
            .unwrap_err();
        assert!(matches!(
            err,
            NbrError::UnsupportedWireType {
                material: WireMaterial::Aluminium,
                insulation: WireInsulation::Pvc,
            }
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_available_wire_choices() {
        let tables = ReferenceData::embedded();
        assert_eq!(tables.wire_materials(), vec![WireMaterial::Copper]);
        assert_eq!(tables.wire_insulations(), WireInsulation::ALL.to_vec());

        let dir = tempfile::tempdir().unwrap();
        assert!(ReferenceData::from_directory(dir.path()).wire_materials().is_empty());
    }

    #[test]
    fn test_temperature_interpolation() {
        let tables = ReferenceData::embedded();
        let pvc = |t| tables.temperature_factor(WireInsulation::Pvc, Celsius(t)).unwrap();

        assert!(close(pvc(30.0), 1.0));
        assert!(close(pvc(40.0), 0.87));
        assert!(close(pvc(55.0), 0.61));
        // between 55 (0.61) and 60 (0.50)
        assert!(close(pvc(58.0), 0.544));
        // below the table clamps to the first entry
        assert!(close(pvc(-10.0), 1.22));
    }

    #[test]
    fn test_temperature_above_table_fails() {
        let tables = ReferenceData::embedded();
        let err = tables
            .temperature_factor(WireInsulation::Pvc, Celsius(70.0))
            .unwrap_err();
        assert!(matches!(err, NbrError::TemperatureOutOfRange { .. }));

        // EPR/XLPE tables continue to 80 °C
        assert!(tables
            .temperature_factor(WireInsulation::Xlpe, Celsius(70.0))
            .is_ok());
    }

    #[test]
    fn test_interpolation_between_arbitrary_points() {
        let table = TemperatureTable::new(vec![
            TemperaturePoint { temperature: Celsius(10.0), value: 1.2 },
            TemperaturePoint { temperature: Celsius(20.0), value: 1.0 },
        ])
        .unwrap();
        assert!(close(table.factor(Celsius(15.0)).unwrap(), 1.1));
        assert!(close(table.factor(Celsius(20.0)).unwrap(), 1.0));
        assert!(table.factor(Celsius(20.5)).is_err());
    }

    #[test]
    fn test_unsorted_temperature_table_rejected() {
        let err = TemperatureTable::new(vec![
            TemperaturePoint { temperature: Celsius(20.0), value: 1.0 },
            TemperaturePoint { temperature: Celsius(10.0), value: 1.2 },
        ])
        .unwrap_err();
        assert!(matches!(err, NbrError::Config(_)));
    }

    #[test]
    fn test_grouping_factor() {
        let tables = ReferenceData::embedded();
        assert!(close(tables.grouping_factor(1).unwrap(), 1.0));
        assert!(close(tables.grouping_factor(3).unwrap(), 0.7));
        // 9 to 11 share the 9 entry
        assert!(close(tables.grouping_factor(10).unwrap(), 0.5));
        // above the table clamps to the largest key
        assert!(close(tables.grouping_factor(40).unwrap(), 0.38));
        assert!(close(tables.grouping_factor(0).unwrap(), 1.0));
    }

    #[test]
    fn test_breaker_series() {
        let tables = ReferenceData::embedded();
        let c = tables.breakers(BreakerCurve::C).unwrap();
        assert!(c.contains(&Amperes(50.0)));
        assert!(c.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(tables.breakers(BreakerCurve::B).unwrap()[0], Amperes(6.0));
    }

    #[test]
    fn test_conduit_catalogue() {
        let tables = ReferenceData::embedded();
        let rigid = tables.conduits(ConduitType::Rigid).unwrap();
        assert_eq!(rigid[0].nominal_diameter, "1/2\"");
        assert_eq!(rigid[0].internal_diameter, Millimeters(16.4));
        assert!(tables.conduits(ConduitType::Flexible).unwrap().len() > 1);
    }

    #[test]
    fn test_reference_method_parsing() {
        assert_eq!(ReferenceMethod::from_str("b1"), Some(ReferenceMethod::B1));
        assert_eq!(ReferenceMethod::from_str("Z9"), None);
        assert_eq!(BreakerCurve::from_str("d"), Some(BreakerCurve::D));
    }

    #[derive(Debug)]
    struct CountingSource {
        reads: Arc<AtomicUsize>,
    }

    impl TableSource for CountingSource {
        fn read(&self, key: &str) -> NbrResult<Cow<'static, str>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            EmbeddedTables.read(key)
        }

        fn contains(&self, key: &str) -> bool {
            EmbeddedTables.contains(key)
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    #[test]
    fn test_tables_are_loaded_once_per_key() {
        let reads = Arc::new(AtomicUsize::new(0));
        let tables = ReferenceData::new(Box::new(CountingSource {
            reads: Arc::clone(&reads),
        }));

        for _ in 0..3 {
            tables.grouping_factor(2).unwrap();
            tables.breakers(BreakerCurve::C).unwrap();
        }
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        tables.temperature_factor(WireInsulation::Pvc, Celsius(30.0)).unwrap();
        tables.temperature_factor(WireInsulation::Xlpe, Celsius(30.0)).unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let tables = Arc::new(ReferenceData::new(Box::new(CountingSource {
            reads: Arc::clone(&reads),
        })));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tables = Arc::clone(&tables);
                std::thread::spawn(move || {
                    tables
                        .wire_table(WireMaterial::Copper, WireInsulation::Pvc)
                        .map(|t| t.sections.len())
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 24);
        }
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_directory_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(GROUPING_TABLE_KEY),
            r#"{"1": 1.0, "2": 0.75}"#,
        )
        .unwrap();

        let tables = ReferenceData::from_directory(dir.path());
        assert!(close(tables.grouping_factor(5).unwrap(), 0.75));

        let err = tables.breakers(BreakerCurve::C).unwrap_err();
        assert!(matches!(err, NbrError::Config(_)));
    }

    #[test]
    fn test_malformed_table_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BREAKER_TABLE_KEY), r#"{"C": [10, 6]}"#).unwrap();

        let tables = ReferenceData::from_directory(dir.path());
        let err = tables.breakers(BreakerCurve::C).unwrap_err();
        assert!(err.to_string().contains("not ascending"));
    }
}
