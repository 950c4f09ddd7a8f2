//! Sizing settings shared by every computation.
//!
//! All fields have defaults, so a partial `[sizing]` table in a TOML file is
//! enough to override one value.

use serde::{Deserialize, Serialize};

use crate::conduit::ConduitType;
use crate::error::{NbrError, NbrResult};
use crate::tables::{BreakerCurve, ReferenceMethod};
use crate::units::Celsius;

/// Maximum voltage drop allowed on a terminal circuit (4%).
pub const TERMINAL_VOLTAGE_DROP_LIMIT: f64 = 0.04;

/// Installation conditions for circuits that are not in any conduit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandaloneConditions {
    pub reference_method: ReferenceMethod,
    pub temperature: Celsius,
    pub grouping: u32,
}

impl Default for StandaloneConditions {
    fn default() -> Self {
        Self {
            reference_method: ReferenceMethod::B1,
            temperature: Celsius(30.0),
            grouping: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingSettings {
    pub breaker_curve: BreakerCurve,
    /// Fraction of the supply voltage
    pub voltage_drop_limit: f64,
    pub conduit_type: ConduitType,
    pub standalone: StandaloneConditions,
}

impl Default for SizingSettings {
    fn default() -> Self {
        Self {
            breaker_curve: BreakerCurve::C,
            voltage_drop_limit: TERMINAL_VOLTAGE_DROP_LIMIT,
            conduit_type: ConduitType::Rigid,
            standalone: StandaloneConditions::default(),
        }
    }
}

impl SizingSettings {
    pub fn validate(&self) -> NbrResult<()> {
        if !(self.voltage_drop_limit > 0.0 && self.voltage_drop_limit < 1.0) {
            return Err(NbrError::Config(format!(
                "voltage drop limit must be between 0 and 1, got {}",
                self.voltage_drop_limit
            )));
        }
        if self.standalone.grouping == 0 {
            return Err(NbrError::Config(
                "standalone grouping must count at least one circuit".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SizingSettings::default();
        assert_eq!(settings.breaker_curve, BreakerCurve::C);
        assert_eq!(settings.voltage_drop_limit, 0.04);
        assert_eq!(settings.standalone.reference_method, ReferenceMethod::B1);
        assert_eq!(settings.standalone.grouping, 1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let settings: SizingSettings = toml::from_str(
            r#"
            breaker_curve = "D"

            [standalone]
            temperature = 40.0
            "#,
        )
        .unwrap();

        assert_eq!(settings.breaker_curve, BreakerCurve::D);
        assert_eq!(settings.voltage_drop_limit, 0.04);
        assert_eq!(settings.standalone.temperature, Celsius(40.0));
        assert_eq!(settings.standalone.reference_method, ReferenceMethod::B1);
    }

    #[test]
    fn test_invalid_limit() {
        let settings = SizingSettings {
            voltage_drop_limit: 0.0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(NbrError::Config(_))));
    }
}
