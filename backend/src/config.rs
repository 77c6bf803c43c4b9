//! Engine configuration
//!
//! Presentation knobs only: urgency tier thresholds and how amounts are
//! rendered. Nothing here changes selection or settlement semantics.

use crate::error::ConfigError;
use crate::temporal::UrgencyTier;
use serde::{Deserialize, Serialize};

/// Top-level engine configuration
///
/// # Example
/// ```
/// use settlement_batch_engine::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{"urgency": {"warning_days": 14}}"#).unwrap();
/// assert_eq!(config.urgency.critical_days, 3);
/// assert_eq!(config.urgency.warning_days, 14);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub urgency: UrgencyThresholds,
    pub amount_format: AmountFormat,
}

impl EngineConfig {
    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.urgency.validate()?;
        self.amount_format.validate()
    }
}

/// Day thresholds for urgency tiers (both inclusive upper bounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyThresholds {
    pub critical_days: i64,
    pub warning_days: i64,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            critical_days: 3,
            warning_days: 7,
        }
    }
}

impl UrgencyThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.critical_days < 0 || self.critical_days > self.warning_days {
            return Err(ConfigError::InvalidUrgencyThresholds {
                critical_days: self.critical_days,
                warning_days: self.warning_days,
            });
        }
        Ok(())
    }

    /// Classify remaining days against these thresholds
    pub fn tier(&self, days_left: i64) -> UrgencyTier {
        if days_left <= self.critical_days {
            UrgencyTier::Critical
        } else if days_left <= self.warning_days {
            UrgencyTier::Warning
        } else {
            UrgencyTier::Notice
        }
    }
}

/// Largest `decimal_places` an `AmountFormat` accepts
pub const MAX_DECIMAL_PLACES: u32 = 6;

/// How minor-unit amounts are rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountFormat {
    /// Prefix placed after any sign, e.g. `"₦"`
    pub symbol: String,
    pub decimal_places: u32,
    pub group_separator: String,
}

impl Default for AmountFormat {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            decimal_places: 2,
            group_separator: ",".to_string(),
        }
    }
}

impl AmountFormat {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(ConfigError::InvalidDecimalPlaces(self.decimal_places));
        }
        Ok(())
    }
}
