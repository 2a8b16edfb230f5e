//! Simulation tuning and timing configuration
//!
//! Two balance variants of the trainer exist in the wild with different
//! coolant drain and energy accumulation constants. Neither is treated as
//! ground truth: both are exposed as named presets and any value can be
//! overridden from a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV_VAR: &str = "REACTOR_CONFIG";

/// Errors raised while loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Named balance presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePreset {
    Standard,
    Accelerated,
}

impl BalancePreset {
    pub fn balance(self) -> Balance {
        match self {
            BalancePreset::Standard => Balance::standard(),
            BalancePreset::Accelerated => Balance::accelerated(),
        }
    }
}

/// Largest damage repair a level advance may grant
pub const MAX_LEVEL_REPAIR: f64 = 20.0; // [%]

/// Tunable gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub coolant_base_drain: f64,       // [%/tick] drained regardless of settings
    pub coolant_flow_speed_drain: f64, // [%/tick] per unit of flow × speed
    pub coolant_speed_credit: f64,     // [%/tick] returned per unit of speed
    pub energy_rate: f64,              // Energy credited per MW of output per tick
    pub recharge_amount: f64,          // [%] coolant added by one recharge
    pub recharge_cost: f64,            // Energy deducted by one recharge
    pub empty_coolant_penalty: f64,    // [°C] one-shot heat-up when coolant runs dry
    pub level_repair: f64,             // [%] damage repaired on level advance
}

impl Default for Balance {
    fn default() -> Self {
        Self::standard()
    }
}

impl Balance {
    /// Slow-paced variant: steep coolant drain, 0.01 energy per MW per tick
    pub fn standard() -> Self {
        Self {
            coolant_base_drain: 0.2,
            coolant_flow_speed_drain: 0.0005,
            coolant_speed_credit: 0.001,
            energy_rate: 0.01,
            recharge_amount: 10.0,
            recharge_cost: 50.0,
            empty_coolant_penalty: 50.0,
            level_repair: 20.0,
        }
    }

    /// Faster variant: triple energy rate, gentler coolant drain
    pub fn accelerated() -> Self {
        Self {
            coolant_base_drain: 0.15,
            coolant_flow_speed_drain: 0.0004,
            energy_rate: 0.03,
            ..Self::standard()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("coolant_base_drain", self.coolant_base_drain),
            ("coolant_flow_speed_drain", self.coolant_flow_speed_drain),
            ("coolant_speed_credit", self.coolant_speed_credit),
            ("energy_rate", self.energy_rate),
            ("recharge_amount", self.recharge_amount),
            ("recharge_cost", self.recharge_cost),
            ("empty_coolant_penalty", self.empty_coolant_penalty),
            ("level_repair", self.level_repair),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a finite non-negative number, got {value}"),
                });
            }
        }

        if self.level_repair > MAX_LEVEL_REPAIR {
            return Err(ConfigError::Invalid {
                field: "level_repair",
                reason: format!(
                    "at most {MAX_LEVEL_REPAIR} points, got {}",
                    self.level_repair
                ),
            });
        }
        // Worst case is zero flow at full speed; coolant must never refill itself
        if self.coolant_speed_credit * 100.0 > self.coolant_base_drain {
            return Err(ConfigError::Invalid {
                field: "coolant_speed_credit",
                reason: format!(
                    "speed credit {} at full speed outweighs base drain {}",
                    self.coolant_speed_credit, self.coolant_base_drain
                ),
            });
        }
        Ok(())
    }
}

/// Wall-clock cadence of the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub tick_period_ms: u64,
    pub scram_delay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_period_ms: 400,
            scram_delay_ms: 500,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub balance: Balance,
    pub timing: Timing,
}

impl SimulationConfig {
    pub fn with_preset(preset: BalancePreset) -> Self {
        Self {
            balance: preset.balance(),
            timing: Timing::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.balance.validate()?;
        if self.timing.tick_period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_period_ms",
                reason: "tick period must be non-zero".to_string(),
            });
        }
        if self.timing.scram_delay_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "scram_delay_ms",
                reason: "SCRAM delay must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from the usual locations, falling back to defaults
    pub fn load() -> Self {
        let mut config_paths: Vec<PathBuf> = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            config_paths.push(PathBuf::from(path));
        }
        config_paths.push(PathBuf::from("config/reactor.json"));
        config_paths.push(PathBuf::from("../config/reactor.json"));

        for path in &config_paths {
            if !path.exists() {
                continue;
            }
            match Self::from_path(path) {
                Ok(config) => {
                    log::info!("Loaded simulation config from {}", path.display());
                    return config;
                }
                Err(err) => log::warn!("Skipping config {}: {}", path.display(), err),
            }
        }

        log::warn!("No usable simulation config found, using standard balance");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_differ_only_in_tuning() {
        let standard = Balance::standard();
        let accelerated = Balance::accelerated();
        assert!(accelerated.energy_rate > standard.energy_rate);
        assert!(accelerated.coolant_base_drain < standard.coolant_base_drain);
        assert_eq!(accelerated.recharge_cost, standard.recharge_cost);
        assert_eq!(accelerated.level_repair, standard.level_repair);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SimulationConfig::from_json_str(r#"{ "balance": { "energy_rate": 0.05 } }"#).unwrap();
        assert_eq!(config.balance.energy_rate, 0.05);
        assert_eq!(config.balance.recharge_amount, 10.0);
        assert_eq!(config.timing, Timing::default());
    }

    #[test]
    fn test_rejects_negative_constants() {
        let err = SimulationConfig::from_json_str(r#"{ "balance": { "recharge_cost": -1.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "recharge_cost", .. }));
    }

    #[test]
    fn test_rejects_zero_tick_period() {
        let err = SimulationConfig::from_json_str(r#"{ "timing": { "tick_period_ms": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tick_period_ms", .. }));
    }

    #[test]
    fn test_rejects_zero_scram_delay() {
        let err = SimulationConfig::from_json_str(r#"{ "timing": { "scram_delay_ms": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "scram_delay_ms", .. }));
    }

    #[test]
    fn test_rejects_oversized_level_repair() {
        let err = SimulationConfig::from_json_str(r#"{ "balance": { "level_repair": 80.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "level_repair", .. }));

        let config =
            SimulationConfig::from_json_str(r#"{ "balance": { "level_repair": 20.0 } }"#).unwrap();
        assert_eq!(config.balance.level_repair, MAX_LEVEL_REPAIR);
    }

    #[test]
    fn test_rejects_self_refilling_coolant() {
        let err =
            SimulationConfig::from_json_str(r#"{ "balance": { "coolant_speed_credit": 1.0 } }"#)
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "coolant_speed_credit", .. }));
        assert!(Balance::standard().validate().is_ok());
        assert!(Balance::accelerated().validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = SimulationConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_preset_names_round_trip_through_json() {
        let preset: BalancePreset = serde_json::from_str("\"accelerated\"").unwrap();
        assert_eq!(preset.balance(), Balance::accelerated());
    }
}
