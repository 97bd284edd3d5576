//! Configuration loader
//!
//! Parses an [`EngineConfig`] from JSON or YAML, enforces size limits and
//! runs full validation. A configuration that fails any check never
//! reaches an engine.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = ConfigLoader::new().from_path("games/sweet.yaml")?;
//! let engine = TumbleEngine::new(config)?;
//! ```

use std::path::Path;

use crate::config::EngineConfig;
use crate::error::ConfigError;

/// Parsing limits for security
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    pub max_name_length: usize,
    pub max_symbols: usize,
    pub max_columns: u8,
    pub max_rows: u8,
    pub max_bonus_tiers: usize,
    /// Largest bet multiple any single cluster, scatter band or carrier may pay
    pub max_pay_value: f64,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_name_length: 256,
            max_symbols: 50,
            max_columns: 10,
            max_rows: 10,
            max_bonus_tiers: 16,
            max_pay_value: 100_000.0,
        }
    }
}

/// JSON / YAML engine configuration loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    pub limits: ConfigLimits,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with custom limits
    pub fn with_limits(limits: ConfigLimits) -> Self {
        Self { limits }
    }

    pub fn from_json_str(&self, json: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        self.check(config)
    }

    pub fn from_yaml_str(&self, yaml: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        self.check(config)
    }

    /// Load from a file; `.yaml`/`.yml` parse as YAML, anything else as JSON
    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        log::debug!("Loading engine config from {}", path.display());
        if is_yaml {
            self.from_yaml_str(&text)
        } else {
            self.from_json_str(&text)
        }
    }

    /// Serialize a configuration as pretty JSON
    pub fn to_json_string(config: &EngineConfig) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize a configuration as YAML
    pub fn to_yaml_string(config: &EngineConfig) -> Result<String, ConfigError> {
        serde_yml::to_string(config).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn check(&self, config: EngineConfig) -> Result<EngineConfig, ConfigError> {
        self.check_limits(&config)?;
        config.validate()?;
        Ok(config)
    }

    fn check_limits(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        let limits = &self.limits;

        if config.name.len() > limits.max_name_length {
            return Err(ConfigError::LimitExceeded(format!(
                "Game name too long: {} > {}",
                config.name.len(),
                limits.max_name_length
            )));
        }
        if config.catalog.len() > limits.max_symbols {
            return Err(ConfigError::LimitExceeded(format!(
                "Too many symbols: {} > {}",
                config.catalog.len(),
                limits.max_symbols
            )));
        }
        if config.grid.columns > limits.max_columns {
            return Err(ConfigError::LimitExceeded(format!(
                "Too many columns: {} > {}",
                config.grid.columns, limits.max_columns
            )));
        }
        if config.grid.rows > limits.max_rows {
            return Err(ConfigError::LimitExceeded(format!(
                "Too many rows: {} > {}",
                config.grid.rows, limits.max_rows
            )));
        }
        if config.bonus_tiers.len() > limits.max_bonus_tiers {
            return Err(ConfigError::LimitExceeded(format!(
                "Too many bonus tiers: {} > {}",
                config.bonus_tiers.len(),
                limits.max_bonus_tiers
            )));
        }

        let cells = config.grid.total_cells();
        for (symbol, entry) in config.paytable.iter() {
            let max = entry.curve.max_multiplier(cells);
            if max > limits.max_pay_value {
                return Err(ConfigError::LimitExceeded(format!(
                    "{symbol} can pay {max}x > {}x",
                    limits.max_pay_value
                )));
            }
        }
        for def in &config.catalog {
            if def.pay_weight > limits.max_pay_value {
                return Err(ConfigError::LimitExceeded(format!(
                    "{} pay weight {} > {}",
                    def.id, def.pay_weight, limits.max_pay_value
                )));
            }
        }
        if let Some(band) = config
            .scatter_pays
            .iter()
            .find(|t| t.multiplier > limits.max_pay_value)
        {
            return Err(ConfigError::LimitExceeded(format!(
                "Scatter band {} pays {}x > {}x",
                band.min_count, band.multiplier, limits.max_pay_value
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_JSON: &str = r#"{
        "name": "Minimal",
        "grid": { "columns": 6, "rows": 5 },
        "cluster_threshold": 8,
        "catalog": [
            { "id": "A", "role": "standard", "pay_weight": 2.0, "rarity": 10 },
            { "id": "B", "role": "standard", "pay_weight": 1.0, "rarity": 10 },
            { "id": "S", "role": "scatter", "rarity": 1 },
            { "id": "X5", "role": "multiplier_carrier", "pay_weight": 5.0, "rarity": 1 }
        ],
        "paytable": {
            "A": { "min_cluster": 8, "curve": { "type": "linear", "per_unit": 2.0, "bet_divisor": 10.0 } },
            "B": { "min_cluster": 8, "curve": { "type": "tiered", "tiers": [
                { "min_count": 8, "multiplier": 1.0 },
                { "min_count": 12, "multiplier": 5.0 }
            ] } }
        }
    }"#;

    #[test]
    fn test_parse_minimal_json() {
        let config = ConfigLoader::new().from_json_str(MINIMAL_JSON).unwrap();
        assert_eq!(config.catalog.len(), 4);
        assert_eq!(config.free_spins.trigger_count, 4);
        assert!(config.bonus_tiers.is_empty());
        assert_eq!(config.max_cascade_steps(), 30);
    }

    #[test]
    fn test_yaml_round_trip_of_default() {
        let config = EngineConfig::sweet_bonanza();
        let yaml = ConfigLoader::to_yaml_string(&config).unwrap();
        let parsed = ConfigLoader::new().from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_documents_rejected() {
        let loader = ConfigLoader::new();
        assert!(matches!(
            loader.from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));

        let missing_entry = MINIMAL_JSON.replace(r#""B": { "min_cluster": 8"#, r#""C": { "min_cluster": 8"#);
        assert!(loader.from_json_str(&missing_entry).is_err());
    }

    #[test]
    fn test_limits_enforced() {
        let loader = ConfigLoader::with_limits(ConfigLimits {
            max_columns: 5,
            ..ConfigLimits::default()
        });
        assert!(matches!(
            loader.from_json_str(MINIMAL_JSON),
            Err(ConfigError::LimitExceeded(_))
        ));

        let loader = ConfigLoader::with_limits(ConfigLimits {
            max_pay_value: 4.0,
            ..ConfigLimits::default()
        });
        // A pays 30 * 2 / 10 = 6x at most
        assert!(matches!(
            loader.from_json_str(MINIMAL_JSON),
            Err(ConfigError::LimitExceeded(_))
        ));
    }
}
