//! TOML loading and validation

use super::types::EngineConfig;

/// Configuration loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Document is not valid TOML or has the wrong shape
    Toml,
    /// A value is out of range
    Invalid(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::Toml => f.write_str("invalid TOML configuration"),
            ConfigError::Invalid(field) => write!(f, "invalid configuration value: {}", field),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    ///
    /// Missing tables and keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text).map_err(|_| {
            warn!("Failed to parse engine configuration");
            ConfigError::Toml
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation.default_app.is_empty() {
            return Err(ConfigError::Invalid("rotation.default_app"));
        }
        if self.rotation.default_dwell_ms == 0 {
            return Err(ConfigError::Invalid("rotation.default_dwell_ms"));
        }
        if self.sync.base_interval_ms == 0 {
            return Err(ConfigError::Invalid("sync.base_interval_ms"));
        }
        if self.sync.max_interval_ms < self.sync.base_interval_ms {
            return Err(ConfigError::Invalid("sync.max_interval_ms"));
        }
        if self.settings.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("settings.poll_interval_ms"));
        }
        if self.cache.time_ttl_ms == 0 {
            return Err(ConfigError::Invalid("cache.time_ttl_ms"));
        }
        if self.cache.weather_ttl_ms == 0 {
            return Err(ConfigError::Invalid("cache.weather_ttl_ms"));
        }
        if self.geo.min_shift_deg.is_nan() || self.geo.min_shift_deg < 0.0 {
            return Err(ConfigError::Invalid("geo.min_shift_deg"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeoRefresh;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.rotation.default_app.as_str(), "clock");
        assert_eq!(config.rotation.default_dwell_ms, 10_000);
        assert_eq!(config.sync.max_interval_ms, 300_000);
        assert_eq!(config.cache.time_ttl_ms, 21_600_000);
        assert!(config.registration.enabled);
    }

    #[test]
    fn test_parse_full_document() {
        let text = r#"
            [device]
            root = "novaFrame"

            [rotation]
            default_app = "weather"
            default_dwell_ms = 15000

            [sync]
            base_interval_ms = 5000
            max_interval_ms = 60000

            [geo]
            refresh = "deferred"
            defer_ms = 120000
        "#;
        let config = EngineConfig::from_toml(text).unwrap();
        assert_eq!(config.device.root, "novaFrame");
        assert_eq!(config.rotation.default_app.as_str(), "weather");
        assert_eq!(config.rotation.default_dwell_ms, 15_000);
        assert_eq!(config.sync.base_interval_ms, 5_000);
        assert_eq!(config.geo.refresh, GeoRefresh::Deferred);
        assert_eq!(config.geo.defer_ms, 120_000);
        assert_eq!(config.settings.poll_interval_ms, 30_000);
    }

    #[test]
    fn test_ceiling_below_base_rejected() {
        let text = "[sync]\nbase_interval_ms = 10000\nmax_interval_ms = 500\n";
        assert_eq!(
            EngineConfig::from_toml(text),
            Err(ConfigError::Invalid("sync.max_interval_ms"))
        );
    }

    #[test]
    fn test_bad_values_rejected() {
        assert_eq!(
            EngineConfig::from_toml("[rotation]\ndefault_app = \"\"\n"),
            Err(ConfigError::Invalid("rotation.default_app"))
        );
        assert_eq!(
            EngineConfig::from_toml("[geo]\nrefresh = \"hourly\"\n"),
            Err(ConfigError::Toml)
        );
        assert_eq!(
            EngineConfig::from_toml("[rotation]\ndefault_app = \"an-app-id-that-is-far-too-long\"\n"),
            Err(ConfigError::Toml)
        );
    }
}
