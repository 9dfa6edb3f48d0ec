//! Configuration type definitions

use alloc::string::String;

use serde::Deserialize;

use crate::rotation::AppId;

/// Default app shown when the remote sequence is unusable
pub const DEFAULT_APP: &str = "clock";

/// Default dwell time per app (ms)
pub const DEFAULT_DWELL_MS: u32 = 10_000;

/// Document tree location of this device
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Prefix in front of `devices/{id}`, empty for the store root
    pub root: String,
}

/// Rotation defaults
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct RotationConfig {
    /// App id used for the single-entry fallback sequence
    pub default_app: AppId,
    /// Dwell applied when an app entry has none (ms)
    pub default_dwell_ms: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        let mut default_app = AppId::new();
        // DEFAULT_APP fits in AppId
        let _ = default_app.push_str(DEFAULT_APP);
        Self {
            default_app,
            default_dwell_ms: DEFAULT_DWELL_MS,
        }
    }
}

/// App sequence poll timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct SyncConfig {
    /// Poll interval while healthy (ms)
    pub base_interval_ms: u32,
    /// Backoff ceiling (ms)
    pub max_interval_ms: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 10_000,
            max_interval_ms: 300_000,
        }
    }
}

/// Settings poll timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct SettingsConfig {
    pub poll_interval_ms: u32,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
        }
    }
}

/// Cache lifetimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct CacheConfig {
    /// Time anchor lifetime (ms)
    pub time_ttl_ms: u32,
    /// Weather report lifetime (ms)
    pub weather_ttl_ms: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            time_ttl_ms: 6 * 60 * 60 * 1000,
            weather_ttl_ms: 10 * 60 * 1000,
        }
    }
}

/// When to query IP geolocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "kebab-case")]
pub enum GeoRefresh {
    /// During engine start, before the first app loads
    #[default]
    AtStart,
    /// Once, `defer_ms` after start
    Deferred,
    /// Never; location comes only from the settings subtree
    Disabled,
}

/// Geolocation refresh
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct GeoConfig {
    pub refresh: GeoRefresh,
    /// Delay for [`GeoRefresh::Deferred`] (ms)
    pub defer_ms: u32,
    /// Smallest coordinate change worth writing back (degrees)
    pub min_shift_deg: f32,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            refresh: GeoRefresh::AtStart,
            defer_ms: 60_000,
            min_shift_deg: 0.01,
        }
    }
}

/// First-boot registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct RegistrationConfig {
    pub enabled: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub device: DeviceConfig,
    pub rotation: RotationConfig,
    pub sync: SyncConfig,
    pub settings: SettingsConfig,
    pub cache: CacheConfig,
    pub geo: GeoConfig,
    pub registration: RegistrationConfig,
}
