//! Logical document paths for one device
//!
//! ```text
//! {root}/devices/{id}/apps                  map of app id -> entry
//! {root}/devices/{id}/settings/appSequence  ordered array of app ids
//! {root}/devices/{id}/settings/{key}        scalar settings
//! ```

use alloc::format;
use alloc::string::String;

/// Scalar keys under the settings subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingKey {
    Brightness,
    Units,
    TimeFormat,
    Lat,
    Lon,
    /// Human-readable "city,region" label written by geolocation refresh
    WeatherLocation,
    AppSequence,
}

impl SettingKey {
    /// Key name as stored remotely
    pub const fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Brightness => "brightness",
            SettingKey::Units => "units",
            SettingKey::TimeFormat => "timeFormat",
            SettingKey::Lat => "lat",
            SettingKey::Lon => "lon",
            SettingKey::WeatherLocation => "weatherLocation",
            SettingKey::AppSequence => "appSequence",
        }
    }
}

/// Path builder bound to one device id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePaths {
    base: String,
}

impl DevicePaths {
    /// Create paths for `device_id` under the optional `root` prefix
    pub fn new(root: &str, device_id: &str) -> Self {
        let root = root.trim_matches('/');
        let base = if root.is_empty() {
            format!("devices/{}", device_id)
        } else {
            format!("{}/devices/{}", root, device_id)
        };
        Self { base }
    }

    /// Device subtree
    pub fn device(&self) -> &str {
        &self.base
    }

    /// Per-app configuration map
    pub fn apps(&self) -> String {
        format!("{}/apps", self.base)
    }

    /// Configuration entry of a single app
    pub fn app(&self, app_id: &str) -> String {
        format!("{}/apps/{}", self.base, app_id)
    }

    /// Settings subtree
    pub fn settings(&self) -> String {
        format!("{}/settings", self.base)
    }

    /// A single scalar setting
    pub fn setting(&self, key: SettingKey) -> String {
        format!("{}/settings/{}", self.base, key.as_str())
    }

    /// Declared app order
    pub fn app_sequence(&self) -> String {
        self.setting(SettingKey::AppSequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_without_root() {
        let paths = DevicePaths::new("", "A1B2C3");
        assert_eq!(paths.apps(), "devices/A1B2C3/apps");
        assert_eq!(
            paths.app_sequence(),
            "devices/A1B2C3/settings/appSequence"
        );
        assert_eq!(
            paths.setting(SettingKey::TimeFormat),
            "devices/A1B2C3/settings/timeFormat"
        );
    }

    #[test]
    fn test_paths_with_root_trims_slashes() {
        let paths = DevicePaths::new("/frames/", "dev");
        assert_eq!(paths.device(), "frames/devices/dev");
        assert_eq!(paths.app("clock"), "frames/devices/dev/apps/clock");
        assert_eq!(paths.settings(), "frames/devices/dev/settings");
    }
}
