//! Setting value types

use serde::{Deserialize, Serialize};

/// Lowest brightness level
pub const MIN_BRIGHTNESS: u8 = 1;

/// Highest brightness level
pub const MAX_BRIGHTNESS: u8 = 10;

/// Brightness applied when none is stored remotely
pub const DEFAULT_BRIGHTNESS: u8 = 7;

/// Clamp a remote brightness value into the panel's range
pub fn clamp_brightness(raw: i64) -> u8 {
    raw.clamp(MIN_BRIGHTNESS as i64, MAX_BRIGHTNESS as i64) as u8
}

/// Unit system for temperatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Remote and weather-query spelling
    pub const fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    /// Parse the remote spelling; unknown values yield `None`
    pub fn from_remote(value: &str) -> Option<Self> {
        match value.trim() {
            "metric" => Some(Units::Metric),
            "imperial" => Some(Units::Imperial),
            _ => None,
        }
    }

    /// Temperature unit letter
    pub const fn temperature_letter(&self) -> char {
        match self {
            Units::Metric => 'C',
            Units::Imperial => 'F',
        }
    }
}

/// Clock display preference
///
/// Stored remotely as an integer code 0-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeFormat {
    /// 12-hour, no AM/PM suffix
    TwelveHour,
    /// 12-hour with AM/PM suffix
    #[default]
    TwelveHourWithSuffix,
    /// 24-hour
    TwentyFourHour,
}

impl TimeFormat {
    /// Map a remote code, clamping out-of-range values into 0-2
    pub fn from_code(code: i64) -> Self {
        match code.clamp(0, 2) {
            0 => TimeFormat::TwelveHour,
            1 => TimeFormat::TwelveHourWithSuffix,
            _ => TimeFormat::TwentyFourHour,
        }
    }

    /// Remote code
    pub const fn code(&self) -> u8 {
        match self {
            TimeFormat::TwelveHour => 0,
            TimeFormat::TwelveHourWithSuffix => 1,
            TimeFormat::TwentyFourHour => 2,
        }
    }
}

/// Device location in decimal degrees
///
/// `(0, 0)` means "not yet known"; location-dependent fetches are skipped
/// until it is set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeoLocation {
    pub lat: f32,
    pub lon: f32,
}

impl GeoLocation {
    /// Location placeholder before the first fix
    pub const UNSET: GeoLocation = GeoLocation { lat: 0.0, lon: 0.0 };

    pub const fn new(lat: f32, lon: f32) -> Self {
        Self { lat, lon }
    }

    /// Check whether a real location is known
    pub fn is_set(&self) -> bool {
        self.lat != 0.0 || self.lon != 0.0
    }

    /// Check whether either coordinate differs from `other` by more than
    /// `threshold_deg`
    pub fn moved_from(&self, other: GeoLocation, threshold_deg: f32) -> bool {
        libm::fabsf(self.lat - other.lat) > threshold_deg
            || libm::fabsf(self.lon - other.lon) > threshold_deg
    }
}

/// Shadow copy of the remote settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Panel brightness, 1-10
    pub brightness: u8,
    pub units: Units,
    pub time_format: TimeFormat,
    pub location: GeoLocation,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            units: Units::Metric,
            time_format: TimeFormat::TwelveHourWithSuffix,
            location: GeoLocation::UNSET,
        }
    }
}
