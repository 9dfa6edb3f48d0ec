//! External data sources
//!
//! Blocking HTTP-like endpoints returning raw JSON text. Transport,
//! TLS and API keys live behind these traits; parsing happens in the
//! cache modules.

use crate::settings::{GeoLocation, Units};
use alloc::string::String;

/// Source fetch errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceError {
    /// No answer within the transport timeout
    Unreachable,
    /// Endpoint answered with a non-success status
    Status(u16),
}

/// Timezone-aware wall-clock source for a location
pub trait TimeSource {
    /// Fetch the time document for `location`
    fn fetch_time(&mut self, location: GeoLocation) -> Result<String, SourceError>;
}

/// Current conditions plus daily forecast for a location
pub trait WeatherSource {
    /// Fetch the weather document for `location` in `units`
    fn fetch_weather(&mut self, location: GeoLocation, units: Units)
        -> Result<String, SourceError>;
}

/// IP-based geolocation
pub trait GeoLocator {
    /// Fetch the geolocation document for the device's public address
    fn locate(&mut self) -> Result<String, SourceError>;
}
