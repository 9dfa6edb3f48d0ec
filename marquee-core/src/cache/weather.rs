//! Weather cache
//!
//! Current conditions plus a short daily forecast, parsed from one
//! weather source answer.

use serde_json::Value;
use time::OffsetDateTime;

use crate::error::Error;
use crate::rotation::RotationController;
use crate::settings::{GeoLocation, Units};
use crate::traits::{AppRegistry, Surface, WeatherSource};

use super::time::weekday_abbrev;
use super::ttl::{Refresh, TtlCache};

/// Id of the app that shows forecast content
pub const FORECAST_APP_ID: &str = "forecast";

/// Forecast days kept from the daily list
pub const MAX_FORECAST_DAYS: usize = 2;

/// Weather icon code, e.g. `"10d"`
pub type IconCode = heapless::String<4>;

/// One forecast column
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ForecastDay {
    /// Three-letter day name in the reported timezone
    pub day: &'static str,
    pub high: i16,
    pub low: i16,
    pub icon: IconCode,
}

/// Parsed weather answer, temperatures in whole degrees
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeatherReport {
    pub temp: i16,
    pub feels_like: i16,
    pub high: i16,
    pub low: i16,
    pub city: heapless::String<32>,
    pub icon: IconCode,
    pub forecast: heapless::Vec<ForecastDay, MAX_FORECAST_DAYS>,
}

/// Parse a weather source answer
///
/// `main.temp` is required; the other current readings default to it.
/// Daily entries without a timestamp or temperatures are skipped.
pub fn parse_weather_document(raw: &str) -> Result<WeatherReport, Error> {
    let doc: Value = serde_json::from_str(raw)?;

    let main = &doc["main"];
    let temp = number(&main["temp"]).ok_or(Error::MalformedDocument)?;
    let feels_like = number(&main["feels_like"]).unwrap_or(temp);
    let high = number(&main["temp_max"]).unwrap_or(temp);
    let low = number(&main["temp_min"]).unwrap_or(temp);

    let offset_s = doc["timezone"].as_i64().unwrap_or(0);
    let mut forecast = heapless::Vec::new();
    if let Some(daily) = doc["daily"].as_array() {
        for entry in daily.iter().filter_map(|entry| forecast_day(entry, offset_s)) {
            if forecast.push(entry).is_err() {
                break;
            }
        }
    }

    Ok(WeatherReport {
        temp: whole_degrees(temp),
        feels_like: whole_degrees(feels_like),
        high: whole_degrees(high),
        low: whole_degrees(low),
        city: truncated(doc["name"].as_str().unwrap_or("")),
        icon: truncated(doc["weather"][0]["icon"].as_str().unwrap_or("")),
        forecast,
    })
}

fn forecast_day(entry: &Value, offset_s: i64) -> Option<ForecastDay> {
    let dt = entry["dt"].as_i64()?;
    let local = OffsetDateTime::from_unix_timestamp(dt.checked_add(offset_s)?).ok()?;
    Some(ForecastDay {
        day: weekday_abbrev(local.weekday()),
        high: whole_degrees(number(&entry["temp"]["max"])?),
        low: whole_degrees(number(&entry["temp"]["min"])?),
        icon: truncated(entry["weather"][0]["icon"].as_str().unwrap_or("")),
    })
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn whole_degrees(value: f64) -> i16 {
    libm::round(value) as i16
}

/// Copy as many whole characters as fit
fn truncated<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Cache of the latest weather report
#[derive(Debug, Clone)]
pub struct WeatherCache {
    cache: TtlCache<WeatherReport>,
}

impl WeatherCache {
    pub const fn new(ttl_ms: u32) -> Self {
        Self {
            cache: TtlCache::new(ttl_ms),
        }
    }

    pub fn get(&self) -> Option<&WeatherReport> {
        self.cache.get()
    }

    pub fn inner(&self) -> &TtlCache<WeatherReport> {
        &self.cache
    }

    pub fn request_refresh(&mut self) {
        self.cache.request_refresh();
    }

    /// Refresh the report if forced or stale
    ///
    /// Skipped entirely while `location` is unset. After a successful
    /// refresh the forecast app, if visible, is marked dirty.
    pub fn refresh_if_needed<W, R, D>(
        &mut self,
        now_ms: u64,
        forced: bool,
        location: GeoLocation,
        units: Units,
        source: &mut W,
        rotation: &mut RotationController<R, D>,
    ) -> Result<Refresh, Error>
    where
        W: WeatherSource + ?Sized,
        R: AppRegistry,
        D: Surface,
    {
        if !location.is_set() {
            trace!("Location unset, skipping weather refresh");
            return Ok(Refresh::Skipped);
        }

        let result = self.cache.refresh_if_needed(now_ms, forced, || {
            let raw = source.fetch_weather(location, units)?;
            parse_weather_document(&raw)
        });

        match result {
            Ok(Refresh::Refreshed) => {
                debug!("Weather cache refreshed");
                if rotation.active_id() == FORECAST_APP_ID && rotation.mark_active_dirty() {
                    debug!("Forecast app notified");
                }
            }
            Err(e) => warn!("Weather refresh failed: {:?}", e),
            _ => {}
        }
        result
    }
}
