//! Geolocation refresh
//!
//! Looks up the device's public-address location and, if it moved, writes
//! the new coordinates into the settings subtree. The settings mirror
//! picks them up from there like any other remote change.

use alloc::format;
use alloc::string::String;

use serde::Deserialize;

use crate::config::{GeoConfig, GeoRefresh};
use crate::error::Error;
use crate::settings::GeoLocation;
use crate::store::document::{encode_scalar, parse_float};
use crate::store::{DevicePaths, RemoteStore, SettingKey, StoreError};
use crate::traits::GeoLocator;

/// Geolocation answer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoFix {
    pub lat: f32,
    pub lon: f32,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
}

impl GeoFix {
    pub fn location(&self) -> GeoLocation {
        GeoLocation::new(self.lat, self.lon)
    }

    /// `"city,region"` as shown by the weather app
    pub fn label(&self) -> String {
        format!("{},{}", self.city, self.region)
    }
}

/// Parse a geolocation answer; `lat` and `lon` are required
pub fn parse_geo_document(raw: &str) -> Result<GeoFix, Error> {
    Ok(serde_json::from_str(raw)?)
}

/// Result of a geolocation refresh
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeoOutcome {
    /// Within the shift threshold of the stored location
    Unchanged,
    /// New location written to the settings subtree
    Updated(GeoLocation),
}

/// Geolocation refresh scheduling
#[derive(Debug)]
pub struct GeoSync {
    paths: DevicePaths,
    config: GeoConfig,
    due_at_ms: Option<u64>,
}

impl GeoSync {
    pub fn new(paths: DevicePaths, config: GeoConfig) -> Self {
        Self {
            paths,
            config,
            due_at_ms: None,
        }
    }

    /// Arm the schedule; returns whether to refresh right now
    pub fn on_start(&mut self, now_ms: u64) -> bool {
        match self.config.refresh {
            GeoRefresh::AtStart => true,
            GeoRefresh::Deferred => {
                debug!("Geolocation deferred by {} ms", self.config.defer_ms);
                self.due_at_ms = Some(now_ms + self.config.defer_ms as u64);
                false
            }
            GeoRefresh::Disabled => false,
        }
    }

    /// Check and consume a deferred refresh
    pub fn take_due(&mut self, now_ms: u64) -> bool {
        match self.due_at_ms {
            Some(due) if now_ms >= due => {
                self.due_at_ms = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.due_at_ms.is_some()
    }

    /// Query the locator and write back a moved location
    ///
    /// The stored coordinates are read first; an absent pair counts as
    /// unset so the first fix is always written.
    pub fn refresh<S, G>(&self, store: &mut S, locator: &mut G) -> Result<GeoOutcome, Error>
    where
        S: RemoteStore,
        G: GeoLocator + ?Sized,
    {
        let current = GeoLocation::new(
            self.read_coordinate(store, SettingKey::Lat)?.unwrap_or(0.0),
            self.read_coordinate(store, SettingKey::Lon)?.unwrap_or(0.0),
        );

        let raw = locator.locate().map_err(|e| {
            warn!("Geolocation lookup failed: {:?}", e);
            Error::from(e)
        })?;
        let fix = parse_geo_document(&raw)?;
        let location = fix.location();

        if !location.moved_from(current, self.config.min_shift_deg) {
            debug!("Location unchanged, skipping update");
            return Ok(GeoOutcome::Unchanged);
        }

        info!(
            "Location moved to ({}, {}), updating settings",
            location.lat, location.lon
        );
        self.write(store, SettingKey::WeatherLocation, &fix.label())?;
        self.write(store, SettingKey::Lat, &fix.lat)?;
        self.write(store, SettingKey::Lon, &fix.lon)?;
        Ok(GeoOutcome::Updated(location))
    }

    fn read_coordinate<S: RemoteStore>(
        &self,
        store: &mut S,
        key: SettingKey,
    ) -> Result<Option<f32>, Error> {
        match store.get(&self.paths.setting(key)) {
            Ok(raw) => Ok(parse_float(&raw).unwrap_or(None)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write<S, T>(&self, store: &mut S, key: SettingKey, value: &T) -> Result<(), Error>
    where
        S: RemoteStore,
        T: serde::Serialize,
    {
        let body = encode_scalar(value)?;
        store.set(&self.paths.setting(key), &body).map_err(|e| {
            error!("Failed to write {}: {:?}", key.as_str(), e);
            Error::from(e)
        })
    }
}
