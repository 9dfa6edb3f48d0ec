//! Settings mirror
//!
//! Polls the scalar settings on its own slow timer and keeps a shadow
//! copy. Writes to the shadow come only from a poll or from defaults
//! applied once at startup when a remote value is absent.

use alloc::string::String;

use crate::error::Error;
use crate::rotation::RotationController;
use crate::store::document::{encode_scalar, parse_float, parse_int, parse_string};
use crate::store::{DevicePaths, RemoteStore, SettingKey, StoreError};
use crate::traits::{AppRegistry, Surface};

use super::types::{clamp_brightness, GeoLocation, Settings, TimeFormat, Units};

/// Which shadow values changed during a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SettingsChanges {
    pub brightness: bool,
    pub units: bool,
    pub time_format: bool,
    pub location: bool,
}

impl SettingsChanges {
    /// Check if anything changed
    pub fn any(&self) -> bool {
        self.brightness || self.units || self.time_format || self.location
    }

    /// Check if the visible app must redraw
    pub fn affects_rendering(&self) -> bool {
        self.units || self.time_format
    }
}

/// Raw values read in one pass; `None` means absent or unusable
#[derive(Debug, Default)]
struct RemoteSnapshot {
    brightness: Option<i64>,
    units: Option<String>,
    time_format: Option<i64>,
    lat: Option<f32>,
    lon: Option<f32>,
}

/// Shadow copy of the remote settings subtree
#[derive(Debug)]
pub struct ConfigMirror {
    shadow: Settings,
    poll_interval_ms: u64,
    next_poll_at_ms: u64,
}

impl ConfigMirror {
    /// Create a mirror holding device defaults
    pub fn new(poll_interval_ms: u32) -> Self {
        Self {
            shadow: Settings::default(),
            poll_interval_ms: poll_interval_ms as u64,
            next_poll_at_ms: 0,
        }
    }

    /// Current shadow values
    pub fn settings(&self) -> &Settings {
        &self.shadow
    }

    /// Check whether the poll timer has elapsed
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_poll_at_ms
    }

    /// Load all settings once at startup
    ///
    /// Absent brightness, units and time format are replaced by device
    /// defaults and the defaults are written back so the remote subtree is
    /// complete. Location is never defaulted remotely.
    pub fn load_initial<S: RemoteStore>(
        &mut self,
        now_ms: u64,
        store: &mut S,
        paths: &DevicePaths,
    ) -> Result<Settings, Error> {
        self.next_poll_at_ms = now_ms + self.poll_interval_ms;

        let snapshot = read_snapshot(store, paths)?;

        match snapshot.brightness {
            Some(raw) => self.shadow.brightness = clamp_brightness(raw),
            None => {
                info!("Brightness not set, defaulting to {}", self.shadow.brightness);
                write_default(store, paths, SettingKey::Brightness, &self.shadow.brightness);
            }
        }

        match snapshot.units.as_deref().and_then(Units::from_remote) {
            Some(units) => self.shadow.units = units,
            None => {
                info!("Units not set, defaulting to {}", self.shadow.units.as_str());
                write_default(store, paths, SettingKey::Units, &self.shadow.units);
            }
        }

        match snapshot.time_format {
            Some(code) => self.shadow.time_format = TimeFormat::from_code(code),
            None => {
                info!(
                    "Time format not set, defaulting to {}",
                    self.shadow.time_format.code()
                );
                write_default(
                    store,
                    paths,
                    SettingKey::TimeFormat,
                    &self.shadow.time_format.code(),
                );
            }
        }

        if let (Some(lat), Some(lon)) = (snapshot.lat, snapshot.lon) {
            self.shadow.location = GeoLocation::new(lat, lon);
        }

        Ok(self.shadow)
    }

    /// Poll if the timer has elapsed
    pub fn poll_if_due<S, R, D>(
        &mut self,
        now_ms: u64,
        store: &mut S,
        paths: &DevicePaths,
        rotation: &mut RotationController<R, D>,
    ) -> Option<Result<SettingsChanges, Error>>
    where
        S: RemoteStore,
        R: AppRegistry,
        D: Surface,
    {
        if !self.is_due(now_ms) {
            return None;
        }
        self.next_poll_at_ms = now_ms + self.poll_interval_ms;
        Some(self.poll_once(store, paths, rotation))
    }

    /// Re-read every scalar and fold differences into the shadow
    ///
    /// An unreachable store leaves the shadow untouched. A time format or
    /// units change marks the active app dirty; a brightness change is
    /// pushed to the surface.
    pub fn poll_once<S, R, D>(
        &mut self,
        store: &mut S,
        paths: &DevicePaths,
        rotation: &mut RotationController<R, D>,
    ) -> Result<SettingsChanges, Error>
    where
        S: RemoteStore,
        R: AppRegistry,
        D: Surface,
    {
        let snapshot = match read_snapshot(store, paths) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Settings poll failed: {:?}", e);
                return Err(e);
            }
        };

        let changes = self.apply(&snapshot);

        if changes.affects_rendering() && rotation.mark_active_dirty() {
            debug!("Active app marked dirty after settings change");
        }
        if changes.brightness {
            rotation.set_brightness(self.shadow.brightness);
        }

        Ok(changes)
    }

    fn apply(&mut self, snapshot: &RemoteSnapshot) -> SettingsChanges {
        let mut changes = SettingsChanges::default();

        if let Some(raw) = snapshot.brightness {
            let brightness = clamp_brightness(raw);
            if brightness != self.shadow.brightness {
                info!("Brightness updated to {}", brightness);
                self.shadow.brightness = brightness;
                changes.brightness = true;
            }
        }

        if let Some(raw) = snapshot.units.as_deref() {
            match Units::from_remote(raw) {
                Some(units) if units != self.shadow.units => {
                    info!("Units updated to {}", units.as_str());
                    self.shadow.units = units;
                    changes.units = true;
                }
                Some(_) => {}
                None => warn!("Ignoring unknown unit system: {}", raw),
            }
        }

        if let Some(code) = snapshot.time_format {
            let format = TimeFormat::from_code(code);
            if format != self.shadow.time_format {
                info!("Time format updated to {}", format.code());
                self.shadow.time_format = format;
                changes.time_format = true;
            }
        }

        if let (Some(lat), Some(lon)) = (snapshot.lat, snapshot.lon) {
            let location = GeoLocation::new(lat, lon);
            if location != self.shadow.location {
                info!("Location updated to ({}, {})", lat, lon);
                self.shadow.location = location;
                changes.location = true;
            }
        }

        changes
    }
}

fn read_snapshot<S: RemoteStore>(
    store: &mut S,
    paths: &DevicePaths,
) -> Result<RemoteSnapshot, Error> {
    Ok(RemoteSnapshot {
        brightness: read_scalar(store, paths, SettingKey::Brightness, parse_int)?,
        units: read_scalar(store, paths, SettingKey::Units, parse_string)?,
        time_format: read_scalar(store, paths, SettingKey::TimeFormat, parse_int)?,
        lat: read_scalar(store, paths, SettingKey::Lat, parse_float)?,
        lon: read_scalar(store, paths, SettingKey::Lon, parse_float)?,
    })
}

/// Read one scalar; absence and malformed values both read as `None`
fn read_scalar<S, T>(
    store: &mut S,
    paths: &DevicePaths,
    key: SettingKey,
    parse: fn(&str) -> Result<Option<T>, Error>,
) -> Result<Option<T>, Error>
where
    S: RemoteStore,
{
    match store.get(&paths.setting(key)) {
        Ok(raw) => match parse(&raw) {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!("Ignoring malformed setting: {}", key.as_str());
                Ok(None)
            }
        },
        Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_default<S, T>(store: &mut S, paths: &DevicePaths, key: SettingKey, value: &T)
where
    S: RemoteStore,
    T: serde::Serialize,
{
    let result = encode_scalar(value)
        .and_then(|body| store.set(&paths.setting(key), &body).map_err(Error::from));
    if let Err(e) = result {
        warn!("Failed to write default {}: {:?}", key.as_str(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::tests::{controller, TestApp};
    use crate::store::MemoryStore;

    fn paths() -> DevicePaths {
        DevicePaths::new("", "dev")
    }

    #[test]
    fn test_initial_load_writes_missing_defaults() {
        let mut store = MemoryStore::new().with("devices/dev/settings/units", "\"imperial\"");
        let mut mirror = ConfigMirror::new(30_000);

        let settings = mirror.load_initial(0, &mut store, &paths()).unwrap();

        assert_eq!(settings.units, Units::Imperial);
        assert_eq!(settings.brightness, 7);
        assert_eq!(settings.time_format, TimeFormat::TwelveHourWithSuffix);
        assert!(!settings.location.is_set());
        assert_eq!(store.document("devices/dev/settings/brightness"), Some("7"));
        assert_eq!(store.document("devices/dev/settings/timeFormat"), Some("1"));
        assert_eq!(store.document("devices/dev/settings/lat"), None);
        assert_eq!(store.writes().len(), 2);
    }

    #[test]
    fn test_initial_load_unreachable_keeps_defaults() {
        let mut store = MemoryStore::new();
        store.set_unreachable(true);
        let mut mirror = ConfigMirror::new(30_000);

        assert_eq!(
            mirror.load_initial(0, &mut store, &paths()),
            Err(Error::Unreachable)
        );
        assert_eq!(*mirror.settings(), Settings::default());
    }

    #[test]
    fn test_time_format_change_marks_active_app_dirty() {
        let mut store = MemoryStore::new()
            .with("devices/dev/settings/brightness", "7")
            .with("devices/dev/settings/units", "\"metric\"")
            .with("devices/dev/settings/timeFormat", "1");
        let mut mirror = ConfigMirror::new(30_000);
        mirror.load_initial(0, &mut store, &paths()).unwrap();

        let mut rotation = controller(&[TestApp::new("clock")]);
        rotation.start_with(&["clock"], 0);
        rotation.active_app().unwrap().set_dirty(false);

        store.insert("devices/dev/settings/timeFormat", "2");
        let changes = mirror.poll_once(&mut store, &paths(), &mut rotation).unwrap();

        assert!(changes.time_format);
        assert!(!changes.brightness);
        assert_eq!(mirror.settings().time_format, TimeFormat::TwentyFourHour);
        assert!(rotation.active_app().unwrap().is_dirty());
    }

    #[test]
    fn test_brightness_change_reaches_surface() {
        let mut store = MemoryStore::new()
            .with("devices/dev/settings/brightness", "7")
            .with("devices/dev/settings/units", "\"metric\"")
            .with("devices/dev/settings/timeFormat", "1");
        let mut mirror = ConfigMirror::new(30_000);
        mirror.load_initial(0, &mut store, &paths()).unwrap();
        let mut rotation = controller(&[TestApp::new("clock")]);
        rotation.start_with(&["clock"], 0);

        store.insert("devices/dev/settings/brightness", "12");
        let changes = mirror.poll_once(&mut store, &paths(), &mut rotation).unwrap();

        assert!(changes.brightness);
        assert!(!changes.affects_rendering());
        assert_eq!(mirror.settings().brightness, 10);
        assert_eq!(rotation.surface().brightness, 10);
    }

    #[test]
    fn test_poll_unreachable_leaves_shadow() {
        let mut store = MemoryStore::new()
            .with("devices/dev/settings/lat", "43.65")
            .with("devices/dev/settings/lon", "-79.38");
        let mut mirror = ConfigMirror::new(30_000);
        mirror.load_initial(0, &mut store, &paths()).unwrap();
        let before = *mirror.settings();
        let mut rotation = controller(&[TestApp::new("clock")]);

        store.set_unreachable(true);
        assert!(mirror.poll_once(&mut store, &paths(), &mut rotation).is_err());
        assert_eq!(*mirror.settings(), before);
    }

    #[test]
    fn test_location_change_detected() {
        let mut store = MemoryStore::new();
        let mut mirror = ConfigMirror::new(30_000);
        mirror.load_initial(0, &mut store, &paths()).unwrap();
        let mut rotation = controller(&[TestApp::new("clock")]);

        store.insert("devices/dev/settings/lat", "51.5");
        store.insert("devices/dev/settings/lon", "\"-0.12\"");
        let changes = mirror.poll_once(&mut store, &paths(), &mut rotation).unwrap();

        assert!(changes.location);
        assert_eq!(mirror.settings().location, GeoLocation::new(51.5, -0.12));
    }

    #[test]
    fn test_poll_timer() {
        let mut store = MemoryStore::new();
        let mut mirror = ConfigMirror::new(30_000);
        mirror.load_initial(1_000, &mut store, &paths()).unwrap();
        let mut rotation = controller(&[TestApp::new("clock")]);

        assert!(mirror
            .poll_if_due(30_999, &mut store, &paths(), &mut rotation)
            .is_none());
        assert!(mirror
            .poll_if_due(31_000, &mut store, &paths(), &mut rotation)
            .is_some());
        assert!(!mirror.is_due(31_001));
    }
}
