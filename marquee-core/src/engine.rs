//! Cooperative engine loop
//!
//! One owner for every component plus the collaborators. `tick` is called
//! from the board's main loop; within one tick rotation always runs
//! before any slow poll so a configuration change never lands mid-redraw.

use crate::cache::{Refresh, TimeCache, WeatherCache};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::geo::{GeoOutcome, GeoSync};
use crate::registration::{register_device, RegistrationReport};
use crate::rotation::{AppSequence, RotationController, TickResult};
use crate::settings::{ConfigMirror, Settings, SettingsChanges};
use crate::store::{DevicePaths, RemoteStore};
use crate::sync::{PollReport, RemoteSyncPoller};
use crate::traits::{AppRegistry, FrameContext, GeoLocator, Surface, TimeSource, WeatherSource};

/// What `start` did
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartReport {
    /// `None` if registration is disabled or the store was unreachable
    pub registration: Option<RegistrationReport>,
    /// `None` unless geolocation ran at start and succeeded
    pub geo: Option<GeoOutcome>,
    /// Remote settings were read (defaults are in effect otherwise)
    pub settings_loaded: bool,
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub rotation: TickResult,
    /// `None` when the active app does not read the time cache
    pub time: Option<Result<Refresh, Error>>,
    /// `None` when the active app does not read the weather cache
    pub weather: Option<Result<Refresh, Error>>,
    /// `None` unless a deferred geolocation ran this tick
    pub geo: Option<Result<GeoOutcome, Error>>,
    /// `None` unless the sequence poll was due
    pub poll: Option<Result<PollReport, Error>>,
    /// `None` unless the settings poll was due
    pub settings: Option<Result<SettingsChanges, Error>>,
}

/// The display engine
///
/// - `S`: remote document store
/// - `R`: static app registry
/// - `D`: display surface
/// - `N`: network data sources (time, weather, geolocation)
pub struct Engine<S, R, D, N> {
    config: EngineConfig,
    paths: DevicePaths,
    store: S,
    net: N,
    rotation: RotationController<R, D>,
    poller: RemoteSyncPoller,
    mirror: ConfigMirror,
    time_cache: TimeCache,
    weather_cache: WeatherCache,
    geo: GeoSync,
}

fn frame<'a>(
    now_ms: u64,
    mirror: &'a ConfigMirror,
    time_cache: &'a TimeCache,
    weather_cache: &'a WeatherCache,
) -> FrameContext<'a> {
    FrameContext {
        now_ms,
        settings: mirror.settings(),
        time: time_cache.get(),
        weather: weather_cache.get(),
    }
}

impl<S, R, D, N> Engine<S, R, D, N>
where
    S: RemoteStore,
    R: AppRegistry,
    D: Surface,
    N: TimeSource + WeatherSource + GeoLocator,
{
    pub fn new(
        config: EngineConfig,
        device_id: &str,
        store: S,
        registry: R,
        surface: D,
        net: N,
    ) -> Self {
        let paths = DevicePaths::new(&config.device.root, device_id);
        Self {
            rotation: RotationController::new(registry, surface, config.rotation.clone()),
            poller: RemoteSyncPoller::new(paths.clone(), &config.sync),
            mirror: ConfigMirror::new(config.settings.poll_interval_ms),
            time_cache: TimeCache::new(config.cache.time_ttl_ms),
            weather_cache: WeatherCache::new(config.cache.weather_ttl_ms),
            geo: GeoSync::new(paths.clone(), config.geo),
            paths,
            store,
            net,
            config,
        }
    }

    /// Bring the device up
    ///
    /// Registration, geolocation (if configured for start), the initial
    /// settings load and the first app. Every step tolerates an
    /// unreachable store; the rotation then starts on the fallback app.
    pub fn start(&mut self, now_ms: u64) -> StartReport {
        info!("Starting engine for {}", self.paths.device());
        let mut report = StartReport {
            registration: None,
            geo: None,
            settings_loaded: false,
        };

        if self.config.registration.enabled {
            match register_device(&mut self.store, &self.paths, &self.config.rotation) {
                Ok(registration) => report.registration = Some(registration),
                Err(e) => warn!("Registration skipped: {:?}", e),
            }
        }

        if self.geo.on_start(now_ms) {
            match self.geo.refresh(&mut self.store, &mut self.net) {
                Ok(outcome) => report.geo = Some(outcome),
                Err(e) => warn!("Geolocation at start failed: {:?}", e),
            }
        }

        match self.mirror.load_initial(now_ms, &mut self.store, &self.paths) {
            Ok(_) => report.settings_loaded = true,
            Err(e) => warn!("Using default settings: {:?}", e),
        }
        let brightness = self.mirror.settings().brightness;
        self.rotation.set_brightness(brightness);

        let ctx = frame(now_ms, &self.mirror, &self.time_cache, &self.weather_cache);
        self.rotation
            .initialize(&mut self.poller, &mut self.store, &ctx);

        report
    }

    /// Run one loop iteration
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport::default();

        let ctx = frame(now_ms, &self.mirror, &self.time_cache, &self.weather_cache);
        report.rotation = self.rotation.tick(&ctx);

        let settings: Settings = *self.mirror.settings();
        let feeds = self.rotation.active_feeds();
        if feeds.time {
            report.time = Some(self.time_cache.refresh_if_needed(
                now_ms,
                false,
                settings.location,
                &mut self.net,
            ));
        }
        if feeds.weather {
            report.weather = Some(self.weather_cache.refresh_if_needed(
                now_ms,
                false,
                settings.location,
                settings.units,
                &mut self.net,
                &mut self.rotation,
            ));
        }

        if self.geo.take_due(now_ms) {
            report.geo = Some(self.geo.refresh(&mut self.store, &mut self.net));
        }

        let ctx = frame(now_ms, &self.mirror, &self.time_cache, &self.weather_cache);
        report.poll = self
            .poller
            .poll_if_due(&mut self.store, &mut self.rotation, &ctx);

        report.settings =
            self.mirror
                .poll_if_due(now_ms, &mut self.store, &self.paths, &mut self.rotation);
        if let Some(Ok(changes)) = report.settings {
            self.apply_setting_changes(changes);
        }

        report
    }

    fn apply_setting_changes(&mut self, changes: SettingsChanges) {
        if changes.location {
            debug!("Location changed, forcing cache refresh");
            self.time_cache.request_refresh();
            self.weather_cache.request_refresh();
        } else if changes.units {
            debug!("Units changed, forcing weather refresh");
            self.weather_cache.request_refresh();
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn paths(&self) -> &DevicePaths {
        &self.paths
    }

    /// Current shadow settings
    pub fn settings(&self) -> &Settings {
        self.mirror.settings()
    }

    pub fn sequence(&self) -> &AppSequence {
        self.rotation.sequence()
    }

    pub fn rotation(&self) -> &RotationController<R, D> {
        &self.rotation
    }

    pub fn rotation_mut(&mut self) -> &mut RotationController<R, D> {
        &mut self.rotation
    }

    pub fn poller(&self) -> &RemoteSyncPoller {
        &self.poller
    }

    pub fn time_cache(&self) -> &TimeCache {
        &self.time_cache
    }

    pub fn weather_cache(&self) -> &WeatherCache {
        &self.weather_cache
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn net(&self) -> &N {
        &self.net
    }

    pub fn net_mut(&mut self) -> &mut N {
        &mut self.net
    }
}
