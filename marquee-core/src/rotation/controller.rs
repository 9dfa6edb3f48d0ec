//! Rotation controller
//!
//! Owns the ordered app list, the active index and the dwell timer, and
//! is the only component that touches the display surface.

use crate::config::RotationConfig;
use crate::store::RemoteStore;
use crate::sync::RemoteSyncPoller;
use crate::traits::{App, AppRegistry, Feeds, FrameContext, Surface};

use super::sequence::{AppDescriptor, AppId, AppSequence};

/// Rotation position
///
/// `active_index` is always a valid index into `sequence`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotationState {
    pub sequence: AppSequence,
    pub active_index: usize,
    /// Monotonic time of the last app switch (ms)
    pub last_switch_at_ms: u64,
}

/// What one rotation tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickResult {
    /// Rotation advanced to the next app
    pub switched: bool,
    /// Active app was redrawn
    pub redrawn: bool,
    /// Active app is not in the registry; nothing was rendered
    pub missing_app: bool,
}

/// Rotation controller
pub struct RotationController<R, D> {
    registry: R,
    surface: D,
    rules: RotationConfig,
    state: RotationState,
    /// Set once the active app has been loaded onto the surface
    loaded: bool,
}

impl<R: AppRegistry, D: Surface> RotationController<R, D> {
    /// Create a controller showing the fallback sequence
    ///
    /// Nothing is loaded until [`initialize`](Self::initialize).
    pub fn new(registry: R, surface: D, rules: RotationConfig) -> Self {
        let sequence = AppSequence::fallback(&rules);
        Self {
            registry,
            surface,
            rules,
            state: RotationState {
                sequence,
                active_index: 0,
                last_switch_at_ms: 0,
            },
            loaded: false,
        }
    }

    /// Fetch the initial sequence and load its first app
    ///
    /// Any failure to reach or parse the remote sequence leaves the
    /// single-app fallback in place.
    pub fn initialize<S: RemoteStore>(
        &mut self,
        poller: &mut RemoteSyncPoller,
        store: &mut S,
        ctx: &FrameContext<'_>,
    ) -> &AppSequence {
        let sequence = match poller.fetch_initial(ctx.now_ms, store, &self.registry, &self.rules) {
            Ok(validated) => validated.sequence,
            Err(e) => {
                warn!("Initial sequence unavailable: {:?}", e);
                AppSequence::fallback(&self.rules)
            }
        };

        info!("Starting rotation with {} apps", sequence.len());
        self.install(sequence, ctx);
        &self.state.sequence
    }

    /// Advance the dwell timer, run the active app and redraw if dirty
    ///
    /// `ctx.now_ms` is the tick time.
    pub fn tick(&mut self, ctx: &FrameContext<'_>) -> TickResult {
        let now_ms = ctx.now_ms;
        let mut result = TickResult::default();

        if !self.loaded {
            self.load_active(ctx);
        }

        if self.state.sequence.len() >= 2 {
            let dwell = self.active_descriptor().dwell_duration_ms as u64;
            if now_ms.saturating_sub(self.state.last_switch_at_ms) >= dwell {
                self.state.active_index = (self.state.active_index + 1) % self.state.sequence.len();
                self.state.last_switch_at_ms = now_ms;
                info!("Switching to {}", self.active_descriptor().id.as_str());
                self.load_active(ctx);
                result.switched = true;
            }
        }

        let id = self.state.active_id();
        let Some(app) = self.registry.app_mut(&id) else {
            error!("No active app for {}", id.as_str());
            result.missing_app = true;
            return result;
        };

        app.run_frame(ctx);

        if app.is_dirty() {
            if let Err(e) = app.redraw(&mut self.surface, ctx, result.switched, 0) {
                warn!("Redraw of {} failed: {:?}", id.as_str(), e);
            }
            app.set_dirty(false);
            if let Err(e) = self.surface.flush() {
                warn!("Surface flush failed: {:?}", e);
            }
            result.redrawn = true;
        }

        result
    }

    /// Adopt a new sequence
    ///
    /// The index returns to 0, the first app is reloaded and the dwell
    /// timer restarts. An identical sequence with its app already loaded is
    /// a no-op. Returns whether anything changed.
    pub fn apply_sequence(&mut self, sequence: AppSequence, ctx: &FrameContext<'_>) -> bool {
        if self.loaded && sequence == self.state.sequence {
            debug!("Sequence unchanged, keeping rotation");
            return false;
        }
        info!("Applying new sequence with {} apps", sequence.len());
        self.install(sequence, ctx);
        true
    }

    fn install(&mut self, sequence: AppSequence, ctx: &FrameContext<'_>) {
        // index and sequence are replaced together
        self.state.sequence = sequence;
        self.state.active_index = 0;
        self.state.last_switch_at_ms = ctx.now_ms;
        self.load_active(ctx);
    }

    /// Clear the surface and hand it to the active app
    ///
    /// An unregistered app leaves the surface showing the last good frame.
    fn load_active(&mut self, ctx: &FrameContext<'_>) {
        let id = self.state.active_id();
        let Some(app) = self.registry.app_mut(&id) else {
            error!("App {} is not registered", id.as_str());
            self.loaded = false;
            return;
        };

        if let Err(e) = self.surface.clear().and_then(|_| self.surface.flush()) {
            warn!("Surface clear failed: {:?}", e);
        }
        app.init(ctx);
        app.set_dirty(true);
        self.loaded = true;
    }

    /// Mutable access to the visible app, for dirty-flag notifications
    pub fn active_app(&mut self) -> Option<&mut dyn App> {
        let id = self.state.active_id();
        self.registry.app_mut(&id)
    }

    /// Id of the visible app
    pub fn active_id(&self) -> &str {
        self.active_descriptor().id.as_str()
    }

    /// Caches the visible app reads
    pub fn active_feeds(&mut self) -> Feeds {
        self.active_app().map(|app| app.feeds()).unwrap_or(Feeds::NONE)
    }

    /// Request a redraw of the visible app; returns whether one exists
    pub fn mark_active_dirty(&mut self) -> bool {
        match self.active_app() {
            Some(app) => {
                app.set_dirty(true);
                true
            }
            None => false,
        }
    }

    /// Apply a brightness level and redraw the visible app
    pub fn set_brightness(&mut self, level: u8) {
        if let Err(e) = self.surface.set_brightness(level) {
            warn!("Failed to set brightness: {:?}", e);
        }
        self.mark_active_dirty();
    }

    fn active_descriptor(&self) -> &AppDescriptor {
        self.state.active()
    }

    pub fn sequence(&self) -> &AppSequence {
        &self.state.sequence
    }

    pub fn active_index(&self) -> usize {
        self.state.active_index
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn rules(&self) -> &RotationConfig {
        &self.rules
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }
}

impl RotationState {
    fn active(&self) -> &AppDescriptor {
        self.sequence.at(self.active_index)
    }

    fn active_id(&self) -> AppId {
        self.active().id.clone()
    }
}


#[cfg(test)]
mod rotation_proptests {
    use super::super::tests::{controller, frame, sequence_of, TestApp};
    use crate::settings::Settings;
    use proptest::prelude::*;

    const IDS: [&str; 4] = ["clock", "weather", "forecast", "ghost"];

    #[derive(Debug, Clone)]
    enum Op {
        Tick(u64),
        Apply(alloc::vec::Vec<usize>),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..30_000).prop_map(Op::Tick),
            proptest::collection::vec(0usize..IDS.len(), 1..6).prop_map(Op::Apply),
        ]
    }

    proptest! {
        #[test]
        fn active_index_stays_in_bounds(ops in proptest::collection::vec(arb_op(), 1..40)) {
            let mut rotation = controller(&[
                TestApp::new("clock"),
                TestApp::new("weather"),
                TestApp::new("forecast"),
            ]);
            rotation.start_with(&["clock"], 0);
            let settings = Settings::default();
            let mut now = 0u64;

            for op in ops {
                match op {
                    Op::Tick(step) => {
                        now += step;
                        rotation.tick(&frame(now, &settings));
                    }
                    Op::Apply(picks) => {
                        let ids: alloc::vec::Vec<&str> = picks.iter().map(|&i| IDS[i]).collect();
                        rotation.apply_sequence(sequence_of(&ids, 5_000), &frame(now, &settings));
                    }
                }
                prop_assert!(rotation.active_index() < rotation.sequence().len());
            }
        }
    }
}
