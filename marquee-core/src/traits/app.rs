//! App contract
//!
//! An app is one screen in the rotation. The rotation controller only
//! ever talks to an app through this trait.

use crate::cache::{TimeBase, WeatherReport};
use crate::settings::Settings;

use super::surface::{Surface, SurfaceError};

/// Caches an app reads while it is active
///
/// The engine only refreshes the caches the active app depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Feeds {
    /// Reads wall-clock time
    pub time: bool,
    /// Reads current weather or forecast
    pub weather: bool,
}

impl Feeds {
    /// No cached data
    pub const NONE: Feeds = Feeds {
        time: false,
        weather: false,
    };
    /// Wall-clock time only
    pub const TIME: Feeds = Feeds {
        time: true,
        weather: false,
    };
    /// Weather only
    pub const WEATHER: Feeds = Feeds {
        time: false,
        weather: true,
    };
    /// Both caches
    pub const ALL: Feeds = Feeds {
        time: true,
        weather: true,
    };
}

/// Read-only view of shared state handed to apps each frame
///
/// Apps never reach into globals; everything they may read arrives here.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Monotonic time of this frame (ms)
    pub now_ms: u64,
    /// Current shadow settings
    pub settings: &'a Settings,
    /// Time anchor, if the time cache has ever been filled
    pub time: Option<&'a TimeBase>,
    /// Latest weather, if the weather cache has ever been filled
    pub weather: Option<&'a WeatherReport>,
}

/// One screen in the rotation
pub trait App {
    /// Stable identifier, matches the registry key and remote app id
    fn id(&self) -> &str;

    /// Caches this app reads
    fn feeds(&self) -> Feeds {
        Feeds::NONE
    }

    /// Called each time the app becomes active
    fn init(&mut self, ctx: &FrameContext<'_>);

    /// Per-frame logic; may mark the app dirty
    fn run_frame(&mut self, ctx: &FrameContext<'_>);

    /// Draw the app onto the surface
    ///
    /// - `force`: redraw even if the app believes nothing changed
    /// - `x_offset`: horizontal shift in pixels (for transitions)
    fn redraw(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &FrameContext<'_>,
        force: bool,
        x_offset: i16,
    ) -> Result<(), SurfaceError>;

    /// Set the pending-redraw flag
    fn set_dirty(&mut self, dirty: bool);

    /// Check the pending-redraw flag
    fn is_dirty(&self) -> bool;
}
