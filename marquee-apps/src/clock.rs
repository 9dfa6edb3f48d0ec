//! Clock app
//!
//! Shows the local time, redrawing only when the displayed minute or the
//! time format changes.

use marquee_core::settings::TimeFormat;
use marquee_core::traits::{App, Feeds, FrameContext, Surface, SurfaceError};

use crate::centered_x;

/// App id
pub const CLOCK_APP_ID: &str = "clock";

/// Shown until the time cache has been filled
const PLACEHOLDER: &str = "--:--";

/// Clock row (pixels from the top)
const TEXT_Y: i16 = 12;

/// Clock app
#[derive(Debug, Default)]
pub struct ClockApp {
    dirty: bool,
    last_minute: Option<u8>,
    last_format: Option<TimeFormat>,
}

impl ClockApp {
    pub const fn new() -> Self {
        Self {
            dirty: false,
            last_minute: None,
            last_format: None,
        }
    }
}

impl App for ClockApp {
    fn id(&self) -> &str {
        CLOCK_APP_ID
    }

    fn feeds(&self) -> Feeds {
        Feeds::TIME
    }

    fn init(&mut self, _ctx: &FrameContext<'_>) {
        self.last_minute = None;
        self.last_format = None;
        self.dirty = true;
    }

    fn run_frame(&mut self, ctx: &FrameContext<'_>) {
        let Some(clock) = ctx.time.and_then(|base| base.wall_clock(ctx.now_ms)) else {
            return;
        };
        let format = ctx.settings.time_format;
        if self.last_minute != Some(clock.minute) || self.last_format != Some(format) {
            self.last_minute = Some(clock.minute);
            self.last_format = Some(format);
            self.dirty = true;
        }
    }

    fn redraw(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &FrameContext<'_>,
        _force: bool,
        x_offset: i16,
    ) -> Result<(), SurfaceError> {
        let (width, _) = surface.dimensions();
        surface.clear()?;

        match ctx.time.and_then(|base| base.wall_clock(ctx.now_ms)) {
            Some(clock) => {
                let text = clock.format(ctx.settings.time_format);
                surface.draw_text(centered_x(width, &text) + x_offset, TEXT_Y, &text)
            }
            None => surface.draw_text(
                centered_x(width, PLACEHOLDER) + x_offset,
                TEXT_Y,
                PLACEHOLDER,
            ),
        }
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextFrame;
    use marquee_core::cache::TimeBase;
    use marquee_core::settings::Settings;

    // 2024-01-05 13:05:09
    const BASE: TimeBase = TimeBase {
        epoch_seconds: 1_704_459_909,
        captured_at_ms: 0,
    };

    fn ctx<'a>(now_ms: u64, settings: &'a Settings, time: Option<&'a TimeBase>) -> FrameContext<'a> {
        FrameContext {
            now_ms,
            settings,
            time,
            weather: None,
        }
    }

    #[test]
    fn test_redraws_on_minute_change_only() {
        let settings = Settings::default();
        let mut app = ClockApp::new();
        app.init(&ctx(0, &settings, Some(&BASE)));
        app.run_frame(&ctx(0, &settings, Some(&BASE)));
        app.set_dirty(false);

        app.run_frame(&ctx(50_000, &settings, Some(&BASE)));
        assert!(!app.is_dirty());

        app.run_frame(&ctx(51_000, &settings, Some(&BASE)));
        assert!(app.is_dirty());
    }

    #[test]
    fn test_format_change_marks_dirty() {
        let mut settings = Settings::default();
        let mut app = ClockApp::new();
        app.run_frame(&ctx(0, &settings, Some(&BASE)));
        app.set_dirty(false);

        settings.time_format = TimeFormat::TwentyFourHour;
        app.run_frame(&ctx(1_000, &settings, Some(&BASE)));

        assert!(app.is_dirty());
    }

    #[test]
    fn test_draws_formatted_time() {
        let mut settings = Settings::default();
        let mut app = ClockApp::new();
        let mut frame = TextFrame::default();

        app.redraw(&mut frame, &ctx(0, &settings, Some(&BASE)), true, 0)
            .unwrap();
        frame.flush().unwrap();
        assert!(frame.shows("1:05PM"));

        settings.time_format = TimeFormat::TwentyFourHour;
        app.redraw(&mut frame, &ctx(0, &settings, Some(&BASE)), true, 0)
            .unwrap();
        frame.flush().unwrap();
        assert!(frame.shows("13:05"));
        assert!(!frame.shows("1:05PM"));
    }

    #[test]
    fn test_placeholder_without_time() {
        let settings = Settings::default();
        let mut app = ClockApp::new();
        let mut frame = TextFrame::default();

        app.run_frame(&ctx(0, &settings, None));
        app.redraw(&mut frame, &ctx(0, &settings, None), true, 0)
            .unwrap();
        frame.flush().unwrap();

        assert!(frame.shows("--:--"));
    }
}
