//! Two-day forecast app
//!
//! The weather cache marks this app dirty when it refreshes while the app
//! is on screen, so `run_frame` has nothing to watch.

use core::fmt::Write as _;

use heapless::String;
use marquee_core::cache::FORECAST_APP_ID;
use marquee_core::traits::{App, Feeds, FrameContext, Surface, SurfaceError};

use crate::{centered_x, icon_for};

/// Column pitch (pixels)
const COLUMN_WIDTH: i16 = 34;

/// Forecast app
#[derive(Debug, Default)]
pub struct ForecastApp {
    dirty: bool,
}

impl ForecastApp {
    pub const fn new() -> Self {
        Self { dirty: false }
    }
}

impl App for ForecastApp {
    fn id(&self) -> &str {
        FORECAST_APP_ID
    }

    fn feeds(&self) -> Feeds {
        Feeds::WEATHER
    }

    fn init(&mut self, _ctx: &FrameContext<'_>) {
        self.dirty = true;
    }

    fn run_frame(&mut self, _ctx: &FrameContext<'_>) {}

    fn redraw(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &FrameContext<'_>,
        _force: bool,
        x_offset: i16,
    ) -> Result<(), SurfaceError> {
        let (width, _) = surface.dimensions();
        surface.clear()?;

        let days = ctx.weather.map(|report| report.forecast.as_slice()).unwrap_or(&[]);
        if days.is_empty() {
            let text = "No forecast";
            return surface.draw_text(centered_x(width, text) + x_offset, 12, text);
        }

        for (i, day) in days.iter().enumerate() {
            let x = 2 + i as i16 * COLUMN_WIDTH + x_offset;
            let mut high: String<6> = String::new();
            let _ = write!(high, "{}°", day.high);
            let mut low: String<6> = String::new();
            let _ = write!(low, "{}°", day.low);

            surface.draw_icon(x, 0, icon_for(&day.icon))?;
            surface.draw_text(x + 14, 0, &high)?;
            surface.draw_text(x + 14, 8, &low)?;
            surface.draw_text(x, 24, day.day)?;
        }
        Ok(())
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
    use marquee_core::cache::parse_weather_document;
    use marquee_core::settings::Settings;
    use marquee_core::traits::Icon;

    const REPORT: &str = r#"{
        "name": "Toronto",
        "timezone": -18000,
        "main": {"temp": 2.0},
        "daily": [
            {"dt": 1704474000, "temp": {"max": 3.4, "min": -2.6}, "weather": [{"icon": "13d"}]},
            {"dt": 1704560400, "temp": {"max": 1.0, "min": -5.5}, "weather": [{"icon": "04d"}]}
        ]
    }"#;

    fn ctx<'a>(
        settings: &'a Settings,
        weather: Option<&'a marquee_core::cache::WeatherReport>,
    ) -> FrameContext<'a> {
        FrameContext {
            now_ms: 0,
            settings,
            time: None,
            weather,
        }
    }

    #[test]
    fn test_draws_two_columns() {
        let settings = Settings::default();
        let report = parse_weather_document(REPORT).unwrap();
        let mut app = ForecastApp::new();
        let mut frame = TextFrame::default();

        app.redraw(&mut frame, &ctx(&settings, Some(&report)), true, 0)
            .unwrap();
        frame.flush().unwrap();

        assert!(frame.shows("Fri"));
        assert!(frame.shows("Sat"));
        assert!(frame.shows("3°"));
        assert!(frame.shows("-6°"));
        let icons: heapless::Vec<Icon, 4> = frame.icons().collect();
        assert_eq!(icons.as_slice(), &[Icon::Rain, Icon::Cloud]);
    }

    #[test]
    fn test_empty_forecast_placeholder() {
        let settings = Settings::default();
        let mut app = ForecastApp::new();
        let mut frame = TextFrame::default();

        app.redraw(&mut frame, &ctx(&settings, None), true, 0).unwrap();
        frame.flush().unwrap();

        assert!(frame.shows("No forecast"));
    }

    #[test]
    fn test_frames_leave_dirty_flag() {
        let settings = Settings::default();
        let mut app = ForecastApp::new();
        app.run_frame(&ctx(&settings, None));
        assert!(!app.is_dirty());

        app.init(&ctx(&settings, None));
        assert!(app.is_dirty());
    }
}
