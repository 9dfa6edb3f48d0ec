//! Current conditions app

use core::fmt::Write as _;

use heapless::String;
use marquee_core::cache::WeatherReport;
use marquee_core::settings::Units;
use marquee_core::traits::{App, Feeds, FrameContext, Surface, SurfaceError};

use crate::{centered_x, icon_for};

/// App id
pub const WEATHER_APP_ID: &str = "weather";

/// Current weather: icon, temperature, high/low and city
#[derive(Debug, Default)]
pub struct WeatherApp {
    dirty: bool,
    shown: Option<WeatherReport>,
    units: Option<Units>,
}

impl WeatherApp {
    pub const fn new() -> Self {
        Self {
            dirty: false,
            shown: None,
            units: None,
        }
    }
}

impl App for WeatherApp {
    fn id(&self) -> &str {
        WEATHER_APP_ID
    }

    fn feeds(&self) -> Feeds {
        Feeds::WEATHER
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.shown = ctx.weather.cloned();
        self.units = Some(ctx.settings.units);
        self.dirty = true;
    }

    fn run_frame(&mut self, ctx: &FrameContext<'_>) {
        if ctx.weather != self.shown.as_ref() || self.units != Some(ctx.settings.units) {
            self.shown = ctx.weather.cloned();
            self.units = Some(ctx.settings.units);
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

        let Some(report) = ctx.weather else {
            return surface.draw_text(centered_x(width, "No data") + x_offset, 12, "No data");
        };

        let letter = ctx.settings.units.temperature_letter();
        let mut temp: String<8> = String::new();
        let _ = write!(temp, "{}°{}", report.temp, letter);
        let mut range: String<12> = String::new();
        let _ = write!(range, "H{} L{}", report.high, report.low);

        surface.draw_icon(x_offset, 0, icon_for(&report.icon))?;
        surface.draw_text(18 + x_offset, 6, &temp)?;
        surface.draw_text(18 + x_offset, 16, &range)?;
        surface.draw_text(x_offset, 24, &report.city)
    }

    fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}
