//! Time-to-live caches
//!
//! A generic stale-but-available cache plus its two instantiations: the
//! wall-clock time anchor and the weather report.

mod time;
mod ttl;
mod weather;

pub use time::{parse_time_document, weekday_abbrev, TimeBase, TimeCache, WallClock};
pub use ttl::{CacheEntry, Refresh, TtlCache};
pub use weather::{
    parse_weather_document, ForecastDay, WeatherCache, WeatherReport, FORECAST_APP_ID,
    MAX_FORECAST_DAYS,
};
