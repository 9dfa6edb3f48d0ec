//! Wall-clock time cache
//!
//! The time source is queried rarely. Between queries the current time is
//! the anchor plus monotonic elapsed time.

use core::fmt::Write as _;

use serde_json::Value;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, Weekday};

use crate::error::Error;
use crate::settings::{GeoLocation, TimeFormat};
use crate::traits::TimeSource;

use super::ttl::{Refresh, TtlCache};

/// Anchor from which the current wall-clock time is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeBase {
    /// Local wall-clock time at capture, as seconds since 1970-01-01
    pub epoch_seconds: i64,
    /// Monotonic time of capture (ms)
    pub captured_at_ms: u64,
}

impl TimeBase {
    /// Local epoch seconds at monotonic time `now_ms`
    pub fn epoch_at(&self, now_ms: u64) -> i64 {
        let elapsed_s = now_ms.saturating_sub(self.captured_at_ms) / 1000;
        self.epoch_seconds.saturating_add(elapsed_s as i64)
    }

    /// Broken-down wall clock at `now_ms`
    pub fn wall_clock(&self, now_ms: u64) -> Option<WallClock> {
        let dt = OffsetDateTime::from_unix_timestamp(self.epoch_at(now_ms)).ok()?;
        Some(WallClock {
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
            weekday: dt.weekday(),
        })
    }
}

/// Local time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub weekday: Weekday,
}

impl WallClock {
    /// Render as `H:MM`, `H:MMAM`/`H:MMPM` or 24-hour `H:MM` per `format`
    ///
    /// Hours never carry a leading zero in any format.
    pub fn format(&self, format: TimeFormat) -> heapless::String<8> {
        let mut out = heapless::String::new();
        let _ = match format {
            TimeFormat::TwentyFourHour => write!(out, "{}:{:02}", self.hour, self.minute),
            TimeFormat::TwelveHour | TimeFormat::TwelveHourWithSuffix => {
                let hour = match self.hour % 12 {
                    0 => 12,
                    h => h,
                };
                let suffix = match (format, self.hour >= 12) {
                    (TimeFormat::TwelveHourWithSuffix, true) => "PM",
                    (TimeFormat::TwelveHourWithSuffix, false) => "AM",
                    _ => "",
                };
                write!(out, "{}:{:02}{}", hour, self.minute, suffix)
            }
        };
        out
    }
}

/// Three-letter English day name
pub fn weekday_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

/// Parse a time source answer into local epoch seconds
///
/// Accepts `date_time_24` (`YYYY-MM-DD HH:MM:SS`, `T` also accepted) or
/// separate `date` and `time_24`/`time_24hr` fields.
pub fn parse_time_document(raw: &str) -> Result<i64, Error> {
    let doc: Value = serde_json::from_str(raw)?;
    let field = |key| str_field(&doc, key);

    let text = match field("date_time_24") {
        Some(date_time) => date_time.trim().replacen(' ', "T", 1),
        None => match (field("date"), field("time_24").or_else(|| field("time_24hr"))) {
            (Some(date), Some(time)) => alloc::format!("{}T{}", date.trim(), time.trim()),
            _ => return Err(Error::MalformedDocument),
        },
    };

    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let parsed = PrimitiveDateTime::parse(&text, format).map_err(|_| Error::MalformedDocument)?;
    Ok(parsed.assume_utc().unix_timestamp())
}

fn str_field<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    doc.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Cache of the wall-clock anchor
#[derive(Debug, Clone)]
pub struct TimeCache {
    cache: TtlCache<TimeBase>,
}

impl TimeCache {
    pub const fn new(ttl_ms: u32) -> Self {
        Self {
            cache: TtlCache::new(ttl_ms),
        }
    }

    pub fn get(&self) -> Option<&TimeBase> {
        self.cache.get()
    }

    pub fn inner(&self) -> &TtlCache<TimeBase> {
        &self.cache
    }

    pub fn request_refresh(&mut self) {
        self.cache.request_refresh();
    }

    /// Refresh the anchor if forced or stale
    ///
    /// Skipped entirely while `location` is unset.
    pub fn refresh_if_needed<T: TimeSource + ?Sized>(
        &mut self,
        now_ms: u64,
        forced: bool,
        location: GeoLocation,
        source: &mut T,
    ) -> Result<Refresh, Error> {
        if !location.is_set() {
            trace!("Location unset, skipping time refresh");
            return Ok(Refresh::Skipped);
        }

        let result = self.cache.refresh_if_needed(now_ms, forced, || {
            let raw = source.fetch_time(location)?;
            let epoch_seconds = parse_time_document(&raw)?;
            Ok(TimeBase {
                epoch_seconds,
                captured_at_ms: now_ms,
            })
        });

        match result {
            Ok(Refresh::Refreshed) => debug!("Time cache refreshed"),
            Err(e) => warn!("Time refresh failed: {:?}", e),
            _ => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SourceError;
    use alloc::string::{String, ToString};

    struct FixedTime {
        body: Result<&'static str, SourceError>,
        calls: u32,
    }

    impl TimeSource for FixedTime {
        fn fetch_time(&mut self, _location: GeoLocation) -> Result<String, SourceError> {
            self.calls += 1;
            self.body.map(|body| body.to_string())
        }
    }

    const TORONTO: GeoLocation = GeoLocation::new(43.65, -79.38);

    #[test]
    fn test_parse_date_time_24() {
        assert_eq!(
            parse_time_document(r#"{"date_time_24":"2024-01-05 13:05:09"}"#),
            Ok(1_704_459_909)
        );
        assert_eq!(
            parse_time_document(r#"{"date_time_24":"2024-01-05T13:05:09"}"#),
            Ok(1_704_459_909)
        );
    }

    #[test]
    fn test_parse_split_fields() {
        assert_eq!(
            parse_time_document(r#"{"date":"2024-01-05","time_24":"13:05:09"}"#),
            Ok(1_704_459_909)
        );
        assert_eq!(
            parse_time_document(r#"{"date":"2024-01-05","time_24hr":"13:05:09"}"#),
            Ok(1_704_459_909)
        );
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert_eq!(
            parse_time_document(r#"{"date":"2024-01-05"}"#),
            Err(Error::MalformedDocument)
        );
        assert_eq!(
            parse_time_document(r#"{"date_time_24":"yesterday"}"#),
            Err(Error::MalformedDocument)
        );
        assert_eq!(parse_time_document("<html>"), Err(Error::MalformedDocument));
    }

    #[test]
    fn test_wall_clock_advances_with_monotonic_time() {
        let base = TimeBase {
            epoch_seconds: 1_704_459_909,
            captured_at_ms: 5_000,
        };

        let clock = base.wall_clock(5_000).unwrap();
        assert_eq!((clock.hour, clock.minute, clock.second), (13, 5, 9));
        assert_eq!(weekday_abbrev(clock.weekday), "Fri");

        let later = base.wall_clock(5_000 + 51_000).unwrap();
        assert_eq!((later.hour, later.minute), (13, 6));
    }

    #[test]
    fn test_format_variants() {
        let afternoon = WallClock {
            hour: 13,
            minute: 5,
            second: 0,
            weekday: Weekday::Friday,
        };
        assert_eq!(afternoon.format(TimeFormat::TwelveHour).as_str(), "1:05");
        assert_eq!(afternoon.format(TimeFormat::TwelveHourWithSuffix).as_str(), "1:05PM");
        assert_eq!(afternoon.format(TimeFormat::TwentyFourHour).as_str(), "13:05");

        let midnight = WallClock {
            hour: 0,
            minute: 7,
            ..afternoon
        };
        assert_eq!(midnight.format(TimeFormat::TwelveHourWithSuffix).as_str(), "12:07AM");
        assert_eq!(midnight.format(TimeFormat::TwentyFourHour).as_str(), "0:07");
    }

    #[test]
    fn test_unset_location_never_fetches() {
        let mut cache = TimeCache::new(1_000);
        let mut source = FixedTime {
            body: Ok(r#"{"date_time_24":"2024-01-05 13:05:09"}"#),
            calls: 0,
        };

        for now in [0, 10_000, 1_000_000] {
            let result = cache.refresh_if_needed(now, true, GeoLocation::UNSET, &mut source);
            assert_eq!(result, Ok(Refresh::Skipped));
        }
        assert_eq!(source.calls, 0);
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_refresh_captures_anchor() {
        let mut cache = TimeCache::new(1_000);
        let mut source = FixedTime {
            body: Ok(r#"{"date_time_24":"2024-01-05 13:05:09"}"#),
            calls: 0,
        };

        assert_eq!(
            cache.refresh_if_needed(7_000, false, TORONTO, &mut source),
            Ok(Refresh::Refreshed)
        );
        assert_eq!(
            cache.get(),
            Some(&TimeBase {
                epoch_seconds: 1_704_459_909,
                captured_at_ms: 7_000,
            })
        );
    }

    #[test]
    fn test_failed_refresh_keeps_anchor() {
        let mut cache = TimeCache::new(1_000);
        let mut source = FixedTime {
            body: Ok(r#"{"date_time_24":"2024-01-05 13:05:09"}"#),
            calls: 0,
        };
        cache.refresh_if_needed(0, false, TORONTO, &mut source).unwrap();

        source.body = Err(SourceError::Status(500));
        assert_eq!(
            cache.refresh_if_needed(2_000, false, TORONTO, &mut source),
            Err(Error::Unreachable)
        );
        assert_eq!(cache.get().unwrap().captured_at_ms, 0);

        source.body = Ok("{}");
        assert_eq!(
            cache.refresh_if_needed(3_000, false, TORONTO, &mut source),
            Err(Error::MalformedDocument)
        );
        assert_eq!(cache.get().unwrap().epoch_seconds, 1_704_459_909);
    }
}
