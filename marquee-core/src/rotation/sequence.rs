//! App sequence validation
//!
//! Turns the declared remote sequence plus the `apps` map into an
//! ordered, deduplicated, non-empty list of apps that exist in the
//! registry.

use alloc::string::String;

use heapless::Vec;

use crate::config::RotationConfig;
use crate::error::Error;
use crate::store::AppsDocument;
use crate::traits::AppRegistry;

/// Maximum app id length
pub const MAX_APP_ID_LEN: usize = 24;

/// Maximum apps in one sequence
pub const MAX_APPS: usize = 16;

/// App identifier
pub type AppId = heapless::String<MAX_APP_ID_LEN>;

/// One validated entry of the rotation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppDescriptor {
    pub id: AppId,
    pub enabled: bool,
    /// Time the app stays active before rotation advances (ms)
    pub dwell_duration_ms: u32,
}

/// Ordered, non-empty list of apps
///
/// Two sequences are equal when their descriptors are equal element by
/// element, so a dwell change counts as drift just like a reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppSequence {
    apps: Vec<AppDescriptor, MAX_APPS>,
}

impl AppSequence {
    /// Build from descriptors; `None` if there are none
    pub fn from_descriptors<I>(descriptors: I) -> Option<Self>
    where
        I: IntoIterator<Item = AppDescriptor>,
    {
        let mut apps = Vec::new();
        for descriptor in descriptors {
            if apps.push(descriptor).is_err() {
                break;
            }
        }
        if apps.is_empty() {
            None
        } else {
            Some(Self { apps })
        }
    }

    /// Single-entry sequence holding the default app
    pub fn fallback(rules: &RotationConfig) -> Self {
        let mut apps = Vec::new();
        // capacity is non-zero
        let _ = apps.push(AppDescriptor {
            id: rules.default_app.clone(),
            enabled: true,
            dwell_duration_ms: rules.default_dwell_ms,
        });
        Self { apps }
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// A sequence holds at least one app, so this is false
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Descriptor at `index`, wrapping around the sequence length
    pub fn at(&self, index: usize) -> &AppDescriptor {
        &self.apps[index % self.apps.len()]
    }

    pub fn get(&self, index: usize) -> Option<&AppDescriptor> {
        self.apps.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppDescriptor> {
        self.apps.iter()
    }

    /// App ids in rotation order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.apps.iter().map(|app| app.id.as_str())
    }
}

/// Outcome of validation with the fallback applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub sequence: AppSequence,
    /// Nothing survived validation and the default app was substituted
    pub fallback_applied: bool,
    /// Number of declared ids left out of the rotation
    pub dropped: usize,
    /// Declared ids that can never run here: invalid, unregistered,
    /// repeated or beyond [`MAX_APPS`]
    pub rejected: usize,
    /// Declared ids minus the rejected ones, disabled apps included
    pub retained: alloc::vec::Vec<AppId>,
}

impl Validated {
    /// Check whether the remote sequence should be rewritten
    ///
    /// Disabled apps are filtered locally only and stay in the remote
    /// sequence, so re-enabling one restores its position.
    pub fn needs_correction(&self) -> bool {
        self.fallback_applied || self.rejected > 0
    }

    /// Ids to write back when a correction is needed
    pub fn corrected_ids(&self) -> alloc::vec::Vec<&str> {
        if self.fallback_applied {
            self.sequence.ids().collect()
        } else {
            self.retained.iter().map(|id| id.as_str()).collect()
        }
    }
}

/// Declared ids sorted into what runs, what stays declared and what goes
struct Screened {
    kept: Vec<AppDescriptor, MAX_APPS>,
    retained: alloc::vec::Vec<AppId>,
    rejected: usize,
    disabled: usize,
}

fn screen<R>(
    declared: &[String],
    apps: &AppsDocument,
    registry: &R,
    rules: &RotationConfig,
) -> Screened
where
    R: AppRegistry + ?Sized,
{
    let mut screened = Screened {
        kept: Vec::new(),
        retained: alloc::vec::Vec::new(),
        rejected: 0,
        disabled: 0,
    };

    for raw in declared {
        let id = raw.as_str();

        let app_id = match AppId::try_from(id) {
            Ok(app_id) if !app_id.is_empty() => app_id,
            _ => {
                warn!("Dropping invalid app id: {}", id);
                screened.rejected += 1;
                continue;
            }
        };

        if !registry.contains(id) {
            warn!("Dropping unregistered app: {}", id);
            screened.rejected += 1;
            continue;
        }

        if screened.retained.contains(&app_id) {
            warn!("Dropping duplicate app: {}", id);
            screened.rejected += 1;
            continue;
        }

        let entry = apps.get(id);
        if entry.is_some_and(|entry| !entry.enabled) {
            debug!("Skipping disabled app: {}", id);
            screened.disabled += 1;
            screened.retained.push(app_id);
            continue;
        }

        let dwell_duration_ms = entry
            .and_then(|entry| entry.dwell_duration_ms)
            .filter(|&ms| ms > 0)
            .unwrap_or(rules.default_dwell_ms);

        let descriptor = AppDescriptor {
            id: app_id.clone(),
            enabled: true,
            dwell_duration_ms,
        };
        match screened.kept.push(descriptor) {
            Ok(()) => screened.retained.push(app_id),
            Err(_) => {
                warn!("Sequence longer than {} apps, dropping: {}", MAX_APPS, id);
                screened.rejected += 1;
            }
        }
    }

    screened
}

/// Validate a declared sequence
///
/// Ids are kept in declared order. An id is rejected with a warning if it
/// is empty or too long, unknown to the registry, a repeat of an earlier
/// id, or beyond [`MAX_APPS`]. Ids disabled in the `apps` map are left out
/// of the rotation but stay in [`Validated::retained`]. Ids without an
/// `apps` entry count as enabled with the default dwell.
///
/// Returns [`Error::EmptyOrInvalidSequence`] if nothing is left to run.
pub fn validate<R>(
    declared: &[String],
    apps: &AppsDocument,
    registry: &R,
    rules: &RotationConfig,
) -> Result<Validated, Error>
where
    R: AppRegistry + ?Sized,
{
    let screened = screen(declared, apps, registry, rules);
    let sequence =
        AppSequence::from_descriptors(screened.kept).ok_or(Error::EmptyOrInvalidSequence)?;
    Ok(Validated {
        sequence,
        fallback_applied: false,
        dropped: screened.rejected + screened.disabled,
        rejected: screened.rejected,
        retained: screened.retained,
    })
}

/// Validate, substituting the single default app if nothing survives
pub fn validate_or_fallback<R>(
    declared: &[String],
    apps: &AppsDocument,
    registry: &R,
    rules: &RotationConfig,
) -> Validated
where
    R: AppRegistry + ?Sized,
{
    let screened = screen(declared, apps, registry, rules);
    let dropped = screened.rejected + screened.disabled;
    let (sequence, fallback_applied) = match AppSequence::from_descriptors(screened.kept) {
        Some(sequence) => (sequence, false),
        None => {
            warn!(
                "No usable app ids, falling back to {}",
                rules.default_app.as_str()
            );
            (AppSequence::fallback(rules), true)
        }
    };
    Validated {
        sequence,
        fallback_applied,
        dropped,
        rejected: screened.rejected,
        retained: screened.retained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AppEntry;
    use alloc::string::ToString;
    use alloc::vec;

    struct Names(&'static [&'static str]);

    impl AppRegistry for Names {
        fn contains(&self, id: &str) -> bool {
            self.0.contains(&id)
        }

        fn app_mut(&mut self, _id: &str) -> Option<&mut dyn crate::traits::App> {
            None
        }
    }

    const REGISTRY: Names = Names(&["clock", "weather", "forecast"]);

    fn declared(ids: &[&str]) -> alloc::vec::Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn ids(sequence: &AppSequence) -> alloc::vec::Vec<&str> {
        sequence.ids().collect()
    }

    #[test]
    fn test_keeps_declared_order() {
        let rules = RotationConfig::default();
        let validated = validate(
            &declared(&["weather", "clock"]),
            &AppsDocument::new(),
            &REGISTRY,
            &rules,
        )
        .unwrap();

        assert_eq!(ids(&validated.sequence), vec!["weather", "clock"]);
        assert_eq!(validated.dropped, 0);
        assert!(!validated.needs_correction());
        assert_eq!(validated.sequence.get(0).unwrap().dwell_duration_ms, 10_000);
    }

    #[test]
    fn test_drops_unknown_duplicate_and_disabled() {
        let mut apps = AppsDocument::new();
        apps.insert(
            "forecast".to_string(),
            AppEntry {
                enabled: false,
                dwell_duration_ms: None,
            },
        );
        apps.insert(
            "weather".to_string(),
            AppEntry {
                enabled: true,
                dwell_duration_ms: Some(4_000),
            },
        );
        let rules = RotationConfig::default();

        let validated = validate(
            &declared(&["clock", "radar", "weather", "clock", "forecast", ""]),
            &apps,
            &REGISTRY,
            &rules,
        )
        .unwrap();

        assert_eq!(ids(&validated.sequence), vec!["clock", "weather"]);
        assert_eq!(validated.dropped, 4);
        assert_eq!(validated.rejected, 3);
        assert_eq!(validated.corrected_ids(), vec!["clock", "weather", "forecast"]);
        assert_eq!(validated.sequence.get(1).unwrap().dwell_duration_ms, 4_000);
    }

    #[test]
    fn test_zero_dwell_uses_default() {
        let mut apps = AppsDocument::new();
        apps.insert(
            "clock".to_string(),
            AppEntry {
                enabled: true,
                dwell_duration_ms: Some(0),
            },
        );
        let rules = RotationConfig::default();
        let validated = validate(&declared(&["clock"]), &apps, &REGISTRY, &rules).unwrap();
        assert_eq!(validated.sequence.get(0).unwrap().dwell_duration_ms, 10_000);
    }

    #[test]
    fn test_empty_or_unregistered_falls_back() {
        let rules = RotationConfig::default();
        let apps = AppsDocument::new();

        assert_eq!(
            validate(&[], &apps, &REGISTRY, &rules),
            Err(Error::EmptyOrInvalidSequence)
        );

        let validated = validate_or_fallback(&declared(&["radar", "tides"]), &apps, &REGISTRY, &rules);
        assert!(validated.fallback_applied);
        assert_eq!(validated.dropped, 2);
        assert!(validated.needs_correction());
        assert_eq!(validated.sequence, AppSequence::fallback(&rules));
        assert_eq!(ids(&validated.sequence), vec!["clock"]);
    }

    #[test]
    fn test_disabled_apps_stay_declared() {
        let mut apps = AppsDocument::new();
        apps.insert(
            "weather".to_string(),
            AppEntry {
                enabled: false,
                dwell_duration_ms: None,
            },
        );
        let rules = RotationConfig::default();

        let validated = validate(
            &declared(&["clock", "weather", "forecast"]),
            &apps,
            &REGISTRY,
            &rules,
        )
        .unwrap();

        assert_eq!(ids(&validated.sequence), vec!["clock", "forecast"]);
        assert_eq!(validated.dropped, 1);
        assert_eq!(validated.rejected, 0);
        assert!(!validated.needs_correction());
        assert_eq!(validated.corrected_ids(), vec!["clock", "weather", "forecast"]);
    }
}
