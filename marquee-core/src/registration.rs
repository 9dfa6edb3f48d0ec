//! First-boot device registration
//!
//! Makes sure the device subtree can drive a rotation on its own: the
//! default app has an entry and the declared sequence is a non-empty
//! list. Existing content is never overwritten.

use crate::config::RotationConfig;
use crate::error::Error;
use crate::store::document::{encode_app_entry, encode_sequence, parse_sequence};
use crate::store::{AppEntry, DevicePaths, RemoteStore, StoreError};

/// What registration created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationReport {
    /// Default app entry was missing and has been written
    pub created_default_app: bool,
    /// Declared sequence was missing or unusable and has been replaced
    pub wrote_sequence: bool,
}

/// Ensure the default app entry and a non-empty sequence exist
///
/// An unreachable store aborts before anything is written. Failed writes
/// are logged and reported as not written.
pub fn register_device<S: RemoteStore>(
    store: &mut S,
    paths: &DevicePaths,
    rules: &RotationConfig,
) -> Result<RegistrationReport, Error> {
    info!("Registering device {}", paths.device());
    let mut report = RegistrationReport::default();

    let app_path = paths.app(&rules.default_app);
    let has_default_app = match store.get(&app_path) {
        Ok(raw) => raw.trim() != "null",
        Err(StoreError::NotFound) => false,
        Err(e) => return Err(e.into()),
    };

    if !has_default_app {
        info!("Creating entry for {}", rules.default_app.as_str());
        let entry = AppEntry {
            enabled: true,
            dwell_duration_ms: Some(rules.default_dwell_ms),
        };
        report.created_default_app = write(store, &app_path, encode_app_entry(&entry));
    }

    let sequence_path = paths.app_sequence();
    let has_sequence = match store.get(&sequence_path) {
        Ok(raw) => parse_sequence(&raw).is_ok_and(|ids| !ids.is_empty()),
        Err(StoreError::NotFound) => false,
        Err(e) => return Err(e.into()),
    };

    if !has_sequence {
        warn!("App sequence missing or invalid, writing default");
        let body = encode_sequence([rules.default_app.as_str()]);
        report.wrote_sequence = write(store, &sequence_path, body);
    }

    Ok(report)
}

fn write<S: RemoteStore>(store: &mut S, path: &str, body: Result<alloc::string::String, Error>) -> bool {
    match body.and_then(|body| store.set(path, &body).map_err(Error::from)) {
        Ok(()) => true,
        Err(e) => {
            error!("Registration write to {} failed: {:?}", path, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const CLOCK: &str = "devices/dev/apps/clock";
    const SEQUENCE: &str = "devices/dev/settings/appSequence";

    fn paths() -> DevicePaths {
        DevicePaths::new("", "dev")
    }

    #[test]
    fn test_fresh_device_gets_defaults() {
        let mut store = MemoryStore::new();

        let report = register_device(&mut store, &paths(), &RotationConfig::default()).unwrap();

        assert!(report.created_default_app);
        assert!(report.wrote_sequence);
        assert_eq!(
            store.document(CLOCK),
            Some(r#"{"enabled":true,"dwellDurationMs":10000}"#)
        );
        assert_eq!(store.document(SEQUENCE), Some(r#"["clock"]"#));
    }

    #[test]
    fn test_existing_content_untouched() {
        let mut store = MemoryStore::new()
            .with(CLOCK, r#"{"enabled":false}"#)
            .with(SEQUENCE, r#"["weather"]"#);

        let report = register_device(&mut store, &paths(), &RotationConfig::default()).unwrap();

        assert_eq!(report, RegistrationReport::default());
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_empty_or_malformed_sequence_replaced() {
        for body in ["[]", "\"clock\"", "null"] {
            let mut store = MemoryStore::new().with(CLOCK, r#"{"enabled":true}"#).with(SEQUENCE, body);

            let report =
                register_device(&mut store, &paths(), &RotationConfig::default()).unwrap();

            assert!(report.wrote_sequence, "{}", body);
            assert_eq!(store.document(SEQUENCE), Some(r#"["clock"]"#));
        }
    }

    #[test]
    fn test_unreachable_aborts() {
        let mut store = MemoryStore::new();
        store.set_unreachable(true);

        assert_eq!(
            register_device(&mut store, &paths(), &RotationConfig::default()),
            Err(Error::Unreachable)
        );
    }

    #[test]
    fn test_rejected_write_reported() {
        let mut store = MemoryStore::new().with(SEQUENCE, r#"["clock"]"#);
        store.set_reject_writes(true);

        let report = register_device(&mut store, &paths(), &RotationConfig::default()).unwrap();

        assert!(!report.created_default_app);
        assert!(!report.wrote_sequence);
    }
}
