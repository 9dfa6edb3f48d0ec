//! Parsing and encoding of remote documents
//!
//! The store hands back JSON text. A missing node reads as `null`, so
//! `null` is accepted everywhere an absent document is legitimate.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Per-app configuration entry under `apps/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppEntry {
    /// Disabled apps are skipped even if listed in the sequence
    #[serde(default)]
    pub enabled: bool,
    /// Dwell time override; `None` uses the configured default
    #[serde(
        rename = "dwellDurationMs",
        alias = "duration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dwell_duration_ms: Option<u32>,
}

/// Parsed `apps` map, keyed by app id
pub type AppsDocument = BTreeMap<String, AppEntry>;

/// Parse the `apps` map
///
/// Entries that do not have the expected shape are dropped with a
/// warning; only a document that is not an object at all is malformed.
pub fn parse_apps(raw: &str) -> Result<AppsDocument, Error> {
    let value: Value = serde_json::from_str(raw)?;
    let object = match value {
        Value::Null => return Ok(AppsDocument::new()),
        Value::Object(object) => object,
        _ => return Err(Error::MalformedDocument),
    };

    let mut apps = AppsDocument::new();
    for (id, entry) in object {
        match serde_json::from_value::<AppEntry>(entry) {
            Ok(entry) => {
                apps.insert(id, entry);
            }
            Err(_) => warn!("Ignoring malformed app entry: {}", id.as_str()),
        }
    }
    Ok(apps)
}

/// Parse the declared app sequence
///
/// Non-string elements are skipped. `null` reads as an empty sequence.
pub fn parse_sequence(raw: &str) -> Result<Vec<String>, Error> {
    let value: Value = serde_json::from_str(raw)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(id),
                _ => None,
            })
            .collect()),
        _ => Err(Error::MalformedDocument),
    }
}

/// Encode an ordered list of app ids as a JSON array
pub fn encode_sequence<'a, I>(ids: I) -> Result<String, Error>
where
    I: IntoIterator<Item = &'a str>,
{
    let ids: Vec<&str> = ids.into_iter().collect();
    Ok(serde_json::to_string(&ids)?)
}

/// Encode an app entry
pub fn encode_app_entry(entry: &AppEntry) -> Result<String, Error> {
    Ok(serde_json::to_string(entry)?)
}

/// Parse an integer scalar
///
/// Numeric strings are accepted because the store console writes them.
/// `null` reads as absent.
pub fn parse_int(raw: &str) -> Result<Option<i64>, Error> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or(Error::MalformedDocument),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| Error::MalformedDocument),
        _ => Err(Error::MalformedDocument),
    }
}

/// Parse a floating point scalar
pub fn parse_float(raw: &str) -> Result<Option<f32>, Error> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(|f| Some(f as f32))
            .ok_or(Error::MalformedDocument),
        Value::String(s) => s
            .trim()
            .parse::<f32>()
            .map(Some)
            .map_err(|_| Error::MalformedDocument),
        _ => Err(Error::MalformedDocument),
    }
}

/// Parse a string scalar
pub fn parse_string(raw: &str) -> Result<Option<String>, Error> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(Error::MalformedDocument),
    }
}

/// Encode a scalar for writing
pub fn encode_scalar<T: Serialize>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string(value)?)
}
