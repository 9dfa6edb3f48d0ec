//! Engine configuration
//!
//! Board-agnostic tuning knobs (timers, TTLs, defaults) loaded from TOML.
//! Every field has a default so an empty document is a valid config.

pub mod loader;
pub mod types;

pub use loader::ConfigError;
pub use types::*;
