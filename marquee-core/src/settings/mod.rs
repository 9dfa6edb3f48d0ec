//! Locally shadowed display settings
//!
//! Brightness, unit system, time format and location live remotely under
//! the device's settings subtree. `ConfigMirror` keeps a shadow copy that
//! apps read synchronously every frame.

pub mod mirror;
pub mod types;

pub use mirror::{ConfigMirror, SettingsChanges};
pub use types::{
    clamp_brightness, GeoLocation, Settings, TimeFormat, Units, DEFAULT_BRIGHTNESS,
    MAX_BRIGHTNESS, MIN_BRIGHTNESS,
};
