//! Board-agnostic core of the Marquee pixel display firmware
//!
//! The display cycles through a sequence of apps (clock, weather,
//! forecast) whose configuration lives in a remote document store. This
//! crate contains everything that does not depend on the board:
//!
//! - App, surface, registry and data-source traits
//! - Rotation controller (ordered app list, active index, dwell timer)
//! - Remote sync poller with failure backoff
//! - Settings mirror (brightness, units, time format, location)
//! - Time-to-live caches for wall-clock time and weather
//! - Device registration and geolocation refresh
//! - The single cooperative engine loop tying it together
//!
//! Everything runs on one thread. Network calls are blocking and happen
//! inside a poll or refresh step; nothing here spawns or locks.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod registration;
pub mod rotation;
pub mod settings;
pub mod store;
pub mod sync;
pub mod traits;

pub use engine::{Engine, StartReport, TickReport};
pub use error::Error;
