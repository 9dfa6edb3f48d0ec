//! Built-in apps for the Marquee display
//!
//! - Clock, weather and forecast implementations of the core `App` trait
//! - `StandardApps`, the static registry the engine selects from
//! - `TextFrame`, a text-level `Surface` used by simulators and tests
//!
//! Apps decide what text and icons go where; the board's surface turns
//! that into pixels.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod clock;
pub mod forecast;
pub mod frame;
pub mod icons;
pub mod registry;
pub mod weather;

pub use clock::ClockApp;
pub use forecast::ForecastApp;
pub use frame::{Element, TextFrame};
pub use icons::icon_for;
pub use registry::StandardApps;
pub use weather::WeatherApp;

/// Glyph cell width of the panel font (pixels)
pub const CHAR_WIDTH: i16 = 6;

/// Glyph cell height of the panel font (pixels)
pub const CHAR_HEIGHT: i16 = 8;

/// Left edge that centers `text` on a surface `width` pixels wide
pub fn centered_x(width: u16, text: &str) -> i16 {
    let text_width = text.chars().count() as i16 * CHAR_WIDTH;
    ((width as i16 - text_width) / 2).max(0)
}
