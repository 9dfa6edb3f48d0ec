//! Text frame surface
//!
//! Records what apps draw as positioned text and icons instead of pixels.
//! Drawing goes to a back buffer; `flush` makes it the shown frame.

use heapless::{String, Vec};
use marquee_core::traits::{Icon, Surface, SurfaceError};

/// Longest text element kept; longer text is truncated
pub const MAX_TEXT_LEN: usize = 16;

/// Maximum elements per frame
pub const MAX_ELEMENTS: usize = 16;

/// Panel width (pixels)
pub const PANEL_WIDTH: u16 = 64;

/// Panel height (pixels)
pub const PANEL_HEIGHT: u16 = 32;

/// One drawn item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Text {
        x: i16,
        y: i16,
        text: String<MAX_TEXT_LEN>,
    },
    Icon {
        x: i16,
        y: i16,
        icon: Icon,
    },
}

/// Double-buffered text-level surface
#[derive(Debug, Clone)]
pub struct TextFrame {
    width: u16,
    height: u16,
    pending: Vec<Element, MAX_ELEMENTS>,
    shown: Vec<Element, MAX_ELEMENTS>,
    brightness: u8,
    flushes: u32,
}

impl Default for TextFrame {
    fn default() -> Self {
        Self::new(PANEL_WIDTH, PANEL_HEIGHT)
    }
}

impl TextFrame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pending: Vec::new(),
            shown: Vec::new(),
            brightness: 0,
            flushes: 0,
        }
    }

    /// Elements of the last flushed frame
    pub fn elements(&self) -> &[Element] {
        &self.shown
    }

    /// Text elements of the last flushed frame
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.shown.iter().filter_map(|element| match element {
            Element::Text { text, .. } => Some(text.as_str()),
            Element::Icon { .. } => None,
        })
    }

    /// Icons of the last flushed frame
    pub fn icons(&self) -> impl Iterator<Item = Icon> + '_ {
        self.shown.iter().filter_map(|element| match element {
            Element::Icon { icon, .. } => Some(*icon),
            Element::Text { .. } => None,
        })
    }

    /// Check whether the shown frame has a text element equal to `text`
    pub fn shows(&self, text: &str) -> bool {
        self.texts().any(|shown| shown == text)
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn flushes(&self) -> u32 {
        self.flushes
    }

    /// Reject positions entirely off the panel
    ///
    /// Negative `x` down to one panel width is allowed for transitions.
    fn check_position(&self, x: i16, y: i16) -> Result<(), SurfaceError> {
        let width = self.width as i16;
        if x <= -width || x >= width || y < 0 || y >= self.height as i16 {
            return Err(SurfaceError::OutOfBounds);
        }
        Ok(())
    }

    fn push(&mut self, element: Element) -> Result<(), SurfaceError> {
        self.pending
            .push(element)
            .map_err(|_| SurfaceError::BufferOverflow)
    }
}

impl Surface for TextFrame {
    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.pending.clear();
        Ok(())
    }

    fn draw_text(&mut self, x: i16, y: i16, text: &str) -> Result<(), SurfaceError> {
        self.check_position(x, y)?;
        let mut line = String::new();
        for c in text.chars() {
            if line.push(c).is_err() {
                break;
            }
        }
        self.push(Element::Text { x, y, text: line })
    }

    fn draw_icon(&mut self, x: i16, y: i16, icon: Icon) -> Result<(), SurfaceError> {
        self.check_position(x, y)?;
        self.push(Element::Icon { x, y, icon })
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), SurfaceError> {
        self.brightness = level;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        self.shown = self.pending.clone();
        self.flushes += 1;
        Ok(())
    }

    fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TextFrame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "TextFrame[");
        for (i, text) in self.texts().enumerate() {
            if i > 0 {
                defmt::write!(f, ", ");
            }
            defmt::write!(f, "{}", text);
        }
        defmt::write!(f, "]");
    }
}
