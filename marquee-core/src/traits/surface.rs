//! Display surface trait
//!
//! The pixel matrix as seen by the engine. Only the rotation controller
//! holds the surface; apps get it lent for the duration of a redraw.

/// Surface errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SurfaceError {
    /// Driver did not accept the command
    Communication,
    /// Coordinates outside the panel
    OutOfBounds,
    /// Frame buffer capacity exceeded
    BufferOverflow,
}

/// Weather glyphs the surface knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Icon {
    Sun,
    Cloud,
    Moon,
    Rain,
    /// Unrecognised condition, drawn as a placeholder
    Unknown,
}

/// Display surface
pub trait Surface {
    /// Blank the whole surface
    fn clear(&mut self) -> Result<(), SurfaceError>;

    /// Draw text with its top-left corner at (`x`, `y`) pixels
    fn draw_text(&mut self, x: i16, y: i16, text: &str) -> Result<(), SurfaceError>;

    /// Draw a weather icon with its top-left corner at (`x`, `y`) pixels
    fn draw_icon(&mut self, x: i16, y: i16, icon: Icon) -> Result<(), SurfaceError>;

    /// Set panel brightness (1-10)
    fn set_brightness(&mut self, level: u8) -> Result<(), SurfaceError>;

    /// Push buffered content to the panel
    fn flush(&mut self) -> Result<(), SurfaceError>;

    /// Panel size in pixels (width, height)
    fn dimensions(&self) -> (u16, u16);
}
