//! Collaborator traits
//!
//! These traits define the seams between the engine and everything it
//! treats as external: the apps, the display surface, the static app
//! registry and the HTTP-like data sources.

pub mod app;
pub mod registry;
pub mod source;
pub mod surface;

pub use app::{App, Feeds, FrameContext};
pub use registry::AppRegistry;
pub use source::{GeoLocator, SourceError, TimeSource, WeatherSource};
pub use surface::{Icon, Surface, SurfaceError};
