//! Static app registry
//!
//! The registry is the fixed set of apps compiled into the firmware,
//! looked up by id. Remote configuration can only select from it.

use super::app::App;

/// Lookup of compiled-in apps by id
pub trait AppRegistry {
    /// Check whether an app with this id exists
    fn contains(&self, id: &str) -> bool;

    /// Get mutable access to an app by id
    fn app_mut(&mut self, id: &str) -> Option<&mut dyn App>;
}
