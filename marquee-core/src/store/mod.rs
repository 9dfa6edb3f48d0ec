//! Remote document store
//!
//! The store is a hierarchical key-value document service reached over
//! an intermittent link. The engine sees it only through `RemoteStore`:
//! blocking get/set of JSON text at slash-separated paths.

pub mod document;
#[cfg(any(test, feature = "mock"))]
pub mod memory;
pub mod paths;

use alloc::string::String;

pub use document::{AppEntry, AppsDocument};
#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryStore;
pub use paths::{DevicePaths, SettingKey};

/// Errors reported by the store transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// No answer within the transport timeout, or not connected
    Unreachable,
    /// Nothing stored at the path
    NotFound,
    /// Store refused the write
    WriteRejected,
}

/// Remote document store
///
/// Calls block until the transport answers or times out. The device is
/// the only writer of its own subtree.
pub trait RemoteStore {
    /// Read the JSON document at `path`
    fn get(&mut self, path: &str) -> Result<String, StoreError>;

    /// Replace the document at `path` with the JSON text `body`
    fn set(&mut self, path: &str, body: &str) -> Result<(), StoreError>;
}
