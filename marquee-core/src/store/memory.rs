//! In-memory remote store
//!
//! Host-side double for tests. Documents are stored flat by path; the
//! link can be taken down and writes can be refused on demand.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::{RemoteStore, StoreError};

/// In-memory document store with scripted failures
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
    unreachable: bool,
    reject_writes: bool,
    reads: u32,
    writes: Vec<(String, String)>,
}

impl MemoryStore {
    /// Create an empty, reachable store
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, path: &str, body: &str) -> Self {
        self.insert(path, body);
        self
    }

    /// Put a document without counting it as a device write
    pub fn insert(&mut self, path: &str, body: &str) {
        self.documents.insert(path.to_string(), body.to_string());
    }

    /// Remove a document
    pub fn remove(&mut self, path: &str) {
        self.documents.remove(path);
    }

    /// Current document at `path`
    pub fn document(&self, path: &str) -> Option<&str> {
        self.documents.get(path).map(|s| s.as_str())
    }

    /// Simulate the link going down or coming back
    pub fn set_unreachable(&mut self, unreachable: bool) {
        self.unreachable = unreachable;
    }

    /// Make every subsequent write fail with `WriteRejected`
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Number of successful reads
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Writes accepted from the device, in order
    pub fn writes(&self) -> &[(String, String)] {
        &self.writes
    }

    /// Forget recorded writes
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl RemoteStore for MemoryStore {
    fn get(&mut self, path: &str) -> Result<String, StoreError> {
        if self.unreachable {
            return Err(StoreError::Unreachable);
        }
        let doc = self.documents.get(path).cloned().ok_or(StoreError::NotFound)?;
        self.reads += 1;
        Ok(doc)
    }

    fn set(&mut self, path: &str, body: &str) -> Result<(), StoreError> {
        if self.unreachable {
            return Err(StoreError::Unreachable);
        }
        if self.reject_writes {
            return Err(StoreError::WriteRejected);
        }
        self.insert(path, body);
        self.writes.push((path.to_string(), body.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_counters() {
        let mut store = MemoryStore::new().with("a/b", "1");
        assert_eq!(store.get("a/b").unwrap(), "1");
        assert_eq!(store.get("a/c"), Err(StoreError::NotFound));
        store.set("a/c", "2").unwrap();
        assert_eq!(store.document("a/c"), Some("2"));
        assert_eq!(store.reads(), 1);
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn test_scripted_failures() {
        let mut store = MemoryStore::new().with("x", "1");
        store.set_unreachable(true);
        assert_eq!(store.get("x"), Err(StoreError::Unreachable));
        store.set_unreachable(false);
        store.set_reject_writes(true);
        assert_eq!(store.set("x", "2"), Err(StoreError::WriteRejected));
        assert_eq!(store.document("x"), Some("1"));
    }
}
