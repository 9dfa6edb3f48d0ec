//! Remote sequence synchronization
//!
//! Slow-timer poll of the `apps` map and the declared app sequence, with
//! drift detection, self-healing correction writes and failure backoff.

mod backoff;
mod poller;

pub use backoff::{PollBackoff, PollHealth};
pub use poller::{Correction, PollReport, RemoteSyncPoller};
