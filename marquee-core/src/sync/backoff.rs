//! Poll failure backoff
//!
//! `Healthy` polls at the base interval. Each consecutive failure doubles
//! the interval up to a ceiling; the first success returns to `Healthy`.

/// Poller health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollHealth {
    /// Polling at the base interval
    Healthy,
    /// At least one consecutive failure
    Degraded,
}

/// Backoff state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollBackoff {
    base_ms: u32,
    ceiling_ms: u32,
    interval_ms: u32,
    failure_count: u32,
}

impl PollBackoff {
    /// Create a healthy backoff; a ceiling below `base_ms` is raised to it
    pub fn new(base_ms: u32, ceiling_ms: u32) -> Self {
        Self {
            base_ms,
            ceiling_ms: ceiling_ms.max(base_ms),
            interval_ms: base_ms,
            failure_count: 0,
        }
    }

    /// Current poll interval (ms)
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn base_ms(&self) -> u32 {
        self.base_ms
    }

    pub fn ceiling_ms(&self) -> u32 {
        self.ceiling_ms
    }

    pub fn health(&self) -> PollHealth {
        if self.failure_count == 0 {
            PollHealth::Healthy
        } else {
            PollHealth::Degraded
        }
    }

    /// Count a failure and return the new interval
    pub fn record_failure(&mut self) -> u32 {
        self.failure_count = self.failure_count.saturating_add(1);
        self.interval_ms = self.scaled(self.failure_count);
        self.interval_ms
    }

    /// Return to the base interval
    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.interval_ms = self.base_ms;
    }

    /// `min(base * 2^k, ceiling)` without overflow
    fn scaled(&self, k: u32) -> u32 {
        if k >= 32 {
            return self.ceiling_ms;
        }
        let scaled = (self.base_ms as u64) << k;
        scaled.min(self.ceiling_ms as u64) as u32
    }
}
