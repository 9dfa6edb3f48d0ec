//! Remote sync poller

use alloc::string::String;
use core::hash::Hasher as _;

use hash32::{FnvHasher, Hasher as _};

use crate::config::{RotationConfig, SyncConfig};
use crate::error::Error;
use crate::rotation::{validate_or_fallback, RotationController, Validated};
use crate::store::document::{encode_sequence, parse_apps, parse_sequence};
use crate::store::{DevicePaths, RemoteStore, StoreError};
use crate::traits::{AppRegistry, FrameContext, Surface};

use super::backoff::PollBackoff;

/// Outcome of writing the validated sequence back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Correction {
    /// Remote sequence already matches what the device shows
    NotNeeded,
    /// Validated sequence written back
    Written,
    /// Write attempted and failed; retried on the next poll
    Failed(Error),
}

/// What one successful poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    /// Candidate differed from the active sequence and was applied
    pub drift: bool,
    pub correction: Correction,
    /// Raw documents were unchanged since the last parse
    pub memo_hit: bool,
    /// Nothing valid was declared and the default app was substituted
    pub fallback_applied: bool,
}

/// Raw text of the two documents the poll reads; `None` if absent
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawDocuments {
    apps: Option<String>,
    sequence: Option<String>,
}

impl RawDocuments {
    fn fingerprint(&self) -> u32 {
        let mut hasher = FnvHasher::default();
        for doc in [&self.apps, &self.sequence] {
            match doc {
                Some(text) => {
                    hasher.write_u8(1);
                    hasher.write(text.as_bytes());
                }
                None => hasher.write_u8(0),
            }
        }
        hasher.finish32()
    }
}

/// Result of the last parse, reused while the raw documents are unchanged
#[derive(Debug, Clone)]
struct Memo {
    fingerprint: u32,
    raw: RawDocuments,
    validated: Validated,
}

impl Memo {
    fn matches(&self, fingerprint: u32, raw: &RawDocuments) -> bool {
        self.fingerprint == fingerprint && self.raw == *raw
    }
}

/// Remote sync poller
#[derive(Debug)]
pub struct RemoteSyncPoller {
    paths: DevicePaths,
    backoff: PollBackoff,
    next_poll_at_ms: u64,
    memo: Option<Memo>,
}

impl RemoteSyncPoller {
    pub fn new(paths: DevicePaths, config: &SyncConfig) -> Self {
        Self {
            paths,
            backoff: PollBackoff::new(config.base_interval_ms, config.max_interval_ms),
            next_poll_at_ms: 0,
            memo: None,
        }
    }

    pub fn backoff(&self) -> &PollBackoff {
        &self.backoff
    }

    /// Monotonic time of the next scheduled poll (ms)
    pub fn next_poll_at_ms(&self) -> u64 {
        self.next_poll_at_ms
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_poll_at_ms
    }

    /// One-shot fetch of the starting sequence
    ///
    /// Validates the same way as [`poll_once`](Self::poll_once) and writes
    /// a correction if the fallback was applied or declared ids were
    /// rejected. The regular poll timer starts from `now_ms`.
    pub fn fetch_initial<S, R>(
        &mut self,
        now_ms: u64,
        store: &mut S,
        registry: &R,
        rules: &RotationConfig,
    ) -> Result<Validated, Error>
    where
        S: RemoteStore,
        R: AppRegistry + ?Sized,
    {
        self.next_poll_at_ms = now_ms + self.backoff.interval_ms() as u64;

        let raw = read_documents(store, &self.paths)?;
        let (memo, _) = self.evaluate(&raw, registry, rules)?;
        if memo.validated.needs_correction() {
            self.write_correction(store, &memo.validated);
        }
        Ok(memo.validated)
    }

    /// Poll if the timer has elapsed
    pub fn poll_if_due<S, R, D>(
        &mut self,
        store: &mut S,
        rotation: &mut RotationController<R, D>,
        ctx: &FrameContext<'_>,
    ) -> Option<Result<PollReport, Error>>
    where
        S: RemoteStore,
        R: AppRegistry,
        D: Surface,
    {
        if !self.is_due(ctx.now_ms) {
            return None;
        }
        Some(self.poll_once(store, rotation, ctx))
    }

    /// Fetch, validate and reconcile
    ///
    /// An unreachable store grows the backoff and changes nothing else.
    /// Any answer from the store resets the backoff, even if the documents
    /// turn out to be malformed.
    ///
    /// Disabled apps leave the rotation but are never removed from the
    /// remote sequence.
    pub fn poll_once<S, R, D>(
        &mut self,
        store: &mut S,
        rotation: &mut RotationController<R, D>,
        ctx: &FrameContext<'_>,
    ) -> Result<PollReport, Error>
    where
        S: RemoteStore,
        R: AppRegistry,
        D: Surface,
    {
        let raw = match read_documents(store, &self.paths) {
            Ok(raw) => raw,
            Err(e) => {
                let interval = self.backoff.record_failure();
                self.next_poll_at_ms = ctx.now_ms + interval as u64;
                warn!(
                    "Sequence poll failed ({} in a row), retrying in {} ms",
                    self.backoff.failure_count(),
                    interval
                );
                return Err(e);
            }
        };

        if self.backoff.failure_count() > 0 {
            info!("Remote store reachable again");
        }
        self.backoff.record_success();
        self.next_poll_at_ms = ctx.now_ms + self.backoff.interval_ms() as u64;

        let (memo, memo_hit) = match self.evaluate(&raw, rotation.registry(), rotation.rules()) {
            Ok(evaluated) => evaluated,
            Err(e) => {
                warn!("Ignoring malformed sequence documents: {:?}", e);
                return Err(e);
            }
        };

        let drift = memo.validated.sequence != *rotation.sequence();
        if drift {
            info!("Sequence drift detected, applying remote sequence");
            rotation.apply_sequence(memo.validated.sequence.clone(), ctx);
        }

        let correction = if memo.validated.needs_correction() {
            self.write_correction(store, &memo.validated)
        } else {
            Correction::NotNeeded
        };

        Ok(PollReport {
            drift,
            correction,
            memo_hit,
            fallback_applied: memo.validated.fallback_applied,
        })
    }

    /// Parse and validate, or reuse the memo if the raw text is unchanged
    fn evaluate<R>(
        &mut self,
        raw: &RawDocuments,
        registry: &R,
        rules: &RotationConfig,
    ) -> Result<(Memo, bool), Error>
    where
        R: AppRegistry + ?Sized,
    {
        let fingerprint = raw.fingerprint();
        if let Some(memo) = self.memo.as_ref().filter(|m| m.matches(fingerprint, raw)) {
            trace!("Sequence documents unchanged");
            return Ok((memo.clone(), true));
        }

        let apps = match raw.apps.as_deref() {
            Some(text) => parse_apps(text)?,
            None => Default::default(),
        };
        let declared = match raw.sequence.as_deref() {
            Some(text) => parse_sequence(text)?,
            None => alloc::vec::Vec::new(),
        };

        let validated = validate_or_fallback(&declared, &apps, registry, rules);
        let memo = Memo {
            fingerprint,
            raw: raw.clone(),
            validated,
        };
        self.memo = Some(memo.clone());
        Ok((memo, false))
    }

    fn write_correction<S: RemoteStore>(&self, store: &mut S, validated: &Validated) -> Correction {
        let ids = validated.corrected_ids();
        let result = encode_sequence(ids.iter().copied())
            .and_then(|body| store.set(&self.paths.app_sequence(), &body).map_err(Error::from));

        match result {
            Ok(()) => {
                info!("Wrote corrected sequence ({} apps)", ids.len());
                Correction::Written
            }
            Err(e) => {
                error!("Sequence correction failed: {:?}", e);
                Correction::Failed(e)
            }
        }
    }
}

fn read_documents<S: RemoteStore>(store: &mut S, paths: &DevicePaths) -> Result<RawDocuments, Error> {
    Ok(RawDocuments {
        apps: read_optional(store, &paths.apps())?,
        sequence: read_optional(store, &paths.app_sequence())?,
    })
}

fn read_optional<S: RemoteStore>(store: &mut S, path: &str) -> Result<Option<String>, Error> {
    match store.get(path) {
        Ok(text) => Ok(Some(text)),
        Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
