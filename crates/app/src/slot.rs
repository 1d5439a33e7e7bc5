//! Snapshot slot — the cache of size one kept per `(device, cadence)`.
//!
//! A slot holds the latest snapshot behind an `Arc`, swapped whole on
//! replace, so readers never observe fields from two polls. It also carries
//! the single-flight gate and the failure counter of its pair.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, MutexGuard};

use washhub_domain::error::CloudError;
use washhub_domain::snapshot::Snapshot;

pub(crate) type FetchOutcome = Result<Arc<Snapshot>, CloudError>;

#[derive(Default)]
struct SlotState {
    current: Option<Arc<Snapshot>>,
    last_outcome: Option<FetchOutcome>,
    consecutive_failures: u32,
}

/// One `(device, cadence)` slot.
#[derive(Default)]
pub(crate) struct SnapshotSlot {
    gate: Mutex<()>,
    /// Number of fetches that finished, successful or not.
    completed: AtomicU64,
    next_sequence: AtomicU64,
    state: RwLock<SlotState>,
}

/// Exclusive right to fetch for a slot, obtained through [`SnapshotSlot::join`].
pub(crate) struct FetchPermit<'a> {
    slot: &'a SnapshotSlot,
    _gate: MutexGuard<'a, ()>,
}

/// Result of waiting on the single-flight gate.
pub(crate) enum Joined<'a> {
    /// Nobody fetched while we waited; the caller must fetch.
    Lead(FetchPermit<'a>),
    /// A fetch finished while we waited; its outcome is shared.
    Shared(FetchOutcome),
}

impl SnapshotSlot {
    /// Wait until no fetch is in flight for this slot.
    ///
    /// A caller that queued behind a running fetch gets that fetch's outcome
    /// instead of starting a second call.
    pub(crate) async fn join(&self) -> Joined<'_> {
        let seen = self.completed.load(Ordering::Acquire);
        let gate = self.gate.lock().await;
        let shared = if self.completed.load(Ordering::Acquire) == seen {
            None
        } else {
            self.read().last_outcome.clone()
        };
        if let Some(outcome) = shared {
            return Joined::Shared(outcome);
        }
        Joined::Lead(FetchPermit {
            slot: self,
            _gate: gate,
        })
    }

    /// The stored snapshot, if any fetch ever succeeded.
    pub(crate) fn current(&self) -> Option<Arc<Snapshot>> {
        self.read().current.clone()
    }

    pub(crate) fn consecutive_failures(&self) -> u32 {
        self.read().consecutive_failures
    }

    /// Store `snapshot` unless a snapshot from a later fetch is already held.
    ///
    /// Returns whether the slot was replaced.
    pub(crate) fn replace(&self, snapshot: Arc<Snapshot>) -> bool {
        let mut state = self.write();
        let stale = state
            .current
            .as_ref()
            .is_some_and(|current| !snapshot.supersedes(current));
        if stale {
            return false;
        }
        state.current = Some(snapshot);
        state.consecutive_failures = 0;
        true
    }

    /// Count one more failed fetch and return the new streak length.
    pub(crate) fn record_failure(&self) -> u32 {
        let mut state = self.write();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.consecutive_failures
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SlotState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SlotState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FetchPermit<'_> {
    /// Sequence number for the fetch about to start.
    pub(crate) fn begin(&self) -> u64 {
        self.slot.next_sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Publish the outcome to queued callers and release the gate.
    pub(crate) fn finish(self, outcome: &FetchOutcome) {
        self.slot.write().last_outcome = Some(outcome.clone());
        self.slot.completed.fetch_add(1, Ordering::Release);
    }
}
