//! Cadence scheduler — keeps one snapshot per `(device, cadence)` fresh.
//!
//! Each registered pair owns a repeating timer task. Timer ticks and forced
//! refreshes go through the same single-flight slot, so at most one cloud
//! fetch runs per pair at a time and callers arriving during a fetch share
//! its outcome. Failures never clear the stored snapshot; they are counted
//! and surfaced as an availability flag.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use washhub_domain::cadence::Cadence;
use washhub_domain::error::{CloudError, InvalidInput};
use washhub_domain::event::{SyncEvent, SyncEventKind};
use washhub_domain::id::DeviceId;
use washhub_domain::snapshot::Snapshot;

use crate::ports::{CloudClient, EventPublisher};
use crate::slot::{FetchOutcome, Joined, SnapshotSlot};

/// Knobs shared by every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Upper bound for one cloud call.
    pub request_timeout: Duration,
    /// Consecutive failures after which a slot reports unavailable.
    pub unavailable_after: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            unavailable_after: 2,
        }
    }
}

/// Out-of-cycle refresh of one snapshot slot.
///
/// Implemented by [`CadenceScheduler`]; the command dispatcher only depends
/// on this trait.
pub trait Refresh {
    /// Fetch now, joining a fetch already in flight for the same pair.
    fn force_refresh(
        &self,
        device_id: &DeviceId,
        cadence: Cadence,
    ) -> impl Future<Output = Result<Arc<Snapshot>, CloudError>> + Send;
}

impl<T: Refresh + Send + Sync> Refresh for Arc<T> {
    fn force_refresh(
        &self,
        device_id: &DeviceId,
        cadence: Cadence,
    ) -> impl Future<Output = Result<Arc<Snapshot>, CloudError>> + Send {
        (**self).force_refresh(device_id, cadence)
    }
}

type SlotKey = (DeviceId, Cadence);

struct Inner<C, P> {
    cloud: C,
    publisher: P,
    settings: PollSettings,
    slots: Mutex<HashMap<SlotKey, Arc<SnapshotSlot>>>,
    timers: Mutex<HashMap<SlotKey, JoinHandle<()>>>,
}

/// Polls the cloud for every registered `(device, cadence)` pair.
pub struct CadenceScheduler<C, P> {
    inner: Arc<Inner<C, P>>,
}

impl<C, P> Clone for CadenceScheduler<C, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, P> CadenceScheduler<C, P>
where
    C: CloudClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a scheduler with no registered pairs.
    pub fn new(cloud: C, publisher: P, settings: PollSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                cloud,
                publisher,
                settings,
                slots: Mutex::new(HashMap::new()),
                timers: Mutex::new(HashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn settings(&self) -> PollSettings {
        self.inner.settings
    }

    /// Start polling `device_id` on `cadence` every `interval`.
    ///
    /// The first fetch happens right away. Registering a pair again replaces
    /// its timer. The stored snapshot is kept.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::ZeroInterval`] when `interval` is zero.
    pub fn register(
        &self,
        device_id: DeviceId,
        cadence: Cadence,
        interval: Duration,
    ) -> Result<(), InvalidInput> {
        if interval.is_zero() {
            return Err(InvalidInput::ZeroInterval);
        }

        let handle = tokio::spawn(poll_loop(
            Arc::downgrade(&self.inner),
            device_id.clone(),
            cadence,
            interval,
        ));

        let previous = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((device_id.clone(), cadence), handle);
        if let Some(previous) = previous {
            previous.abort();
        }

        tracing::info!(
            device_id = %device_id,
            %cadence,
            interval_secs = interval.as_secs(),
            "polling registered"
        );
        Ok(())
    }

    /// Stop the timer of one pair and drop its snapshot. Returns whether a
    /// timer was running.
    pub fn unregister(&self, device_id: &DeviceId, cadence: Cadence) -> bool {
        let key = (device_id.clone(), cadence);
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        let handle = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        match handle {
            Some(handle) => {
                handle.abort();
                tracing::debug!(device_id = %device_id, %cadence, "polling unregistered");
                true
            }
            None => false,
        }
    }

    /// Abort every timer task.
    pub fn shutdown(&self) {
        let handles: Vec<_> = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in &handles {
            handle.abort();
        }
        tracing::info!(timers = handles.len(), "scheduler stopped");
    }

    /// Number of running timers.
    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Latest snapshot of a pair, if one was ever fetched.
    #[must_use]
    pub fn latest(&self, device_id: &DeviceId, cadence: Cadence) -> Option<Arc<Snapshot>> {
        self.inner
            .existing_slot(device_id, cadence)
            .and_then(|slot| slot.current())
    }

    #[must_use]
    pub fn consecutive_failures(&self, device_id: &DeviceId, cadence: Cadence) -> u32 {
        self.inner
            .existing_slot(device_id, cadence)
            .map_or(0, |slot| slot.consecutive_failures())
    }

    /// Whether entities on this pair should be shown as available.
    ///
    /// Requires a stored snapshot and fewer consecutive failures than
    /// [`PollSettings::unavailable_after`].
    #[must_use]
    pub fn is_available(&self, device_id: &DeviceId, cadence: Cadence) -> bool {
        self.inner
            .existing_slot(device_id, cadence)
            .is_some_and(|slot| self.inner.slot_available(&slot))
    }
}

impl<C, P> Refresh for CadenceScheduler<C, P>
where
    C: CloudClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    async fn force_refresh(
        &self,
        device_id: &DeviceId,
        cadence: Cadence,
    ) -> Result<Arc<Snapshot>, CloudError> {
        tracing::debug!(device_id = %device_id, %cadence, "forced refresh");
        self.inner.refresh(device_id, cadence).await
    }
}

async fn poll_loop<C, P>(
    inner: Weak<Inner<C, P>>,
    device_id: DeviceId,
    cadence: Cadence,
    interval: Duration,
) where
    C: CloudClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        // failures are recorded on the slot; the next tick is the retry
        let _ = inner.refresh(&device_id, cadence).await;
    }
}

impl<C, P> Inner<C, P>
where
    C: CloudClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    fn slot(&self, device_id: &DeviceId, cadence: Cadence) -> Arc<SnapshotSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry((device_id.clone(), cadence)).or_default())
    }

    fn existing_slot(&self, device_id: &DeviceId, cadence: Cadence) -> Option<Arc<SnapshotSlot>> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(device_id.clone(), cadence))
            .cloned()
    }

    fn slot_available(&self, slot: &SnapshotSlot) -> bool {
        slot.current().is_some() && slot.consecutive_failures() < self.settings.unavailable_after
    }

    async fn refresh(&self, device_id: &DeviceId, cadence: Cadence) -> FetchOutcome {
        let slot = self.slot(device_id, cadence);
        let permit = match slot.join().await {
            Joined::Shared(outcome) => return outcome,
            Joined::Lead(permit) => permit,
        };

        let sequence = permit.begin();
        let outcome = match self.fetch(device_id, sequence).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                if slot.replace(Arc::clone(&snapshot)) {
                    tracing::debug!(
                        device_id = %device_id,
                        %cadence,
                        sequence,
                        fields = snapshot.len(),
                        "snapshot replaced"
                    );
                    self.emit(device_id, cadence, SyncEventKind::SnapshotReplaced { sequence })
                        .await;
                    Ok(snapshot)
                } else {
                    tracing::debug!(
                        device_id = %device_id,
                        %cadence,
                        sequence,
                        "stale snapshot discarded"
                    );
                    Ok(slot.current().unwrap_or(snapshot))
                }
            }
            Err(err) => {
                let consecutive_failures = slot.record_failure();
                let available = self.slot_available(&slot);
                tracing::warn!(
                    device_id = %device_id,
                    %cadence,
                    consecutive_failures,
                    available,
                    error = %err,
                    "poll failed, keeping previous snapshot"
                );
                self.emit(
                    device_id,
                    cadence,
                    SyncEventKind::PollFailed {
                        consecutive_failures,
                        available,
                        reason: err.to_string(),
                    },
                )
                .await;
                Err(err)
            }
        };

        permit.finish(&outcome);
        outcome
    }

    async fn fetch(&self, device_id: &DeviceId, sequence: u64) -> Result<Snapshot, CloudError> {
        let timeout = self.settings.request_timeout;
        let blob = tokio::time::timeout(timeout, self.cloud.fetch_status(device_id))
            .await
            .map_err(|_| CloudError::Timeout(timeout))??;
        Ok(Snapshot::from_blob(sequence, Utc::now(), blob)?)
    }

    async fn emit(&self, device_id: &DeviceId, cadence: Cadence, kind: SyncEventKind) {
        let event = SyncEvent::new(device_id.clone(), cadence, kind, Utc::now());
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(error = %err, "failed to publish sync event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use serde_json::json;
    use washhub_domain::error::WashHubError;

    use super::*;
    use crate::event_bus::InProcessEventBus;
    use crate::fake::{FakeCloud, Step};

    fn device() -> DeviceId {
        DeviceId::new("duid-1").unwrap()
    }

    fn scheduler(
        cloud: &Arc<FakeCloud>,
    ) -> CadenceScheduler<Arc<FakeCloud>, Arc<InProcessEventBus>> {
        CadenceScheduler::new(
            Arc::clone(cloud),
            Arc::new(InProcessEventBus::new(64)),
            PollSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn should_fetch_and_store_snapshot() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 2})));
        let scheduler = scheduler(&cloud);

        let snapshot = scheduler.force_refresh(&device(), Cadence::Fast).await.unwrap();

        assert_eq!(snapshot.sequence(), 1);
        assert_eq!(
            scheduler.latest(&device(), Cadence::Fast).unwrap().sequence(),
            1
        );
        assert!(scheduler.is_available(&device(), Cadence::Fast));
        assert!(scheduler.latest(&device(), Cadence::Slow).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_single_fetch_for_concurrent_callers() {
        let cloud = Arc::new(
            FakeCloud::with_status(json!({"status": 2})).delay(Duration::from_millis(500)),
        );
        let scheduler = scheduler(&cloud);

        let calls: Vec<_> = (0..5)
            .map(|_| {
                let scheduler = scheduler.clone();
                tokio::spawn(async move { scheduler.force_refresh(&device(), Cadence::Fast).await })
            })
            .collect();
        let mut sequences = Vec::new();
        for call in calls {
            sequences.push(call.await.unwrap().unwrap().sequence());
        }

        assert_eq!(cloud.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cloud.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(sequences.iter().all(|s| *s == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn should_share_failure_with_joined_callers() {
        let cloud = Arc::new(
            FakeCloud::with_status(json!({"status": 2})).delay(Duration::from_millis(500)),
        );
        cloud.script([Step::Fail]);
        let scheduler = scheduler(&cloud);

        let first = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.force_refresh(&device(), Cadence::Fast).await }
        });
        let second = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.force_refresh(&device(), Cadence::Fast).await }
        });

        assert!(matches!(first.await.unwrap(), Err(CloudError::Transport(_))));
        assert!(matches!(second.await.unwrap(), Err(CloudError::Transport(_))));
        assert_eq!(cloud.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.consecutive_failures(&device(), Cadence::Fast), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_release_joined_callers_on_timeout() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 2})));
        cloud.script([Step::Hang]);
        let scheduler = scheduler(&cloud);
        let id = device();

        let (a, b) = tokio::join!(
            scheduler.force_refresh(&id, Cadence::Fast),
            scheduler.force_refresh(&id, Cadence::Fast),
        );

        assert!(matches!(a, Err(CloudError::Timeout(_))));
        assert!(matches!(b, Err(CloudError::Timeout(_))));
        assert_eq!(cloud.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.consecutive_failures(&id, Cadence::Fast), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_fetch_pairs_in_parallel() {
        let cloud = Arc::new(
            FakeCloud::with_status(json!({"status": 2})).delay(Duration::from_millis(500)),
        );
        let scheduler = scheduler(&cloud);

        let first = device();
        let other = DeviceId::new("duid-2").unwrap();
        let (a, b, c) = tokio::join!(
            scheduler.force_refresh(&first, Cadence::Fast),
            scheduler.force_refresh(&first, Cadence::Slow),
            scheduler.force_refresh(&other, Cadence::Fast),
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(cloud.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(cloud.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_values_while_unavailable_and_recover() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 2, "washing_left": 37})));
        let scheduler = scheduler(&cloud);
        scheduler.force_refresh(&device(), Cadence::Fast).await.unwrap();

        cloud.script([Step::Hang, Step::Hang]);
        for _ in 0..2 {
            let result = scheduler.force_refresh(&device(), Cadence::Fast).await;
            assert!(matches!(result, Err(CloudError::Timeout(_))));
        }

        assert!(!scheduler.is_available(&device(), Cadence::Fast));
        let kept = scheduler.latest(&device(), Cadence::Fast).unwrap();
        assert_eq!(kept.sequence(), 1);
        assert_eq!(
            kept.get("washing_left"),
            Some(&washhub_domain::value::RawValue::Int(37))
        );

        cloud.set_status(json!({"status": 2, "washing_left": 36}));
        let recovered = scheduler.force_refresh(&device(), Cadence::Fast).await.unwrap();

        assert!(scheduler.is_available(&device(), Cadence::Fast));
        assert_eq!(recovered.sequence(), 4);
        assert_eq!(
            recovered.get("washing_left"),
            Some(&washhub_domain::value::RawValue::Int(36))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_stay_available_after_single_failure() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 1})));
        let scheduler = scheduler(&cloud);
        scheduler.force_refresh(&device(), Cadence::Fast).await.unwrap();

        cloud.script([Step::Fail]);
        let _ = scheduler.force_refresh(&device(), Cadence::Fast).await;

        assert!(scheduler.is_available(&device(), Cadence::Fast));
        assert_eq!(scheduler.consecutive_failures(&device(), Cadence::Fast), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_malformed_blob() {
        let cloud = Arc::new(FakeCloud::with_status(json!(["not", "an", "object"])));
        let scheduler = scheduler(&cloud);

        let result = scheduler.force_refresh(&device(), Cadence::Fast).await;

        assert!(matches!(result, Err(CloudError::MalformedResponse(_))));
        assert!(!scheduler.is_available(&device(), Cadence::Fast));
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_sync_events() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 1})));
        let bus = Arc::new(InProcessEventBus::new(16));
        let mut rx = bus.subscribe();
        let scheduler = CadenceScheduler::new(Arc::clone(&cloud), bus, PollSettings::default());

        scheduler.force_refresh(&device(), Cadence::Slow).await.unwrap();
        cloud.script([Step::Fail]);
        let _ = scheduler.force_refresh(&device(), Cadence::Slow).await;

        let replaced = rx.recv().await.unwrap();
        assert_eq!(replaced.cadence, Cadence::Slow);
        assert_eq!(replaced.kind, SyncEventKind::SnapshotReplaced { sequence: 1 });
        let failed = rx.recv().await.unwrap();
        assert!(matches!(
            failed.kind,
            SyncEventKind::PollFailed {
                consecutive_failures: 1,
                available: true,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_poll_on_every_tick() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 1})));
        let scheduler = scheduler(&cloud);

        scheduler
            .register(device(), Cadence::Fast, Duration::from_secs(60))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(150)).await;

        // ticks at 0s, 60s and 120s
        assert_eq!(cloud.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(
            scheduler.latest(&device(), Cadence::Fast).unwrap().sequence(),
            3
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_replace_timer_on_register() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 1})));
        let scheduler = scheduler(&cloud);

        scheduler
            .register(device(), Cadence::Slow, Duration::from_secs(10))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler
            .register(device(), Cadence::Slow, Duration::from_secs(100))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(50)).await;

        assert_eq!(scheduler.timer_count(), 1);
        assert_eq!(cloud.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_disturb_timer_on_forced_refresh() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 1})));
        let scheduler = scheduler(&cloud);

        scheduler
            .register(device(), Cadence::Fast, Duration::from_secs(60))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        scheduler.force_refresh(&device(), Cadence::Fast).await.unwrap();
        tokio::time::sleep(Duration::from_secs(40)).await;

        // 0s tick, forced at 30s, 60s tick
        assert_eq!(cloud.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_polling_after_unregister_and_shutdown() {
        let cloud = Arc::new(FakeCloud::with_status(json!({"status": 1})));
        let scheduler = scheduler(&cloud);
        let other = DeviceId::new("duid-2").unwrap();

        scheduler
            .register(device(), Cadence::Fast, Duration::from_secs(60))
            .unwrap();
        scheduler
            .register(other.clone(), Cadence::Fast, Duration::from_secs(60))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(scheduler.unregister(&device(), Cadence::Fast));
        assert!(!scheduler.unregister(&device(), Cadence::Fast));
        assert!(scheduler.latest(&device(), Cadence::Fast).is_none());
        assert!(!scheduler.is_available(&device(), Cadence::Fast));
        scheduler.shutdown();
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(scheduler.timer_count(), 0);
        assert_eq!(cloud.fetches.load(Ordering::SeqCst), 2);
        assert!(scheduler.latest(&other, Cadence::Fast).is_some());
    }

    #[tokio::test]
    async fn should_reject_zero_interval() {
        let cloud = Arc::new(FakeCloud::with_status(json!({})));
        let scheduler = scheduler(&cloud);
        let err = scheduler
            .register(device(), Cadence::Fast, Duration::ZERO)
            .unwrap_err();
        assert_eq!(err, InvalidInput::ZeroInterval);
        let _: WashHubError = err.into();
    }
}
