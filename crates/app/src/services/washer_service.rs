//! Washer service — the facade drivers use to discover, read and command
//! washers.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

use washhub_domain::cadence::Cadence;
use washhub_domain::catalog::{self, EntityDescriptor};
use washhub_domain::device::Device;
use washhub_domain::error::{CloudError, NotFoundError, WashHubError};
use washhub_domain::id::DeviceId;
use washhub_domain::reading::EntityReading;
use washhub_domain::snapshot::Snapshot;

use crate::dispatcher::{CommandDispatcher, DispatchOutcome};
use crate::ports::{CloudClient, EventPublisher};
use crate::scheduler::{CadenceScheduler, PollSettings};

/// Polling interval per cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub fast: Duration,
    pub slow: Duration,
}

impl PollIntervals {
    #[must_use]
    pub fn of(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Fast => self.fast,
            Cadence::Slow => self.slow,
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            fast: Cadence::Fast.default_interval(),
            slow: Cadence::Slow.default_interval(),
        }
    }
}

/// Application service wiring discovery, polling and dispatch together.
pub struct WasherService<C, P> {
    cloud: C,
    scheduler: CadenceScheduler<C, P>,
    dispatcher: CommandDispatcher<C, CadenceScheduler<C, P>>,
    intervals: PollIntervals,
    devices: RwLock<Vec<Device>>,
}

impl<C, P> WasherService<C, P>
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new service. Nothing is polled until [`discover`](Self::discover).
    pub fn new(cloud: C, publisher: P, settings: PollSettings, intervals: PollIntervals) -> Self {
        let scheduler = CadenceScheduler::new(cloud.clone(), publisher, settings);
        let dispatcher =
            CommandDispatcher::new(cloud.clone(), scheduler.clone(), settings.request_timeout);
        Self {
            cloud,
            scheduler,
            dispatcher,
            intervals,
            devices: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> &CadenceScheduler<C, P> {
        &self.scheduler
    }

    /// List the account's devices and start polling every washer.
    ///
    /// Devices that do not speak the washer protocol are skipped, as are
    /// repeated ids and devices failing validation. Washers that disappeared
    /// since the previous discovery stop being polled.
    ///
    /// # Errors
    ///
    /// Returns [`WashHubError::Cloud`] if the device list cannot be fetched,
    /// or [`WashHubError::InvalidInput`] for a zero polling interval.
    #[tracing::instrument(skip(self))]
    pub async fn discover(&self) -> Result<Vec<Device>, WashHubError> {
        let timeout = self.scheduler.settings().request_timeout;
        let listed = tokio::time::timeout(timeout, self.cloud.list_devices())
            .await
            .map_err(|_| CloudError::Timeout(timeout))??;

        let mut seen = HashSet::new();
        let mut washers = Vec::new();
        for device in listed {
            if !device.washer {
                tracing::debug!(
                    device_id = %device.id,
                    model = ?device.model,
                    "skipping non-washer device"
                );
                continue;
            }
            if let Err(err) = device.validate() {
                tracing::warn!(device_id = %device.id, error = %err, "skipping invalid device");
                continue;
            }
            if !seen.insert(device.id.clone()) {
                tracing::warn!(device_id = %device.id, "skipping duplicate device");
                continue;
            }
            washers.push(device);
        }

        for device in &washers {
            for cadence in Cadence::ALL {
                self.scheduler
                    .register(device.id.clone(), cadence, self.intervals.of(cadence))?;
            }
        }

        let previous = std::mem::replace(&mut *self.write_devices(), washers.clone());
        for gone in previous.iter().filter(|d| !seen.contains(&d.id)) {
            for cadence in Cadence::ALL {
                self.scheduler.unregister(&gone.id, cadence);
            }
            tracing::info!(device_id = %gone.id, "washer no longer listed");
        }

        tracing::info!(count = washers.len(), "washer discovery complete");
        Ok(washers)
    }

    /// All discovered washers.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up a discovered washer.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no washer with `id` was discovered.
    pub fn device(&self, id: &DeviceId) -> Result<Device, NotFoundError> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|d| &d.id == id)
            .cloned()
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: id.to_string(),
            })
    }

    /// Current readings of every entity of one washer.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown device.
    pub fn readings(&self, id: &DeviceId) -> Result<Vec<EntityReading>, NotFoundError> {
        self.device(id)?;
        let fast = self.read_context(id, Cadence::Fast);
        let slow = self.read_context(id, Cadence::Slow);
        Ok(catalog::ENTITIES
            .iter()
            .map(|entity| {
                let (snapshot, available) = match entity.cadence() {
                    Cadence::Fast => &fast,
                    Cadence::Slow => &slow,
                };
                EntityReading::read(entity, snapshot.as_deref(), *available)
            })
            .collect())
    }

    /// Current reading of one entity.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown device or entity id.
    pub fn reading(&self, id: &DeviceId, entity_id: &str) -> Result<EntityReading, NotFoundError> {
        self.device(id)?;
        let entity: &EntityDescriptor = catalog::entity(entity_id).ok_or_else(|| NotFoundError {
            entity: "Entity",
            id: entity_id.to_string(),
        })?;
        let (snapshot, available) = self.read_context(id, entity.cadence());
        Ok(EntityReading::read(entity, snapshot.as_deref(), available))
    }

    /// Write `value` to `capability` on a discovered washer and read the
    /// effect back.
    ///
    /// # Errors
    ///
    /// Returns [`WashHubError::NotFound`] for an unknown device, otherwise
    /// whatever [`CommandDispatcher::dispatch`] returns.
    pub async fn dispatch(
        &self,
        id: &DeviceId,
        capability: &str,
        value: &str,
    ) -> Result<DispatchOutcome, WashHubError> {
        self.device(id)?;
        self.dispatcher.dispatch(id, capability, value).await
    }

    /// Stop all polling.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn read_context(&self, id: &DeviceId, cadence: Cadence) -> (Option<Arc<Snapshot>>, bool) {
        (
            self.scheduler.latest(id, cadence),
            self.scheduler.is_available(id, cadence),
        )
    }

    fn write_devices(&self) -> RwLockWriteGuard<'_, Vec<Device>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
}
