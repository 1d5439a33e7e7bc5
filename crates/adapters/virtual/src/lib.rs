//! # washhub-adapter-virtual
//!
//! Virtual/demo cloud that serves simulated devices through the
//! [`CloudClient`] port, for demonstrations and end-to-end tests.
//!
//! ## Provided devices
//!
//! | Device | `washer` | Behaviour |
//! |--------|----------|-----------|
//! | [`VirtualWasher`] | `true` | Full washer status blob; power, setting and sound writes; cycle countdown on the tokio clock |
//! | [`VirtualVacuum`] | `false` | Fixed status blob; refuses every washer command |
//!
//! The whole cloud can be switched offline to simulate an outage: every
//! call then fails with a transport error.
//!
//! ## Dependency rule
//!
//! Depends on `washhub-app` (port traits) and `washhub-domain` only.

mod devices;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use washhub_app::ports::CloudClient;
use washhub_domain::device::Device;
use washhub_domain::error::CloudError;
use washhub_domain::id::DeviceId;

pub use devices::{VirtualDevice, VirtualVacuum, VirtualWasher};

/// Simulated vendor cloud holding a fixed set of devices.
pub struct VirtualCloud {
    devices: Vec<VirtualDevice>,
    online: AtomicBool,
    latency: Duration,
}

impl VirtualCloud {
    /// Create an online cloud serving `devices` in the given order.
    pub fn new(devices: impl IntoIterator<Item = VirtualDevice>) -> Self {
        Self {
            devices: devices.into_iter().collect(),
            online: AtomicBool::new(true),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Bring the cloud up or down.
    pub fn set_online(&self, online: bool) {
        let was = self.online.swap(online, Ordering::SeqCst);
        if was != online {
            tracing::info!(online, "virtual cloud availability changed");
        }
    }

    /// The simulated washer behind `device_id`, for driving it from outside.
    #[must_use]
    pub fn washer(&self, device_id: &DeviceId) -> Option<&VirtualWasher> {
        match self.find(device_id).ok()? {
            VirtualDevice::Washer(washer) => Some(washer),
            VirtualDevice::Vacuum(_) => None,
        }
    }

    fn find(&self, device_id: &DeviceId) -> Result<&VirtualDevice, CloudError> {
        self.devices
            .iter()
            .find(|d| &d.device().id == device_id)
            .ok_or_else(|| {
                CloudError::transport(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("unknown device {device_id}"),
                ))
            })
    }

    async fn round_trip(&self) -> Result<(), CloudError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CloudError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "virtual cloud is offline",
            )))
        }
    }
}

impl CloudClient for VirtualCloud {
    async fn list_devices(&self) -> Result<Vec<Device>, CloudError> {
        self.round_trip().await?;
        Ok(self.devices.iter().map(|d| d.device().clone()).collect())
    }

    async fn fetch_status(&self, device_id: &DeviceId) -> Result<serde_json::Value, CloudError> {
        self.round_trip().await?;
        Ok(self.find(device_id)?.status())
    }

    async fn send_command(
        &self,
        device_id: &DeviceId,
        code: u16,
        value: i64,
    ) -> Result<(), CloudError> {
        self.round_trip().await?;
        tracing::debug!(%device_id, code, value, "virtual command");
        self.find(device_id)?.apply(code, value)
    }
}
