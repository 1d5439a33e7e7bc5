//! Scriptable in-memory cloud used by the unit tests of this crate.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use washhub_domain::device::Device;
use washhub_domain::error::CloudError;
use washhub_domain::id::DeviceId;

use crate::ports::CloudClient;

/// What the next fetch does instead of answering normally.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    /// Never answers; only a timeout releases the caller.
    Hang,
    /// Fails with a transport error.
    Fail,
}

pub(crate) struct FakeCloud {
    devices: Mutex<Vec<Device>>,
    status: Mutex<serde_json::Value>,
    delay: Duration,
    script: Mutex<VecDeque<Step>>,
    /// `(code, field, value)` applied to the status when `code` is written.
    effects: Mutex<Vec<(u16, &'static str, serde_json::Value)>>,
    reject_commands: AtomicBool,
    pub(crate) fetches: AtomicUsize,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
    pub(crate) commands: Mutex<Vec<(DeviceId, u16, i64)>>,
}

impl FakeCloud {
    pub(crate) fn with_status(status: serde_json::Value) -> Self {
        Self {
            devices: Mutex::new(Vec::new()),
            status: Mutex::new(status),
            delay: Duration::ZERO,
            script: Mutex::new(VecDeque::new()),
            effects: Mutex::new(Vec::new()),
            reject_commands: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn devices(self, devices: Vec<Device>) -> Self {
        self.set_devices(devices);
        self
    }

    pub(crate) fn set_devices(&self, devices: Vec<Device>) {
        *self.devices.lock().unwrap() = devices;
    }

    pub(crate) fn set_status(&self, status: serde_json::Value) {
        *self.status.lock().unwrap() = status;
    }

    pub(crate) fn script(&self, steps: impl IntoIterator<Item = Step>) {
        self.script.lock().unwrap().extend(steps);
    }

    pub(crate) fn on_command(&self, code: u16, field: &'static str, value: serde_json::Value) {
        self.effects.lock().unwrap().push((code, field, value));
    }

    pub(crate) fn reject_commands(&self) {
        self.reject_commands.store(true, Ordering::SeqCst);
    }

    pub(crate) fn command_count(&self) -> usize {
        self.commands.lock().unwrap().len()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CloudClient for FakeCloud {
    async fn list_devices(&self) -> Result<Vec<Device>, CloudError> {
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn fetch_status(&self, _device_id: &DeviceId) -> Result<serde_json::Value, CloudError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let step = self.script.lock().unwrap().pop_front();
        tokio::time::sleep(self.delay).await;
        match step {
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Fail) => Err(CloudError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))),
            None => Ok(self.status.lock().unwrap().clone()),
        }
    }

    async fn send_command(
        &self,
        device_id: &DeviceId,
        code: u16,
        value: i64,
    ) -> Result<(), CloudError> {
        self.commands
            .lock()
            .unwrap()
            .push((device_id.clone(), code, value));
        if self.reject_commands.load(Ordering::SeqCst) {
            return Err(CloudError::transport(std::io::Error::other("rejected")));
        }
        let effects = self.effects.lock().unwrap().clone();
        let mut status = self.status.lock().unwrap();
        for (effect_code, field, field_value) in effects {
            if effect_code == code {
                status[field] = field_value;
            }
        }
        Ok(())
    }
}
