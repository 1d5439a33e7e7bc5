//! Virtual vacuum — a non-washer device under the same account.
//!
//! It only exists so that discovery has something to filter out.

use serde_json::json;
use washhub_domain::device::Device;
use washhub_domain::error::CloudError;

use super::unsupported;

/// A simulated robot vacuum that reports a fixed status.
pub struct VirtualVacuum {
    device: Device,
    battery: u8,
}

impl VirtualVacuum {
    #[must_use]
    pub fn new(device: Device) -> Self {
        Self {
            device,
            battery: 100,
        }
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[must_use]
    pub fn status(&self) -> serde_json::Value {
        json!({"state": 8, "battery": self.battery, "clean_area": 0})
    }

    /// Vacuums speak another protocol; every washer code is refused.
    ///
    /// # Errors
    ///
    /// Always returns a transport error.
    pub fn apply(&self, code: u16, _value: i64) -> Result<(), CloudError> {
        tracing::debug!(device_id = %self.device.id, code, "vacuum refused washer command");
        Err(unsupported(code))
    }
}
