//! Cloud client port — the vendor cloud that relays every read and write.
//!
//! Authentication, session renewal and wire encoding live behind this
//! trait. The core only asks for a device list, a full status blob, and a
//! single protocol write.

use std::future::Future;
use std::sync::Arc;

use washhub_domain::device::Device;
use washhub_domain::error::CloudError;
use washhub_domain::id::DeviceId;

/// Client for the vendor cloud API.
///
/// Calls may hang; callers wrap them in their own timeout.
pub trait CloudClient {
    /// List every device under the account.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, CloudError>> + Send;

    /// Fetch the full status blob of one device.
    ///
    /// The blob is expected to be a JSON object of field name to value.
    fn fetch_status(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<serde_json::Value, CloudError>> + Send;

    /// Write `value` to protocol `code` on one device.
    ///
    /// An `Ok` only means the cloud accepted the write, not that the
    /// appliance applied it.
    fn send_command(
        &self,
        device_id: &DeviceId,
        code: u16,
        value: i64,
    ) -> impl Future<Output = Result<(), CloudError>> + Send;
}

impl<T: CloudClient + Send + Sync> CloudClient for Arc<T> {
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, CloudError>> + Send {
        (**self).list_devices()
    }

    fn fetch_status(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<serde_json::Value, CloudError>> + Send {
        (**self).fetch_status(device_id)
    }

    fn send_command(
        &self,
        device_id: &DeviceId,
        code: u16,
        value: i64,
    ) -> impl Future<Output = Result<(), CloudError>> + Send {
        (**self).send_command(device_id, code, value)
    }
}
