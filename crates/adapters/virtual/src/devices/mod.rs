//! Virtual device implementations — washer and vacuum.
//!
//! Each virtual device wraps the [`Device`] it is discovered as, so ids and
//! names come from whoever builds the virtual cloud.

mod vacuum;
mod washer;

pub use vacuum::VirtualVacuum;
pub use washer::VirtualWasher;

use washhub_domain::device::Device;
use washhub_domain::error::CloudError;

/// Wrapper enum for the concrete virtual device types.
pub enum VirtualDevice {
    Washer(VirtualWasher),
    Vacuum(VirtualVacuum),
}

impl VirtualDevice {
    /// Simulate `device` with the behaviour its `washer` flag calls for.
    #[must_use]
    pub fn from_device(device: Device) -> Self {
        if device.washer {
            Self::Washer(VirtualWasher::new(device))
        } else {
            Self::Vacuum(VirtualVacuum::new(device))
        }
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        match self {
            Self::Washer(d) => d.device(),
            Self::Vacuum(d) => d.device(),
        }
    }

    #[must_use]
    pub fn status(&self) -> serde_json::Value {
        match self {
            Self::Washer(d) => d.status(),
            Self::Vacuum(d) => d.status(),
        }
    }

    /// Apply one protocol write.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the device refuses `code`.
    pub fn apply(&self, code: u16, value: i64) -> Result<(), CloudError> {
        match self {
            Self::Washer(d) => d.apply(code, value),
            Self::Vacuum(d) => d.apply(code, value),
        }
    }
}

fn unsupported(code: u16) -> CloudError {
    CloudError::transport(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("unsupported command code {code}"),
    ))
}
