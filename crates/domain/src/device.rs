//! Device — an appliance reachable through the vendor cloud.

use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;
use crate::id::DeviceId;

/// A device under the cloud account, as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    /// Whether the device speaks the washer status/command protocol.
    pub washer: bool,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::EmptyName`] when `name` is empty.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.name.trim().is_empty() {
            return Err(InvalidInput::EmptyName);
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<String>,
    name: Option<String>,
    model: Option<String>,
    firmware_version: Option<String>,
    washer: bool,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn firmware_version(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn washer(mut self, washer: bool) -> Self {
        self.washer = washer;
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] if the id or the name is missing or blank.
    pub fn build(self) -> Result<Device, InvalidInput> {
        let device = Device {
            id: DeviceId::new(self.id.unwrap_or_default())?,
            name: self.name.unwrap_or_default(),
            model: self.model,
            firmware_version: self.firmware_version,
            washer: self.washer,
        };
        device.validate()?;
        Ok(device)
    }
}
