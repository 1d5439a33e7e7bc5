//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `washhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use washhub_adapter_virtual::VirtualDevice;
use washhub_app::scheduler::PollSettings;
use washhub_app::services::washer_service::PollIntervals;
use washhub_domain::device::Device;
use washhub_domain::error::InvalidInput;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Poll cadences and cloud call limits.
    pub polling: PollingConfig,
    /// Devices served by the virtual cloud.
    #[serde(rename = "virtual")]
    pub virtual_cloud: VirtualConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Polling configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub fast_interval_secs: u64,
    pub slow_interval_secs: u64,
    /// Upper bound for any single cloud call.
    pub request_timeout_secs: u64,
    /// Consecutive failed polls before a cadence reports unavailable.
    pub unavailable_after_failures: u32,
}

/// Virtual cloud configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Simulated round-trip time of every cloud call.
    pub latency_ms: u64,
    pub devices: Vec<VirtualDeviceConfig>,
}

/// One simulated device.
#[derive(Debug, Deserialize)]
pub struct VirtualDeviceConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    /// `false` simulates another appliance under the same account.
    #[serde(default = "default_true")]
    pub washer: bool,
    /// Start in the ready state instead of standby.
    #[serde(default)]
    pub powered_on: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from `washhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("washhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("WASHHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("WASHHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some((host, port)) = var("WASHHUB_BIND")
            .as_deref()
            .and_then(|val| val.rsplit_once(':'))
            .map(|(host, port)| (host.to_string(), port.parse::<u16>().ok()))
        {
            self.server.host = host;
            if let Some(port) = port {
                self.server.port = port;
            }
        }
        if let Some(val) = var("WASHHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(secs) = var("WASHHUB_FAST_INTERVAL_SECS").and_then(|val| val.parse().ok()) {
            self.polling.fast_interval_secs = secs;
        }
        if let Some(secs) = var("WASHHUB_SLOW_INTERVAL_SECS").and_then(|val| val.parse().ok()) {
            self.polling.slow_interval_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.polling.fast_interval_secs == 0 || self.polling.slow_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "polling intervals must be positive".to_string(),
            ));
        }
        if self.polling.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request timeout must be positive".to_string(),
            ));
        }
        if self.polling.unavailable_after_failures == 0 {
            return Err(ConfigError::Validation(
                "unavailable_after_failures must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl PollingConfig {
    #[must_use]
    pub fn settings(&self) -> PollSettings {
        PollSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            unavailable_after: self.unavailable_after_failures,
        }
    }

    #[must_use]
    pub fn intervals(&self) -> PollIntervals {
        PollIntervals {
            fast: Duration::from_secs(self.fast_interval_secs),
            slow: Duration::from_secs(self.slow_interval_secs),
        }
    }
}

impl VirtualConfig {
    /// Build the simulated devices.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Device`] for a blank id or name.
    pub fn build_devices(&self) -> Result<Vec<VirtualDevice>, ConfigError> {
        self.devices
            .iter()
            .map(VirtualDeviceConfig::build)
            .collect()
    }

    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl VirtualDeviceConfig {
    fn build(&self) -> Result<VirtualDevice, ConfigError> {
        let mut builder = Device::builder()
            .id(&self.id)
            .name(&self.name)
            .firmware_version("virtual")
            .washer(self.washer);
        if let Some(model) = &self.model {
            builder = builder.model(model);
        }
        let device = VirtualDevice::from_device(builder.build()?);
        Ok(match device {
            VirtualDevice::Washer(washer) if self.powered_on => {
                VirtualDevice::Washer(washer.powered_on())
            }
            other => other,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "washhubd=info,washhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        let intervals = PollIntervals::default();
        let settings = PollSettings::default();
        Self {
            fast_interval_secs: intervals.fast.as_secs(),
            slow_interval_secs: intervals.slow.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            unavailable_after_failures: settings.unavailable_after,
        }
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            devices: vec![VirtualDeviceConfig {
                id: "virtual-washer-1".to_string(),
                name: "Virtual Washer".to_string(),
                model: Some("virtual.wm.v1".to_string()),
                washer: true,
                powered_on: true,
            }],
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// A virtual device entry is invalid.
    #[error("invalid virtual device")]
    Device(#[from] InvalidInput),
}
