//! Common error types used across the workspace.
//!
//! Each failure mode is a typed enum. Layers convert into [`WashHubError`]
//! via `#[from]` when they need a single error type at a port boundary.

use std::sync::Arc;
use std::time::Duration;

/// Top-level error for operations that cross the application boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WashHubError {
    #[error("invalid input")]
    InvalidInput(#[from] InvalidInput),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("cloud call failed")]
    Cloud(#[from] CloudError),
}

/// A request was rejected locally, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("unknown capability {0:?}")]
    UnknownCapability(String),

    #[error("{value:?} is not accepted by {capability}, expected one of {allowed:?}")]
    OutOfDomain {
        capability: &'static str,
        value: String,
        allowed: Vec<&'static str>,
    },

    #[error("polling interval must be positive")]
    ZeroInterval,

    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("name must not be empty")]
    EmptyName,
}

/// A lookup for something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure talking to the vendor cloud.
///
/// Clonable so that every caller joined on a single in-flight fetch
/// observes the same failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CloudError {
    #[error("cloud transport failure")]
    Transport(#[source] Arc<dyn std::error::Error + Send + Sync>),

    #[error("cloud call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed cloud response")]
    MalformedResponse(#[source] MalformedResponse),
}

impl CloudError {
    /// Wrap any transport-level error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}

/// Why a status blob could not be turned into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedResponse {
    #[error("status blob must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
}

impl From<MalformedResponse> for CloudError {
    fn from(err: MalformedResponse) -> Self {
        Self::MalformedResponse(err)
    }
}
