//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use washhub_domain::error::{CloudError, InvalidInput, NotFoundError, WashHubError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`WashHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(WashHubError);

impl From<WashHubError> for ApiError {
    fn from(err: WashHubError) -> Self {
        Self(err)
    }
}

impl From<InvalidInput> for ApiError {
    fn from(err: InvalidInput) -> Self {
        Self(err.into())
    }
}

impl From<NotFoundError> for ApiError {
    fn from(err: NotFoundError) -> Self {
        Self(err.into())
    }
}

impl From<CloudError> for ApiError {
    fn from(err: CloudError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            WashHubError::InvalidInput(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            WashHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            WashHubError::Cloud(err) => {
                tracing::warn!(
                    error = %err,
                    source = ?std::error::Error::source(err),
                    "cloud error"
                );
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
