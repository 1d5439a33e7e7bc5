//! JSON REST handlers for discovered washers.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use washhub_app::ports::{CloudClient, EventPublisher};
use washhub_domain::device::Device;
use washhub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Device>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<C, P>(State(state): State<AppState<C, P>>) -> ListResponse
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    ListResponse::Ok(Json(state.washer_service.devices()))
}

/// `GET /api/devices/{id}`
pub async fn get<C, P>(
    State(state): State<AppState<C, P>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_id = DeviceId::from_str(&id)?;
    let device = state.washer_service.device(&device_id)?;
    Ok(GetResponse::Ok(Json(device)))
}
