//! JSON REST handlers for entity readings.
//!
//! A reading carries the projected value (`null` when unknown), whether the
//! cadence it reads from is currently available, and for selects the labels
//! a write accepts.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use washhub_app::ports::{CloudClient, EventPublisher};
use washhub_domain::id::DeviceId;
use washhub_domain::reading::EntityReading;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<EntityReading>>),
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
    Ok(Json<EntityReading>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices/{id}/entities`
pub async fn list<C, P>(
    State(state): State<AppState<C, P>>,
    Path(id): Path<String>,
) -> Result<ListResponse, ApiError>
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_id = DeviceId::from_str(&id)?;
    let readings = state.washer_service.readings(&device_id)?;
    Ok(ListResponse::Ok(Json(readings)))
}

/// `GET /api/devices/{id}/entities/{entity_id}`
pub async fn get<C, P>(
    State(state): State<AppState<C, P>>,
    Path((id, entity_id)): Path<(String, String)>,
) -> Result<GetResponse, ApiError>
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_id = DeviceId::from_str(&id)?;
    let reading = state.washer_service.reading(&device_id, &entity_id)?;
    Ok(GetResponse::Ok(Json(reading)))
}
