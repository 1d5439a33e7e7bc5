//! JSON REST handlers for writable capabilities.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use washhub_app::dispatcher::DispatchOutcome;
use washhub_app::ports::{CloudClient, EventPublisher};
use washhub_domain::cadence::Cadence;
use washhub_domain::catalog::{self, Capability, CapabilityKind};
use washhub_domain::id::DeviceId;
use washhub_domain::value::EntityValue;

use crate::error::ApiError;
use crate::state::AppState;

/// One capability and the values it accepts.
#[derive(Serialize)]
pub struct CapabilityView {
    pub key: &'static str,
    pub kind: &'static str,
    pub allowed_values: Vec<&'static str>,
    /// Cadences refreshed after a write.
    pub cadences: Vec<Cadence>,
}

impl From<&Capability> for CapabilityView {
    fn from(capability: &Capability) -> Self {
        let kind = match capability.kind {
            CapabilityKind::Action(_) => "action",
            CapabilityKind::Select { .. } => "select",
            CapabilityKind::Toggle { .. } => "toggle",
        };
        Self {
            key: capability.key,
            kind,
            allowed_values: capability.allowed_values(),
            cadences: capability.refresh_cadences(),
        }
    }
}

/// Request body for a capability write.
#[derive(Deserialize)]
pub struct DispatchRequest {
    pub value: String,
}

/// How a capability write ended.
#[derive(Serialize)]
pub struct DispatchResponse {
    pub capability: String,
    pub value: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<EntityValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<CapabilityView>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the dispatch endpoint.
pub enum DispatchResult {
    Ok(Json<DispatchResponse>),
}

impl IntoResponse for DispatchResult {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/capabilities`
pub async fn list() -> ListResponse {
    ListResponse::Ok(Json(
        catalog::CAPABILITIES.iter().map(CapabilityView::from).collect(),
    ))
}

/// `POST /api/devices/{id}/capabilities/{capability}`
///
/// A write the cloud accepted answers `200` whatever its effect; the
/// `outcome` field says whether the effect was observed.
pub async fn dispatch<C, P>(
    State(state): State<AppState<C, P>>,
    Path((id, capability)): Path<(String, String)>,
    Json(req): Json<DispatchRequest>,
) -> Result<DispatchResult, ApiError>
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_id = DeviceId::from_str(&id)?;
    let outcome = state
        .washer_service
        .dispatch(&device_id, &capability, &req.value)
        .await?;

    let (outcome, observed, error) = match outcome {
        DispatchOutcome::Confirmed { observed } => ("confirmed", Some(observed), None),
        DispatchOutcome::UnconfirmedEffect { observed } => {
            ("unconfirmed_effect", Some(observed), None)
        }
        DispatchOutcome::StatusUnknown { error } => {
            ("status_unknown", None, Some(error.to_string()))
        }
    };
    Ok(DispatchResult::Ok(Json(DispatchResponse {
        capability,
        value: req.value,
        outcome,
        observed,
        error,
    })))
}
