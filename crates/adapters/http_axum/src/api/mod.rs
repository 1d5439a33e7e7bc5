//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod capabilities;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod entities;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};

use washhub_app::ports::{CloudClient, EventPublisher};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<C, P>() -> Router<AppState<C, P>>
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Devices
        .route("/devices", get(devices::list::<C, P>))
        .route("/devices/{id}", get(devices::get::<C, P>))
        // Entity readings
        .route("/devices/{id}/entities", get(entities::list::<C, P>))
        .route(
            "/devices/{id}/entities/{entity_id}",
            get(entities::get::<C, P>),
        )
        // Capabilities
        .route("/capabilities", get(capabilities::list))
        .route(
            "/devices/{id}/capabilities/{capability}",
            post(capabilities::dispatch::<C, P>),
        )
        // Sync events
        .route("/events/stream", get(sse::stream::<C, P>))
}
