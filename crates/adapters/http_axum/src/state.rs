//! Shared application state for axum handlers.

use std::sync::Arc;

use washhub_app::event_bus::InProcessEventBus;
use washhub_app::ports::{CloudClient, EventPublisher};
use washhub_app::services::washer_service::WasherService;

/// Application state shared across all axum handlers.
///
/// Generic over the cloud client and event publisher to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<C, P> {
    /// Discovery, readings and command dispatch.
    pub washer_service: Arc<WasherService<C, P>>,
    /// Event bus the SSE stream subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<C, P> Clone for AppState<C, P> {
    fn clone(&self) -> Self {
        Self {
            washer_service: Arc::clone(&self.washer_service),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<C, P> AppState<C, P>
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create the application state.
    ///
    /// Both values are shared: the daemon keeps the service for shutdown and
    /// the bus for its event log.
    pub fn new(
        washer_service: Arc<WasherService<C, P>>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            washer_service,
            event_bus,
        }
    }
}
