//! Server-Sent Events (SSE) stream of sync events.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use washhub_app::ports::{CloudClient, EventPublisher};

use crate::state::AppState;

/// `GET /api/events/stream`
///
/// Sends every [`SyncEvent`](washhub_domain::event::SyncEvent) published on
/// the bus as a JSON `data:` frame until the client disconnects. A lagging
/// client skips the events it missed.
pub async fn stream<C, P>(
    State(state): State<AppState<C, P>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    C: CloudClient + Clone + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().event("sync").data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize sync event for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some events were dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
