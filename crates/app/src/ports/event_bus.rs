//! Event bus port — publish/subscribe for sync events.

use std::future::Future;

use washhub_domain::error::WashHubError;
use washhub_domain::event::SyncEvent;

/// Publishes sync events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: SyncEvent) -> impl Future<Output = Result<(), WashHubError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: SyncEvent) -> impl Future<Output = Result<(), WashHubError>> + Send {
        (**self).publish(event)
    }
}
