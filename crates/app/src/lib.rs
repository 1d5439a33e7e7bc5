//! # washhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `CloudClient` — list devices, fetch a status blob, send a protocol write
//!   - `EventPublisher` — publish sync events
//! - Run the **cadence scheduler**: one timer per `(device, cadence)`,
//!   single-flight fetches, stale-result rejection, availability tracking
//! - Run the **command dispatcher**: validate, write, force a refresh, read
//!   the effect back
//! - Expose the `WasherService` facade used by driving adapters
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `washhub-domain` only (plus `tokio` for channels, timers and
//! the poll tasks). Never imports adapter crates. Adapters depend on *this*
//! crate, not the reverse.

pub mod dispatcher;
pub mod event_bus;
pub mod ports;
pub mod scheduler;
pub mod services;

mod slot;

#[cfg(test)]
mod fake;
