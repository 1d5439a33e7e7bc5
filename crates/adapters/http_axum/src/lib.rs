//! # washhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for the host platform: discovered washers, entity
//!   readings with availability, accepted values per capability
//! - Map capability writes (`POST /api/devices/{id}/capabilities/{key}`) into
//!   [`WasherService::dispatch`](washhub_app::services::washer_service::WasherService::dispatch)
//!   calls and report how each one ended
//! - Relay sync events as **server-sent events** (`/api/events/stream`)
//!
//! ## Dependency rule
//! Depends on `washhub-app` (for port traits and services) and `washhub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;
