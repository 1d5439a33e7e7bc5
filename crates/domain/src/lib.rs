//! # washhub-domain
//!
//! Pure domain model for the washhub washer bridge.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, error conventions, timestamps
//! - Define **Snapshots** (the last-known status blob of one poll)
//! - Define **Cadences** (fast and slow polling classes)
//! - Define the **Projection** of snapshot fields into typed entity values
//! - Define the washer **Catalog** (entities, writable capabilities, code tables)
//! - Define **Pending commands** and the effect each one should have
//! - Define **Sync events** (snapshot replaced, poll failed)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod cadence;
pub mod catalog;
pub mod codes;
pub mod command;
pub mod device;
pub mod event;
pub mod projection;
pub mod reading;
pub mod snapshot;
pub mod value;
