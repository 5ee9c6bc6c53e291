//! Wire types for the Binder launch protocol.
//!
//! This crate contains the serde-serializable types exchanged with the
//! Binder build service and published into the launch state container.
//! These types represent the "protocol layer" - the shapes of data as they
//! appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization and classification
//! * 1:1 with protocol: Match the build service's event-stream payloads
//! * Stable: Changes only when the wire protocol changes
//!
//! The orchestration that consumes these types lives in `binder-rs`.

pub mod event;
pub mod phase;

pub use event::*;
pub use phase::*;
