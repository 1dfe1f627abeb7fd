//! Event types broadcast to engine consumers.
//!
//! All types derive `serde::Serialize` + `serde::Deserialize` so a host can
//! forward them unchanged over its own IPC channel.

pub mod events;
