//! The connection facade: one transport, one registry, one readiness state.

pub mod core;
mod events;
