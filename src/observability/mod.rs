//! Logging setup for binaries and tests.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the embedding program.

pub mod tracing;
