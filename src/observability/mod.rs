//! Observability infrastructure.
//!
//! Provides structured `tracing` setup for binaries and tests. The store
//! itself only emits events; installing a subscriber is the caller's job.

pub mod tracing;
