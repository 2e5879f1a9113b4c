//! echopulse core: error surface and the in-process metrics registry.
//!
//! This crate defines the shared error type and the metrics aggregation
//! layer used by both the ping and pong services. It intentionally carries
//! no transport or runtime dependencies so it can be reused in multiple
//! contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `EchoPulseError`/`Result` so production
//! processes do not crash on a metrics bug or bad traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;

/// Shared result type.
pub use error::{EchoPulseError, Result};
