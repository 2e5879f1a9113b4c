//! echopulse pong service library.
//!
//! Wires config, the metrics registry, the acknowledgment responder, and the
//! HTTP surface into a cohesive service. It is intended to be consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod ack;
pub mod app_state;
pub mod handlers;
pub mod router;
