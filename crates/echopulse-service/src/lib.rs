//! Shared HTTP service layer for the echopulse pair.
//!
//! Both the ping and pong binaries are wired from the pieces here: env
//! configuration, the metric family schema, the instrumentation middleware,
//! the outbound peer client, and the HTTP error mapping. It is intended to
//! be consumed by the service crates and by integration tests.

pub mod client;
pub mod config;
pub mod error;
pub mod families;
pub mod middleware;
