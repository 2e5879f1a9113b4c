//! Shared error type across echopulse crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, EchoPulseError>;

/// Unified error type used by the core and both services.
#[derive(Debug, Error)]
pub enum EchoPulseError {
    #[error("duplicate metric family: {0}")]
    DuplicateFamily(&'static str),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("upstream call failed: {0}")]
    Upstream(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl EchoPulseError {
    /// Map to the HTTP status a caller should see (stable API).
    ///
    /// Both services resolve handler failures through this single path, so
    /// the status recorded in metrics always matches the response on the
    /// wire.
    pub fn http_status(&self) -> u16 {
        match self {
            EchoPulseError::BadRequest(_) => 400,
            EchoPulseError::Upstream(_) => 502,
            EchoPulseError::DuplicateFamily(_)
            | EchoPulseError::Config(_)
            | EchoPulseError::Internal(_) => 500,
        }
    }
}
