//! Typed errors for the matching engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Browser navigation failed
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),

    /// Embedding provider unavailable or failed
    #[error("embedding provider error: {0}")]
    Embedding(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Text-generation provider unavailable or failed
    #[error("generation provider error: {0}")]
    Generation(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Embedding vectors from different models were about to be compared
    #[error("embedding dimension mismatch: profile {profile} vs candidate {candidate}")]
    DimensionMismatch { profile: usize, candidate: usize },

    /// External call exceeded its bounded timeout
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    /// Operation was cancelled via `stop`
    #[error("operation cancelled")]
    Cancelled,

    /// Controller was asked to start from a non-startable state
    #[error("cannot start run: {reason}")]
    InvalidStart { reason: String },

    /// The browser driver itself is gone; the run cannot continue
    #[error("browser driver lost: {0}")]
    DriverLost(String),
}

/// Errors produced by browser-driver implementations.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Page failed to load
    #[error("page load failed: {url}")]
    Load { url: String },

    /// Selector matched nothing on the current page
    #[error("selector not found: {selector}")]
    SelectorNotFound { selector: String },

    /// Page load or element lookup timed out
    #[error("timeout navigating: {url}")]
    Timeout { url: String },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Whether this error ends the whole run rather than a single job.
    ///
    /// Everything else is contained per spec: one job's failure never
    /// aborts the run.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, EngineError::Cancelled | EngineError::DriverLost(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_errors_are_contained() {
        let err = EngineError::Navigation(NavigationError::Load {
            url: "https://example.com/job/1".to_string(),
        });
        assert!(!err.is_fatal_to_run());
    }

    #[test]
    fn cancellation_and_driver_loss_end_the_run() {
        assert!(EngineError::Cancelled.is_fatal_to_run());
        assert!(EngineError::DriverLost("session closed".to_string()).is_fatal_to_run());
    }
}
