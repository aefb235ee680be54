//! Bounded external calls.
//!
//! Every call that leaves the process is wrapped here so that a hung
//! collaborator cannot keep a stop or pause checkpoint unreachable.

use std::future::Future;
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Run a fallible future under a timeout, mapping expiry to
/// `EngineError::Timeout`.
pub(crate) async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout {
            operation,
            seconds: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_completed_futures() {
        let result = bounded("noop", Duration::from_secs(1), async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn maps_expiry_to_timeout_error() {
        let result: Result<()> = bounded("hang", Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            result,
            Err(EngineError::Timeout { operation: "hang", .. })
        ));
    }
}
