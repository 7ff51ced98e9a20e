use std::future::Future;
use std::time::Duration;

use crate::error::{ErrorCode, NumeratorError, Result};

/// Races `future` against a timer, failing with [`ErrorCode::Timeout`] if
/// the timer wins.
pub async fn with_timeout<T, F>(future: F, timeout: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(NumeratorError::new(
            ErrorCode::Timeout,
            format!("Operation timed out after {:?}", timeout),
        )),
    }
}
