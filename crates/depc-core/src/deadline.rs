//! Deadline wrapper for daemon calls
//!
//! Every control-plane call in the pipeline is bounded; a call that outlives
//! its deadline surfaces as `CoreError::DaemonTimeout` with the operation
//! name, distinct from the call's own failure modes.

use crate::{CoreError, Result};
use std::future::Future;
use std::time::Duration;

pub(crate) async fn bounded<T, F>(op: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = depc_provider::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(CoreError::from),
        Err(_) => Err(CoreError::DaemonTimeout(op)),
    }
}

/// Same as `bounded`, but keeps the provider error for call-site mapping
pub(crate) async fn bounded_raw<T, F>(
    op: &'static str,
    limit: Duration,
    fut: F,
) -> Result<depc_provider::Result<T>>
where
    F: Future<Output = depc_provider::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => Ok(result),
        Err(_) => Err(CoreError::DaemonTimeout(op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depc_provider::ProviderError;
    use std::future::{pending, ready};

    #[tokio::test]
    async fn test_bounded_timeout_names_operation() {
        let result = bounded(
            "list_images",
            Duration::from_millis(5),
            pending::<depc_provider::Result<()>>(),
        )
        .await;
        match result {
            Err(CoreError::DaemonTimeout(op)) => assert_eq!(op, "list_images"),
            other => panic!("expected DaemonTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bounded_raw_timeout_names_operation() {
        let result = bounded_raw(
            "start_container",
            Duration::from_millis(5),
            pending::<depc_provider::Result<()>>(),
        )
        .await;
        assert!(matches!(
            result,
            Err(CoreError::DaemonTimeout("start_container"))
        ));
    }

    #[tokio::test]
    async fn test_bounded_passes_value_through() {
        let value = bounded(
            "ping",
            Duration::from_secs(1),
            ready(Ok::<_, ProviderError>(7)),
        )
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_maps_provider_error() {
        let result = bounded(
            "ping",
            Duration::from_secs(1),
            ready(Err::<(), _>(ProviderError::Timeout)),
        )
        .await;
        assert!(matches!(result, Err(CoreError::Provider(_))));
    }

    #[tokio::test]
    async fn test_bounded_raw_keeps_inner_error() {
        let result = bounded_raw(
            "remove_container",
            Duration::from_secs(1),
            ready(Err::<(), _>(ProviderError::Timeout)),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(ProviderError::Timeout)));
    }
}
