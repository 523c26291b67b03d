//! Manifest handler contract
//!
//! Every manifest type is driven by one [`ManifestHandler`]. The driver calls
//! [`ManifestHandler::capture_rollback_content`] before
//! [`ManifestHandler::upsert`] so the snapshot reflects the resource as it
//! was before this run touched it.

use crate::error::ChainError;
use crate::request::ManifestRequest;
use crate::state::ChainState;
use asg_cloud::CloudError;
use asg_manifest::ManifestType;
use std::future::Future;
use std::time::Duration;

/// Handler for one manifest type
#[async_trait::async_trait]
pub trait ManifestHandler: Send + Sync {
    /// Manifest type this handler parses and applies
    fn manifest_type(&self) -> ManifestType;

    /// Create or update the resource; safe to call more than once
    async fn upsert(&self, state: &mut ChainState, request: &ManifestRequest) -> Result<(), ChainError>;

    /// Remove the resource
    ///
    /// Deployments never delete through the chain, so the default is a no-op.
    async fn delete(&self, _state: &mut ChainState, _request: &ManifestRequest) -> Result<(), ChainError> {
        Ok(())
    }

    /// Snapshot the live resource into `state`'s rollback data
    async fn capture_rollback_content(
        &self,
        state: &mut ChainState,
        request: &ManifestRequest,
    ) -> Result<(), ChainError>;
}

/// Error for a request addressed to another handler
pub(crate) fn mismatch(expected: ManifestType, request: &ManifestRequest) -> ChainError {
    ChainError::RequestMismatch {
        expected,
        actual: request.manifest_type(),
    }
}

/// Run one provider call with start/end logging
pub(crate) async fn step<T, F>(operation: &str, call: F) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, CloudError>>,
{
    tracing::info!("{operation} has started");
    match call.await {
        Ok(value) => {
            tracing::info!("{operation} ended successfully");
            Ok(value)
        }
        Err(e) => {
            let err = ChainError::from_cloud(operation, e);
            tracing::error!("{operation} failed: {err}");
            Err(err)
        }
    }
}

/// Run one blocking wait bounded by `timeout`
pub(crate) async fn wait_step<T, F>(operation: &str, timeout: Duration, call: F) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, CloudError>>,
{
    tracing::info!("{operation} has started");
    let result = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ChainError::from_cloud(operation, e)),
        Err(_) => Err(ChainError::WaitTimeoutExceeded {
            operation: operation.to_string(),
            timeout: Some(timeout),
        }),
    };
    match &result {
        Ok(_) => tracing::info!("{operation} ended successfully"),
        Err(err) => tracing::error!("{operation} failed: {err}"),
    }
    result
}

/// First manifest of a request that expects exactly one document
pub(crate) fn single_manifest<'a>(
    manifest_type: ManifestType,
    manifests: &'a [String],
) -> Result<&'a str, ChainError> {
    manifests
        .first()
        .map(String::as_str)
        .ok_or_else(|| asg_manifest::ValidationError::missing(manifest_type, "manifest").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn step_maps_client_errors() {
        let err = step::<(), _>("Update group", async { Err(CloudError::api("UpdateAutoScalingGroup", "nope")) })
            .await
            .unwrap_err();
        assert!(err.is_provider_failure());
    }

    #[tokio::test]
    async fn wait_step_times_out() {
        let err = wait_step::<(), _>("Wait for group ready", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ChainError::WaitTimeoutExceeded { timeout: Some(t), .. } if t == Duration::from_millis(20)
        ));
    }

    #[test]
    fn single_manifest_requires_one() {
        let err = single_manifest(ManifestType::Configuration, &[]).unwrap_err();
        assert!(matches!(err, ChainError::InvalidManifest(_)));
        let docs = vec!["{}".to_string(), "[]".to_string()];
        assert_eq!(single_manifest(ManifestType::Configuration, &docs).unwrap(), "{}");
    }
}
