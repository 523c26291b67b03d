//! Instance refresh handler

use crate::error::ChainError;
use crate::handler::{mismatch, step, wait_step, ManifestHandler};
use crate::request::ManifestRequest;
use crate::state::ChainState;
use asg_cloud::{CloudControlPlane, CloudError, InstanceRefreshStatus};
use asg_manifest::ManifestType;
use std::sync::Arc;

/// Rolls instances onto the group's current launch template
///
/// Does nothing on a first deploy, when the group does not exist yet.
pub struct InstanceRefreshHandler {
    client: Arc<dyn CloudControlPlane>,
}

impl InstanceRefreshHandler {
    #[must_use]
    pub fn new(client: Arc<dyn CloudControlPlane>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ManifestHandler for InstanceRefreshHandler {
    fn manifest_type(&self) -> ManifestType {
        ManifestType::InstanceRefresh
    }

    async fn upsert(&self, state: &mut ChainState, request: &ManifestRequest) -> Result<(), ChainError> {
        let ManifestRequest::InstanceRefresh(req) = request else {
            return Err(mismatch(ManifestType::InstanceRefresh, request));
        };
        let client = &*self.client;
        let group = state
            .fetch_group(client)
            .await
            .map_err(|e| ChainError::from_cloud("Describe group", e))?;
        if group.is_none() {
            tracing::info!("Group {} does not exist, skipping instance refresh", state.group_name());
            return Ok(());
        }

        let name = state.group_name().to_string();
        let refresh_id = step(
            "Start instance refresh",
            client.start_instance_refresh(
                &name,
                req.skip_matching,
                req.instance_warmup,
                req.min_healthy_percentage,
            ),
        )
        .await?;
        let status = wait_step(
            "Wait for instance refresh",
            state.timeouts().instance_refresh,
            client.wait_instance_refresh_steady(&name, &refresh_id, "instance refresh"),
        )
        .await?;

        state.invalidate_group();
        if status != InstanceRefreshStatus::Successful {
            let err = ChainError::ProviderOperationFailed {
                operation: "Instance refresh".to_string(),
                source: CloudError::api(
                    "StartInstanceRefresh",
                    format!("refresh {refresh_id} ended with status {status}"),
                ),
            };
            tracing::error!("{err}");
            return Err(err);
        }
        Ok(())
    }

    async fn capture_rollback_content(
        &self,
        _state: &mut ChainState,
        request: &ManifestRequest,
    ) -> Result<(), ChainError> {
        if !matches!(request, ManifestRequest::InstanceRefresh(_)) {
            return Err(mismatch(ManifestType::InstanceRefresh, request));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::InstanceRefreshManifestRequest;
    use crate::state::ExecutionStrategy;
    use asg_cloud::{CloudCall, SimulatedCloud};
    use asg_test_utils::fixtures;

    fn request() -> ManifestRequest {
        ManifestRequest::InstanceRefresh(InstanceRefreshManifestRequest::default())
    }

    #[tokio::test]
    async fn no_op_without_group() {
        let cloud = Arc::new(SimulatedCloud::new());
        let handler = InstanceRefreshHandler::new(cloud.clone());
        let mut state = ChainState::new("asg-1", ExecutionStrategy::Rolling);

        handler.upsert(&mut state, &request()).await.unwrap();
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn refresh_passes_parameters() {
        let cloud = Arc::new(SimulatedCloud::new().with_group(fixtures::running_group("asg-1", 1, 2, 1)));
        let handler = InstanceRefreshHandler::new(cloud.clone());
        let mut state = ChainState::new("asg-1", ExecutionStrategy::Rolling);

        handler.upsert(&mut state, &request()).await.unwrap();
        assert!(cloud.calls().iter().any(|c| matches!(
            c,
            CloudCall::StartInstanceRefresh {
                skip_matching: false,
                instance_warmup_secs: 300,
                min_healthy_percentage: 90,
                ..
            }
        )));
        handler
            .capture_rollback_content(&mut state, &request())
            .await
            .unwrap();
        assert!(state.rollback_data().is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_is_a_provider_failure() {
        let cloud = Arc::new(SimulatedCloud::new().with_group(fixtures::running_group("asg-1", 1, 2, 1)));
        cloud.set_refresh_outcome(InstanceRefreshStatus::RollbackSuccessful);
        let handler = InstanceRefreshHandler::new(cloud);
        let mut state = ChainState::new("asg-1", ExecutionStrategy::Rolling);

        let err = handler.upsert(&mut state, &request()).await.unwrap_err();
        assert!(err.is_provider_failure());
    }
}
