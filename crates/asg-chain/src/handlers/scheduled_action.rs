//! Scheduled action handler: full replace of the actions attached to the group

use crate::error::ChainError;
use crate::handler::{mismatch, step, ManifestHandler};
use crate::request::ManifestRequest;
use crate::state::ChainState;
use asg_cloud::CloudControlPlane;
use asg_manifest::{ContentParser, ManifestModel, ManifestType, ScheduledActionRequest};
use std::sync::Arc;

/// Replaces the group's scheduled actions with the manifest list
pub struct ScheduledActionHandler {
    client: Arc<dyn CloudControlPlane>,
    parser: ContentParser,
}

impl ScheduledActionHandler {
    #[must_use]
    pub fn new(client: Arc<dyn CloudControlPlane>) -> Self {
        Self {
            client,
            parser: ContentParser::new(),
        }
    }
}

#[async_trait::async_trait]
impl ManifestHandler for ScheduledActionHandler {
    fn manifest_type(&self) -> ManifestType {
        ManifestType::ScheduledAction
    }

    async fn upsert(&self, state: &mut ChainState, request: &ManifestRequest) -> Result<(), ChainError> {
        let ManifestRequest::ScheduledAction(req) = request else {
            return Err(mismatch(ManifestType::ScheduledAction, request));
        };
        let name = state.group_name().to_string();
        let mut actions: Vec<ScheduledActionRequest> = self.parser.parse_all(&req.manifests)?;
        for action in &mut actions {
            action.validate()?;
            action.auto_scaling_group_name = Some(name.clone());
        }

        step("Clear scheduled actions", self.client.clear_scheduled_actions(&name)).await?;
        if !actions.is_empty() {
            step(
                "Attach scheduled actions",
                self.client.attach_scheduled_actions(&name, &actions),
            )
            .await?;
        }
        Ok(())
    }

    async fn capture_rollback_content(
        &self,
        state: &mut ChainState,
        request: &ManifestRequest,
    ) -> Result<(), ChainError> {
        if !matches!(request, ManifestRequest::ScheduledAction(_)) {
            return Err(mismatch(ManifestType::ScheduledAction, request));
        }
        let attached = step(
            "List scheduled actions",
            self.client.list_scheduled_actions(state.group_name()),
        )
        .await?;
        let snapshots = attached
            .iter()
            .map(|a| self.parser.serialize(a, false))
            .collect::<Result<Vec<_>, _>>()?;
        state.record_rollback(ManifestType::ScheduledAction, snapshots);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ScheduledActionManifestRequest;
    use crate::state::ExecutionStrategy;
    use asg_cloud::SimulatedCloud;
    use asg_test_utils::fixtures;

    #[tokio::test]
    async fn invalid_action_stops_before_clearing() {
        let existing: ScheduledActionRequest =
            serde_json::from_str(&fixtures::scheduled_action_manifest("nightly", 0)).unwrap();
        let cloud = Arc::new(
            SimulatedCloud::new()
                .with_group(fixtures::running_group("asg-1", 0, 2, 1))
                .with_scheduled_actions("asg-1", vec![existing]),
        );
        let handler = ScheduledActionHandler::new(cloud.clone());
        let mut state = ChainState::new("asg-1", ExecutionStrategy::Rolling);

        let req = ManifestRequest::ScheduledAction(ScheduledActionManifestRequest {
            manifests: vec![r#"{"scheduledActionName": "empty"}"#.to_string()],
        });
        let err = handler.upsert(&mut state, &req).await.unwrap_err();

        assert!(matches!(err, ChainError::InvalidManifest(_)));
        assert_eq!(cloud.scheduled_actions("asg-1").len(), 1);
    }
}
