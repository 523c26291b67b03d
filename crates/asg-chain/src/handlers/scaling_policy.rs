//! Scaling policy handler: full replace of the policies attached to the group

use crate::error::ChainError;
use crate::handler::{mismatch, step, ManifestHandler};
use crate::request::ManifestRequest;
use crate::state::ChainState;
use asg_cloud::CloudControlPlane;
use asg_manifest::{ContentParser, ManifestModel, ManifestType, ScalingPolicyRequest};
use std::sync::Arc;

/// Replaces the group's scaling policies with the manifest list
pub struct ScalingPolicyHandler {
    client: Arc<dyn CloudControlPlane>,
    parser: ContentParser,
}

impl ScalingPolicyHandler {
    #[must_use]
    pub fn new(client: Arc<dyn CloudControlPlane>) -> Self {
        Self {
            client,
            parser: ContentParser::new(),
        }
    }
}

#[async_trait::async_trait]
impl ManifestHandler for ScalingPolicyHandler {
    fn manifest_type(&self) -> ManifestType {
        ManifestType::ScalingPolicy
    }

    async fn upsert(&self, state: &mut ChainState, request: &ManifestRequest) -> Result<(), ChainError> {
        let ManifestRequest::ScalingPolicy(req) = request else {
            return Err(mismatch(ManifestType::ScalingPolicy, request));
        };
        let name = state.group_name().to_string();
        let mut policies: Vec<ScalingPolicyRequest> = self.parser.parse_all(&req.manifests)?;
        for policy in &mut policies {
            policy.validate()?;
            policy.auto_scaling_group_name = Some(name.clone());
        }

        step("Clear scaling policies", self.client.clear_scaling_policies(&name)).await?;
        if !policies.is_empty() {
            step(
                "Attach scaling policies",
                self.client.attach_scaling_policies(&name, &policies),
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
        if !matches!(request, ManifestRequest::ScalingPolicy(_)) {
            return Err(mismatch(ManifestType::ScalingPolicy, request));
        }
        let attached = step(
            "List scaling policies",
            self.client.list_scaling_policies(state.group_name()),
        )
        .await?;
        let snapshots = attached
            .iter()
            .map(|p| self.parser.serialize(p, false))
            .collect::<Result<Vec<_>, _>>()?;
        state.record_rollback(ManifestType::ScalingPolicy, snapshots);
        Ok(())
    }
}
