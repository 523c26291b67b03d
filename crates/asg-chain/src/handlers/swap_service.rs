//! Blue/green listener swap

use super::listener::{forward, weighted};
use crate::error::ChainError;
use crate::handler::{mismatch, step, ManifestHandler};
use crate::request::ManifestRequest;
use crate::state::ChainState;
use asg_cloud::{BlueGreenColor, CloudControlPlane};
use asg_manifest::{ManifestType, TrafficWeight};
use std::sync::Arc;

/// Swaps prod and stage listeners in one step, then retags both groups
pub struct SwapServiceHandler {
    client: Arc<dyn CloudControlPlane>,
}

impl SwapServiceHandler {
    #[must_use]
    pub fn new(client: Arc<dyn CloudControlPlane>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ManifestHandler for SwapServiceHandler {
    fn manifest_type(&self) -> ManifestType {
        ManifestType::SwapService
    }

    async fn upsert(&self, state: &mut ChainState, request: &ManifestRequest) -> Result<(), ChainError> {
        let ManifestRequest::SwapService(req) = request else {
            return Err(mismatch(ManifestType::SwapService, request));
        };
        for lb in &req.load_balancers {
            lb.validate_both_routes(ManifestType::SwapService)?;
        }
        let client = &*self.client;

        for lb in &req.load_balancers {
            let to_stage: Vec<_> = weighted(&lb.stage_target_group_arns, TrafficWeight::FULL).collect();
            let to_prod: Vec<_> = weighted(&lb.prod_target_group_arns, TrafficWeight::FULL).collect();
            forward(client, &req.region, &lb.prod_listener_arn, &lb.prod_listener_rule_arn, &to_stage).await?;
            forward(client, &req.region, &lb.stage_listener_arn, &lb.stage_listener_rule_arn, &to_prod).await?;
        }

        step(
            "Tag new group blue",
            client.update_blue_green_tags(state.stage_group_name(), BlueGreenColor::Blue),
        )
        .await?;
        if let Some(old_group) = req.prod_group_name.as_deref() {
            step(
                "Tag old group green",
                client.update_blue_green_tags(old_group, BlueGreenColor::Green),
            )
            .await?;
        }
        Ok(())
    }

    async fn capture_rollback_content(
        &self,
        _state: &mut ChainState,
        request: &ManifestRequest,
    ) -> Result<(), ChainError> {
        if !matches!(request, ManifestRequest::SwapService(_)) {
            return Err(mismatch(ManifestType::SwapService, request));
        }
        Ok(())
    }
}
