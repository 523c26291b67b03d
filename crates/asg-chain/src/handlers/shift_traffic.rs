//! Weighted traffic shift for canary rollouts
//!
//! The stage target groups get the clamped weight `w` and the prod target
//! groups get `100 - w`, both on the prod listener. Blue/green tags only move
//! once `w` reaches 100, so intermediate steps never flip them.

use super::listener::{forward, weighted};
use crate::error::ChainError;
use crate::handler::{mismatch, step, ManifestHandler};
use crate::request::{ManifestRequest, ShiftTrafficManifestRequest};
use crate::state::ChainState;
use asg_cloud::{BlueGreenColor, CloudControlPlane};
use asg_manifest::{LoadBalancerConfig, ManifestType, TrafficWeight, WeightedTargetGroup};
use std::sync::Arc;

/// Splits listener traffic between the prod and stage target groups
pub struct ShiftTrafficHandler {
    client: Arc<dyn CloudControlPlane>,
}

impl ShiftTrafficHandler {
    #[must_use]
    pub fn new(client: Arc<dyn CloudControlPlane>) -> Self {
        Self { client }
    }

    async fn tag_groups(&self, state: &ChainState, req: &ShiftTrafficManifestRequest) -> Result<(), ChainError> {
        let client = &*self.client;
        let new_group = state.stage_group_name();
        step(
            "Tag new group blue",
            client.update_blue_green_tags(new_group, BlueGreenColor::Blue),
        )
        .await?;

        let Some(old_group) = req.prod_group_name.as_deref().filter(|g| *g != new_group) else {
            return Ok(());
        };
        let exists = step("Describe old group", client.get_group(old_group))
            .await?
            .is_some();
        if exists {
            step(
                "Tag old group green",
                client.update_blue_green_tags(old_group, BlueGreenColor::Green),
            )
            .await?;
        } else {
            tracing::info!("Old group {old_group} no longer exists, skipping green tag");
        }
        Ok(())
    }
}

/// Forward targets for the prod listener at `weight`
pub(crate) fn shifted_targets(lb: &LoadBalancerConfig, weight: TrafficWeight) -> Vec<WeightedTargetGroup> {
    weighted(&lb.stage_target_group_arns, weight.stage())
        .chain(weighted(&lb.prod_target_group_arns, weight.prod()))
        .collect()
}

#[async_trait::async_trait]
impl ManifestHandler for ShiftTrafficHandler {
    fn manifest_type(&self) -> ManifestType {
        ManifestType::ShiftTraffic
    }

    async fn upsert(&self, state: &mut ChainState, request: &ManifestRequest) -> Result<(), ChainError> {
        let ManifestRequest::ShiftTraffic(req) = request else {
            return Err(mismatch(ManifestType::ShiftTraffic, request));
        };
        for lb in &req.load_balancers {
            lb.validate_prod_route(ManifestType::ShiftTraffic)?;
        }

        let weight = TrafficWeight::clamped(req.weight);
        if i64::from(weight.stage()) != req.weight {
            tracing::warn!("Traffic weight {} clamped to {}", req.weight, weight.stage());
        }
        tracing::info!(
            "Shifting traffic: stage={} prod={}",
            weight.stage(),
            weight.prod()
        );

        for lb in &req.load_balancers {
            forward(
                &*self.client,
                &req.region,
                &lb.prod_listener_arn,
                &lb.prod_listener_rule_arn,
                &shifted_targets(lb, weight),
            )
            .await?;
        }

        if weight.is_full() {
            self.tag_groups(state, req).await?;
        }
        Ok(())
    }

    async fn capture_rollback_content(
        &self,
        _state: &mut ChainState,
        request: &ManifestRequest,
    ) -> Result<(), ChainError> {
        if !matches!(request, ManifestRequest::ShiftTraffic(_)) {
            return Err(mismatch(ManifestType::ShiftTraffic, request));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asg_test_utils::fixtures;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn targets_sum_to_full_weight(requested in -500i64..500) {
            let lb = fixtures::load_balancer("lb-1");
            let weight = TrafficWeight::clamped(requested);
            let targets = shifted_targets(&lb, weight);

            prop_assert_eq!(targets.len(), 2);
            prop_assert!(targets[0].weight <= 100);
            prop_assert_eq!(targets[0].weight + targets[1].weight, 100);
            prop_assert_eq!(&targets[0].target_group_arn, &lb.stage_target_group_arns[0]);
        }
    }
}
