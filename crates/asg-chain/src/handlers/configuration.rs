//! Group configuration handler
//!
//! Creates the group when it is missing, otherwise updates it in place, then
//! blocks until the group reaches the state implied by its desired capacity:
//!
//! - created, or updated to a desired capacity above zero: every instance ready
//! - updated to a desired capacity of zero: scaled to zero
//!
//! An update without `desiredCapacity` keeps the running count, clamped to
//! the new size bounds.

use crate::error::ChainError;
use crate::handler::{mismatch, single_manifest, step, wait_step, ManifestHandler};
use crate::request::{ConfigurationManifestRequest, ManifestRequest};
use crate::state::ChainState;
use asg_cloud::{CloudControlPlane, Group};
use asg_manifest::{
    CapacityOverrides, ContentParser, GroupConfigurationRequest, LaunchTemplateSpecification,
    ManifestModel, ManifestType,
};
use std::sync::Arc;

/// Creates or updates the group and waits for it to settle
pub struct ConfigurationHandler {
    client: Arc<dyn CloudControlPlane>,
    parser: ContentParser,
}

impl ConfigurationHandler {
    #[must_use]
    pub fn new(client: Arc<dyn CloudControlPlane>) -> Self {
        Self {
            client,
            parser: ContentParser::new(),
        }
    }

    /// Capacity overrides in effect for this invocation
    fn capacity_overrides(
        req: &ConfigurationManifestRequest,
        running: Option<&Group>,
    ) -> Result<CapacityOverrides, ChainError> {
        match running {
            Some(group) if req.use_already_running_instances => {
                tracing::info!(
                    "Reusing running capacity of {}: min={} max={} desired={}",
                    group.name,
                    group.min_size,
                    group.max_size,
                    group.desired_capacity
                );
                Ok(CapacityOverrides::from_running(
                    group.min_size,
                    group.max_size,
                    group.desired_capacity,
                ))
            }
            _ => Ok(CapacityOverrides::from_map(&req.overrides)?),
        }
    }

    /// Build the effective request sent to the provider
    fn prepare(
        &self,
        state: &ChainState,
        req: &ConfigurationManifestRequest,
        running: Option<&Group>,
    ) -> Result<GroupConfigurationRequest, ChainError> {
        let raw = single_manifest(ManifestType::Configuration, &req.manifests)?;
        let mut config: GroupConfigurationRequest = self.parser.parse(raw)?;
        Self::capacity_overrides(req, running)?.apply_to(&mut config);

        config.auto_scaling_group_name = Some(state.group_name().to_string());
        if let Some(version) = state.launch_template_version().version() {
            config.launch_template = Some(LaunchTemplateSpecification {
                launch_template_id: None,
                launch_template_name: Some(state.group_name().to_string()),
                version: Some(version.to_string()),
            });
        }
        config.normalize_vpc_zone_identifier();
        config.validate()?;
        Ok(config)
    }
}

/// Rollback snapshot of a live group in request shape
pub(crate) fn snapshot_request(group: &Group) -> GroupConfigurationRequest {
    let mut request = GroupConfigurationRequest {
        auto_scaling_group_name: Some(group.name.clone()),
        launch_template: group.launch_template.clone(),
        mixed_instances_policy: group.mixed_instances_policy.clone(),
        min_size: group.min_size,
        max_size: group.max_size,
        desired_capacity: Some(group.desired_capacity),
        default_cooldown: group.default_cooldown,
        availability_zones: group.availability_zones.clone(),
        load_balancer_names: group.load_balancer_names.clone(),
        target_group_arns: group.target_group_arns.clone(),
        health_check_type: group.health_check_type.clone(),
        health_check_grace_period: group.health_check_grace_period,
        vpc_zone_identifier: group.vpc_zone_identifier.clone(),
        termination_policies: group.termination_policies.clone(),
        new_instances_protected_from_scale_in: group.new_instances_protected_from_scale_in,
        service_linked_role_arn: None,
        lifecycle_hook_specification_list: group.lifecycle_hooks.clone(),
        tags: group.tags.clone(),
        capacity_rebalance: group.capacity_rebalance,
        max_instance_lifetime: group.max_instance_lifetime,
    };
    request.normalize_vpc_zone_identifier();
    request
}

#[async_trait::async_trait]
impl ManifestHandler for ConfigurationHandler {
    fn manifest_type(&self) -> ManifestType {
        ManifestType::Configuration
    }

    async fn upsert(&self, state: &mut ChainState, request: &ManifestRequest) -> Result<(), ChainError> {
        let ManifestRequest::Configuration(req) = request else {
            return Err(mismatch(ManifestType::Configuration, request));
        };
        let client = &*self.client;
        let running = state
            .fetch_group(client)
            .await
            .map_err(|e| ChainError::from_cloud("Describe group", e))?;
        let config = self.prepare(state, req, running.as_ref())?;

        let name = state.group_name().to_string();
        let version = state.launch_template_version().version().map(str::to_string);
        let timeout = state.timeouts().steady_state;

        if running.is_none() {
            step(
                "Create group",
                client.create_group(&name, version.as_deref(), &config),
            )
            .await?;
            wait_step(
                "Wait for group instances ready",
                timeout,
                client.wait_ready_state(&name, &Group::all_instances_ready, "group creation"),
            )
            .await?;
        } else {
            step(
                "Update group",
                client.update_group(&name, version.as_deref(), &config),
            )
            .await?;
            let current = running.as_ref().map(|g| g.desired_capacity);
            if config.resulting_desired_capacity(current) == 0 {
                wait_step(
                    "Wait for group scaled to zero",
                    timeout,
                    client.wait_scaled_to_zero(&name, "group update"),
                )
                .await?;
            } else {
                wait_step(
                    "Wait for group instances ready",
                    timeout,
                    client.wait_ready_state(&name, &Group::all_instances_ready, "group update"),
                )
                .await?;
            }
        }

        state
            .refresh_group(client)
            .await
            .map_err(|e| ChainError::from_cloud("Describe group", e))?;
        Ok(())
    }

    async fn capture_rollback_content(
        &self,
        state: &mut ChainState,
        request: &ManifestRequest,
    ) -> Result<(), ChainError> {
        if !matches!(request, ManifestRequest::Configuration(_)) {
            return Err(mismatch(ManifestType::Configuration, request));
        }
        let group = state
            .fetch_group(&*self.client)
            .await
            .map_err(|e| ChainError::from_cloud("Describe group", e))?;
        let Some(group) = group else {
            tracing::debug!("Group {} does not exist, nothing to roll back", state.group_name());
            return Ok(());
        };
        let snapshot = self.parser.serialize(&snapshot_request(&group), false)?;
        state.record_rollback(ManifestType::Configuration, vec![snapshot]);
        Ok(())
    }
}
