//! Cloud control-plane client boundary
//!
//! Everything the deployment chain needs from the provider goes through
//! [`CloudControlPlane`]. "Not found" is an `Ok(None)`, never an error, so
//! handlers branch on an explicit condition.

use crate::error::CloudError;
use crate::types::{BlueGreenColor, Group, InstanceRefreshStatus, LaunchTemplate};
use asg_manifest::{
    CreateLaunchTemplateRequest, GroupConfigurationRequest, ScalingPolicyRequest,
    ScheduledActionRequest, WeightedTargetGroup,
};

/// Predicate evaluated against a live group while waiting
pub type GroupPredicate = dyn Fn(&Group) -> bool + Send + Sync;

/// Provider operations consumed by the manifest handlers
///
/// Implementations may parallelize internally, but every call is awaited
/// to completion by the chain before the next one starts.
#[async_trait::async_trait]
pub trait CloudControlPlane: Send + Sync {
    /// Describe a group
    async fn get_group(&self, name: &str) -> Result<Option<Group>, CloudError>;

    /// Create a group launching from `launch_template_version` of the
    /// template named after the group
    async fn create_group(
        &self,
        name: &str,
        launch_template_version: Option<&str>,
        request: &GroupConfigurationRequest,
    ) -> Result<(), CloudError>;

    /// Update an existing group
    async fn update_group(
        &self,
        name: &str,
        launch_template_version: Option<&str>,
        request: &GroupConfigurationRequest,
    ) -> Result<(), CloudError>;

    /// Block until `predicate` holds for the live group
    async fn wait_ready_state(
        &self,
        name: &str,
        predicate: &GroupPredicate,
        label: &str,
    ) -> Result<(), CloudError>;

    /// Block until the group has no instances left
    async fn wait_scaled_to_zero(&self, name: &str, label: &str) -> Result<(), CloudError>;

    /// Describe a launch template
    async fn get_launch_template(&self, name: &str) -> Result<Option<LaunchTemplate>, CloudError>;

    /// Create a template; its first version carries `request`'s data
    async fn create_launch_template(
        &self,
        name: &str,
        request: &CreateLaunchTemplateRequest,
    ) -> Result<LaunchTemplate, CloudError>;

    /// Create a new version of `template`, returning its version number
    async fn create_launch_template_version(
        &self,
        template: &LaunchTemplate,
        data: &CreateLaunchTemplateRequest,
    ) -> Result<u64, CloudError>;

    async fn list_scaling_policies(&self, name: &str) -> Result<Vec<ScalingPolicyRequest>, CloudError>;

    async fn clear_scaling_policies(&self, name: &str) -> Result<(), CloudError>;

    async fn attach_scaling_policies(
        &self,
        name: &str,
        policies: &[ScalingPolicyRequest],
    ) -> Result<(), CloudError>;

    async fn list_scheduled_actions(&self, name: &str) -> Result<Vec<ScheduledActionRequest>, CloudError>;

    async fn clear_scheduled_actions(&self, name: &str) -> Result<(), CloudError>;

    async fn attach_scheduled_actions(
        &self,
        name: &str,
        actions: &[ScheduledActionRequest],
    ) -> Result<(), CloudError>;

    /// Start an instance refresh, returning its id
    async fn start_instance_refresh(
        &self,
        name: &str,
        skip_matching: bool,
        instance_warmup_secs: u32,
        min_healthy_percentage: u32,
    ) -> Result<String, CloudError>;

    /// Block until the refresh reaches a terminal status and return it
    async fn wait_instance_refresh_steady(
        &self,
        name: &str,
        refresh_id: &str,
        label: &str,
    ) -> Result<InstanceRefreshStatus, CloudError>;

    /// Whether `rule_arn` is the listener's default rule
    async fn is_default_listener_rule(
        &self,
        region: &str,
        listener_arn: &str,
        rule_arn: &str,
    ) -> Result<bool, CloudError>;

    /// Replace the forward action of the listener's default rule
    async fn modify_default_listener_rule(
        &self,
        region: &str,
        listener_arn: &str,
        targets: &[WeightedTargetGroup],
    ) -> Result<(), CloudError>;

    /// Replace the forward action of a non-default rule
    async fn modify_specific_listener_rule(
        &self,
        region: &str,
        listener_arn: &str,
        rule_arn: &str,
        targets: &[WeightedTargetGroup],
    ) -> Result<(), CloudError>;

    /// Write the blue/green tag on a group
    async fn update_blue_green_tags(&self, name: &str, color: BlueGreenColor) -> Result<(), CloudError>;
}
