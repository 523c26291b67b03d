//! Simulated control plane
//!
//! In-memory provider used by tests and the `asg-sim` binary. Every mutating
//! call is appended to an ordered call log so callers can assert exactly
//! what the chain asked the provider to do.
//!
//! Knobs:
//! - instances either come up ready immediately or stay `Pending` forever
//! - the outcome of instance refreshes is configurable
//! - any operation can be made to fail with an injected message

use crate::client::{CloudControlPlane, GroupPredicate};
use crate::error::CloudError;
use crate::types::{
    BlueGreenColor, Group, HealthStatus, Instance, InstanceRefreshStatus, LaunchTemplate,
    LifecycleState, BG_VERSION_TAG,
};
use asg_manifest::{
    CreateLaunchTemplateRequest, GroupConfigurationRequest, GroupTag, LaunchTemplateSpecification,
    ScalingPolicyRequest, ScheduledActionRequest, WeightedTargetGroup,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use uuid::Uuid;

const SERVICE_LINKED_ROLE: &str =
    "arn:aws:iam::000000000000:role/aws-service-role/autoscaling.amazonaws.com/AWSServiceRoleForAutoScaling";

/// One call made against the simulated provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum CloudCall {
    CreateGroup { name: String, launch_template_version: Option<String>, desired_capacity: u32 },
    UpdateGroup { name: String, launch_template_version: Option<String>, desired_capacity: u32 },
    WaitReadyState { name: String, label: String },
    WaitScaledToZero { name: String, label: String },
    CreateLaunchTemplate { name: String },
    CreateLaunchTemplateVersion { name: String, version: u64 },
    ClearScalingPolicies { name: String },
    AttachScalingPolicies { name: String, policies: Vec<String> },
    ClearScheduledActions { name: String },
    AttachScheduledActions { name: String, actions: Vec<String> },
    StartInstanceRefresh {
        name: String,
        skip_matching: bool,
        instance_warmup_secs: u32,
        min_healthy_percentage: u32,
    },
    WaitInstanceRefresh { name: String, refresh_id: String },
    ModifyDefaultListenerRule { listener_arn: String, targets: Vec<WeightedTargetGroup> },
    ModifySpecificListenerRule {
        listener_arn: String,
        rule_arn: String,
        targets: Vec<WeightedTargetGroup>,
    },
    UpdateBlueGreenTags { name: String, color: BlueGreenColor },
}

impl CloudCall {
    /// Whether the call changes the launch template
    #[must_use]
    pub fn is_template_creation(&self) -> bool {
        matches!(self, Self::CreateLaunchTemplate { .. } | Self::CreateLaunchTemplateVersion { .. })
    }

    /// Whether the call rewrites a listener rule
    #[must_use]
    pub fn is_listener_modification(&self) -> bool {
        matches!(
            self,
            Self::ModifyDefaultListenerRule { .. } | Self::ModifySpecificListenerRule { .. }
        )
    }
}

#[derive(Debug)]
struct TemplateRecord {
    template: LaunchTemplate,
    versions: Vec<CreateLaunchTemplateRequest>,
}

#[derive(Debug)]
struct Inner {
    groups: BTreeMap<String, Group>,
    templates: BTreeMap<String, TemplateRecord>,
    scaling_policies: BTreeMap<String, Vec<ScalingPolicyRequest>>,
    scheduled_actions: BTreeMap<String, Vec<ScheduledActionRequest>>,
    default_rules: BTreeSet<(String, String)>,
    listener_rules: BTreeMap<(String, Option<String>), Vec<WeightedTargetGroup>>,
    refreshes: BTreeMap<String, InstanceRefreshStatus>,
    failures: BTreeMap<String, String>,
    calls: Vec<CloudCall>,
    instances_ready: bool,
    refresh_outcome: InstanceRefreshStatus,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
            templates: BTreeMap::new(),
            scaling_policies: BTreeMap::new(),
            scheduled_actions: BTreeMap::new(),
            default_rules: BTreeSet::new(),
            listener_rules: BTreeMap::new(),
            refreshes: BTreeMap::new(),
            failures: BTreeMap::new(),
            calls: Vec::new(),
            instances_ready: true,
            refresh_outcome: InstanceRefreshStatus::Successful,
        }
    }
}

impl Inner {
    fn check(&self, operation: &str) -> Result<(), CloudError> {
        match self.failures.get(operation) {
            Some(message) => Err(CloudError::api(operation, message.clone())),
            None => Ok(()),
        }
    }

    fn group_mut(&mut self, name: &str) -> Result<&mut Group, CloudError> {
        self.groups
            .get_mut(name)
            .ok_or_else(|| CloudError::not_found("auto scaling group", name))
    }

    fn require_group(&self, name: &str) -> Result<(), CloudError> {
        if self.groups.contains_key(name) {
            Ok(())
        } else {
            Err(CloudError::not_found("auto scaling group", name))
        }
    }
}

/// In-memory [`CloudControlPlane`]
#[derive(Debug)]
pub struct SimulatedCloud {
    inner: Mutex<Inner>,
    poll_interval: Duration,
}

impl Default for SimulatedCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCloud {
    /// Empty provider whose instances come up ready immediately
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Seed an existing group
    #[must_use]
    pub fn with_group(self, group: Group) -> Self {
        self.inner.lock().groups.insert(group.name.clone(), group);
        self
    }

    /// Seed an existing launch template with one version
    #[must_use]
    pub fn with_launch_template(self, name: &str, request: CreateLaunchTemplateRequest) -> Self {
        {
            let mut inner = self.inner.lock();
            inner.templates.insert(
                name.to_string(),
                TemplateRecord {
                    template: LaunchTemplate {
                        launch_template_id: format!("lt-{}", Uuid::new_v4().simple()),
                        launch_template_name: name.to_string(),
                        default_version_number: 1,
                        latest_version_number: 1,
                    },
                    versions: vec![request],
                },
            );
        }
        self
    }

    /// Seed attached scaling policies
    #[must_use]
    pub fn with_scaling_policies(self, group: &str, policies: Vec<ScalingPolicyRequest>) -> Self {
        self.inner.lock().scaling_policies.insert(group.to_string(), policies);
        self
    }

    /// Seed attached scheduled actions
    #[must_use]
    pub fn with_scheduled_actions(self, group: &str, actions: Vec<ScheduledActionRequest>) -> Self {
        self.inner.lock().scheduled_actions.insert(group.to_string(), actions);
        self
    }

    /// Declare `rule_arn` the default rule of `listener_arn`
    #[must_use]
    pub fn with_default_rule(self, listener_arn: &str, rule_arn: &str) -> Self {
        self.inner
            .lock()
            .default_rules
            .insert((listener_arn.to_string(), rule_arn.to_string()));
        self
    }

    /// Polling interval used by the wait operations
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Whether newly launched instances become ready
    pub fn set_instances_ready(&self, ready: bool) {
        self.inner.lock().instances_ready = ready;
    }

    /// Terminal status every instance refresh will report
    pub fn set_refresh_outcome(&self, status: InstanceRefreshStatus) {
        self.inner.lock().refresh_outcome = status;
    }

    /// Make every call of `operation` fail with `message`
    pub fn fail_on(&self, operation: &str, message: &str) {
        self.inner
            .lock()
            .failures
            .insert(operation.to_string(), message.to_string());
    }

    /// Remove an injected failure
    pub fn clear_failure(&self, operation: &str) {
        self.inner.lock().failures.remove(operation);
    }

    /// Ordered log of calls made so far
    #[must_use]
    pub fn calls(&self) -> Vec<CloudCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of logged calls matching `pred`
    pub fn count_calls(&self, pred: impl Fn(&CloudCall) -> bool) -> usize {
        self.inner.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Forget the call log
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Current state of a group
    #[must_use]
    pub fn group(&self, name: &str) -> Option<Group> {
        self.inner.lock().groups.get(name).cloned()
    }

    /// Policies currently attached to a group
    #[must_use]
    pub fn scaling_policies(&self, name: &str) -> Vec<ScalingPolicyRequest> {
        self.inner
            .lock()
            .scaling_policies
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Scheduled actions currently attached to a group
    #[must_use]
    pub fn scheduled_actions(&self, name: &str) -> Vec<ScheduledActionRequest> {
        self.inner
            .lock()
            .scheduled_actions
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Every version submitted for a template, oldest first
    #[must_use]
    pub fn launch_template_versions(&self, name: &str) -> Vec<CreateLaunchTemplateRequest> {
        self.inner
            .lock()
            .templates
            .get(name)
            .map(|r| r.versions.clone())
            .unwrap_or_default()
    }

    /// Forward targets of a listener rule; `None` rule means the default rule
    #[must_use]
    pub fn listener_targets(&self, listener_arn: &str, rule_arn: Option<&str>) -> Option<Vec<WeightedTargetGroup>> {
        self.inner
            .lock()
            .listener_rules
            .get(&(listener_arn.to_string(), rule_arn.map(str::to_string)))
            .cloned()
    }

    fn record(&self, call: CloudCall) {
        tracing::trace!(?call, "simulated cloud call");
        self.inner.lock().calls.push(call);
    }

    fn launch_instances(count: u32, ready: bool) -> Vec<Instance> {
        (0..count)
            .map(|_| Instance {
                instance_id: format!("i-{}", Uuid::new_v4().simple()),
                lifecycle_state: if ready {
                    LifecycleState::InService
                } else {
                    LifecycleState::Pending
                },
                health_status: HealthStatus::Healthy,
            })
            .collect()
    }

    fn apply_request(
        group: &mut Group,
        name: &str,
        launch_template_version: Option<&str>,
        request: &GroupConfigurationRequest,
        current_desired: Option<u32>,
        instances_ready: bool,
    ) {
        group.name = name.to_string();
        group.desired_capacity = request.resulting_desired_capacity(current_desired);
        group.min_size = request.min_size;
        group.max_size = request.max_size;
        group.launch_template = match launch_template_version {
            Some(version) => Some(LaunchTemplateSpecification {
                launch_template_id: None,
                launch_template_name: Some(name.to_string()),
                version: Some(version.to_string()),
            }),
            None => request.launch_template.clone().or_else(|| group.launch_template.take()),
        };
        group.mixed_instances_policy = request.mixed_instances_policy.clone();
        group.default_cooldown = request.default_cooldown;
        group.availability_zones = request.availability_zones.clone();
        group.load_balancer_names = request.load_balancer_names.clone();
        group.target_group_arns = request.target_group_arns.clone();
        group.health_check_type = request.health_check_type.clone();
        group.health_check_grace_period = request.health_check_grace_period;
        group.vpc_zone_identifier = request.vpc_zone_identifier.clone();
        group.termination_policies = request.termination_policies.clone();
        group.new_instances_protected_from_scale_in = request.new_instances_protected_from_scale_in;
        group.capacity_rebalance = request.capacity_rebalance;
        group.max_instance_lifetime = request.max_instance_lifetime;
        if !request.lifecycle_hook_specification_list.is_empty() {
            group.lifecycle_hooks = request.lifecycle_hook_specification_list.clone();
        }
        for tag in &request.tags {
            upsert_tag(&mut group.tags, tag.clone());
        }

        let desired = group.desired_capacity as usize;
        if group.instances.len() > desired {
            group.instances.truncate(desired);
        } else {
            let missing = u32::try_from(desired - group.instances.len()).unwrap_or(u32::MAX);
            group
                .instances
                .extend(Self::launch_instances(missing, instances_ready));
        }
    }

    async fn poll_group(&self, name: &str, predicate: &GroupPredicate) -> Result<(), CloudError> {
        loop {
            let satisfied = {
                let inner = self.inner.lock();
                let group = inner
                    .groups
                    .get(name)
                    .ok_or_else(|| CloudError::not_found("auto scaling group", name))?;
                predicate(group)
            };
            if satisfied {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn upsert_tag(tags: &mut Vec<GroupTag>, tag: GroupTag) {
    match tags.iter_mut().find(|t| t.key == tag.key) {
        Some(existing) => *existing = tag,
        None => tags.push(tag),
    }
}

#[async_trait::async_trait]
impl CloudControlPlane for SimulatedCloud {
    async fn get_group(&self, name: &str) -> Result<Option<Group>, CloudError> {
        let inner = self.inner.lock();
        inner.check("DescribeAutoScalingGroups")?;
        Ok(inner.groups.get(name).cloned())
    }

    async fn create_group(
        &self,
        name: &str,
        launch_template_version: Option<&str>,
        request: &GroupConfigurationRequest,
    ) -> Result<(), CloudError> {
        {
            let mut inner = self.inner.lock();
            inner.check("CreateAutoScalingGroup")?;
            if inner.groups.contains_key(name) {
                return Err(CloudError::api(
                    "CreateAutoScalingGroup",
                    format!("group '{name}' already exists"),
                ));
            }
            let mut group = Group {
                arn: Some(format!("arn:aws:autoscaling:sim:autoScalingGroup:{name}")),
                service_linked_role_arn: Some(SERVICE_LINKED_ROLE.to_string()),
                ..Group::default()
            };
            let ready = inner.instances_ready;
            Self::apply_request(&mut group, name, launch_template_version, request, None, ready);
            inner.groups.insert(name.to_string(), group);
        }
        self.record(CloudCall::CreateGroup {
            name: name.to_string(),
            launch_template_version: launch_template_version.map(str::to_string),
            desired_capacity: request.resulting_desired_capacity(None),
        });
        Ok(())
    }

    async fn update_group(
        &self,
        name: &str,
        launch_template_version: Option<&str>,
        request: &GroupConfigurationRequest,
    ) -> Result<(), CloudError> {
        let desired_capacity = {
            let mut inner = self.inner.lock();
            inner.check("UpdateAutoScalingGroup")?;
            let ready = inner.instances_ready;
            let group = inner.group_mut(name)?;
            let current = Some(group.desired_capacity);
            Self::apply_request(group, name, launch_template_version, request, current, ready);
            group.desired_capacity
        };
        self.record(CloudCall::UpdateGroup {
            name: name.to_string(),
            launch_template_version: launch_template_version.map(str::to_string),
            desired_capacity,
        });
        Ok(())
    }

    async fn wait_ready_state(
        &self,
        name: &str,
        predicate: &GroupPredicate,
        label: &str,
    ) -> Result<(), CloudError> {
        self.inner.lock().check("WaitReadyState")?;
        self.record(CloudCall::WaitReadyState {
            name: name.to_string(),
            label: label.to_string(),
        });
        self.poll_group(name, predicate).await
    }

    async fn wait_scaled_to_zero(&self, name: &str, label: &str) -> Result<(), CloudError> {
        self.inner.lock().check("WaitScaledToZero")?;
        self.record(CloudCall::WaitScaledToZero {
            name: name.to_string(),
            label: label.to_string(),
        });
        self.poll_group(name, &Group::is_scaled_to_zero).await
    }

    async fn get_launch_template(&self, name: &str) -> Result<Option<LaunchTemplate>, CloudError> {
        let inner = self.inner.lock();
        inner.check("DescribeLaunchTemplates")?;
        Ok(inner.templates.get(name).map(|r| r.template.clone()))
    }

    async fn create_launch_template(
        &self,
        name: &str,
        request: &CreateLaunchTemplateRequest,
    ) -> Result<LaunchTemplate, CloudError> {
        let template = {
            let mut inner = self.inner.lock();
            inner.check("CreateLaunchTemplate")?;
            if inner.templates.contains_key(name) {
                return Err(CloudError::api(
                    "CreateLaunchTemplate",
                    format!("launch template '{name}' already exists"),
                ));
            }
            let template = LaunchTemplate {
                launch_template_id: format!("lt-{}", Uuid::new_v4().simple()),
                launch_template_name: name.to_string(),
                default_version_number: 1,
                latest_version_number: 1,
            };
            inner.templates.insert(
                name.to_string(),
                TemplateRecord {
                    template: template.clone(),
                    versions: vec![request.clone()],
                },
            );
            template
        };
        self.record(CloudCall::CreateLaunchTemplate { name: name.to_string() });
        Ok(template)
    }

    async fn create_launch_template_version(
        &self,
        template: &LaunchTemplate,
        data: &CreateLaunchTemplateRequest,
    ) -> Result<u64, CloudError> {
        let name = template.launch_template_name.clone();
        let version = {
            let mut inner = self.inner.lock();
            inner.check("CreateLaunchTemplateVersion")?;
            let record = inner
                .templates
                .get_mut(&name)
                .ok_or_else(|| CloudError::not_found("launch template", name.clone()))?;
            record.versions.push(data.clone());
            record.template.latest_version_number += 1;
            record.template.latest_version_number
        };
        self.record(CloudCall::CreateLaunchTemplateVersion { name, version });
        Ok(version)
    }

    async fn list_scaling_policies(&self, name: &str) -> Result<Vec<ScalingPolicyRequest>, CloudError> {
        let inner = self.inner.lock();
        inner.check("DescribePolicies")?;
        Ok(inner.scaling_policies.get(name).cloned().unwrap_or_default())
    }

    async fn clear_scaling_policies(&self, name: &str) -> Result<(), CloudError> {
        {
            let mut inner = self.inner.lock();
            inner.check("DeletePolicy")?;
            inner.scaling_policies.remove(name);
        }
        self.record(CloudCall::ClearScalingPolicies { name: name.to_string() });
        Ok(())
    }

    async fn attach_scaling_policies(
        &self,
        name: &str,
        policies: &[ScalingPolicyRequest],
    ) -> Result<(), CloudError> {
        {
            let mut inner = self.inner.lock();
            inner.check("PutScalingPolicy")?;
            inner.require_group(name)?;
            inner
                .scaling_policies
                .entry(name.to_string())
                .or_default()
                .extend(policies.iter().cloned());
        }
        self.record(CloudCall::AttachScalingPolicies {
            name: name.to_string(),
            policies: policies.iter().map(|p| p.policy_name.clone()).collect(),
        });
        Ok(())
    }

    async fn list_scheduled_actions(&self, name: &str) -> Result<Vec<ScheduledActionRequest>, CloudError> {
        let inner = self.inner.lock();
        inner.check("DescribeScheduledActions")?;
        Ok(inner.scheduled_actions.get(name).cloned().unwrap_or_default())
    }

    async fn clear_scheduled_actions(&self, name: &str) -> Result<(), CloudError> {
        {
            let mut inner = self.inner.lock();
            inner.check("BatchDeleteScheduledAction")?;
            inner.scheduled_actions.remove(name);
        }
        self.record(CloudCall::ClearScheduledActions { name: name.to_string() });
        Ok(())
    }

    async fn attach_scheduled_actions(
        &self,
        name: &str,
        actions: &[ScheduledActionRequest],
    ) -> Result<(), CloudError> {
        {
            let mut inner = self.inner.lock();
            inner.check("PutScheduledUpdateGroupAction")?;
            inner.require_group(name)?;
            inner
                .scheduled_actions
                .entry(name.to_string())
                .or_default()
                .extend(actions.iter().cloned());
        }
        self.record(CloudCall::AttachScheduledActions {
            name: name.to_string(),
            actions: actions.iter().map(|a| a.scheduled_action_name.clone()).collect(),
        });
        Ok(())
    }

    async fn start_instance_refresh(
        &self,
        name: &str,
        skip_matching: bool,
        instance_warmup_secs: u32,
        min_healthy_percentage: u32,
    ) -> Result<String, CloudError> {
        let refresh_id = Uuid::new_v4().to_string();
        {
            let mut inner = self.inner.lock();
            inner.check("StartInstanceRefresh")?;
            inner.require_group(name)?;
            let outcome = inner.refresh_outcome;
            inner.refreshes.insert(refresh_id.clone(), outcome);
        }
        self.record(CloudCall::StartInstanceRefresh {
            name: name.to_string(),
            skip_matching,
            instance_warmup_secs,
            min_healthy_percentage,
        });
        Ok(refresh_id)
    }

    async fn wait_instance_refresh_steady(
        &self,
        name: &str,
        refresh_id: &str,
        _label: &str,
    ) -> Result<InstanceRefreshStatus, CloudError> {
        self.record(CloudCall::WaitInstanceRefresh {
            name: name.to_string(),
            refresh_id: refresh_id.to_string(),
        });
        loop {
            let status = {
                let inner = self.inner.lock();
                inner.check("DescribeInstanceRefreshes")?;
                *inner
                    .refreshes
                    .get(refresh_id)
                    .ok_or_else(|| CloudError::not_found("instance refresh", refresh_id))?
            };
            if status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn is_default_listener_rule(
        &self,
        _region: &str,
        listener_arn: &str,
        rule_arn: &str,
    ) -> Result<bool, CloudError> {
        let inner = self.inner.lock();
        inner.check("DescribeRules")?;
        Ok(inner
            .default_rules
            .contains(&(listener_arn.to_string(), rule_arn.to_string())))
    }

    async fn modify_default_listener_rule(
        &self,
        _region: &str,
        listener_arn: &str,
        targets: &[WeightedTargetGroup],
    ) -> Result<(), CloudError> {
        {
            let mut inner = self.inner.lock();
            inner.check("ModifyListener")?;
            inner
                .listener_rules
                .insert((listener_arn.to_string(), None), targets.to_vec());
        }
        self.record(CloudCall::ModifyDefaultListenerRule {
            listener_arn: listener_arn.to_string(),
            targets: targets.to_vec(),
        });
        Ok(())
    }

    async fn modify_specific_listener_rule(
        &self,
        _region: &str,
        listener_arn: &str,
        rule_arn: &str,
        targets: &[WeightedTargetGroup],
    ) -> Result<(), CloudError> {
        {
            let mut inner = self.inner.lock();
            inner.check("ModifyRule")?;
            inner.listener_rules.insert(
                (listener_arn.to_string(), Some(rule_arn.to_string())),
                targets.to_vec(),
            );
        }
        self.record(CloudCall::ModifySpecificListenerRule {
            listener_arn: listener_arn.to_string(),
            rule_arn: rule_arn.to_string(),
            targets: targets.to_vec(),
        });
        Ok(())
    }

    async fn update_blue_green_tags(&self, name: &str, color: BlueGreenColor) -> Result<(), CloudError> {
        {
            let mut inner = self.inner.lock();
            inner.check("CreateOrUpdateTags")?;
            let group = inner.group_mut(name)?;
            upsert_tag(
                &mut group.tags,
                GroupTag {
                    key: BG_VERSION_TAG.to_string(),
                    value: color.tag_value().to_string(),
                    propagate_at_launch: Some(true),
                },
            );
        }
        self.record(CloudCall::UpdateBlueGreenTags {
            name: name.to_string(),
            color,
        });
        Ok(())
    }
}
