//! Provider-side resource snapshots returned by the control plane

use asg_manifest::{GroupTag, LaunchTemplateSpecification, LifecycleHookSpecification};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag key marking the blue/green identity of a group
pub const BG_VERSION_TAG: &str = "BG_VERSION";

/// Instance lifecycle state as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Pending,
    InService,
    Terminating,
    Terminated,
    Standby,
}

/// Instance health as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// One instance of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    pub lifecycle_state: LifecycleState,
    pub health_status: HealthStatus,
}

impl Instance {
    /// In service and healthy
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lifecycle_state == LifecycleState::InService && self.health_status == HealthStatus::Healthy
    }
}

/// Live snapshot of an auto-scaling group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template: Option<LaunchTemplateSpecification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixed_instances_policy: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cooldown: Option<u32>,
    #[serde(default)]
    pub availability_zones: Vec<String>,
    #[serde(default)]
    pub load_balancer_names: Vec<String>,
    #[serde(default)]
    pub target_group_arns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_grace_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_zone_identifier: Option<String>,
    #[serde(default)]
    pub termination_policies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_instances_protected_from_scale_in: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_linked_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_rebalance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instance_lifetime: Option<u32>,
    #[serde(default)]
    pub tags: Vec<GroupTag>,
    /// Lifecycle hooks attached to the group
    #[serde(default)]
    pub lifecycle_hooks: Vec<LifecycleHookSpecification>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl Group {
    /// Every desired instance exists, is in service and healthy
    #[must_use]
    pub fn all_instances_ready(&self) -> bool {
        let ready = self.instances.iter().filter(|i| i.is_ready()).count();
        ready >= self.desired_capacity as usize && self.instances.iter().all(Instance::is_ready)
    }

    /// No instances remain
    #[must_use]
    pub fn is_scaled_to_zero(&self) -> bool {
        self.desired_capacity == 0 && self.instances.is_empty()
    }

    /// Version of the launch template the group currently launches from
    #[must_use]
    pub fn launch_template_version(&self) -> Option<&str> {
        self.launch_template.as_ref()?.version.as_deref()
    }

    /// Current blue/green tag, if any
    #[must_use]
    pub fn blue_green_color(&self) -> Option<BlueGreenColor> {
        self.tags
            .iter()
            .find(|t| t.key == BG_VERSION_TAG)
            .and_then(|t| BlueGreenColor::from_tag_value(&t.value))
    }
}

/// Launch template metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTemplate {
    pub launch_template_id: String,
    pub launch_template_name: String,
    pub default_version_number: u64,
    pub latest_version_number: u64,
}

/// Terminal and in-flight instance refresh states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceRefreshStatus {
    Pending,
    InProgress,
    Successful,
    Failed,
    Cancelling,
    Cancelled,
    RollbackInProgress,
    RollbackSuccessful,
    RollbackFailed,
}

impl InstanceRefreshStatus {
    /// No further transitions will happen
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Successful
                | Self::Failed
                | Self::Cancelled
                | Self::RollbackSuccessful
                | Self::RollbackFailed
        )
    }
}

impl fmt::Display for InstanceRefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Blue/green identity of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlueGreenColor {
    /// Active, serving prod traffic
    Blue,
    /// Standby
    Green,
}

impl BlueGreenColor {
    /// Tag value written under [`BG_VERSION_TAG`]
    #[must_use]
    pub const fn tag_value(self) -> &'static str {
        match self {
            Self::Blue => "BLUE",
            Self::Green => "GREEN",
        }
    }

    #[must_use]
    pub fn from_tag_value(value: &str) -> Option<Self> {
        match value {
            "BLUE" => Some(Self::Blue),
            "GREEN" => Some(Self::Green),
            _ => None,
        }
    }
}

impl fmt::Display for BlueGreenColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(state: LifecycleState) -> Instance {
        Instance {
            instance_id: "i-1".into(),
            lifecycle_state: state,
            health_status: HealthStatus::Healthy,
        }
    }

    #[test]
    fn readiness_requires_desired_count() {
        let mut group = Group {
            desired_capacity: 2,
            instances: vec![instance(LifecycleState::InService)],
            ..Group::default()
        };
        assert!(!group.all_instances_ready());
        group.instances.push(instance(LifecycleState::InService));
        assert!(group.all_instances_ready());
        group.instances.push(instance(LifecycleState::Pending));
        assert!(!group.all_instances_ready());
    }

    #[test]
    fn scaled_to_zero_needs_no_instances() {
        let mut group = Group::default();
        assert!(group.is_scaled_to_zero());
        group.instances.push(instance(LifecycleState::Terminating));
        assert!(!group.is_scaled_to_zero());
    }

    #[test]
    fn blue_green_tag_read_back() {
        let group = Group {
            tags: vec![GroupTag {
                key: BG_VERSION_TAG.into(),
                value: "GREEN".into(),
                propagate_at_launch: Some(true),
            }],
            ..Group::default()
        };
        assert_eq!(group.blue_green_color(), Some(BlueGreenColor::Green));
    }

    #[test]
    fn refresh_terminal_states() {
        assert!(InstanceRefreshStatus::Successful.is_terminal());
        assert!(InstanceRefreshStatus::RollbackFailed.is_terminal());
        assert!(!InstanceRefreshStatus::InProgress.is_terminal());
        assert!(!InstanceRefreshStatus::Cancelling.is_terminal());
    }
}
