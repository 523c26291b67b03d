//! Group configuration manifests
//!
//! One request shape serves both group creation and group update, and is also
//! the rollback snapshot shape for a live group.

use super::{read_u32, ManifestModel, ManifestOverrides};
use crate::error::ValidationError;
use crate::ManifestType;
use serde::{Deserialize, Serialize};

/// Reference from a group to a launch template version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTemplateSpecification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Lifecycle hook declared together with the group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleHookSpecification {
    pub lifecycle_hook_name: String,
    pub lifecycle_transition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_target_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
}

/// Group tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTag {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagate_at_launch: Option<bool>,
}

/// Create/update request for an auto-scaling group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfigurationRequest {
    /// Always replaced by the chain's group name before submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling_group_name: Option<String>,

    /// Always replaced by the latched template version when one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template: Option<LaunchTemplateSpecification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixed_instances_policy: Option<serde_json::Value>,

    pub min_size: u32,
    pub max_size: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_capacity: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cooldown: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_group_arns: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_grace_period: Option<u32>,

    /// Comma-separated subnet ids. The provider treats `""` and absent
    /// differently, so empty values are normalized to `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_zone_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub termination_policies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_instances_protected_from_scale_in: Option<bool>,

    /// Provider managed; never resubmitted from a snapshot
    #[serde(
        default,
        rename = "serviceLinkedRoleARN",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_linked_role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lifecycle_hook_specification_list: Vec<LifecycleHookSpecification>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<GroupTag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_rebalance: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instance_lifetime: Option<u32>,
}

impl GroupConfigurationRequest {
    /// Desired capacity the group ends up with
    ///
    /// Without `desiredCapacity` an existing group keeps `current`, moved into
    /// `[minSize, maxSize]`; a new group starts at `minSize`.
    #[must_use]
    pub fn resulting_desired_capacity(&self, current: Option<u32>) -> u32 {
        match (self.desired_capacity, current) {
            (Some(desired), _) => desired,
            (None, Some(current)) => current.min(self.max_size).max(self.min_size),
            (None, None) => self.min_size,
        }
    }

    /// Drop an empty subnet identifier instead of sending `""`
    pub fn normalize_vpc_zone_identifier(&mut self) {
        if self
            .vpc_zone_identifier
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            self.vpc_zone_identifier = None;
        }
    }
}

impl ManifestModel for GroupConfigurationRequest {
    const MANIFEST_TYPE: ManifestType = ManifestType::Configuration;

    fn validate(&self) -> Result<(), ValidationError> {
        if self.min_size > self.max_size {
            return Err(ValidationError::invalid(
                Self::MANIFEST_TYPE,
                "minSize",
                format!("minSize {} exceeds maxSize {}", self.min_size, self.max_size),
            ));
        }
        if let Some(desired) = self.desired_capacity {
            if desired < self.min_size || desired > self.max_size {
                return Err(ValidationError::invalid(
                    Self::MANIFEST_TYPE,
                    "desiredCapacity",
                    format!(
                        "desiredCapacity {desired} outside [{}, {}]",
                        self.min_size, self.max_size
                    ),
                ));
            }
        }
        for hook in &self.lifecycle_hook_specification_list {
            if hook.lifecycle_hook_name.trim().is_empty() {
                return Err(ValidationError::missing(Self::MANIFEST_TYPE, "lifecycleHookName"));
            }
        }
        Ok(())
    }
}

/// Capacity overrides for a group configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapacityOverrides {
    pub min_size: Option<u32>,
    pub max_size: Option<u32>,
    pub desired_capacity: Option<u32>,
}

impl CapacityOverrides {
    pub const MIN_SIZE: &'static str = "minSize";
    pub const MAX_SIZE: &'static str = "maxSize";
    pub const DESIRED_CAPACITY: &'static str = "desiredCapacity";

    /// Read capacity keys from an override map; other keys are ignored
    ///
    /// # Errors
    /// [`ValidationError::InvalidField`] when a capacity key is not a
    /// non-negative integer.
    pub fn from_map(overrides: &ManifestOverrides) -> Result<Self, ValidationError> {
        let t = ManifestType::Configuration;
        Ok(Self {
            min_size: read_u32(overrides, t, Self::MIN_SIZE)?,
            max_size: read_u32(overrides, t, Self::MAX_SIZE)?,
            desired_capacity: read_u32(overrides, t, Self::DESIRED_CAPACITY)?,
        })
    }

    /// Overrides taken verbatim from a running group
    #[must_use]
    pub fn from_running(min_size: u32, max_size: u32, desired_capacity: u32) -> Self {
        Self {
            min_size: Some(min_size),
            max_size: Some(max_size),
            desired_capacity: Some(desired_capacity),
        }
    }

    /// Whether no field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_size.is_none() && self.max_size.is_none() && self.desired_capacity.is_none()
    }

    /// Write every set field onto the request
    pub fn apply_to(&self, request: &mut GroupConfigurationRequest) {
        if let Some(min) = self.min_size {
            request.min_size = min;
        }
        if let Some(max) = self.max_size {
            request.max_size = max;
        }
        if let Some(desired) = self.desired_capacity {
            request.desired_capacity = Some(desired);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(min: u32, max: u32, desired: Option<u32>) -> GroupConfigurationRequest {
        GroupConfigurationRequest {
            min_size: min,
            max_size: max,
            desired_capacity: desired,
            ..GroupConfigurationRequest::default()
        }
    }

    #[test]
    fn overrides_applied_verbatim_and_unknown_keys_ignored() {
        let mut overrides = ManifestOverrides::new();
        overrides.insert("minSize".into(), json!(1));
        overrides.insert("maxSize".into(), json!(5));
        overrides.insert("desiredCapacity".into(), json!("3"));
        overrides.insert("healthCheckType".into(), json!("ELB"));

        let mut req = request(0, 10, Some(0));
        CapacityOverrides::from_map(&overrides).unwrap().apply_to(&mut req);

        assert_eq!((req.min_size, req.max_size, req.desired_capacity), (1, 5, Some(3)));
        assert!(req.health_check_type.is_none());
    }

    #[test]
    fn negative_override_rejected() {
        let mut overrides = ManifestOverrides::new();
        overrides.insert("minSize".into(), json!(1));
        overrides.insert("maxSize".into(), json!(-2));
        assert!(CapacityOverrides::from_map(&overrides).is_err());
    }

    #[test]
    fn desired_outside_bounds_is_invalid() {
        assert!(request(1, 3, Some(4)).validate().is_err());
        assert!(request(4, 3, None).validate().is_err());
        assert!(request(0, 3, Some(0)).validate().is_ok());
    }

    #[test]
    fn omitted_desired_keeps_running_count_within_bounds() {
        assert_eq!(request(0, 5, None).resulting_desired_capacity(Some(3)), 3);
        assert_eq!(request(0, 2, None).resulting_desired_capacity(Some(3)), 2);
        assert_eq!(request(4, 6, None).resulting_desired_capacity(Some(3)), 4);
        assert_eq!(request(2, 6, None).resulting_desired_capacity(None), 2);
        assert_eq!(request(0, 5, Some(0)).resulting_desired_capacity(Some(3)), 0);
    }

    #[test]
    fn empty_vpc_zone_identifier_normalized() {
        let mut req = request(0, 1, None);
        req.vpc_zone_identifier = Some(String::new());
        req.normalize_vpc_zone_identifier();
        assert!(req.vpc_zone_identifier.is_none());

        req.vpc_zone_identifier = Some("subnet-1,subnet-2".into());
        req.normalize_vpc_zone_identifier();
        assert_eq!(req.vpc_zone_identifier.as_deref(), Some("subnet-1,subnet-2"));
    }

    #[test]
    fn service_linked_role_uses_provider_casing() {
        let mut req = request(0, 1, None);
        req.service_linked_role_arn = Some("arn:role".into());
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["serviceLinkedRoleARN"], json!("arn:role"));
    }

    proptest! {
        #[test]
        fn prop_override_fields_win(
            base in (0u32..50, 50u32..100),
            min in proptest::option::of(0u32..200),
            max in proptest::option::of(0u32..200),
            desired in proptest::option::of(0u32..200),
        ) {
            let mut req = request(base.0, base.1, None);
            let overrides = CapacityOverrides { min_size: min, max_size: max, desired_capacity: desired };
            overrides.apply_to(&mut req);

            prop_assert_eq!(req.min_size, min.unwrap_or(base.0));
            prop_assert_eq!(req.max_size, max.unwrap_or(base.1));
            prop_assert_eq!(req.desired_capacity, desired);
        }
    }
}
