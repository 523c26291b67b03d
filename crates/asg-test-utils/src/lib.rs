//! Testing utilities for the ASG orchestrator workspace
//!
//! Shared manifest fixtures and seeded provider state.

#![allow(missing_docs)]

pub mod fixtures {
    use asg_cloud::{Group, HealthStatus, Instance, LifecycleState};
    use asg_manifest::{LaunchTemplateSpecification, LoadBalancerConfig, ManifestOverrides};
    use serde_json::{json, Value};

    pub fn launch_template_manifest(image_id: &str) -> String {
        json!({
            "launchTemplateData": {
                "imageId": image_id,
                "instanceType": "t3.micro"
            }
        })
        .to_string()
    }

    pub fn launch_template_manifest_with_user_data(image_id: &str, user_data: &str) -> String {
        json!({
            "launchTemplateData": {
                "imageId": image_id,
                "instanceType": "t3.micro",
                "userData": user_data
            }
        })
        .to_string()
    }

    pub fn configuration_manifest(min: u32, max: u32, desired: u32) -> String {
        json!({
            "minSize": min,
            "maxSize": max,
            "desiredCapacity": desired,
            "availabilityZones": ["us-east-1a", "us-east-1b"],
            "healthCheckType": "EC2",
            "vpcZoneIdentifier": ""
        })
        .to_string()
    }

    pub fn scaling_policy_manifest(name: &str) -> String {
        json!({
            "policyName": name,
            "policyType": "SimpleScaling",
            "adjustmentType": "ChangeInCapacity",
            "scalingAdjustment": 1
        })
        .to_string()
    }

    pub fn scheduled_action_manifest(name: &str, desired: u32) -> String {
        json!({
            "scheduledActionName": name,
            "recurrence": "0 22 * * *",
            "desiredCapacity": desired
        })
        .to_string()
    }

    pub fn overrides(pairs: &[(&str, Value)]) -> ManifestOverrides {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    /// Load balancer with one stage and one prod target group
    pub fn load_balancer(name: &str) -> LoadBalancerConfig {
        LoadBalancerConfig {
            load_balancer: name.to_string(),
            prod_listener_arn: format!("{name}/listener/prod"),
            prod_listener_rule_arn: format!("{name}/rule/prod"),
            stage_listener_arn: format!("{name}/listener/stage"),
            stage_listener_rule_arn: format!("{name}/rule/stage"),
            prod_target_group_arns: vec![format!("{name}/tg/prod")],
            stage_target_group_arns: vec![format!("{name}/tg/stage")],
        }
    }

    /// Existing group with `desired` ready instances on template version 1
    pub fn running_group(name: &str, min: u32, max: u32, desired: u32) -> Group {
        Group {
            name: name.to_string(),
            arn: Some(format!("arn:aws:autoscaling:sim:autoScalingGroup:{name}")),
            min_size: min,
            max_size: max,
            desired_capacity: desired,
            launch_template: Some(LaunchTemplateSpecification {
                launch_template_id: None,
                launch_template_name: Some(name.to_string()),
                version: Some("1".to_string()),
            }),
            availability_zones: vec!["us-east-1a".to_string()],
            health_check_type: Some("EC2".to_string()),
            service_linked_role_arn: Some("arn:aws:iam::000000000000:role/asg".to_string()),
            instances: (0..desired)
                .map(|i| Instance {
                    instance_id: format!("i-{name}-{i}"),
                    lifecycle_state: LifecycleState::InService,
                    health_status: HealthStatus::Healthy,
                })
                .collect(),
            ..Group::default()
        }
    }
}
