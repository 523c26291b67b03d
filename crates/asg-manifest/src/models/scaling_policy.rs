//! Scaling policy manifests

use super::ManifestModel;
use crate::error::ValidationError;
use crate::ManifestType;
use serde::{Deserialize, Serialize};

/// One step of a step-scaling policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAdjustment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_interval_lower_bound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_interval_upper_bound: Option<f64>,
    pub scaling_adjustment: i32,
}

/// Put-scaling-policy request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingPolicyRequest {
    /// Replaced by the chain's group name on attach
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling_group_name: Option<String>,

    pub policy_name: String,

    /// `SimpleScaling` (default), `StepScaling`, `TargetTrackingScaling`
    /// or `PredictiveScaling`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_adjustment_magnitude: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling_adjustment: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_aggregation_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_adjustments: Vec<StepAdjustment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_instance_warmup: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_tracking_configuration: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictive_scaling_configuration: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ManifestModel for ScalingPolicyRequest {
    const MANIFEST_TYPE: ManifestType = ManifestType::ScalingPolicy;

    fn validate(&self) -> Result<(), ValidationError> {
        let t = Self::MANIFEST_TYPE;
        if self.policy_name.trim().is_empty() {
            return Err(ValidationError::missing(t, "policyName"));
        }
        match self.policy_type.as_deref().unwrap_or("SimpleScaling") {
            "SimpleScaling" if self.scaling_adjustment.is_none() => {
                Err(ValidationError::missing(t, "scalingAdjustment"))
            }
            "StepScaling" if self.step_adjustments.is_empty() => {
                Err(ValidationError::missing(t, "stepAdjustments"))
            }
            "TargetTrackingScaling" if self.target_tracking_configuration.is_none() => {
                Err(ValidationError::missing(t, "targetTrackingConfiguration"))
            }
            "PredictiveScaling" if self.predictive_scaling_configuration.is_none() => {
                Err(ValidationError::missing(t, "predictiveScalingConfiguration"))
            }
            "SimpleScaling" | "StepScaling" | "TargetTrackingScaling" | "PredictiveScaling" => Ok(()),
            other => Err(ValidationError::invalid(
                t,
                "policyType",
                format!("unsupported policy type '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ScalingPolicyRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn target_tracking_requires_configuration() {
        let p = parse(json!({"policyName": "cpu", "policyType": "TargetTrackingScaling"}));
        assert_eq!(
            p.validate().unwrap_err(),
            ValidationError::missing(ManifestType::ScalingPolicy, "targetTrackingConfiguration")
        );

        let p = parse(json!({
            "policyName": "cpu",
            "policyType": "TargetTrackingScaling",
            "targetTrackingConfiguration": {"targetValue": 50.0}
        }));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn simple_scaling_is_the_default_type() {
        let p = parse(json!({"policyName": "up"}));
        assert!(p.validate().is_err());
        let p = parse(json!({"policyName": "up", "scalingAdjustment": 1}));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn unknown_policy_type_rejected() {
        let p = parse(json!({"policyName": "x", "policyType": "Magic"}));
        assert!(matches!(
            p.validate(),
            Err(ValidationError::InvalidField { ref field, .. }) if field == "policyType"
        ));
    }

    #[test]
    fn missing_policy_name_is_a_parse_error() {
        assert!(serde_json::from_value::<ScalingPolicyRequest>(json!({"scalingAdjustment": 1})).is_err());
    }
}
