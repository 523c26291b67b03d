//! Traffic routing types shared by the shift and swap handlers

use crate::error::ValidationError;
use crate::ManifestType;
use serde::{Deserialize, Serialize};

/// Listener wiring for one load balancer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerConfig {
    pub load_balancer: String,
    pub prod_listener_arn: String,
    pub prod_listener_rule_arn: String,
    pub stage_listener_arn: String,
    pub stage_listener_rule_arn: String,
    pub prod_target_group_arns: Vec<String>,
    pub stage_target_group_arns: Vec<String>,
}

impl LoadBalancerConfig {
    /// Check the wiring needed to route the prod listener
    ///
    /// # Errors
    /// [`ValidationError::MissingField`] for the first absent piece.
    pub fn validate_prod_route(&self, manifest_type: ManifestType) -> Result<(), ValidationError> {
        require(manifest_type, "loadBalancer", &self.load_balancer)?;
        require(manifest_type, "prodListenerArn", &self.prod_listener_arn)?;
        require(manifest_type, "prodListenerRuleArn", &self.prod_listener_rule_arn)?;
        if self.prod_target_group_arns.is_empty() {
            return Err(ValidationError::missing(manifest_type, "prodTargetGroupArns"));
        }
        if self.stage_target_group_arns.is_empty() {
            return Err(ValidationError::missing(manifest_type, "stageTargetGroupArns"));
        }
        Ok(())
    }

    /// Check the wiring needed to route both listeners
    ///
    /// # Errors
    /// [`ValidationError::MissingField`] for the first absent piece.
    pub fn validate_both_routes(&self, manifest_type: ManifestType) -> Result<(), ValidationError> {
        self.validate_prod_route(manifest_type)?;
        require(manifest_type, "stageListenerArn", &self.stage_listener_arn)?;
        require(manifest_type, "stageListenerRuleArn", &self.stage_listener_rule_arn)
    }
}

fn require(manifest_type: ManifestType, field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::missing(manifest_type, field))
    } else {
        Ok(())
    }
}

/// Target group entry of a weighted forward action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedTargetGroup {
    pub target_group_arn: String,
    pub weight: u32,
}

impl WeightedTargetGroup {
    #[must_use]
    pub fn new(target_group_arn: impl Into<String>, weight: u32) -> Self {
        Self {
            target_group_arn: target_group_arn.into(),
            weight,
        }
    }
}

/// Stage traffic weight, always within `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrafficWeight(u32);

impl TrafficWeight {
    /// Full cut-over weight
    pub const FULL: u32 = 100;

    /// Clamp any requested weight into `0..=100`
    #[must_use]
    pub fn clamped(requested: i64) -> Self {
        // clamp keeps the value inside u32 range
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self(requested.clamp(0, i64::from(Self::FULL)) as u32)
    }

    /// Weight routed to the stage target groups
    #[must_use]
    pub fn stage(self) -> u32 {
        self.0
    }

    /// Complementary weight routed to the prod target groups
    #[must_use]
    pub fn prod(self) -> u32 {
        Self::FULL - self.0
    }

    /// Whether this is the terminal cut-over weight
    #[must_use]
    pub fn is_full(self) -> bool {
        self.0 == Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamps_out_of_range_weights() {
        assert_eq!(TrafficWeight::clamped(-5).stage(), 0);
        assert_eq!(TrafficWeight::clamped(140).stage(), 100);
        assert_eq!(TrafficWeight::clamped(140).prod(), 0);
        assert!(TrafficWeight::clamped(100).is_full());
        assert!(!TrafficWeight::clamped(99).is_full());
    }

    #[test]
    fn swap_routes_need_stage_listener() {
        let cfg = LoadBalancerConfig {
            load_balancer: "lb".into(),
            prod_listener_arn: "l-prod".into(),
            prod_listener_rule_arn: "r-prod".into(),
            prod_target_group_arns: vec!["tg-prod".into()],
            stage_target_group_arns: vec!["tg-stage".into()],
            ..LoadBalancerConfig::default()
        };
        assert!(cfg.validate_prod_route(ManifestType::ShiftTraffic).is_ok());
        assert_eq!(
            cfg.validate_both_routes(ManifestType::SwapService).unwrap_err(),
            ValidationError::missing(ManifestType::SwapService, "stageListenerArn")
        );
    }

    proptest! {
        #[test]
        fn prop_weights_are_complementary(requested in any::<i64>()) {
            let w = TrafficWeight::clamped(requested);
            prop_assert!(w.stage() <= 100);
            prop_assert_eq!(w.stage() + w.prod(), 100);
            prop_assert_eq!(w.is_full(), requested >= 100);
        }
    }
}
