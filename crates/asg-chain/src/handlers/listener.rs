//! Listener rule routing shared by the traffic handlers

use crate::error::ChainError;
use crate::handler::step;
use asg_cloud::CloudControlPlane;
use asg_manifest::WeightedTargetGroup;

/// Point a listener rule at `targets`
///
/// The default rule is modified through the listener itself; any other rule
/// is modified directly.
pub(crate) async fn forward(
    client: &dyn CloudControlPlane,
    region: &str,
    listener_arn: &str,
    rule_arn: &str,
    targets: &[WeightedTargetGroup],
) -> Result<(), ChainError> {
    let is_default = step(
        "Describe listener rule",
        client.is_default_listener_rule(region, listener_arn, rule_arn),
    )
    .await?;
    if is_default {
        step(
            "Modify default listener rule",
            client.modify_default_listener_rule(region, listener_arn, targets),
        )
        .await
    } else {
        step(
            "Modify listener rule",
            client.modify_specific_listener_rule(region, listener_arn, rule_arn, targets),
        )
        .await
    }
}

/// Every arn in `arns` at the same weight
pub(crate) fn weighted(arns: &[String], weight: u32) -> impl Iterator<Item = WeightedTargetGroup> + '_ {
    arns.iter().map(move |arn| WeightedTargetGroup::new(arn.clone(), weight))
}
