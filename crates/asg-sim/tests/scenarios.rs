//! End-to-end simulator scenarios

use asg_cloud::{BlueGreenColor, CloudCall};
use asg_core::OrchestratorConfig;
use asg_manifest::ManifestType;
use asg_sim::{Scenario, TrafficMode};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn canary_shift_promotes_new_group() {
    let scenario = Scenario {
        traffic: TrafficMode::Shift(vec![10, 60, 140]),
        ..Scenario::new("web-green")
    };
    let outcome = asg_sim::run(&scenario, OrchestratorConfig::new()).await.unwrap();

    assert!(outcome.failure.is_none());
    assert_eq!(outcome.applied_weights, vec![10, 60, 100]);
    let deployment = outcome.deployment.as_ref().unwrap();
    assert_eq!(deployment.executed.len(), 5);

    let group = outcome.final_group.as_ref().unwrap();
    assert_eq!(group.desired_capacity, 2);
    assert_eq!(group.launch_template_version(), Some("1"));
    assert_eq!(group.blue_green_color(), Some(BlueGreenColor::Blue));

    let tags: Vec<_> = outcome
        .calls
        .iter()
        .filter_map(|c| match c {
            CloudCall::UpdateBlueGreenTags { name, color } => Some((name.as_str(), *color)),
            _ => None,
        })
        .collect();
    assert_eq!(
        tags,
        vec![
            ("web-green", BlueGreenColor::Blue),
            ("web-green-prod", BlueGreenColor::Green),
        ]
    );
}

#[tokio::test]
async fn swap_modifies_both_listeners() {
    let scenario = Scenario {
        traffic: TrafficMode::Swap,
        ..Scenario::new("api-green")
    };
    let outcome = asg_sim::run(&scenario, OrchestratorConfig::new()).await.unwrap();

    assert!(outcome.applied_weights.is_empty());
    let listener_calls = outcome
        .calls
        .iter()
        .filter(|c| c.is_listener_modification())
        .count();
    assert_eq!(listener_calls, 2);

    let text = asg_sim::render_text(&outcome);
    assert!(text.contains("color=BLUE"));
}

#[tokio::test]
async fn injected_failure_is_reported_and_rolled_back() {
    let scenario = Scenario {
        fail_on: Some("PutScalingPolicy".to_string()),
        rollback: true,
        ..Scenario::new("web-green")
    };
    let outcome = asg_sim::run(&scenario, OrchestratorConfig::new()).await.unwrap();

    let failure = outcome.failure.as_ref().unwrap();
    assert!(failure.message.contains("AsgScalingPolicy"));
    assert!(outcome.deployment.is_none());

    let rollback = outcome.rollback.as_ref().unwrap();
    assert_eq!(rollback.executed, vec![ManifestType::ScalingPolicy]);
    assert!(matches!(
        outcome.calls.last(),
        Some(CloudCall::ClearScalingPolicies { name }) if name == "web-green"
    ));

    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json.get("deployment").is_none());
    assert!(json["failure"]["remediation"].is_string());
}

#[tokio::test]
async fn invalid_config_is_an_error() {
    let config = OrchestratorConfig::new().with_region(" ");
    assert!(asg_sim::run(&Scenario::new("g"), config).await.is_err());
}
