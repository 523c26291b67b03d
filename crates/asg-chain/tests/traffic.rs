//! Shift and swap behavior on listeners and blue/green tags

use asg_chain::{
    ChainFactory, ChainState, ExecutionStrategy, ManifestRequest, ShiftTrafficManifestRequest,
    SwapServiceManifestRequest,
};
use asg_cloud::{BlueGreenColor, CloudCall, SimulatedCloud};
use asg_manifest::{ManifestType, TrafficWeight, WeightedTargetGroup};
use asg_test_utils::fixtures;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

fn two_groups() -> SimulatedCloud {
    let lb = fixtures::load_balancer("lb-1");
    SimulatedCloud::new()
        .with_group(fixtures::running_group("asg-blue", 1, 2, 1))
        .with_group(fixtures::running_group("asg-green", 1, 2, 1))
        .with_default_rule(&lb.prod_listener_arn, &lb.prod_listener_rule_arn)
}

fn canary_state() -> ChainState {
    ChainState::new("asg-green", ExecutionStrategy::Canary)
}

fn shift(weight: i64) -> ManifestRequest {
    ManifestRequest::ShiftTraffic(ShiftTrafficManifestRequest {
        weight,
        region: "us-east-1".to_string(),
        load_balancers: vec![fixtures::load_balancer("lb-1")],
        prod_group_name: Some("asg-blue".to_string()),
    })
}

fn tag_writes(cloud: &SimulatedCloud) -> usize {
    cloud.count_calls(|c| matches!(c, CloudCall::UpdateBlueGreenTags { .. }))
}

#[tokio::test]
async fn intermediate_weights_never_touch_tags() {
    let cloud = Arc::new(two_groups());
    let handler = ChainFactory::new(cloud.clone())
        .handler_for(ManifestType::ShiftTraffic)
        .unwrap();
    let mut state = canary_state();

    for weight in [10, 50, 99] {
        handler.upsert(&mut state, &shift(weight)).await.unwrap();
    }
    assert_eq!(tag_writes(&cloud), 0);
    assert_eq!(cloud.count_calls(CloudCall::is_listener_modification), 3);
    assert_eq!(
        cloud.listener_targets("lb-1/listener/prod", None).unwrap(),
        vec![
            WeightedTargetGroup::new("lb-1/tg/stage", 99),
            WeightedTargetGroup::new("lb-1/tg/prod", 1),
        ]
    );
}

#[tokio::test]
async fn out_of_range_weight_clamps_to_full_and_retags() {
    let cloud = Arc::new(two_groups());
    let handler = ChainFactory::new(cloud.clone())
        .handler_for(ManifestType::ShiftTraffic)
        .unwrap();
    let mut state = canary_state();

    handler.upsert(&mut state, &shift(150)).await.unwrap();

    assert_eq!(
        cloud.listener_targets("lb-1/listener/prod", None).unwrap(),
        vec![
            WeightedTargetGroup::new("lb-1/tg/stage", 100),
            WeightedTargetGroup::new("lb-1/tg/prod", 0),
        ]
    );
    assert_eq!(cloud.group("asg-green").unwrap().blue_green_color(), Some(BlueGreenColor::Blue));
    assert_eq!(cloud.group("asg-blue").unwrap().blue_green_color(), Some(BlueGreenColor::Green));
    assert!(cloud.listener_targets("lb-1/listener/stage", Some("lb-1/rule/stage")).is_none());
}

#[tokio::test]
async fn negative_weight_routes_everything_to_prod() {
    let cloud = Arc::new(two_groups());
    let handler = ChainFactory::new(cloud.clone())
        .handler_for(ManifestType::ShiftTraffic)
        .unwrap();

    handler.upsert(&mut canary_state(), &shift(-20)).await.unwrap();

    assert_eq!(
        cloud.listener_targets("lb-1/listener/prod", None).unwrap(),
        vec![
            WeightedTargetGroup::new("lb-1/tg/stage", 0),
            WeightedTargetGroup::new("lb-1/tg/prod", 100),
        ]
    );
    assert_eq!(tag_writes(&cloud), 0);
}

#[tokio::test]
async fn swap_moves_both_listeners_and_both_tags() {
    let cloud = Arc::new(two_groups());
    let handler = ChainFactory::new(cloud.clone())
        .handler_for(ManifestType::SwapService)
        .unwrap();
    let mut state = ChainState::new("asg-blue", ExecutionStrategy::BlueGreen).with_new_group_name("asg-green");

    let request = ManifestRequest::SwapService(SwapServiceManifestRequest {
        region: "us-east-1".to_string(),
        load_balancers: vec![fixtures::load_balancer("lb-1")],
        prod_group_name: Some("asg-blue".to_string()),
    });
    handler.upsert(&mut state, &request).await.unwrap();

    assert_eq!(
        cloud.calls(),
        vec![
            CloudCall::ModifyDefaultListenerRule {
                listener_arn: "lb-1/listener/prod".into(),
                targets: vec![WeightedTargetGroup::new("lb-1/tg/stage", 100)],
            },
            CloudCall::ModifySpecificListenerRule {
                listener_arn: "lb-1/listener/stage".into(),
                rule_arn: "lb-1/rule/stage".into(),
                targets: vec![WeightedTargetGroup::new("lb-1/tg/prod", 100)],
            },
            CloudCall::UpdateBlueGreenTags {
                name: "asg-green".into(),
                color: BlueGreenColor::Blue,
            },
            CloudCall::UpdateBlueGreenTags {
                name: "asg-blue".into(),
                color: BlueGreenColor::Green,
            },
        ]
    );
}

#[tokio::test]
async fn swap_requires_both_routes() {
    let cloud = Arc::new(two_groups());
    let handler = ChainFactory::new(cloud.clone())
        .handler_for(ManifestType::SwapService)
        .unwrap();
    let mut lb = fixtures::load_balancer("lb-1");
    lb.stage_listener_arn.clear();

    let request = ManifestRequest::SwapService(SwapServiceManifestRequest {
        region: "us-east-1".to_string(),
        load_balancers: vec![lb],
        prod_group_name: Some("asg-blue".to_string()),
    });
    let err = handler.upsert(&mut canary_state(), &request).await.unwrap_err();
    assert!(err.is_pre_mutation());
    assert!(cloud.calls().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn tags_written_iff_weight_reaches_full(requested in -300i64..300) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let cloud = Arc::new(two_groups());
        let handler = ChainFactory::new(cloud.clone())
            .handler_for(ManifestType::ShiftTraffic)
            .unwrap();

        runtime
            .block_on(handler.upsert(&mut canary_state(), &shift(requested)))
            .unwrap();

        let expected = if TrafficWeight::clamped(requested).is_full() { 2 } else { 0 };
        prop_assert_eq!(tag_writes(&cloud), expected);
        prop_assert_eq!(cloud.count_calls(CloudCall::is_listener_modification), 1);
    }
}
