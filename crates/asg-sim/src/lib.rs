//! Deployment scenarios against the simulated control plane
//!
//! A scenario seeds a [`SimulatedCloud`] with a prod group serving traffic,
//! deploys a new group through the full manifest chain, moves traffic by
//! weighted shift or listener swap, and optionally rolls back.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use asg_chain::{
    ConfigurationManifestRequest, InstanceRefreshManifestRequest, LaunchTemplateManifestRequest,
    ManifestRequest, ScalingPolicyManifestRequest, ScheduledActionManifestRequest,
    ShiftTrafficManifestRequest, SwapServiceManifestRequest,
};
use asg_cloud::{
    BlueGreenColor, CloudCall, Group, HealthStatus, Instance, LifecycleState, SimulatedCloud,
    BG_VERSION_TAG,
};
use asg_core::{DeploymentOrchestrator, DeploymentReport, OrchestratorConfig};
use asg_manifest::{GroupTag, LoadBalancerConfig};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How traffic reaches the new group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficMode {
    /// Weighted shift through the listed weights
    Shift(Vec<i64>),
    /// Immediate listener swap
    Swap,
}

/// Scenario parameters
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Group created by the deployment
    pub group: String,
    /// Group currently serving prod traffic
    pub prod_group: String,
    pub traffic: TrafficMode,
    /// Provider operation to fail during the forward run
    pub fail_on: Option<String>,
    /// Replay rollback data after the forward run
    pub rollback: bool,
}

impl Scenario {
    #[must_use]
    pub fn new(group: impl Into<String>) -> Self {
        let group = group.into();
        Self {
            prod_group: format!("{group}-prod"),
            group,
            traffic: TrafficMode::Shift(vec![25, 50, 100]),
            fail_on: None,
            rollback: false,
        }
    }
}

/// What a scenario did
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Stage weights applied by traffic shifts
    pub applied_weights: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback: Option<DeploymentReport>,
    pub calls: Vec<CloudCall>,
    pub final_group: Option<Group>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub message: String,
    pub remediation: &'static str,
}

/// Load balancer wiring shared by every scenario
#[must_use]
pub fn load_balancer() -> LoadBalancerConfig {
    LoadBalancerConfig {
        load_balancer: "sim-alb".to_string(),
        prod_listener_arn: "sim-alb/listener/443".to_string(),
        prod_listener_rule_arn: "sim-alb/listener/443/default".to_string(),
        stage_listener_arn: "sim-alb/listener/8443".to_string(),
        stage_listener_rule_arn: "sim-alb/listener/8443/rule/1".to_string(),
        prod_target_group_arns: vec!["sim-alb/tg/prod".to_string()],
        stage_target_group_arns: vec!["sim-alb/tg/stage".to_string()],
    }
}

/// Provider seeded with the prod group tagged blue
#[must_use]
pub fn seeded_cloud(scenario: &Scenario) -> SimulatedCloud {
    let lb = load_balancer();
    let prod = Group {
        name: scenario.prod_group.clone(),
        min_size: 1,
        max_size: 4,
        desired_capacity: 2,
        tags: vec![GroupTag {
            key: BG_VERSION_TAG.to_string(),
            value: BlueGreenColor::Blue.tag_value().to_string(),
            propagate_at_launch: Some(true),
        }],
        instances: (0..2)
            .map(|i| Instance {
                instance_id: format!("i-prod-{i}"),
                lifecycle_state: LifecycleState::InService,
                health_status: HealthStatus::Healthy,
            })
            .collect(),
        ..Group::default()
    };
    SimulatedCloud::new()
        .with_group(prod)
        .with_default_rule(&lb.prod_listener_arn, &lb.prod_listener_rule_arn)
}

/// Manifests deploying the new group
#[must_use]
pub fn deployment_plan() -> Vec<ManifestRequest> {
    vec![
        ManifestRequest::LaunchTemplate(LaunchTemplateManifestRequest {
            manifests: vec![json!({
                "launchTemplateData": {
                    "imageId": "ami-0sim",
                    "instanceType": "t3.small",
                    "userData": "#!/bin/sh\necho ready"
                }
            })
            .to_string()],
            ..LaunchTemplateManifestRequest::default()
        }),
        ManifestRequest::Configuration(ConfigurationManifestRequest {
            manifests: vec![json!({
                "minSize": 1,
                "maxSize": 4,
                "desiredCapacity": 2,
                "availabilityZones": ["us-east-1a", "us-east-1b"],
                "healthCheckType": "ELB",
                "healthCheckGracePeriod": 120
            })
            .to_string()],
            ..ConfigurationManifestRequest::default()
        }),
        ManifestRequest::ScalingPolicy(ScalingPolicyManifestRequest {
            manifests: vec![json!({
                "policyName": "cpu-target",
                "policyType": "TargetTrackingScaling",
                "targetTrackingConfiguration": {
                    "predefinedMetricSpecification": {"predefinedMetricType": "ASGAverageCPUUtilization"},
                    "targetValue": 60.0
                }
            })
            .to_string()],
        }),
        ManifestRequest::ScheduledAction(ScheduledActionManifestRequest {
            manifests: vec![json!({
                "scheduledActionName": "nightly-scale-in",
                "recurrence": "0 22 * * *",
                "minSize": 1,
                "desiredCapacity": 1
            })
            .to_string()],
        }),
        ManifestRequest::InstanceRefresh(InstanceRefreshManifestRequest::default()),
    ]
}

/// Run a scenario end to end
///
/// A failing forward step is reported in the outcome, not returned as an
/// error, so the rollback half of the scenario can still run.
///
/// # Errors
/// Configuration errors and rollback failures.
pub async fn run(
    scenario: &Scenario,
    config: OrchestratorConfig,
) -> anyhow::Result<ScenarioOutcome> {
    let cloud = Arc::new(seeded_cloud(scenario));
    if let Some(operation) = &scenario.fail_on {
        cloud.fail_on(operation, "injected failure");
    }
    let region = config.region.clone();
    let orchestrator = DeploymentOrchestrator::new(config, cloud.clone())?;
    let mut state = orchestrator.new_state(&scenario.group);

    let mut applied_weights = Vec::new();
    let forward = async {
        let report = orchestrator.deploy(&mut state, &deployment_plan()).await?;
        match &scenario.traffic {
            TrafficMode::Shift(weights) => {
                let template = ShiftTrafficManifestRequest {
                    weight: 0,
                    region: region.clone(),
                    load_balancers: vec![load_balancer()],
                    prod_group_name: Some(scenario.prod_group.clone()),
                };
                let applied = orchestrator.shift_traffic(&mut state, &template, weights).await?;
                applied_weights.extend(applied.into_iter().map(|w| w.stage()));
            }
            TrafficMode::Swap => {
                let swap = ManifestRequest::SwapService(SwapServiceManifestRequest {
                    region: region.clone(),
                    load_balancers: vec![load_balancer()],
                    prod_group_name: Some(scenario.prod_group.clone()),
                });
                orchestrator.deploy(&mut state, &[swap]).await?;
            }
        }
        Ok::<_, asg_core::OrchestratorError>(report)
    };
    let (deployment, failure) = match forward.await {
        Ok(report) => (Some(report), None),
        Err(e) => {
            tracing::error!("Scenario failed: {e}");
            let failure = Failure {
                message: e.to_string(),
                remediation: e.remediation(),
            };
            (None, Some(failure))
        }
    };

    let rollback = if scenario.rollback {
        if let Some(operation) = &scenario.fail_on {
            cloud.clear_failure(operation);
        }
        Some(orchestrator.rollback(&scenario.group, state.rollback_data()).await?)
    } else {
        None
    };

    Ok(ScenarioOutcome {
        deployment,
        failure,
        applied_weights,
        rollback,
        calls: cloud.calls(),
        final_group: cloud.group(&scenario.group),
    })
}

/// Human-readable summary of an outcome
#[must_use]
pub fn render_text(outcome: &ScenarioOutcome) -> String {
    let mut out = String::new();
    if let Some(report) = &outcome.deployment {
        out.push_str(&format!(
            "Deployment {} of {}: {} step(s), launch template {:?}\n",
            report.run_id,
            report.group_name,
            report.executed.len(),
            report.launch_template_version
        ));
        for (manifest_type, snapshots) in &report.rollback_data {
            out.push_str(&format!("  captured {} snapshot(s) for {manifest_type}\n", snapshots.len()));
        }
    }
    if let Some(failure) = &outcome.failure {
        out.push_str(&format!("Failed: {}\n  hint: {}\n", failure.message, failure.remediation));
    }
    if !outcome.applied_weights.is_empty() {
        out.push_str(&format!("Traffic weights applied: {:?}\n", outcome.applied_weights));
    }
    if let Some(report) = &outcome.rollback {
        out.push_str(&format!(
            "Rollback {}: replayed {:?}\n",
            report.run_id, report.executed
        ));
    }
    out.push_str(&format!("Provider calls ({}):\n", outcome.calls.len()));
    for (i, call) in outcome.calls.iter().enumerate() {
        out.push_str(&format!("  {:>3}. {call:?}\n", i + 1));
    }
    if let Some(group) = &outcome.final_group {
        out.push_str(&format!(
            "Group {}: min={} max={} desired={} color={}\n",
            group.name,
            group.min_size,
            group.max_size,
            group.desired_capacity,
            group
                .blue_green_color()
                .map_or_else(|| "untagged".to_string(), |c| c.to_string())
        ));
    }
    out
}
