//! Deployment orchestrator
//!
//! Drives a plan of [`ManifestRequest`]s through the handler chain: for each
//! request it captures rollback content and then upserts. Rollback replays
//! the captured snapshots through the same handlers with a fresh state.

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use asg_chain::{
    ChainError, ChainFactory, ChainState, LaunchTemplateVersion, ManifestHandler, ManifestRequest,
    RollbackData, ShiftTrafficManifestRequest,
};
use asg_cloud::CloudControlPlane;
use asg_manifest::{ManifestType, TrafficWeight};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one forward or rollback run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub run_id: Uuid,
    pub group_name: String,
    /// Manifest types in the order they ran
    pub executed: Vec<ManifestType>,
    pub launch_template_version: LaunchTemplateVersion,
    pub rollback_data: RollbackData,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Reference driver for the manifest chain
pub struct DeploymentOrchestrator<C: CloudControlPlane + 'static> {
    config: OrchestratorConfig,
    client: Arc<C>,
    factory: ChainFactory,
}

impl<C: CloudControlPlane + 'static> DeploymentOrchestrator<C> {
    /// Create an orchestrator with the built-in handlers
    ///
    /// # Errors
    /// [`OrchestratorError::Config`] when the configuration is invalid.
    pub fn new(config: OrchestratorConfig, client: Arc<C>) -> Result<Self, OrchestratorError> {
        config.validate()?;
        let factory = ChainFactory::new(client.clone());
        Ok(Self {
            config,
            client,
            factory,
        })
    }

    /// Replace the handler for its manifest type
    pub fn register_handler(&mut self, handler: Arc<dyn ManifestHandler>) {
        self.factory.register(handler);
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Fresh chain state for `group_name` carrying the configured strategy
    /// and wait bounds
    #[must_use]
    pub fn new_state(&self, group_name: &str) -> ChainState {
        ChainState::new(group_name, self.config.execution_strategy)
            .with_timeouts(self.config.wait_timeouts())
    }

    /// Order a plan by the configured manifest order, stable within a type
    #[must_use]
    pub fn ordered<'a>(&self, plan: &'a [ManifestRequest]) -> Vec<&'a ManifestRequest> {
        let mut ordered: Vec<_> = plan.iter().collect();
        ordered.sort_by_key(|r| self.config.order_of(r.manifest_type()));
        ordered
    }

    /// Run a plan forward
    ///
    /// On failure `state` keeps every snapshot captured so far, ready for
    /// [`Self::rollback`].
    ///
    /// # Errors
    /// [`OrchestratorError::Step`] for the first failing request.
    pub async fn deploy(
        &self,
        state: &mut ChainState,
        plan: &[ManifestRequest],
    ) -> Result<DeploymentReport, OrchestratorError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(
            "Deployment {run_id} of {} started ({} strategy, {} steps)",
            state.group_name(),
            state.execution_strategy(),
            plan.len()
        );

        let mut executed = Vec::with_capacity(plan.len());
        for request in self.ordered(plan) {
            let manifest_type = request.manifest_type();
            let handler = self.factory.handler_for(manifest_type)?;
            let step = |source: ChainError| OrchestratorError::Step {
                manifest_type,
                source,
            };
            handler
                .capture_rollback_content(state, request)
                .await
                .map_err(step)?;
            handler.upsert(state, request).await.map_err(step)?;
            executed.push(manifest_type);
        }

        tracing::info!("Deployment {run_id} of {} finished", state.group_name());
        Ok(DeploymentReport {
            run_id,
            group_name: state.group_name().to_string(),
            executed,
            launch_template_version: state.launch_template_version().clone(),
            rollback_data: state.rollback_data().clone(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Replay captured snapshots against `group_name`
    ///
    /// # Errors
    /// [`OrchestratorError::Rollback`] for the first snapshot that fails to
    /// apply.
    pub async fn rollback(
        &self,
        group_name: &str,
        rollback_data: &RollbackData,
    ) -> Result<DeploymentReport, OrchestratorError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = self.new_state(group_name);

        let plan: Vec<ManifestRequest> = rollback_data
            .iter()
            .filter_map(|(t, snapshots)| ManifestRequest::from_rollback(*t, snapshots.clone()))
            .collect();
        tracing::info!(
            "Rollback {run_id} of {group_name} started ({} steps)",
            plan.len()
        );

        let mut executed = Vec::with_capacity(plan.len());
        for request in self.ordered(&plan) {
            let manifest_type = request.manifest_type();
            let handler = self.factory.handler_for(manifest_type)?;
            handler
                .upsert(&mut state, request)
                .await
                .map_err(|source| OrchestratorError::Rollback {
                    manifest_type,
                    source,
                })?;
            executed.push(manifest_type);
        }

        tracing::info!("Rollback {run_id} of {group_name} finished");
        Ok(DeploymentReport {
            run_id,
            group_name: group_name.to_string(),
            executed,
            launch_template_version: state.launch_template_version().clone(),
            rollback_data: RollbackData::new(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Shift traffic through `weights` in order
    ///
    /// Returns the clamped weight applied at each step.
    ///
    /// # Errors
    /// [`OrchestratorError::Step`] for the first failing shift.
    pub async fn shift_traffic(
        &self,
        state: &mut ChainState,
        template: &ShiftTrafficManifestRequest,
        weights: &[i64],
    ) -> Result<Vec<TrafficWeight>, OrchestratorError> {
        let handler = self.factory.handler_for(ManifestType::ShiftTraffic)?;
        let mut applied = Vec::with_capacity(weights.len());
        for &weight in weights {
            let request = ManifestRequest::ShiftTraffic(ShiftTrafficManifestRequest {
                weight,
                ..template.clone()
            });
            handler
                .upsert(state, &request)
                .await
                .map_err(|source| OrchestratorError::Step {
                    manifest_type: ManifestType::ShiftTraffic,
                    source,
                })?;
            applied.push(TrafficWeight::clamped(weight));
        }
        Ok(applied)
    }
}

impl<C: CloudControlPlane + 'static> std::fmt::Debug for DeploymentOrchestrator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentOrchestrator")
            .field("config", &self.config)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asg_chain::ScalingPolicyManifestRequest;
    use asg_cloud::SimulatedCloud;

    #[test]
    fn plan_is_sorted_stably_by_configured_order() {
        let orchestrator =
            DeploymentOrchestrator::new(OrchestratorConfig::new(), Arc::new(SimulatedCloud::new())).unwrap();
        let shift = |w| {
            ManifestRequest::ShiftTraffic(ShiftTrafficManifestRequest {
                weight: w,
                ..ShiftTrafficManifestRequest::default()
            })
        };
        let plan = vec![
            shift(50),
            ManifestRequest::ScalingPolicy(ScalingPolicyManifestRequest::default()),
            shift(100),
        ];

        let ordered = orchestrator.ordered(&plan);
        assert_eq!(ordered[0].manifest_type(), ManifestType::ScalingPolicy);
        assert_eq!(ordered[1], &plan[0]);
        assert_eq!(ordered[2], &plan[2]);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = OrchestratorConfig::new().with_region("");
        let err = DeploymentOrchestrator::new(config, Arc::new(SimulatedCloud::new())).unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }
}
