//! Chain state threaded through every handler of one deployment run

use asg_cloud::{CloudControlPlane, CloudError, Group};
use asg_manifest::ManifestType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Serialized prior-state snapshots keyed by manifest type
pub type RollbackData = IndexMap<ManifestType, Vec<String>>;

/// How the deployment rolls out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStrategy {
    /// In-place update of one group
    #[default]
    Rolling,
    /// Weighted traffic shift to a new group
    Canary,
    /// Listener swap to a new group
    BlueGreen,
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rolling => "rolling",
            Self::Canary => "canary",
            Self::BlueGreen => "blue-green",
        })
    }
}

/// Launch template version latched for the run
///
/// Once it leaves `NotStarted` no handler creates another version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "version", rename_all = "camelCase")]
pub enum LaunchTemplateVersion {
    /// No launch template step has run yet
    #[default]
    NotStarted,
    /// A version was created during this run
    Created(String),
    /// An existing version was pointed at
    Reused(String),
}

impl LaunchTemplateVersion {
    /// Whether a version has been fixed for the rest of the run
    #[must_use]
    pub fn is_latched(&self) -> bool {
        !matches!(self, Self::NotStarted)
    }

    /// Latched version identifier
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::NotStarted => None,
            Self::Created(v) | Self::Reused(v) => Some(v),
        }
    }
}

/// Upper bounds for blocking waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTimeouts {
    /// Group readiness and scale-to-zero waits
    pub steady_state: Duration,
    /// Instance refresh completion
    pub instance_refresh: Duration,
}

impl Default for WaitTimeouts {
    fn default() -> Self {
        Self {
            steady_state: Duration::from_secs(600),
            instance_refresh: Duration::from_secs(1800),
        }
    }
}

/// Mutable context for one deployment run
///
/// Created once by the driver and passed by `&mut` through every handler.
#[derive(Debug, Clone)]
pub struct ChainState {
    group_name: String,
    new_group_name: Option<String>,
    execution_strategy: ExecutionStrategy,
    launch_template_version: LaunchTemplateVersion,
    group: Option<Group>,
    rollback_data: RollbackData,
    timeouts: WaitTimeouts,
}

impl ChainState {
    /// Create state for a run against `group_name`
    #[must_use]
    pub fn new(group_name: impl Into<String>, execution_strategy: ExecutionStrategy) -> Self {
        Self {
            group_name: group_name.into(),
            new_group_name: None,
            execution_strategy,
            launch_template_version: LaunchTemplateVersion::NotStarted,
            group: None,
            rollback_data: RollbackData::new(),
            timeouts: WaitTimeouts::default(),
        }
    }

    /// Set the group receiving traffic in a blue/green or canary run
    #[inline]
    #[must_use]
    pub fn with_new_group_name(mut self, name: impl Into<String>) -> Self {
        self.new_group_name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: WaitTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[inline]
    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    #[inline]
    #[must_use]
    pub fn new_group_name(&self) -> Option<&str> {
        self.new_group_name.as_deref()
    }

    /// Group that receives stage traffic
    #[must_use]
    pub fn stage_group_name(&self) -> &str {
        self.new_group_name.as_deref().unwrap_or(&self.group_name)
    }

    #[inline]
    #[must_use]
    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.execution_strategy
    }

    #[inline]
    #[must_use]
    pub fn timeouts(&self) -> WaitTimeouts {
        self.timeouts
    }

    #[inline]
    #[must_use]
    pub fn launch_template_version(&self) -> &LaunchTemplateVersion {
        &self.launch_template_version
    }

    /// Latch a version created in this run; ignored once latched
    pub fn latch_created(&mut self, version: impl Into<String>) {
        if !self.launch_template_version.is_latched() {
            self.launch_template_version = LaunchTemplateVersion::Created(version.into());
        }
    }

    /// Latch an existing version; ignored once latched
    pub fn latch_reused(&mut self, version: impl Into<String>) {
        if !self.launch_template_version.is_latched() {
            self.launch_template_version = LaunchTemplateVersion::Reused(version.into());
        }
    }

    /// Cached group snapshot, if fetched
    #[inline]
    #[must_use]
    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    /// Return the cached group, fetching it when absent
    ///
    /// A missing group is not cached so a later fetch sees it once created.
    ///
    /// # Errors
    /// Propagates the client failure.
    pub async fn fetch_group(&mut self, client: &dyn CloudControlPlane) -> Result<Option<Group>, CloudError> {
        if self.group.is_none() {
            self.group = client.get_group(&self.group_name).await?;
        }
        Ok(self.group.clone())
    }

    /// Re-read the group after a mutation
    ///
    /// # Errors
    /// Propagates the client failure; the cache is left empty.
    pub async fn refresh_group(&mut self, client: &dyn CloudControlPlane) -> Result<Option<Group>, CloudError> {
        self.group = None;
        self.fetch_group(client).await
    }

    /// Drop the cached group
    pub fn invalidate_group(&mut self) {
        self.group = None;
    }

    /// Store snapshots for `manifest_type`, replacing any earlier entry
    pub fn record_rollback(&mut self, manifest_type: ManifestType, snapshots: Vec<String>) {
        tracing::debug!(
            "Recorded {} rollback snapshot(s) for {}",
            snapshots.len(),
            manifest_type
        );
        self.rollback_data.insert(manifest_type, snapshots);
    }

    #[inline]
    #[must_use]
    pub fn rollback_data(&self) -> &RollbackData {
        &self.rollback_data
    }

    /// Consume the state, keeping only the captured rollback data
    #[must_use]
    pub fn into_rollback_data(self) -> RollbackData {
        self.rollback_data
    }
}
