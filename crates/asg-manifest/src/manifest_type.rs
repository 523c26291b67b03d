//! Manifest type tags
//!
//! Every handler in the deployment chain is keyed by one [`ManifestType`].
//! The string tags are the wire names used by pipeline definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag identifying one kind of manifest in the deployment chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ManifestType {
    /// Versioned instance-launch specification
    #[serde(rename = "AsgLaunchTemplate")]
    LaunchTemplate,

    /// The auto-scaling group itself
    #[serde(rename = "AsgConfiguration")]
    Configuration,

    /// Scaling policies attached to the group
    #[serde(rename = "AsgScalingPolicy")]
    ScalingPolicy,

    /// Scheduled capacity actions attached to the group
    #[serde(rename = "AsgScheduledUpdateGroupAction")]
    ScheduledAction,

    /// Rolling instance refresh
    #[serde(rename = "AsgInstanceRefresh")]
    InstanceRefresh,

    /// Weighted canary traffic shift
    #[serde(rename = "AsgShiftTraffic")]
    ShiftTraffic,

    /// Atomic blue/green listener swap
    #[serde(rename = "AsgSwapService")]
    SwapService,
}

impl ManifestType {
    /// All manifest types in default execution order
    pub const ALL: [ManifestType; 7] = [
        Self::LaunchTemplate,
        Self::Configuration,
        Self::ScalingPolicy,
        Self::ScheduledAction,
        Self::InstanceRefresh,
        Self::ShiftTraffic,
        Self::SwapService,
    ];

    /// Wire tag for this manifest type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LaunchTemplate => "AsgLaunchTemplate",
            Self::Configuration => "AsgConfiguration",
            Self::ScalingPolicy => "AsgScalingPolicy",
            Self::ScheduledAction => "AsgScheduledUpdateGroupAction",
            Self::InstanceRefresh => "AsgInstanceRefresh",
            Self::ShiftTraffic => "AsgShiftTraffic",
            Self::SwapService => "AsgSwapService",
        }
    }

    /// Whether handlers of this type capture rollback snapshots
    ///
    /// Instance refreshes and traffic moves are not reversible resources;
    /// traffic is reversed by shifting again with the previous weight.
    #[must_use]
    pub const fn captures_rollback(self) -> bool {
        matches!(
            self,
            Self::LaunchTemplate | Self::Configuration | Self::ScalingPolicy | Self::ScheduledAction
        )
    }
}

impl fmt::Display for ManifestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown manifest type tags
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown manifest type: '{0}'")]
pub struct UnknownManifestType(pub String);

impl FromStr for ManifestType {
    type Err = UnknownManifestType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownManifestType(s.to_string()))
    }
}
