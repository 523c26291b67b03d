//! Per-invocation handler input
//!
//! One variant per manifest type. Raw manifest texts stay unparsed until the
//! handler that owns them runs.

use asg_manifest::{LoadBalancerConfig, ManifestOverrides, ManifestType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTemplateManifestRequest {
    pub manifests: Vec<String>,
    #[serde(default)]
    pub overrides: ManifestOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationManifestRequest {
    pub manifests: Vec<String>,
    #[serde(default)]
    pub overrides: ManifestOverrides,
    /// Keep the running group's capacity instead of the caller's overrides
    #[serde(default)]
    pub use_already_running_instances: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingPolicyManifestRequest {
    pub manifests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledActionManifestRequest {
    pub manifests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRefreshManifestRequest {
    pub skip_matching: bool,
    /// Seconds a new instance gets before it counts as healthy
    pub instance_warmup: u32,
    pub min_healthy_percentage: u32,
}

impl Default for InstanceRefreshManifestRequest {
    fn default() -> Self {
        Self {
            skip_matching: false,
            instance_warmup: 300,
            min_healthy_percentage: 90,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTrafficManifestRequest {
    /// Requested stage weight; clamped to `[0, 100]`
    pub weight: i64,
    pub region: String,
    pub load_balancers: Vec<LoadBalancerConfig>,
    /// Group currently serving prod traffic
    #[serde(default)]
    pub prod_group_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapServiceManifestRequest {
    pub region: String,
    pub load_balancers: Vec<LoadBalancerConfig>,
    /// Group currently serving prod traffic
    #[serde(default)]
    pub prod_group_name: Option<String>,
}

/// Input for one handler invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "request")]
pub enum ManifestRequest {
    #[serde(rename = "AsgLaunchTemplate")]
    LaunchTemplate(LaunchTemplateManifestRequest),
    #[serde(rename = "AsgConfiguration")]
    Configuration(ConfigurationManifestRequest),
    #[serde(rename = "AsgScalingPolicy")]
    ScalingPolicy(ScalingPolicyManifestRequest),
    #[serde(rename = "AsgScheduledUpdateGroupAction")]
    ScheduledAction(ScheduledActionManifestRequest),
    #[serde(rename = "AsgInstanceRefresh")]
    InstanceRefresh(InstanceRefreshManifestRequest),
    #[serde(rename = "AsgShiftTraffic")]
    ShiftTraffic(ShiftTrafficManifestRequest),
    #[serde(rename = "AsgSwapService")]
    SwapService(SwapServiceManifestRequest),
}

impl ManifestRequest {
    /// Manifest type this request is addressed to
    #[must_use]
    pub fn manifest_type(&self) -> ManifestType {
        match self {
            Self::LaunchTemplate(_) => ManifestType::LaunchTemplate,
            Self::Configuration(_) => ManifestType::Configuration,
            Self::ScalingPolicy(_) => ManifestType::ScalingPolicy,
            Self::ScheduledAction(_) => ManifestType::ScheduledAction,
            Self::InstanceRefresh(_) => ManifestType::InstanceRefresh,
            Self::ShiftTraffic(_) => ManifestType::ShiftTraffic,
            Self::SwapService(_) => ManifestType::SwapService,
        }
    }

    /// Raw manifest texts carried by the request
    #[must_use]
    pub fn manifests(&self) -> &[String] {
        match self {
            Self::LaunchTemplate(r) => &r.manifests,
            Self::Configuration(r) => &r.manifests,
            Self::ScalingPolicy(r) => &r.manifests,
            Self::ScheduledAction(r) => &r.manifests,
            Self::InstanceRefresh(_) | Self::ShiftTraffic(_) | Self::SwapService(_) => &[],
        }
    }

    /// Rebuild a request from captured rollback snapshots
    ///
    /// Returns `None` for types that never capture rollback content.
    #[must_use]
    pub fn from_rollback(manifest_type: ManifestType, snapshots: Vec<String>) -> Option<Self> {
        match manifest_type {
            ManifestType::LaunchTemplate => Some(Self::LaunchTemplate(LaunchTemplateManifestRequest {
                manifests: snapshots,
                overrides: ManifestOverrides::new(),
            })),
            ManifestType::Configuration => Some(Self::Configuration(ConfigurationManifestRequest {
                manifests: snapshots,
                overrides: ManifestOverrides::new(),
                use_already_running_instances: false,
            })),
            ManifestType::ScalingPolicy => Some(Self::ScalingPolicy(ScalingPolicyManifestRequest {
                manifests: snapshots,
            })),
            ManifestType::ScheduledAction => {
                Some(Self::ScheduledAction(ScheduledActionManifestRequest { manifests: snapshots }))
            }
            ManifestType::InstanceRefresh | ManifestType::ShiftTraffic | ManifestType::SwapService => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matches_manifest_type() {
        let req = ManifestRequest::ShiftTraffic(ShiftTrafficManifestRequest {
            weight: 50,
            ..ShiftTrafficManifestRequest::default()
        });
        assert_eq!(req.manifest_type(), ManifestType::ShiftTraffic);
        assert!(req.manifests().is_empty());

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "AsgShiftTraffic");
        assert_eq!(json["request"]["weight"], 50);
    }

    #[test]
    fn rollback_requests_only_for_capturing_types() {
        for t in ManifestType::ALL {
            let rebuilt = ManifestRequest::from_rollback(t, vec!["{}".into()]);
            assert_eq!(rebuilt.is_some(), t.captures_rollback(), "{t}");
            if let Some(req) = rebuilt {
                assert_eq!(req.manifest_type(), t);
                assert_eq!(req.manifests(), ["{}".to_string()]);
            }
        }
    }
}
