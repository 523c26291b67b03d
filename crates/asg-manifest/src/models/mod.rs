//! Typed manifest models
//!
//! Field names follow the provider's JSON request shapes (camelCase), so a
//! manifest written for the provider API parses without translation.

use crate::error::ValidationError;
use crate::ManifestType;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

mod configuration;
mod launch_template;
mod scaling_policy;
mod scheduled_action;
mod traffic;

pub use configuration::{
    CapacityOverrides, GroupConfigurationRequest, GroupTag, LaunchTemplateSpecification,
    LifecycleHookSpecification,
};
pub use launch_template::{
    CreateLaunchTemplateRequest, ImageOverride, LaunchTemplateData, LaunchTemplateManifest,
    LaunchTemplateVersionPointer,
};
pub use scaling_policy::{ScalingPolicyRequest, StepAdjustment};
pub use scheduled_action::ScheduledActionRequest;
pub use traffic::{LoadBalancerConfig, TrafficWeight, WeightedTargetGroup};

/// Caller-supplied override properties, keyed by provider field name
pub type ManifestOverrides = BTreeMap<String, serde_json::Value>;

/// A parsed manifest that knows its type tag and how to validate itself
pub trait ManifestModel: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Manifest type this model belongs to
    const MANIFEST_TYPE: ManifestType;

    /// Type-specific required-field checks
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Read an optional non-negative integer override
pub(crate) fn read_u32(
    overrides: &ManifestOverrides,
    manifest_type: ManifestType,
    key: &str,
) -> Result<Option<u32>, ValidationError> {
    let Some(value) = overrides.get(key) else {
        return Ok(None);
    };
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| {
            ValidationError::invalid(manifest_type, key, format!("expected a non-negative integer, got {value}"))
        })
}
