//! Launch template manifests
//!
//! A launch template manifest is either a full creation request or, when
//! replayed from a rollback snapshot, a pointer to an existing version.

use super::{ManifestModel, ManifestOverrides};
use crate::error::ValidationError;
use crate::ManifestType;
use serde::{Deserialize, Serialize};

/// Instance launch data carried by a template version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTemplateData {
    /// AMI the instances boot from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,

    /// Instance size, e.g. `t3.micro`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,

    /// SSH key pair name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,

    /// Boot script; base64-encoded on the wire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,

    /// Security groups attached to the primary interface
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,

    /// Provider fields passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Request creating a launch template (or a new version of one)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLaunchTemplateRequest {
    /// Template name; always replaced by the group name before submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template_name: Option<String>,

    /// Free-form description for the new version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_description: Option<String>,

    /// Launch data payload; required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template_data: Option<LaunchTemplateData>,

    /// Provider fields passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CreateLaunchTemplateRequest {
    /// Apply override properties; only the AMI image id is honored
    ///
    /// # Errors
    /// [`ValidationError`] when the payload is absent or the override value
    /// is not a string. Nothing is modified on error.
    pub fn apply_overrides(&mut self, overrides: &ManifestOverrides) -> Result<(), ValidationError> {
        let image = ImageOverride::from_map(overrides)?;
        let data = self
            .launch_template_data
            .as_mut()
            .ok_or_else(|| ValidationError::missing(ManifestType::LaunchTemplate, "launchTemplateData"))?;
        if let Some(image_id) = image.image_id {
            data.image_id = Some(image_id);
        }
        Ok(())
    }
}

/// Launch template overrides recognized by the chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOverride {
    /// Replacement AMI id
    pub image_id: Option<String>,
}

impl ImageOverride {
    /// Override key for the AMI id
    pub const IMAGE_ID: &'static str = "imageId";

    /// Extract recognized keys; unknown keys are ignored
    ///
    /// # Errors
    /// [`ValidationError::InvalidField`] when `imageId` is not a non-empty string.
    pub fn from_map(overrides: &ManifestOverrides) -> Result<Self, ValidationError> {
        let image_id = match overrides.get(Self::IMAGE_ID) {
            None => None,
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(other) => {
                return Err(ValidationError::invalid(
                    ManifestType::LaunchTemplate,
                    Self::IMAGE_ID,
                    format!("expected a non-empty string, got {other}"),
                ))
            }
        };
        Ok(Self { image_id })
    }
}

/// Pointer at an existing template version
///
/// This is the rollback snapshot shape: rolling back a launch template means
/// pointing the group at the previous version, not deleting the new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LaunchTemplateVersionPointer {
    /// Template name
    pub launch_template_name: String,
    /// Version identifier
    pub version: String,
}

/// Either form a launch template manifest may take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LaunchTemplateManifest {
    /// Point at an already existing version
    Pointer(LaunchTemplateVersionPointer),
    /// Create a template or a new version of it
    Template(CreateLaunchTemplateRequest),
}

impl ManifestModel for LaunchTemplateManifest {
    const MANIFEST_TYPE: ManifestType = ManifestType::LaunchTemplate;

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Pointer(p) => {
                if p.version.trim().is_empty() {
                    return Err(ValidationError::missing(Self::MANIFEST_TYPE, "version"));
                }
                Ok(())
            }
            Self::Template(t) => {
                if t.launch_template_data.is_none() {
                    return Err(ValidationError::missing(Self::MANIFEST_TYPE, "launchTemplateData"));
                }
                Ok(())
            }
        }
    }
}
