//! Scheduled update group action manifests

use super::ManifestModel;
use crate::error::ValidationError;
use crate::ManifestType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Put-scheduled-update-group-action request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledActionRequest {
    /// Replaced by the chain's group name on attach
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling_group_name: Option<String>,

    pub scheduled_action_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Cron expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_capacity: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ManifestModel for ScheduledActionRequest {
    const MANIFEST_TYPE: ManifestType = ManifestType::ScheduledAction;

    fn validate(&self) -> Result<(), ValidationError> {
        let t = Self::MANIFEST_TYPE;
        if self.scheduled_action_name.trim().is_empty() {
            return Err(ValidationError::missing(t, "scheduledActionName"));
        }
        if self.min_size.is_none() && self.max_size.is_none() && self.desired_capacity.is_none() {
            return Err(ValidationError::invalid(
                t,
                "desiredCapacity",
                "at least one of minSize, maxSize or desiredCapacity is required",
            ));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end <= start {
                return Err(ValidationError::invalid(t, "endTime", "endTime must be after startTime"));
            }
        }
        Ok(())
    }
}
