//! Chain error types

use asg_cloud::CloudError;
use asg_manifest::{ManifestType, ParseError, SerializeError, UnknownManifestType, ValidationError};
use std::time::Duration;

/// Errors raised while running a manifest handler
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Manifest failed validation; no cloud call was made
    #[error("invalid manifest: {0}")]
    InvalidManifest(#[from] ValidationError),

    /// Manifest text could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Rollback snapshot could not be serialized
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// A provider call failed
    #[error("{operation} failed: {source}")]
    ProviderOperationFailed {
        operation: String,
        #[source]
        source: CloudError,
    },

    /// A blocking wait did not complete in time
    #[error("{operation} did not reach a steady state{}", fmt_timeout(.timeout))]
    WaitTimeoutExceeded {
        operation: String,
        timeout: Option<Duration>,
    },

    /// A handler received a request built for another manifest type
    #[error("{expected} handler cannot run a {actual} request")]
    RequestMismatch {
        expected: ManifestType,
        actual: ManifestType,
    },

    /// No handler registered for the manifest type
    #[error("no handler registered for {0}")]
    NoHandler(ManifestType),

    /// Manifest type tag not recognized
    #[error(transparent)]
    UnknownManifestType(#[from] UnknownManifestType),
}

fn fmt_timeout(timeout: &Option<Duration>) -> String {
    match timeout {
        Some(t) => format!(" within {}s", t.as_secs()),
        None => String::new(),
    }
}

impl ChainError {
    /// Map a client failure for `operation`
    ///
    /// Provider-side wait expiry is reported as a timeout, not a failure.
    #[must_use]
    pub fn from_cloud(operation: impl Into<String>, source: CloudError) -> Self {
        let operation = operation.into();
        if source.is_timeout() {
            Self::WaitTimeoutExceeded {
                operation,
                timeout: None,
            }
        } else {
            Self::ProviderOperationFailed { operation, source }
        }
    }

    /// Check if this is a wait expiry
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeoutExceeded { .. })
    }

    /// Check if the failure came from the provider
    #[inline]
    #[must_use]
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::ProviderOperationFailed { .. })
    }

    /// Check if the error was raised before any cloud mutation
    #[inline]
    #[must_use]
    pub fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            Self::InvalidManifest(_)
                | Self::Parse(_)
                | Self::Serialize(_)
                | Self::RequestMismatch { .. }
                | Self::NoHandler(_)
                | Self::UnknownManifestType(_)
        )
    }

    /// Check if a retry could succeed without operator action
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProviderOperationFailed { source, .. } => source.is_retryable(),
            Self::WaitTimeoutExceeded { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_timeout_maps_to_wait_timeout() {
        let err = ChainError::from_cloud(
            "Wait for group ready",
            CloudError::Timeout { label: "ready".into() },
        );
        assert!(err.is_timeout());
        assert!(!err.is_provider_failure());
    }

    #[test]
    fn api_failure_keeps_source() {
        let err = ChainError::from_cloud("Create group", CloudError::api("CreateAutoScalingGroup", "denied"));
        assert!(err.is_provider_failure());
        assert!(!err.is_pre_mutation());
        assert_eq!(
            err.to_string(),
            "Create group failed: CreateAutoScalingGroup failed: denied"
        );
    }

    #[test]
    fn timeout_message_includes_duration() {
        let err = ChainError::WaitTimeoutExceeded {
            operation: "Wait for group ready".into(),
            timeout: Some(Duration::from_secs(600)),
        };
        assert_eq!(
            err.to_string(),
            "Wait for group ready did not reach a steady state within 600s"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_is_pre_mutation() {
        let err: ChainError =
            ValidationError::missing(ManifestType::LaunchTemplate, "launchTemplateData").into();
        assert!(err.is_pre_mutation());
        assert!(!err.is_retryable());
    }
}
