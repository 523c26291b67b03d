//! Orchestrator error types

use asg_chain::ChainError;
use asg_manifest::ManifestType;
use std::path::PathBuf;

/// Errors raised by the deployment orchestrator
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Invalid orchestrator configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A forward step failed; captured rollback data stays in the chain state
    #[error("{manifest_type} step failed: {source}")]
    Step {
        manifest_type: ManifestType,
        #[source]
        source: ChainError,
    },

    /// Replaying a rollback snapshot failed
    #[error("rollback of {manifest_type} failed: {source}")]
    Rollback {
        manifest_type: ManifestType,
        #[source]
        source: ChainError,
    },

    /// Handler lookup or request construction failed
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl OrchestratorError {
    /// Underlying chain error, if any
    #[must_use]
    pub fn chain_error(&self) -> Option<&ChainError> {
        match self {
            Self::Step { source, .. } | Self::Rollback { source, .. } => Some(source),
            Self::Chain(e) => Some(e),
            Self::Config(_) => None,
        }
    }

    /// Check if the run should be rolled back
    ///
    /// Failures raised before any mutation leave nothing to undo.
    #[must_use]
    pub fn needs_rollback(&self) -> bool {
        matches!(self, Self::Step { source, .. } if !source.is_pre_mutation())
    }

    /// Operator hint for the failure
    #[must_use]
    pub fn remediation(&self) -> &'static str {
        match self.chain_error() {
            None => "fix the orchestrator configuration and rerun",
            Some(ChainError::WaitTimeoutExceeded { .. }) => {
                "inspect instance health, raise the steady state timeout or roll back"
            }
            Some(ChainError::ProviderOperationFailed { source, .. }) if source.is_retryable() => {
                "provider throttled the call, retry the deployment"
            }
            Some(ChainError::ProviderOperationFailed { .. }) => {
                "check provider permissions and quotas, then roll back or retry"
            }
            Some(e) if e.is_pre_mutation() => "fix the manifest, nothing was changed",
            Some(_) => "roll back the deployment",
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML syntax or schema error
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config file could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Semantically invalid value
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
