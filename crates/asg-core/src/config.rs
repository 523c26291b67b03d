//! Orchestrator configuration
//!
//! Loaded from TOML, for example:
//!
//! ```toml
//! region = "us-east-1"
//! steady_state_timeout_secs = 600
//! instance_refresh_timeout_secs = 1800
//! execution_strategy = "canary"
//! manifest_order = ["AsgLaunchTemplate", "AsgConfiguration", "AsgShiftTraffic"]
//! ```

use crate::error::ConfigError;
use asg_chain::{ExecutionStrategy, WaitTimeouts};
use asg_manifest::ManifestType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Deployment orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Provider region used for listener calls
    pub region: String,
    /// Bound on group readiness and scale-to-zero waits
    pub steady_state_timeout_secs: u64,
    /// Bound on instance refresh completion
    pub instance_refresh_timeout_secs: u64,
    /// Rollout style recorded on the chain state
    pub execution_strategy: ExecutionStrategy,
    /// Manifest types in execution order; unlisted types run last
    pub manifest_order: Vec<ManifestType>,
}

impl OrchestratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_steady_state_timeout(mut self, timeout: Duration) -> Self {
        self.steady_state_timeout_secs = timeout.as_secs();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_instance_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.instance_refresh_timeout_secs = timeout.as_secs();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.execution_strategy = strategy;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_manifest_order(mut self, order: Vec<ManifestType>) -> Self {
        self.manifest_order = order;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// [`ConfigError`] on syntax errors, unknown keys or invalid values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check value constraints
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::invalid("region", "must not be empty"));
        }
        if self.steady_state_timeout_secs == 0 {
            return Err(ConfigError::invalid("steady_state_timeout_secs", "must be greater than zero"));
        }
        if self.instance_refresh_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "instance_refresh_timeout_secs",
                "must be greater than zero",
            ));
        }
        let mut seen = HashSet::new();
        for t in &self.manifest_order {
            if !seen.insert(*t) {
                return Err(ConfigError::invalid("manifest_order", format!("{t} listed twice")));
            }
        }
        Ok(())
    }

    /// Wait bounds handed to the chain state
    #[must_use]
    pub fn wait_timeouts(&self) -> WaitTimeouts {
        WaitTimeouts {
            steady_state: Duration::from_secs(self.steady_state_timeout_secs),
            instance_refresh: Duration::from_secs(self.instance_refresh_timeout_secs),
        }
    }

    /// Sort key of a manifest type under the configured order
    #[must_use]
    pub fn order_of(&self, manifest_type: ManifestType) -> usize {
        self.manifest_order
            .iter()
            .position(|t| *t == manifest_type)
            .unwrap_or(self.manifest_order.len())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            steady_state_timeout_secs: 600,
            instance_refresh_timeout_secs: 1800,
            execution_strategy: ExecutionStrategy::Rolling,
            manifest_order: ManifestType::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = OrchestratorConfig::new();
        config.validate().unwrap();
        assert_eq!(config.wait_timeouts(), WaitTimeouts::default());
        assert_eq!(config.order_of(ManifestType::LaunchTemplate), 0);
        assert_eq!(config.order_of(ManifestType::SwapService), 6);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = OrchestratorConfig::from_toml_str(
            r#"
            region = "eu-west-1"
            execution_strategy = "blue-green"
            manifest_order = ["AsgConfiguration", "AsgLaunchTemplate"]
            "#,
        )
        .unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.execution_strategy, ExecutionStrategy::BlueGreen);
        assert_eq!(config.steady_state_timeout_secs, 600);
        assert_eq!(config.order_of(ManifestType::LaunchTemplate), 1);
        assert_eq!(config.order_of(ManifestType::ShiftTraffic), 2);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = OrchestratorConfig::from_toml_str("regoin = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn invalid_values_rejected() {
        let err = OrchestratorConfig::from_toml_str("steady_state_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "steady_state_timeout_secs", .. }));

        let err = OrchestratorConfig::from_toml_str(
            r#"manifest_order = ["AsgSwapService", "AsgSwapService"]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "manifest_order", .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region = \"ap-south-1\"\ninstance_refresh_timeout_secs = 60").unwrap();

        let config = OrchestratorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.region, "ap-south-1");
        assert_eq!(config.wait_timeouts().instance_refresh, Duration::from_secs(60));

        let missing = OrchestratorConfig::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn builders_round_trip_through_toml() {
        let config = OrchestratorConfig::new()
            .with_region("us-west-2")
            .with_steady_state_timeout(Duration::from_secs(30))
            .with_execution_strategy(ExecutionStrategy::Canary);
        let raw = toml::to_string(&config).unwrap();
        assert_eq!(OrchestratorConfig::from_toml_str(&raw).unwrap(), config);
    }
}
