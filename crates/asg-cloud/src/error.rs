//! Control-plane error type

/// Errors surfaced by a [`crate::CloudControlPlane`] implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CloudError {
    /// The provider rejected or failed the call
    #[error("{operation} failed: {message}")]
    Api { operation: String, message: String },

    /// A resource the call depends on does not exist
    #[error("{resource} '{name}' not found")]
    NotFound { resource: &'static str, name: String },

    /// The provider throttled the call
    #[error("{operation} throttled by provider")]
    Throttled { operation: String },

    /// A provider-side wait gave up before its predicate held
    #[error("{label} did not complete before the provider wait expired")]
    Timeout { label: String },
}

impl CloudError {
    /// Create API error
    #[inline]
    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create not-found error
    #[inline]
    pub fn not_found(resource: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            name: name.into(),
        }
    }

    /// Check if the failure is transient
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }

    /// Check if this is a wait expiry rather than an API failure
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classification() {
        assert!(CloudError::Throttled { operation: "x".into() }.is_retryable());
        assert!(!CloudError::api("x", "boom").is_retryable());
        assert!(CloudError::Timeout { label: "wait".into() }.is_timeout());
        assert_eq!(
            CloudError::not_found("group", "asg-1").to_string(),
            "group 'asg-1' not found"
        );
    }
}
