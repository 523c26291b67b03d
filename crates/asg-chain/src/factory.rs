//! Handler lookup by manifest type
//!
//! Provides [`ChainFactory`] mapping every [`ManifestType`] to its handler.

use crate::error::ChainError;
use crate::handler::ManifestHandler;
use crate::handlers::{
    ConfigurationHandler, InstanceRefreshHandler, LaunchTemplateHandler, ScalingPolicyHandler,
    ScheduledActionHandler, ShiftTrafficHandler, SwapServiceHandler,
};
use asg_cloud::CloudControlPlane;
use asg_manifest::ManifestType;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of manifest handlers sharing one control-plane client
#[derive(Clone)]
pub struct ChainFactory {
    handlers: IndexMap<ManifestType, Arc<dyn ManifestHandler>>,
}

impl ChainFactory {
    /// Create an empty factory
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Create a factory with the built-in handler for every manifest type
    #[must_use]
    pub fn new(client: Arc<dyn CloudControlPlane>) -> Self {
        let mut factory = Self::empty();
        factory.register(Arc::new(LaunchTemplateHandler::new(client.clone())));
        factory.register(Arc::new(ConfigurationHandler::new(client.clone())));
        factory.register(Arc::new(ScalingPolicyHandler::new(client.clone())));
        factory.register(Arc::new(ScheduledActionHandler::new(client.clone())));
        factory.register(Arc::new(InstanceRefreshHandler::new(client.clone())));
        factory.register(Arc::new(ShiftTrafficHandler::new(client.clone())));
        factory.register(Arc::new(SwapServiceHandler::new(client)));
        factory
    }

    /// Register a handler, replacing any previous one for its type
    pub fn register(&mut self, handler: Arc<dyn ManifestHandler>) {
        self.handlers.insert(handler.manifest_type(), handler);
    }

    /// Handler for `manifest_type`
    ///
    /// # Errors
    /// [`ChainError::NoHandler`] when nothing is registered for the type.
    pub fn handler_for(&self, manifest_type: ManifestType) -> Result<Arc<dyn ManifestHandler>, ChainError> {
        self.handlers
            .get(&manifest_type)
            .cloned()
            .ok_or(ChainError::NoHandler(manifest_type))
    }

    /// Handler for a wire tag such as `"AsgLaunchTemplate"`
    ///
    /// # Errors
    /// [`ChainError::UnknownManifestType`] for an unrecognized tag.
    pub fn handler_for_tag(&self, tag: &str) -> Result<Arc<dyn ManifestHandler>, ChainError> {
        self.handler_for(tag.parse::<ManifestType>()?)
    }

    /// Registered manifest types in registration order
    #[must_use]
    pub fn manifest_types(&self) -> Vec<ManifestType> {
        self.handlers.keys().copied().collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ChainFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainFactory")
            .field("handlers", &self.manifest_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asg_cloud::SimulatedCloud;

    #[test]
    fn every_type_has_a_handler() {
        let factory = ChainFactory::new(Arc::new(SimulatedCloud::new()));
        assert_eq!(factory.manifest_types(), ManifestType::ALL.to_vec());
        for t in ManifestType::ALL {
            assert_eq!(factory.handler_for(t).unwrap().manifest_type(), t);
        }
    }

    #[test]
    fn tags_resolve() {
        let factory = ChainFactory::new(Arc::new(SimulatedCloud::new()));
        let handler = factory.handler_for_tag("AsgScheduledUpdateGroupAction").unwrap();
        assert_eq!(handler.manifest_type(), ManifestType::ScheduledAction);
        assert!(matches!(
            factory.handler_for_tag("AsgNope"),
            Err(ChainError::UnknownManifestType(_))
        ));
    }

    #[test]
    fn empty_factory_reports_missing_handler() {
        let factory = ChainFactory::empty();
        assert!(factory.is_empty());
        assert!(matches!(
            factory.handler_for(ManifestType::SwapService),
            Err(ChainError::NoHandler(ManifestType::SwapService))
        ));
    }

    #[tokio::test]
    async fn delete_touches_nothing() {
        let cloud = Arc::new(SimulatedCloud::new());
        let factory = ChainFactory::new(cloud.clone());
        let mut state = crate::ChainState::new("asg-1", crate::ExecutionStrategy::default());
        let request = crate::ManifestRequest::ScalingPolicy(crate::ScalingPolicyManifestRequest::default());
        for t in ManifestType::ALL {
            factory.handler_for(t).unwrap().delete(&mut state, &request).await.unwrap();
        }
        assert!(cloud.calls().is_empty());
    }
}
