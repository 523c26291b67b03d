//! ASG Chain
//!
//! Manifest handlers that drive one auto-scaling group deployment:
//!
//! - [`ChainState`]: mutable run context passed by `&mut` to every handler
//! - [`ManifestRequest`]: per-invocation input, one variant per manifest type
//! - [`ManifestHandler`]: capture rollback content, then upsert
//! - [`ChainFactory`]: manifest type to handler
//!
//! # Example
//!
//! ```rust,ignore
//! use asg_chain::{ChainFactory, ChainState, ExecutionStrategy, ManifestRequest};
//! use asg_cloud::SimulatedCloud;
//! use std::sync::Arc;
//!
//! # async fn example(request: ManifestRequest) -> Result<(), asg_chain::ChainError> {
//! let factory = ChainFactory::new(Arc::new(SimulatedCloud::new()));
//! let mut state = ChainState::new("asg-1", ExecutionStrategy::Rolling);
//!
//! let handler = factory.handler_for(request.manifest_type())?;
//! handler.capture_rollback_content(&mut state, &request).await?;
//! handler.upsert(&mut state, &request).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod factory;
pub mod handler;
pub mod handlers;
pub mod request;
pub mod state;

pub use error::ChainError;
pub use factory::ChainFactory;
pub use handler::ManifestHandler;
pub use request::{
    ConfigurationManifestRequest, InstanceRefreshManifestRequest, LaunchTemplateManifestRequest,
    ManifestRequest, ScalingPolicyManifestRequest, ScheduledActionManifestRequest,
    ShiftTrafficManifestRequest, SwapServiceManifestRequest,
};
pub use state::{ChainState, ExecutionStrategy, LaunchTemplateVersion, RollbackData, WaitTimeouts};
