//! ASG Core
//!
//! Reference deployment driver for the auto-scaling group manifest chain.
//!
//! - [`OrchestratorConfig`]: region, wait bounds, strategy and manifest order
//! - [`DeploymentOrchestrator`]: forward runs, rollback replay and canary
//!   weight progressions
//!
//! # Example
//!
//! ```rust,ignore
//! use asg_core::{DeploymentOrchestrator, OrchestratorConfig};
//! use asg_cloud::SimulatedCloud;
//! use std::sync::Arc;
//!
//! # async fn example(plan: Vec<asg_chain::ManifestRequest>) -> Result<(), asg_core::OrchestratorError> {
//! let orchestrator = DeploymentOrchestrator::new(OrchestratorConfig::new(), Arc::new(SimulatedCloud::new()))?;
//! let mut state = orchestrator.new_state("asg-1");
//!
//! match orchestrator.deploy(&mut state, &plan).await {
//!     Ok(report) => println!("executed {:?}", report.executed),
//!     Err(e) if e.needs_rollback() => {
//!         orchestrator.rollback("asg-1", state.rollback_data()).await?;
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::OrchestratorConfig;
pub use error::{ConfigError, OrchestratorError};
pub use orchestrator::{DeploymentOrchestrator, DeploymentReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
