//! ASG Cloud
//!
//! Control-plane boundary consumed by the deployment chain, plus an
//! in-memory [`SimulatedCloud`] used by tests and the simulator binary.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod error;
pub mod simulated;
pub mod types;

pub use client::{CloudControlPlane, GroupPredicate};
pub use error::CloudError;
pub use simulated::{CloudCall, SimulatedCloud};
pub use types::{
    BlueGreenColor, Group, HealthStatus, Instance, InstanceRefreshStatus, LaunchTemplate,
    LifecycleState, BG_VERSION_TAG,
};
