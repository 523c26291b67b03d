//! Concrete manifest handlers, one per [`asg_manifest::ManifestType`]

mod configuration;
mod instance_refresh;
mod launch_template;
mod listener;
mod scaling_policy;
mod scheduled_action;
mod shift_traffic;
mod swap_service;

pub use configuration::ConfigurationHandler;
pub use instance_refresh::InstanceRefreshHandler;
pub use launch_template::LaunchTemplateHandler;
pub use scaling_policy::ScalingPolicyHandler;
pub use scheduled_action::ScheduledActionHandler;
pub use shift_traffic::ShiftTrafficHandler;
pub use swap_service::SwapServiceHandler;
