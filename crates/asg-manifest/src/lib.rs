//! ASG Manifests
//!
//! Typed manifests for the auto-scaling group deployment chain.
//!
//! # Core Concepts
//!
//! - [`ManifestType`]: tag selecting a handler in the chain
//! - [`ManifestModel`]: parsed manifest that can validate itself
//! - [`ContentParser`]: strict JSON text ⇄ model conversion
//!
//! # Example
//!
//! ```rust
//! use asg_manifest::{ContentParser, GroupConfigurationRequest, ManifestModel};
//!
//! let parser = ContentParser::new();
//! let model: GroupConfigurationRequest =
//!     parser.parse(r#"{"minSize": 1, "maxSize": 3, "desiredCapacity": 2}"#).unwrap();
//! model.validate().unwrap();
//! let snapshot = parser.serialize(&model, false).unwrap();
//! assert!(snapshot.contains("\"desiredCapacity\":2"));
//! ```

#![warn(unreachable_pub)]

pub mod error;
mod manifest_type;
pub mod models;
mod parser;

pub use error::{ParseError, SerializeError, ValidationError};
pub use manifest_type::{ManifestType, UnknownManifestType};
pub use models::{
    CapacityOverrides, CreateLaunchTemplateRequest, GroupConfigurationRequest, GroupTag,
    ImageOverride, LaunchTemplateData, LaunchTemplateManifest, LaunchTemplateSpecification,
    LaunchTemplateVersionPointer, LifecycleHookSpecification, LoadBalancerConfig,
    ManifestModel, ManifestOverrides, ScalingPolicyRequest, ScheduledActionRequest,
    StepAdjustment, TrafficWeight, WeightedTargetGroup,
};
pub use parser::ContentParser;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
