//! Launch template handler

use crate::error::ChainError;
use crate::handler::{mismatch, single_manifest, step, ManifestHandler};
use crate::request::ManifestRequest;
use crate::state::ChainState;
use asg_cloud::CloudControlPlane;
use asg_manifest::{
    ContentParser, CreateLaunchTemplateRequest, LaunchTemplateManifest, LaunchTemplateVersionPointer,
    ManifestModel, ManifestType,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;

/// Creates the template named after the group, or a new version of it
///
/// Runs at most once per chain: after the version is latched every further
/// `upsert` is a no-op.
pub struct LaunchTemplateHandler {
    client: Arc<dyn CloudControlPlane>,
    parser: ContentParser,
}

impl LaunchTemplateHandler {
    #[must_use]
    pub fn new(client: Arc<dyn CloudControlPlane>) -> Self {
        Self {
            client,
            parser: ContentParser::new(),
        }
    }

    async fn create(
        &self,
        state: &mut ChainState,
        mut request: CreateLaunchTemplateRequest,
    ) -> Result<(), ChainError> {
        let name = state.group_name().to_string();
        request.launch_template_name = Some(name.clone());
        encode_user_data(&mut request);

        let existing = step("Describe launch template", self.client.get_launch_template(&name)).await?;
        match existing {
            Some(template) => {
                let version = step(
                    "Create launch template version",
                    self.client.create_launch_template_version(&template, &request),
                )
                .await?;
                state.latch_created(version.to_string());
            }
            None => {
                let template = step(
                    "Create launch template",
                    self.client.create_launch_template(&name, &request),
                )
                .await?;
                state.latch_created(template.latest_version_number.to_string());
            }
        }
        Ok(())
    }
}

/// Base64-encode non-empty user data in place
fn encode_user_data(request: &mut CreateLaunchTemplateRequest) {
    if let Some(data) = request.launch_template_data.as_mut() {
        if let Some(user_data) = data.user_data.as_mut().filter(|u| !u.is_empty()) {
            *user_data = STANDARD.encode(user_data.as_bytes());
        }
    }
}

#[async_trait::async_trait]
impl ManifestHandler for LaunchTemplateHandler {
    fn manifest_type(&self) -> ManifestType {
        ManifestType::LaunchTemplate
    }

    async fn upsert(&self, state: &mut ChainState, request: &ManifestRequest) -> Result<(), ChainError> {
        let ManifestRequest::LaunchTemplate(req) = request else {
            return Err(mismatch(ManifestType::LaunchTemplate, request));
        };
        if state.launch_template_version().is_latched() {
            tracing::debug!(
                "Launch template version already latched for {}, skipping",
                state.group_name()
            );
            return Ok(());
        }

        let raw = single_manifest(ManifestType::LaunchTemplate, &req.manifests)?;
        let manifest: LaunchTemplateManifest = self.parser.parse(raw)?;
        manifest.validate()?;

        match manifest {
            LaunchTemplateManifest::Pointer(pointer) => {
                tracing::info!(
                    "Pointing {} back at launch template version {}",
                    state.group_name(),
                    pointer.version
                );
                state.latch_reused(pointer.version);
                Ok(())
            }
            LaunchTemplateManifest::Template(mut template) => {
                template.apply_overrides(&req.overrides)?;
                self.create(state, template).await
            }
        }
    }

    async fn capture_rollback_content(
        &self,
        state: &mut ChainState,
        request: &ManifestRequest,
    ) -> Result<(), ChainError> {
        if !matches!(request, ManifestRequest::LaunchTemplate(_)) {
            return Err(mismatch(ManifestType::LaunchTemplate, request));
        }
        let group = state
            .fetch_group(&*self.client)
            .await
            .map_err(|e| ChainError::from_cloud("Describe group", e))?;
        let Some(version) = group.as_ref().and_then(|g| g.launch_template_version()) else {
            tracing::debug!("No launch template version attached to {}", state.group_name());
            return Ok(());
        };

        let pointer = LaunchTemplateManifest::Pointer(LaunchTemplateVersionPointer {
            launch_template_name: state.group_name().to_string(),
            version: version.to_string(),
        });
        let snapshot = self.parser.serialize(&pointer, false)?;
        state.record_rollback(ManifestType::LaunchTemplate, vec![snapshot]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asg_cloud::{CloudCall, SimulatedCloud};
    use asg_manifest::LaunchTemplateData;
    use asg_test_utils::fixtures;
    use crate::request::LaunchTemplateManifestRequest;
    use crate::state::{ExecutionStrategy, LaunchTemplateVersion};

    fn request(manifest: &str) -> ManifestRequest {
        ManifestRequest::LaunchTemplate(LaunchTemplateManifestRequest {
            manifests: vec![manifest.to_string()],
            ..LaunchTemplateManifestRequest::default()
        })
    }

    #[test]
    fn user_data_encoded_only_when_present() {
        let mut req = CreateLaunchTemplateRequest {
            launch_template_data: Some(LaunchTemplateData {
                user_data: Some("#!/bin/sh".into()),
                ..LaunchTemplateData::default()
            }),
            ..CreateLaunchTemplateRequest::default()
        };
        encode_user_data(&mut req);
        assert_eq!(
            req.launch_template_data.as_ref().unwrap().user_data.as_deref(),
            Some("IyEvYmluL3No")
        );

        let mut empty = CreateLaunchTemplateRequest {
            launch_template_data: Some(LaunchTemplateData {
                user_data: Some(String::new()),
                ..LaunchTemplateData::default()
            }),
            ..CreateLaunchTemplateRequest::default()
        };
        encode_user_data(&mut empty);
        assert_eq!(
            empty.launch_template_data.unwrap().user_data.as_deref(),
            Some("")
        );
    }

    #[tokio::test]
    async fn creates_template_then_latches() {
        let cloud = Arc::new(SimulatedCloud::new());
        let handler = LaunchTemplateHandler::new(cloud.clone());
        let mut state = ChainState::new("asg-1", ExecutionStrategy::Rolling);
        let req = request(&fixtures::launch_template_manifest("ami-1"));

        handler.upsert(&mut state, &req).await.unwrap();
        handler.upsert(&mut state, &req).await.unwrap();

        assert_eq!(state.launch_template_version(), &LaunchTemplateVersion::Created("1".into()));
        assert_eq!(cloud.count_calls(CloudCall::is_template_creation), 1);
    }

    #[tokio::test]
    async fn missing_data_rejected_before_cloud_call() {
        let cloud = Arc::new(SimulatedCloud::new());
        let handler = LaunchTemplateHandler::new(cloud.clone());
        let mut state = ChainState::new("asg-1", ExecutionStrategy::Rolling);

        let err = handler
            .upsert(&mut state, &request(r#"{"versionDescription": "no data"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidManifest(_)));
        assert!(cloud.calls().is_empty());
        assert!(!state.launch_template_version().is_latched());
    }

    #[tokio::test]
    async fn capture_skipped_without_group() {
        let cloud = Arc::new(SimulatedCloud::new());
        let handler = LaunchTemplateHandler::new(cloud);
        let mut state = ChainState::new("asg-1", ExecutionStrategy::Rolling);

        handler
            .capture_rollback_content(&mut state, &request("{}"))
            .await
            .unwrap();
        assert!(state.rollback_data().is_empty());
    }
}
