//! JSON content parser
//!
//! Uses serde_json for strict parsing of manifest text into typed models and
//! deterministic serialization back to text for rollback snapshots.

use crate::error::{ParseError, SerializeError};
use crate::models::ManifestModel;

/// Manifest content parser
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentParser;

impl ContentParser {
    /// Create new content parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse one manifest text into its model
    ///
    /// # Errors
    /// [`ParseError::Empty`] for blank text, [`ParseError::Syntax`] for
    /// malformed JSON or a missing required field.
    pub fn parse<M: ManifestModel>(&self, raw: &str) -> Result<M, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::Empty {
                manifest_type: M::MANIFEST_TYPE,
            });
        }
        serde_json::from_str(raw).map_err(|e| ParseError::from_json(M::MANIFEST_TYPE, &e))
    }

    /// Parse every manifest text, preserving order
    ///
    /// # Errors
    /// The first [`ParseError`] encountered.
    pub fn parse_all<M: ManifestModel>(&self, raws: &[String]) -> Result<Vec<M>, ParseError> {
        raws.iter().map(|raw| self.parse(raw)).collect()
    }

    /// Serialize a model to text
    ///
    /// Output is stable for equal models: struct fields serialize in
    /// declaration order and pass-through maps are key-sorted.
    ///
    /// # Errors
    /// [`SerializeError::Json`] if serde_json rejects the model.
    pub fn serialize<M: ManifestModel>(&self, model: &M, pretty: bool) -> Result<String, SerializeError> {
        let out = if pretty {
            serde_json::to_string_pretty(model)
        } else {
            serde_json::to_string(model)
        };
        out.map_err(|source| SerializeError::Json {
            manifest_type: M::MANIFEST_TYPE,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupConfigurationRequest, LaunchTemplateManifest, ScalingPolicyRequest};
    use crate::ManifestType;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_text_is_empty_error() {
        let err = ContentParser::new()
            .parse::<GroupConfigurationRequest>("   ")
            .unwrap_err();
        assert!(matches!(err, ParseError::Empty { manifest_type: ManifestType::Configuration }));
    }

    #[test]
    fn missing_required_field_is_parse_error() {
        let err = ContentParser::new()
            .parse::<GroupConfigurationRequest>(r#"{"maxSize": 3}"#)
            .unwrap_err();
        assert!(err.to_string().contains("minSize"));
    }

    #[test]
    fn parse_all_preserves_order() {
        let raws = vec![
            r#"{"policyName": "b", "scalingAdjustment": 1}"#.to_string(),
            r#"{"policyName": "a", "scalingAdjustment": -1}"#.to_string(),
        ];
        let parsed: Vec<ScalingPolicyRequest> = ContentParser::new().parse_all(&raws).unwrap();
        let names: Vec<_> = parsed.iter().map(|p| p.policy_name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn serialization_is_deterministic() {
        let parser = ContentParser::new();
        let raw = r#"{"launchTemplateData": {"zeta": 1, "imageId": "ami-1", "alpha": 2}}"#;
        let model: LaunchTemplateManifest = parser.parse(raw).unwrap();
        let first = parser.serialize(&model, false).unwrap();
        let reparsed: LaunchTemplateManifest = parser.parse(&first).unwrap();
        assert_eq!(first, parser.serialize(&reparsed, false).unwrap());
        assert_eq!(
            first,
            r#"{"launchTemplateData":{"imageId":"ami-1","alpha":2,"zeta":1}}"#
        );
    }

    #[test]
    fn pretty_output_is_multiline() {
        let parser = ContentParser::new();
        let model: GroupConfigurationRequest = parser.parse(r#"{"minSize": 0, "maxSize": 2}"#).unwrap();
        assert!(parser.serialize(&model, true).unwrap().contains('\n'));
    }
}
