//! Canonical vocabulary registry: keyword tables for inferring intent
//! fields from raw tool names, and slot template assembly for turning a
//! structured intent or policy constraint into the anchor text C2 embeds.

use std::collections::BTreeMap;

use gateway_core::{Action, ResourceType, Slice};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::VocabError;

const EMBEDDED_VOCABULARY: &str = include_str!("../assets/vocabulary.yaml");

/// Global vocabulary instance, parsed once from the embedded asset.
///
/// Unlike the reference implementation this has no filesystem fallback:
/// the vocabulary ships baked into the binary so there is no install-time
/// path resolution to get wrong.
pub static VOCABULARY: Lazy<VocabularyRegistry> =
    Lazy::new(|| VocabularyRegistry::from_str(EMBEDDED_VOCABULARY).expect("embedded vocabulary.yaml is malformed"));

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap());

#[derive(Debug, Deserialize)]
struct KeywordEntry {
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VocabularySection {
    actions: BTreeMap<String, KeywordEntry>,
    resource_types: BTreeMap<String, KeywordEntry>,
    sensitivity_levels: BTreeMap<String, serde_yaml::Value>,
    volumes: BTreeMap<String, serde_yaml::Value>,
    authn_levels: BTreeMap<String, serde_yaml::Value>,
    params_length_buckets: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
struct TemplatesSection {
    action: BTreeMap<String, String>,
    resource: BTreeMap<String, String>,
    data: BTreeMap<String, String>,
    risk: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct VocabFile {
    version: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    vocabulary: VocabularySection,
    templates: TemplatesSection,
}

/// Parsed vocabulary: keyword tables plus per-slot anchor templates.
pub struct VocabularyRegistry {
    file: VocabFile,
}

impl VocabularyRegistry {
    pub fn from_str(yaml: &str) -> Result<Self, VocabError> {
        let file: VocabFile =
            serde_yaml::from_str(yaml).map_err(|e| VocabError::AssetMalformed(e.to_string()))?;
        Ok(Self { file })
    }

    pub fn get_version(&self) -> &str {
        &self.file.version
    }

    pub fn get_metadata(&self) -> &BTreeMap<String, String> {
        &self.file.metadata
    }

    pub fn get_valid_actions(&self) -> Vec<&str> {
        self.file.vocabulary.actions.keys().map(String::as_str).collect()
    }

    pub fn get_valid_resource_types(&self) -> Vec<&str> {
        self.file.vocabulary.resource_types.keys().map(String::as_str).collect()
    }

    pub fn get_sensitivity_levels(&self) -> Vec<&str> {
        self.file.vocabulary.sensitivity_levels.keys().map(String::as_str).collect()
    }

    pub fn get_volumes(&self) -> Vec<&str> {
        self.file.vocabulary.volumes.keys().map(String::as_str).collect()
    }

    pub fn get_authn_levels(&self) -> Vec<&str> {
        self.file.vocabulary.authn_levels.keys().map(String::as_str).collect()
    }

    pub fn get_params_length_buckets(&self) -> Vec<&str> {
        self.file.vocabulary.params_length_buckets.keys().map(String::as_str).collect()
    }

    pub fn get_action_keywords(&self, action: &str) -> &[String] {
        self.file
            .vocabulary
            .actions
            .get(action)
            .map(|e| e.keywords.as_slice())
            .unwrap_or(&[])
    }

    /// Map a single keyword token to its canonical action, if any action's
    /// keyword list contains it exactly.
    pub fn map_keyword_to_action(&self, keyword: &str) -> Option<Action> {
        let keyword_lower = keyword.to_lowercase();
        for (action, entry) in &self.file.vocabulary.actions {
            if entry.keywords.iter().any(|k| k == &keyword_lower) {
                return parse_action(action);
            }
        }
        None
    }

    /// Infer a canonical action from a raw tool name by splitting on `-`/`_`
    /// and matching each token against the keyword tables. Falls back to
    /// `Execute` when nothing matches, mirroring a tool call whose intent
    /// can't be narrowed further.
    pub fn infer_action_from_tool_name(&self, tool_name: &str) -> Action {
        let normalized = tool_name.replace(['-', '_'], " ");
        for part in normalized.split_whitespace() {
            if let Some(action) = self.map_keyword_to_action(part) {
                return action;
            }
        }
        Action::Execute
    }

    /// Infer a resource type from a raw tool name via substring match
    /// against the keyword tables. Falls back to `Api`.
    pub fn infer_resource_type_from_tool_name(&self, tool_name: &str) -> ResourceType {
        let tool_lower = tool_name.to_lowercase();
        for (resource_type, entry) in &self.file.vocabulary.resource_types {
            if entry.keywords.iter().any(|kw| tool_lower.contains(kw.as_str())) {
                if let Some(rt) = parse_resource_type(resource_type) {
                    return rt;
                }
            }
        }
        ResourceType::Api
    }

    pub fn is_valid_action(&self, action: &str) -> bool {
        self.file.vocabulary.actions.contains_key(action)
    }

    pub fn is_valid_resource_type(&self, resource_type: &str) -> bool {
        self.file.vocabulary.resource_types.contains_key(resource_type)
    }

    /// Select and render the anchor template for `slot` given the fields
    /// present. Which template variant is chosen depends on which optional
    /// fields are present, mirroring the encoder's field-assembly logic.
    pub fn assemble_anchor(&self, slot: Slice, fields: &BTreeMap<String, String>) -> Result<String, VocabError> {
        let template_name = self.select_template(slot, fields);
        let templates = match slot {
            Slice::Action => &self.file.templates.action,
            Slice::Resource => &self.file.templates.resource,
            Slice::Data => &self.file.templates.data,
            Slice::Risk => &self.file.templates.risk,
        };
        let template = templates
            .get(template_name)
            .ok_or(VocabError::TemplateNotFound { slot, variant: template_name })?;
        render(template, fields)
    }

    fn select_template(&self, slot: Slice, fields: &BTreeMap<String, String>) -> &'static str {
        match slot {
            Slice::Action => {
                if fields.contains_key("tool_call") {
                    "with_tool_call"
                } else {
                    "format"
                }
            }
            Slice::Resource => {
                let has_location = fields.contains_key("resource_location");
                let has_name = fields.contains_key("resource_name");
                let has_tool = fields.contains_key("tool_name") && fields.contains_key("tool_method");
                if has_tool && has_location && has_name {
                    "full"
                } else if has_tool {
                    "with_tool"
                } else if has_name {
                    "with_name"
                } else if has_location {
                    "with_location"
                } else {
                    "minimal"
                }
            }
            Slice::Data => {
                if fields.contains_key("params_length") {
                    "with_params"
                } else {
                    "base"
                }
            }
            Slice::Risk => {
                if fields.contains_key("rate_limit") {
                    "with_rate_limit"
                } else {
                    "base"
                }
            }
        }
    }
}

fn parse_action(s: &str) -> Option<Action> {
    serde_yaml::from_str(s).ok()
}

fn parse_resource_type(s: &str) -> Option<ResourceType> {
    serde_yaml::from_str(s).ok()
}

fn render(template: &str, fields: &BTreeMap<String, String>) -> Result<String, VocabError> {
    let mut missing: Option<String> = None;
    let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
        let name = &caps[1];
        match fields.get(name) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(field) => Err(VocabError::MissingField { template: template.to_string(), field }),
        None => Ok(rendered.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn infers_action_from_tool_name() {
        assert_eq!(VOCABULARY.infer_action_from_tool_name("get_user_profile"), Action::Read);
        assert_eq!(VOCABULARY.infer_action_from_tool_name("delete-record"), Action::Delete);
        assert_eq!(VOCABULARY.infer_action_from_tool_name("noop_widget"), Action::Execute);
    }

    #[test]
    fn infers_resource_type_from_tool_name() {
        assert_eq!(VOCABULARY.infer_resource_type_from_tool_name("query_postgres_table"), ResourceType::Database);
        assert_eq!(VOCABULARY.infer_resource_type_from_tool_name("read_s3_object"), ResourceType::File);
        assert_eq!(VOCABULARY.infer_resource_type_from_tool_name("call_webhook"), ResourceType::Api);
    }

    #[test]
    fn assembles_minimal_resource_anchor() {
        let f = fields(&[("resource_type", "database")]);
        let anchor = VOCABULARY.assemble_anchor(Slice::Resource, &f).unwrap();
        assert_eq!(anchor, "resource_type is database");
    }

    #[test]
    fn assembles_full_resource_anchor_when_all_fields_present() {
        let f = fields(&[
            ("resource_type", "file"),
            ("resource_location", "us-east-1"),
            ("resource_name", "report.csv"),
            ("tool_name", "s3"),
            ("tool_method", "get_object"),
        ]);
        let anchor = VOCABULARY.assemble_anchor(Slice::Resource, &f).unwrap();
        assert_eq!(
            anchor,
            "resource_type is file | resource_location is us-east-1 | resource_name is report.csv | accessed via tool s3.get_object"
        );
    }

    #[test]
    fn missing_field_is_an_error() {
        let f = fields(&[]);
        let err = VOCABULARY.assemble_anchor(Slice::Action, &f).unwrap_err();
        assert!(matches!(err, VocabError::MissingField { .. }));
    }

    #[test]
    fn embedded_asset_parses() {
        assert_eq!(VOCABULARY.get_version(), "1.0");
        assert!(VOCABULARY.is_valid_action("read"));
        assert!(VOCABULARY.is_valid_resource_type("api"));
    }
}
