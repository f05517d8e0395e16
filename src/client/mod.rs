// Copyright (c) 2025 - Cowboy AI, Inc.
//! Template Service Client
//!
//! The orchestration core talks to the policy platform only through the
//! [`TemplateService`] trait:
//!
//! ```text
//! list_templates(category, tags)                → [TemplateDescriptor]
//! validate(template_id, variables)              → ValidationResult
//! instantiate(template_id, variables, switch,
//!             dry_run)                          → InstantiationResult
//! ```
//!
//! Each call is a single request; callers await one before issuing the next.
//! [`HttpTemplateClient`] implements the trait over the platform's REST API.
//!
//! # Example
//!
//! ```rust,no_run
//! use cim_policy_orchestrator::client::{HttpTemplateClient, TemplateService, TemplateServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpTemplateClient::new(TemplateServiceConfig {
//!         base_url: "http://localhost:8080".to_string(),
//!         api_token: "your-token-here".to_string(),
//!         timeout_secs: 30,
//!     })?;
//!
//!     for template in client.list_templates(Some("security"), &[]).await? {
//!         println!("{} - {}", template.id, template.name);
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpTemplateClient;

pub use crate::config::TemplateServiceConfig;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::errors::ServiceResult;
use crate::variables::TemplateVariables;

/// Remote policy template capability
#[async_trait]
pub trait TemplateService: Send + Sync {
    /// List templates, optionally filtered by category and tags
    ///
    /// Filtering happens on the service; no filters returns every template.
    async fn list_templates(
        &self,
        category: Option<&str>,
        tags: &[String],
    ) -> ServiceResult<Vec<TemplateDescriptor>>;

    /// Check a variable set against a template without changing remote state
    ///
    /// A rejected variable set is a successful call returning
    /// `valid == false`; only transport, auth and unknown-template failures
    /// are errors.
    async fn validate(
        &self,
        template_id: &str,
        variables: &TemplateVariables,
    ) -> ServiceResult<ValidationResult>;

    /// Create the template's rules on `target_switch`
    ///
    /// With `dry_run` nothing is persisted; the result still reports the
    /// rules that would have been created.
    async fn instantiate(
        &self,
        template_id: &str,
        variables: &TemplateVariables,
        target_switch: Option<&str>,
        dry_run: bool,
    ) -> ServiceResult<InstantiationResult>;
}

/// Template variable declaration as published by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateVariableSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub value_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Rule skeleton inside a template definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateRuleSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub action: String,
    #[serde(rename = "match", default)]
    pub match_expr: String,
    #[serde(default)]
    pub log: bool,
}

/// Template definition returned by the listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub variables: Vec<TemplateVariableSpec>,
    #[serde(default)]
    pub rules: Vec<TemplateRuleSpec>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TemplateDescriptor {
    /// Names of variables the template requires
    pub fn required_variables(&self) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .filter(|v| v.required)
            .map(|v| v.name.as_str())
    }
}

/// Outcome of validating a variable set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Validation failures, in the order reported
    #[serde(default, deserialize_with = "deserialize_errors")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            ..Default::default()
        }
    }

    pub fn rejected(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
            warnings: Vec::new(),
        }
    }
}

/// Accept `errors` as a list, as a `field → message` map, or as null
///
/// Map entries are flattened to `"field: message"` in key order.
fn deserialize_errors<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Errors {
        List(Vec<String>),
        Map(BTreeMap<String, String>),
    }

    Ok(match Option::<Errors>::deserialize(deserializer)? {
        Some(Errors::List(errors)) => errors,
        Some(Errors::Map(errors)) => errors
            .into_iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect(),
        None => Vec::new(),
    })
}

/// A generated rule, kept exactly as the service returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyRule(pub serde_json::Value);

impl PolicyRule {
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(|v| v.as_str())
    }

    pub fn direction(&self) -> Option<&str> {
        self.0.get("direction").and_then(|v| v.as_str())
    }

    pub fn action(&self) -> Option<&str> {
        self.0.get("action").and_then(|v| v.as_str())
    }

    pub fn priority(&self) -> Option<i64> {
        self.0.get("priority").and_then(|v| v.as_i64())
    }
}

/// Instantiated template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateInstance {
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    /// Remaining fields (template_id, name, variables, ...), untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of an instantiation request
///
/// A regular instantiation carries `instance`; the platform answers dry runs
/// with a `preview` list instead. Unrecognised fields are preserved so the
/// response round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstantiationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<TemplateInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<PolicyRule>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InstantiationResult {
    pub fn with_rules(rules: Vec<PolicyRule>) -> Self {
        Self {
            instance: Some(TemplateInstance {
                rules,
                extra: serde_json::Map::new(),
            }),
            ..Default::default()
        }
    }

    /// Rules created, or that would be created for a dry run
    pub fn rules(&self) -> &[PolicyRule] {
        match (&self.instance, &self.preview) {
            (Some(instance), _) => &instance.rules,
            (None, Some(preview)) => preview,
            (None, None) => &[],
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules().len()
    }
}
