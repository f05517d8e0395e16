// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment configuration
//!
//! Configuration is read from environment variables; command-line flags of
//! the `policy-deployer` binary override individual values.
//!
//! | Variable                    | Default                 |
//! |-----------------------------|-------------------------|
//! | `TEMPLATE_API_URL`          | `http://localhost:8080` |
//! | `TEMPLATE_API_TOKEN`        | required                |
//! | `TEMPLATE_API_TIMEOUT_SECS` | `30`                    |
//! | `DEPLOY_DRY_RUN`            | `false`                 |
//! | `DEPLOY_ENTITY_CONCURRENCY` | `1`                     |
//! | `DEPLOY_VERIFY_TEMPLATES`   | `false`                 |
//! | `TOPOLOGY_PATH`             | built-in reference      |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Configuration for the template service connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateServiceConfig {
    /// Platform base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Bearer token for authentication
    pub api_token: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for TemplateServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Knobs for a deployment run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentOptions {
    /// Ask the platform for previews instead of creating rules
    #[serde(default)]
    pub dry_run: bool,

    /// Entities of one tier allowed in flight at once
    #[serde(default = "default_concurrency")]
    pub entity_concurrency: usize,

    /// Check every required template exists before deploying anything
    #[serde(default)]
    pub verify_templates: bool,
}

fn default_concurrency() -> usize {
    1
}

impl Default for DeploymentOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            entity_concurrency: 1,
            verify_templates: false,
        }
    }
}

/// Complete configuration of the deployer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployerConfig {
    pub service: TemplateServiceConfig,
    pub options: DeploymentOptions,
    /// Topology document; `None` selects the reference topology
    pub topology_path: Option<PathBuf>,
}

impl DeployerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let service = TemplateServiceConfig {
            base_url: lookup("TEMPLATE_API_URL").unwrap_or(defaults.service.base_url),
            api_token: lookup("TEMPLATE_API_TOKEN")
                .filter(|token| !token.is_empty())
                .ok_or(ConfigError::Missing("TEMPLATE_API_TOKEN"))?,
            timeout_secs: parse_or(&lookup, "TEMPLATE_API_TIMEOUT_SECS", defaults.service.timeout_secs)?,
        };

        let options = DeploymentOptions {
            dry_run: parse_or(&lookup, "DEPLOY_DRY_RUN", defaults.options.dry_run)?,
            entity_concurrency: parse_or(
                &lookup,
                "DEPLOY_ENTITY_CONCURRENCY",
                defaults.options.entity_concurrency,
            )?,
            verify_templates: parse_or(
                &lookup,
                "DEPLOY_VERIFY_TEMPLATES",
                defaults.options.verify_templates,
            )?,
        };

        if options.entity_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "DEPLOY_ENTITY_CONCURRENCY",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            service,
            options,
            topology_path: lookup("TOPOLOGY_PATH").map(PathBuf::from),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
