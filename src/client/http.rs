// Copyright (c) 2025 - Cowboy AI, Inc.

//! HTTP Template Service Client
//!
//! Implements [`TemplateService`] over the policy platform's REST API:
//!
//! ```text
//! list_templates  = GET  /api/v1/templates?category=..&tag=..
//! get_template    = GET  /api/v1/templates/{id}
//! validate        = POST /api/v1/templates/validate
//! instantiate     = POST /api/v1/templates/instantiate
//! ```
//!
//! Requests carry `Authorization: Bearer <token>` and JSON bodies. Any
//! non-success status is mapped to a [`ServiceError`]; no retries are made.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{InstantiationResult, TemplateDescriptor, TemplateService, ValidationResult};
use crate::config::TemplateServiceConfig;
use crate::errors::{ServiceError, ServiceResult};
use crate::variables::TemplateVariables;

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    template_id: &'a str,
    variables: &'a TemplateVariables,
}

#[derive(Debug, Serialize)]
struct InstantiateRequest<'a> {
    template_id: &'a str,
    variables: &'a TemplateVariables,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_switch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TemplateList {
    templates: Vec<TemplateDescriptor>,
}

/// Template service client over HTTP
#[derive(Debug, Clone)]
pub struct HttpTemplateClient {
    config: TemplateServiceConfig,
    client: Client,
}

impl HttpTemplateClient {
    /// Create a new client
    pub fn new(config: TemplateServiceConfig) -> ServiceResult<Self> {
        info!("Using template service at {}", config.base_url);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    format!("Bearer {}", config.api_token)
                        .parse()
                        .map_err(|e| {
                            ServiceError::Configuration(format!("Invalid API token: {}", e))
                        })?,
                );
                headers.insert(
                    reqwest::header::CONTENT_TYPE,
                    "application/json".parse().map_err(|e| {
                        ServiceError::Configuration(format!("Invalid header: {}", e))
                    })?,
                );
                headers
            })
            .build()
            .map_err(|e| {
                ServiceError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let config = TemplateServiceConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/templates{}", self.config.base_url, path)
    }

    /// Fetch a single template definition
    pub async fn get_template(&self, template_id: &str) -> ServiceResult<TemplateDescriptor> {
        let url = self.url(&format!("/{}", urlencoding::encode(template_id)));
        let response = self.client.get(&url).send().await?;
        decode(response, Some(template_id)).await
    }
}

/// Map a response to its body or to a `ServiceError`
async fn decode<T: DeserializeOwned>(
    response: Response,
    template_id: Option<&str>,
) -> ServiceResult<T> {
    let status = response.status();
    if status.is_success() {
        let body = response.bytes().await?;
        return serde_json::from_slice(&body).map_err(ServiceError::from);
    }

    let body = response.text().await.unwrap_or_else(|_| "".to_string());
    Err(match (status, template_id) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => ServiceError::Authentication {
            status: status.as_u16(),
            message: body,
        },
        (StatusCode::NOT_FOUND, Some(id)) => ServiceError::UnknownTemplate(id.to_string()),
        _ => ServiceError::Api {
            status: status.as_u16(),
            body,
        },
    })
}

#[async_trait]
impl TemplateService for HttpTemplateClient {
    async fn list_templates(
        &self,
        category: Option<&str>,
        tags: &[String],
    ) -> ServiceResult<Vec<TemplateDescriptor>> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(category) = category {
            query.push(("category", category));
        }
        for tag in tags {
            query.push(("tag", tag.as_str()));
        }

        let response = self.client.get(self.url("")).query(&query).send().await?;
        let list: TemplateList = decode(response, None).await?;

        debug!("Listed {} templates", list.templates.len());
        Ok(list.templates)
    }

    async fn validate(
        &self,
        template_id: &str,
        variables: &TemplateVariables,
    ) -> ServiceResult<ValidationResult> {
        let request = ValidateRequest {
            template_id,
            variables,
        };

        let response = self
            .client
            .post(self.url("/validate"))
            .json(&request)
            .send()
            .await?;

        let result: ValidationResult = decode(response, Some(template_id)).await?;
        debug!("Validated {}: valid={}", template_id, result.valid);
        Ok(result)
    }

    async fn instantiate(
        &self,
        template_id: &str,
        variables: &TemplateVariables,
        target_switch: Option<&str>,
        dry_run: bool,
    ) -> ServiceResult<InstantiationResult> {
        let request = InstantiateRequest {
            template_id,
            variables,
            dry_run,
            target_switch,
        };

        let response = self
            .client
            .post(self.url("/instantiate"))
            .json(&request)
            .send()
            .await?;

        let result: InstantiationResult = decode(response, Some(template_id)).await?;
        debug!(
            "Instantiated {} ({} rules, dry_run={})",
            template_id,
            result.rule_count(),
            dry_run
        );
        Ok(result)
    }
}
