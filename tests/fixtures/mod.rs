// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-policy-orchestrator
//!
//! Provides deterministic topologies and a scripted in-memory
//! [`TemplateService`] that records every call it receives.
//!
//! # Design Principles
//! - All topology data is fixed; entity IPs identify entities in scripts
//! - The scripted service never touches the network
//! - Responses are decided up front, so call logs are exact

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use cim_policy_orchestrator::client::{
    InstantiationResult, PolicyRule, TemplateDescriptor, TemplateService, ValidationResult,
};
use cim_policy_orchestrator::domain::{
    Database, DatabaseEngine, SecureResource, Server, Service, Tier, TierEntities, Topology,
};
use cim_policy_orchestrator::errors::{ServiceError, ServiceResult};
use cim_policy_orchestrator::variables::TemplateVariables;

/// A call received by [`ScriptedService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Validate {
        template_id: String,
        ip: String,
    },
    Instantiate {
        template_id: String,
        ip: String,
        target_switch: Option<String>,
        dry_run: bool,
    },
}

impl Call {
    pub fn ip(&self) -> Option<&str> {
        match self {
            Call::List => None,
            Call::Validate { ip, .. } | Call::Instantiate { ip, .. } => Some(ip),
        }
    }

    pub fn is_instantiate(&self) -> bool {
        matches!(self, Call::Instantiate { .. })
    }
}

/// IP of the entity a variable set was built for
pub fn entity_ip(variables: &TemplateVariables) -> &str {
    match variables {
        TemplateVariables::WebServer(v) => &v.server_ip,
        TemplateVariables::Microservice(v) => &v.service_ip,
        TemplateVariables::DatabaseServer(v) => &v.db_ip,
        TemplateVariables::ZeroTrust(v) => &v.resource_ip,
    }
}

/// In-memory template service driven by a fixed script
///
/// Entities are addressed by IP. By default every variable set is valid and
/// every instantiation creates `rules_per_entity` rules.
pub struct ScriptedService {
    rules_per_entity: usize,
    templates: Vec<TemplateDescriptor>,
    rejections: HashMap<String, Vec<String>>,
    validate_failures: HashSet<String>,
    instantiate_failures: HashSet<String>,
    validate_delays: HashMap<String, Duration>,
    calls: Mutex<Vec<Call>>,
    variables: Mutex<Vec<TemplateVariables>>,
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            rules_per_entity: 3,
            templates: ["web-server", "microservice", "database-server", "zero-trust"]
                .iter()
                .map(|id| template(id))
                .collect(),
            rejections: HashMap::new(),
            validate_failures: HashSet::new(),
            instantiate_failures: HashSet::new(),
            validate_delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            variables: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rules(mut self, rules_per_entity: usize) -> Self {
        self.rules_per_entity = rules_per_entity;
        self
    }

    pub fn with_templates(mut self, ids: &[&str]) -> Self {
        self.templates = ids.iter().map(|id| template(id)).collect();
        self
    }

    /// Answer `valid = false` for the entity at `ip`
    pub fn reject(mut self, ip: &str, errors: &[&str]) -> Self {
        self.rejections
            .insert(ip.to_string(), errors.iter().map(|e| e.to_string()).collect());
        self
    }

    /// Fail the validate call for the entity at `ip` with a transport error
    pub fn fail_validate(mut self, ip: &str) -> Self {
        self.validate_failures.insert(ip.to_string());
        self
    }

    /// Fail the instantiate call for the entity at `ip` with a 500
    pub fn fail_instantiate(mut self, ip: &str) -> Self {
        self.instantiate_failures.insert(ip.to_string());
        self
    }

    /// Hold the validate answer for the entity at `ip`
    pub fn delay_validate(mut self, ip: &str, millis: u64) -> Self {
        self.validate_delays
            .insert(ip.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Variable sets received by validate, in call order
    pub fn validated_variables(&self) -> Vec<TemplateVariables> {
        self.variables.lock().unwrap().clone()
    }

    pub fn instantiated_ips(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(Call::is_instantiate)
            .filter_map(|call| call.ip().map(str::to_string))
            .collect()
    }

    pub fn attempted_ips(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Validate { .. }))
            .filter_map(|call| call.ip().map(str::to_string))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn rules(&self) -> Vec<PolicyRule> {
        (0..self.rules_per_entity)
            .map(|i| {
                PolicyRule(json!({
                    "uuid": format!("rule-{}", i),
                    "priority": 1000 - (i as i64) * 100,
                    "direction": "to-lport",
                    "action": "allow-related",
                }))
            })
            .collect()
    }
}

#[async_trait]
impl TemplateService for ScriptedService {
    async fn list_templates(
        &self,
        category: Option<&str>,
        _tags: &[String],
    ) -> ServiceResult<Vec<TemplateDescriptor>> {
        self.record(Call::List);
        Ok(self
            .templates
            .iter()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect())
    }

    async fn validate(
        &self,
        template_id: &str,
        variables: &TemplateVariables,
    ) -> ServiceResult<ValidationResult> {
        let ip = entity_ip(variables).to_string();
        self.record(Call::Validate {
            template_id: template_id.to_string(),
            ip: ip.clone(),
        });
        self.variables.lock().unwrap().push(variables.clone());

        if let Some(delay) = self.validate_delays.get(&ip) {
            tokio::time::sleep(*delay).await;
        }
        if self.validate_failures.contains(&ip) {
            return Err(ServiceError::Transport("connection reset by peer".to_string()));
        }
        if !self.templates.iter().any(|t| t.id == template_id) {
            return Err(ServiceError::UnknownTemplate(template_id.to_string()));
        }

        Ok(match self.rejections.get(&ip) {
            Some(errors) => ValidationResult::rejected(errors.clone()),
            None => ValidationResult::accepted(),
        })
    }

    async fn instantiate(
        &self,
        template_id: &str,
        variables: &TemplateVariables,
        target_switch: Option<&str>,
        dry_run: bool,
    ) -> ServiceResult<InstantiationResult> {
        let ip = entity_ip(variables).to_string();
        self.record(Call::Instantiate {
            template_id: template_id.to_string(),
            ip: ip.clone(),
            target_switch: target_switch.map(str::to_string),
            dry_run,
        });

        if self.instantiate_failures.contains(&ip) {
            return Err(ServiceError::Api {
                status: 500,
                body: "internal error".to_string(),
            });
        }

        if dry_run {
            let mut extra = serde_json::Map::new();
            extra.insert("dry_run".to_string(), json!(true));
            Ok(InstantiationResult {
                instance: None,
                preview: Some(self.rules()),
                extra,
            })
        } else {
            Ok(InstantiationResult::with_rules(self.rules()))
        }
    }
}

pub fn template(id: &str) -> TemplateDescriptor {
    TemplateDescriptor {
        id: id.to_string(),
        name: id.replace('-', " "),
        category: "security".to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Topology fixtures
// ============================================================================

pub fn server(name: &str, ip: &str) -> Server {
    Server {
        name: name.to_string(),
        ip: ip.to_string(),
        allowed_sources: None,
        enable_ssh: None,
        ssh_sources: None,
    }
}

pub fn service(name: &str, ip: &str, dependencies: &[&str]) -> Service {
    Service {
        name: name.to_string(),
        ip: ip.to_string(),
        port: None,
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
    }
}

pub fn database(name: &str, engine: DatabaseEngine, ip: &str) -> Database {
    Database {
        name: name.to_string(),
        engine,
        ip: ip.to_string(),
        port: None,
        app_subnet: "10.0.2.0/24".to_string(),
        backup_server: None,
        enable_replication: None,
        replicas: Vec::new(),
    }
}

pub fn secure_resource(name: &str, ip: &str, port: u16) -> SecureResource {
    SecureResource {
        name: name.to_string(),
        ip: ip.to_string(),
        port,
        authorized_users: vec!["10.0.100.10".to_string()],
        require_encryption: None,
    }
}

/// IP of the i-th web server produced by [`web_tier`]
pub fn web_ip(i: usize) -> String {
    format!("10.0.1.{}", 10 + i)
}

/// Web tier with `count` servers `web-0..web-{count-1}`
pub fn web_tier(count: usize) -> Tier {
    Tier::new(
        "web_tier",
        "ls-web",
        TierEntities::Servers(
            (0..count)
                .map(|i| server(&format!("web-{}", i), &web_ip(i)))
                .collect(),
        ),
    )
}

pub fn app_tier() -> Tier {
    Tier::new(
        "app_tier",
        "ls-app",
        TierEntities::Services(vec![
            service("api-gateway", "10.0.2.10", &["user-service"]),
            service("user-service", "10.0.2.11", &[]),
        ]),
    )
}

pub fn data_tier() -> Tier {
    Tier::new(
        "data_tier",
        "ls-data",
        TierEntities::Databases(vec![
            database("users-db", DatabaseEngine::PostgreSql, "10.0.3.10"),
            database("legacy-db", DatabaseEngine::Other("oracle".to_string()), "10.0.3.20"),
        ]),
    )
}

pub fn secure_tier() -> Tier {
    Tier::new(
        "secure_resources",
        "ls-secure",
        TierEntities::Resources(vec![secure_resource("admin-panel", "10.0.5.10", 443)]),
    )
}

/// Four tiers listed out of deployment order
pub fn shuffled_topology() -> Topology {
    Topology::new(vec![secure_tier(), data_tier(), web_tier(2), app_tier()])
}

pub fn single_server_topology() -> Topology {
    Topology::new(vec![web_tier(1)])
}
