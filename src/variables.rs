// Copyright (c) 2025 - Cowboy AI, Inc.
//! Template Variable Builder
//!
//! Maps each topology entity, together with the context of its tier, to the
//! variable record its policy template expects. One record type exists per
//! template kind:
//!
//! ```text
//! Server         → WebServerVariables      → "web-server"
//! Service        → MicroserviceVariables   → "microservice"
//! Database       → DatabaseServerVariables → "database-server"
//! SecureResource → ZeroTrustVariables      → "zero-trust"
//! ```
//!
//! Records hold only primitive values and are turned into the wire map by
//! the template client. Everything here is pure: no I/O, no clocks, no
//! randomness, so identical input always yields identical variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{
    resolve_port, Database, EntityRef, SecureResource, Server, Service, Tier, TierEntities,
    TierKind, Topology,
};

/// Sources allowed to reach a web server when none are given
pub const DEFAULT_ALLOWED_SOURCES: &str = "0.0.0.0/0";

/// Management subnet allowed to SSH into web servers
pub const DEFAULT_SSH_SOURCES: &str = "10.0.100.0/24";

/// Port a microservice listens on when none is given
pub const DEFAULT_SERVICE_PORT: u16 = 8080;

/// Subnet allowed to scrape microservices
pub const DEFAULT_MONITORING_SUBNET: &str = "10.0.200.0/24";

/// Variables for the `web-server` template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebServerVariables {
    pub server_ip: String,
    pub allowed_sources: String,
    pub enable_ssh: bool,
    pub ssh_sources: String,
}

/// Variables for the `microservice` template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroserviceVariables {
    pub service_name: String,
    pub service_ip: String,
    pub service_port: u16,
    /// Comma-joined IPs of resolved dependencies
    pub allowed_services: String,
    pub monitoring_subnet: String,
}

/// Variables for the `database-server` template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseServerVariables {
    pub db_ip: String,
    pub db_port: u16,
    pub app_subnet: String,
    /// Sent as `null` when absent
    pub backup_server: Option<String>,
    pub enable_replication: bool,
    /// Comma-joined replica IPs
    pub replica_ips: String,
}

/// Variables for the `zero-trust` template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroTrustVariables {
    pub resource_ip: String,
    pub resource_port: u16,
    /// Comma-joined authorized client IPs
    pub authorized_users: String,
    pub require_encryption: bool,
}

/// Variable set for one template instantiation
///
/// Serializes to the flat `variables` object of the template API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TemplateVariables {
    WebServer(WebServerVariables),
    Microservice(MicroserviceVariables),
    DatabaseServer(DatabaseServerVariables),
    ZeroTrust(ZeroTrustVariables),
}

impl TemplateVariables {
    /// Tier kind these variables were built for
    pub fn kind(&self) -> TierKind {
        match self {
            Self::WebServer(_) => TierKind::Web,
            Self::Microservice(_) => TierKind::Application,
            Self::DatabaseServer(_) => TierKind::Data,
            Self::ZeroTrust(_) => TierKind::Secure,
        }
    }

    /// Render as the JSON object sent on the wire
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            // Every variant is a struct of primitives
            _ => serde_json::Map::new(),
        }
    }
}

impl From<WebServerVariables> for TemplateVariables {
    fn from(vars: WebServerVariables) -> Self {
        Self::WebServer(vars)
    }
}

impl From<MicroserviceVariables> for TemplateVariables {
    fn from(vars: MicroserviceVariables) -> Self {
        Self::Microservice(vars)
    }
}

impl From<DatabaseServerVariables> for TemplateVariables {
    fn from(vars: DatabaseServerVariables) -> Self {
        Self::DatabaseServer(vars)
    }
}

impl From<ZeroTrustVariables> for TemplateVariables {
    fn from(vars: ZeroTrustVariables) -> Self {
        Self::ZeroTrust(vars)
    }
}

/// Name → IP lookup over the services of one tier
///
/// Built once, before any entity of the tier is deployed, and never modified
/// afterwards. Resolution therefore does not depend on entity order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDirectory {
    ips: HashMap<String, String>,
}

impl ServiceDirectory {
    pub fn from_services(services: &[Service]) -> Self {
        Self {
            ips: services
                .iter()
                .map(|s| (s.name.clone(), s.ip.clone()))
                .collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.ips.get(name).map(String::as_str)
    }

    /// Resolve dependency names to IPs, in dependency order
    ///
    /// Names without a matching service are dropped.
    pub fn resolve(&self, dependencies: &[String]) -> Vec<String> {
        dependencies
            .iter()
            .filter_map(|dep| match self.lookup(dep) {
                Some(ip) => Some(ip.to_string()),
                None => {
                    debug!("Dropping unresolved service dependency: {}", dep);
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }
}

/// Read-only context shared by all entities of a tier
#[derive(Debug, Clone)]
pub struct TierContext<'a> {
    pub tier_name: &'a str,
    pub switch: &'a str,
    pub template_id: &'a str,
    pub monitoring_subnet: &'a str,
    pub services: ServiceDirectory,
}

impl<'a> TierContext<'a> {
    pub fn for_tier(tier: &'a Tier) -> Self {
        let services = match &tier.entities {
            TierEntities::Services(services) => ServiceDirectory::from_services(services),
            _ => ServiceDirectory::default(),
        };

        Self {
            tier_name: &tier.name,
            switch: &tier.switch,
            template_id: tier.template_id(),
            monitoring_subnet: tier
                .monitoring_subnet
                .as_deref()
                .unwrap_or(DEFAULT_MONITORING_SUBNET),
            services,
        }
    }
}

pub fn build_server_variables(server: &Server) -> WebServerVariables {
    WebServerVariables {
        server_ip: server.ip.clone(),
        allowed_sources: server
            .allowed_sources
            .clone()
            .unwrap_or_else(|| DEFAULT_ALLOWED_SOURCES.to_string()),
        enable_ssh: server.enable_ssh.unwrap_or(true),
        ssh_sources: server
            .ssh_sources
            .clone()
            .unwrap_or_else(|| DEFAULT_SSH_SOURCES.to_string()),
    }
}

pub fn build_service_variables(service: &Service, ctx: &TierContext<'_>) -> MicroserviceVariables {
    MicroserviceVariables {
        service_name: service.name.clone(),
        service_ip: service.ip.clone(),
        service_port: service.port.unwrap_or(DEFAULT_SERVICE_PORT),
        allowed_services: ctx.services.resolve(&service.dependencies).join(","),
        monitoring_subnet: ctx.monitoring_subnet.to_string(),
    }
}

pub fn build_database_variables(db: &Database) -> DatabaseServerVariables {
    DatabaseServerVariables {
        db_ip: db.ip.clone(),
        db_port: resolve_port(&db.engine, db.port),
        app_subnet: db.app_subnet.clone(),
        backup_server: db.backup_server.clone(),
        enable_replication: db.enable_replication.unwrap_or(false),
        replica_ips: db.replicas.join(","),
    }
}

pub fn build_secure_resource_variables(resource: &SecureResource) -> ZeroTrustVariables {
    ZeroTrustVariables {
        resource_ip: resource.ip.clone(),
        resource_port: resource.port,
        authorized_users: resource.authorized_users.join(","),
        require_encryption: resource.require_encryption.unwrap_or(true),
    }
}

/// Build the variable set for any entity
pub fn build_variables(entity: EntityRef<'_>, ctx: &TierContext<'_>) -> TemplateVariables {
    match entity {
        EntityRef::Server(server) => build_server_variables(server).into(),
        EntityRef::Service(service) => build_service_variables(service, ctx).into(),
        EntityRef::Database(db) => build_database_variables(db).into(),
        EntityRef::SecureResource(resource) => build_secure_resource_variables(resource).into(),
    }
}

/// One template call that a deployment would make
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedInstantiation {
    pub tier: String,
    pub switch: String,
    pub entity: String,
    pub template_id: String,
    pub variables: TemplateVariables,
}

/// Every template call for one tier, in entity order
pub fn plan_tier(tier: &Tier) -> Vec<PlannedInstantiation> {
    let ctx = TierContext::for_tier(tier);
    tier.entities
        .refs()
        .into_iter()
        .map(|entity| PlannedInstantiation {
            tier: tier.name.clone(),
            switch: tier.switch.clone(),
            entity: entity.name().to_string(),
            template_id: ctx.template_id.to_string(),
            variables: build_variables(entity, &ctx),
        })
        .collect()
}

/// Every template call for a topology, in deployment order
pub fn plan_topology(topology: &Topology) -> Vec<PlannedInstantiation> {
    topology
        .deployment_order()
        .into_iter()
        .flat_map(plan_tier)
        .collect()
}
