// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Model
//!
//! A topology is an ordered list of tiers. Each tier targets one logical
//! switch and holds entities of exactly one kind:
//!
//! ```text
//! Topology
//!  ├── Tier "web_tier"         (switch ls-web)    → servers
//!  ├── Tier "app_tier"         (switch ls-app)    → services
//!  ├── Tier "data_tier"        (switch ls-data)   → databases
//!  └── Tier "secure_resources" (switch ls-secure) → resources
//! ```
//!
//! Optional entity attributes stay `None` here; defaults are applied by the
//! variable builder so that the document always reflects what the operator
//! actually wrote.
//!
//! Topologies are loaded from YAML or JSON and validated once; they are not
//! mutated during a deployment run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::database::DatabaseEngine;
use super::invariants::{validate_topology, InvariantViolation};

/// Errors raised while loading a topology document
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Document could not be read
    #[error("Failed to read topology {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid YAML/JSON for a topology
    #[error("Failed to parse topology: {0}")]
    Parse(String),

    /// Document parsed but violates a topology invariant
    #[error("Invalid topology: {0}")]
    Invalid(#[from] InvariantViolation),
}

/// Web server entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_sources: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ssh: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_sources: Option<String>,
}

/// Microservice entity
///
/// `dependencies` names other services of the same tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Database entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    #[serde(rename = "type")]
    pub engine: DatabaseEngine,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub app_subnet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_replication: Option<bool>,
    #[serde(default)]
    pub replicas: Vec<String>,
}

/// Sensitive resource protected by a zero-trust policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureResource {
    pub name: String,
    pub ip: String,
    pub port: u16,
    pub authorized_users: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_encryption: Option<bool>,
}

/// Tier kind, in deployment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Web,
    Application,
    Data,
    Secure,
}

impl TierKind {
    /// All kinds in the order tiers are deployed
    pub const DEPLOYMENT_ORDER: [TierKind; 4] = [
        TierKind::Web,
        TierKind::Application,
        TierKind::Data,
        TierKind::Secure,
    ];

    /// Platform template used for this kind unless a tier overrides it
    pub fn default_template_id(&self) -> &'static str {
        match self {
            Self::Web => "web-server",
            Self::Application => "microservice",
            Self::Data => "database-server",
            Self::Secure => "zero-trust",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Application => "application",
            Self::Data => "data",
            Self::Secure => "secure",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entities of a tier; a tier holds exactly one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierEntities {
    Servers(Vec<Server>),
    Services(Vec<Service>),
    Databases(Vec<Database>),
    Resources(Vec<SecureResource>),
}

impl TierEntities {
    pub fn kind(&self) -> TierKind {
        match self {
            Self::Servers(_) => TierKind::Web,
            Self::Services(_) => TierKind::Application,
            Self::Databases(_) => TierKind::Data,
            Self::Resources(_) => TierKind::Secure,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Servers(v) => v.len(),
            Self::Services(v) => v.len(),
            Self::Databases(v) => v.len(),
            Self::Resources(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the entities in document order
    pub fn refs(&self) -> Vec<EntityRef<'_>> {
        match self {
            Self::Servers(v) => v.iter().map(EntityRef::Server).collect(),
            Self::Services(v) => v.iter().map(EntityRef::Service).collect(),
            Self::Databases(v) => v.iter().map(EntityRef::Database).collect(),
            Self::Resources(v) => v.iter().map(EntityRef::SecureResource).collect(),
        }
    }
}

/// Borrowed view over any entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef<'a> {
    Server(&'a Server),
    Service(&'a Service),
    Database(&'a Database),
    SecureResource(&'a SecureResource),
}

impl<'a> EntityRef<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Server(e) => &e.name,
            Self::Service(e) => &e.name,
            Self::Database(e) => &e.name,
            Self::SecureResource(e) => &e.name,
        }
    }

    pub fn ip(&self) -> &'a str {
        match self {
            Self::Server(e) => &e.ip,
            Self::Service(e) => &e.ip,
            Self::Database(e) => &e.ip,
            Self::SecureResource(e) => &e.ip,
        }
    }
}

/// A named group of entities sharing one target switch
///
/// Documents list the entities under exactly one of `servers`, `services`,
/// `databases` or `resources`; any other shape is a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TierDocument")]
pub struct Tier {
    pub name: String,
    /// Logical switch the generated rules attach to
    pub switch: String,
    /// Overrides the default monitoring subnet for services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_subnet: Option<String>,
    /// Overrides the platform template used for this tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(flatten)]
    pub entities: TierEntities,
}

/// Tier as written in a topology document
#[derive(Deserialize)]
struct TierDocument {
    name: String,
    switch: String,
    #[serde(default)]
    monitoring_subnet: Option<String>,
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    servers: Option<Vec<Server>>,
    #[serde(default)]
    services: Option<Vec<Service>>,
    #[serde(default)]
    databases: Option<Vec<Database>>,
    #[serde(default)]
    resources: Option<Vec<SecureResource>>,
}

impl TryFrom<TierDocument> for Tier {
    type Error = String;

    fn try_from(doc: TierDocument) -> Result<Self, Self::Error> {
        let lists: Vec<TierEntities> = [
            doc.servers.map(TierEntities::Servers),
            doc.services.map(TierEntities::Services),
            doc.databases.map(TierEntities::Databases),
            doc.resources.map(TierEntities::Resources),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut lists = lists.into_iter();
        match (lists.next(), lists.next()) {
            (Some(entities), None) => Ok(Self {
                name: doc.name,
                switch: doc.switch,
                monitoring_subnet: doc.monitoring_subnet,
                template: doc.template,
                entities,
            }),
            (None, _) => Err(format!(
                "tier '{}' lists no servers, services, databases or resources",
                doc.name
            )),
            (Some(_), Some(_)) => Err(format!(
                "tier '{}' lists more than one entity kind",
                doc.name
            )),
        }
    }
}

impl Tier {
    pub fn new(name: impl Into<String>, switch: impl Into<String>, entities: TierEntities) -> Self {
        Self {
            name: name.into(),
            switch: switch.into(),
            monitoring_subnet: None,
            template: None,
            entities,
        }
    }

    pub fn kind(&self) -> TierKind {
        self.entities.kind()
    }

    /// Template instantiated for every entity of this tier
    pub fn template_id(&self) -> &str {
        self.template
            .as_deref()
            .unwrap_or_else(|| self.kind().default_template_id())
    }
}

/// Complete infrastructure description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub tiers: Vec<Tier>,
}

impl Topology {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    /// Load and validate a topology document
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, TopologyError> {
        let topology: Self =
            serde_yaml::from_str(content).map_err(|e| TopologyError::Parse(e.to_string()))?;
        topology.validate()?;
        Ok(topology)
    }

    pub fn from_json_str(content: &str) -> Result<Self, TopologyError> {
        let topology: Self =
            serde_json::from_str(content).map_err(|e| TopologyError::Parse(e.to_string()))?;
        topology.validate()?;
        Ok(topology)
    }

    /// Check all topology invariants
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        validate_topology(self)
    }

    /// Tiers in deployment order (web, application, data, secure)
    ///
    /// Tiers of the same kind keep their document order.
    pub fn deployment_order(&self) -> Vec<&Tier> {
        let mut tiers: Vec<&Tier> = self.tiers.iter().collect();
        tiers.sort_by_key(|tier| tier.kind());
        tiers
    }

    /// Distinct template ids required to deploy this topology
    pub fn template_ids(&self) -> BTreeSet<String> {
        self.tiers
            .iter()
            .map(|tier| tier.template_id().to_string())
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.tiers.iter().map(|tier| tier.entities.len()).sum()
    }
}
