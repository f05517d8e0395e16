// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! This module contains the structural rules a topology must satisfy before
//! any template call is made. All functions are pure (no side effects) and
//! return the first violation found.
//!
//! # Invariant Categories
//!
//! 1. **Naming**: tier names unique, entity names unique within a tier
//! 2. **Addressing**: IPs and CIDR blocks parse for their address family
//! 3. **Targeting**: every tier names a switch
//!
//! Unknown service dependencies are deliberately *not* a violation; they are
//! dropped during variable construction.

use std::collections::HashSet;

use super::network::{parse_host, validate_port, validate_source_list, Cidr, NetworkError};
use super::topology::{EntityRef, Tier, Topology};

/// Result of checking a topology invariant
pub type InvariantResult = Result<(), InvariantViolation>;

/// Topology invariant violation with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Tier name must not be empty")]
    EmptyTierName,

    #[error("Duplicate tier name: {0}")]
    DuplicateTier(String),

    #[error("Tier '{tier}' has no target switch")]
    MissingSwitch { tier: String },

    #[error("Tier '{tier}' contains an entity without a name")]
    EmptyEntityName { tier: String },

    #[error("Duplicate entity '{entity}' in tier '{tier}'")]
    DuplicateEntity { tier: String, entity: String },

    #[error("Entity '{entity}' in tier '{tier}' has invalid {field}: {source}")]
    InvalidAddress {
        tier: String,
        entity: String,
        field: &'static str,
        #[source]
        source: NetworkError,
    },
}

/// Validate every invariant of a topology
pub fn validate_topology(topology: &Topology) -> InvariantResult {
    let mut seen = HashSet::new();
    for tier in &topology.tiers {
        if tier.name.trim().is_empty() {
            return Err(InvariantViolation::EmptyTierName);
        }
        if !seen.insert(tier.name.as_str()) {
            return Err(InvariantViolation::DuplicateTier(tier.name.clone()));
        }
        validate_tier(tier)?;
    }
    Ok(())
}

/// Validate a single tier
///
/// # Rules
/// - Switch must be non-empty
/// - Entity names non-empty and unique within the tier
/// - Entity addresses well formed
pub fn validate_tier(tier: &Tier) -> InvariantResult {
    if tier.switch.trim().is_empty() {
        return Err(InvariantViolation::MissingSwitch {
            tier: tier.name.clone(),
        });
    }

    if let Some(subnet) = &tier.monitoring_subnet {
        Cidr::new(subnet).map_err(|source| InvariantViolation::InvalidAddress {
            tier: tier.name.clone(),
            entity: tier.name.clone(),
            field: "monitoring_subnet",
            source,
        })?;
    }

    let mut names = HashSet::new();
    for entity in tier.entities.refs() {
        let name = entity.name();
        if name.trim().is_empty() {
            return Err(InvariantViolation::EmptyEntityName {
                tier: tier.name.clone(),
            });
        }
        if !names.insert(name) {
            return Err(InvariantViolation::DuplicateEntity {
                tier: tier.name.clone(),
                entity: name.to_string(),
            });
        }
        validate_entity(entity).map_err(|(field, source)| InvariantViolation::InvalidAddress {
            tier: tier.name.clone(),
            entity: name.to_string(),
            field,
            source,
        })?;
    }
    Ok(())
}

/// Check the addressing fields of one entity, naming the offending field
fn validate_entity(entity: EntityRef<'_>) -> Result<(), (&'static str, NetworkError)> {
    let field = |name: &'static str| move |e: NetworkError| (name, e);

    parse_host(entity.ip()).map_err(field("ip"))?;

    match entity {
        EntityRef::Server(server) => {
            if let Some(sources) = &server.allowed_sources {
                validate_source_list(sources).map_err(field("allowed_sources"))?;
            }
            if let Some(sources) = &server.ssh_sources {
                validate_source_list(sources).map_err(field("ssh_sources"))?;
            }
        }
        EntityRef::Service(service) => {
            if let Some(port) = service.port {
                validate_port(port).map_err(field("port"))?;
            }
        }
        EntityRef::Database(db) => {
            if let Some(port) = db.port {
                validate_port(port).map_err(field("port"))?;
            }
            Cidr::new(&db.app_subnet).map_err(field("app_subnet"))?;
            if let Some(backup) = &db.backup_server {
                parse_host(backup).map_err(field("backup_server"))?;
            }
            for replica in &db.replicas {
                parse_host(replica).map_err(field("replicas"))?;
            }
        }
        EntityRef::SecureResource(resource) => {
            validate_port(resource.port).map_err(field("port"))?;
            for user in &resource.authorized_users {
                parse_host(user).map_err(field("authorized_users"))?;
            }
        }
    }
    Ok(())
}
