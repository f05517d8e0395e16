// Copyright (c) 2025 - Cowboy AI, Inc.
//! Policy template orchestration for multi-tier infrastructure
//!
//! This crate deploys network security policies across an infrastructure
//! topology by driving a remote policy template service. Each entity of the
//! topology (web server, microservice, database, secure resource) is mapped
//! to a template variable set, validated, and instantiated on its tier's
//! logical switch.

pub mod client;
pub mod config;
pub mod deployer;
pub mod domain;
pub mod errors;
pub mod orchestrator;
pub mod variables;

// Re-export commonly used types
pub use client::{TemplateService, TemplateServiceConfig};
pub use config::{DeployerConfig, DeploymentOptions};
pub use deployer::{EntityOutcome, TierDeployer, TierReport};
pub use domain::{reference_topology, Tier, TierKind, Topology};
pub use errors::{ServiceError, ServiceResult};
pub use orchestrator::{DeploymentError, DeploymentOrchestrator, DeploymentReport};
pub use variables::{build_variables, plan_topology, TemplateVariables};

#[cfg(feature = "http")]
pub use client::HttpTemplateClient;
