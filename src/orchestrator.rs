// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Orchestrator
//!
//! Runs a whole topology through the template service, one tier at a time:
//!
//! ```text
//! [verify templates] → web → application → data → secure
//! ```
//!
//! Each tier is finished before the next one starts. Entities rejected by
//! validation are recorded and skipped; a [`ServiceError`] anywhere ends the
//! run and is returned as a [`DeploymentError`] carrying what had already
//! been created. Nothing is rolled back: the platform owns the consistency
//! of rules it has accepted.
//!
//! # Example
//!
//! ```rust,no_run
//! use cim_policy_orchestrator::client::{HttpTemplateClient, TemplateServiceConfig};
//! use cim_policy_orchestrator::config::DeploymentOptions;
//! use cim_policy_orchestrator::domain::reference_topology;
//! use cim_policy_orchestrator::orchestrator::DeploymentOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpTemplateClient::new(TemplateServiceConfig::default())?;
//!     let orchestrator = DeploymentOrchestrator::new(client, DeploymentOptions::default());
//!
//!     let report = orchestrator.deploy(&reference_topology()).await?;
//!     println!("{} rules created", report.total_rules());
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::client::TemplateService;
use crate::config::DeploymentOptions;
use crate::deployer::{TierAborted, TierDeployer, TierReport};
use crate::domain::Topology;
use crate::errors::{ServiceError, ServiceResult};

/// Aggregated result of a deployment run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Tier reports in deployment order
    pub tiers: Vec<TierReport>,
}

impl DeploymentReport {
    fn start(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            tiers: Vec::new(),
        }
    }

    fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn deployed(&self) -> usize {
        self.tiers.iter().map(TierReport::deployed).sum()
    }

    pub fn rejected(&self) -> usize {
        self.tiers.iter().map(TierReport::rejected).sum()
    }

    pub fn total_rules(&self) -> usize {
        self.tiers.iter().map(TierReport::total_rules).sum()
    }

    /// True when every attempted entity was deployed
    pub fn is_clean(&self) -> bool {
        self.rejected() == 0
    }
}

/// Plain-text summary: one line per tier, each rejection with its errors
impl fmt::Display for DeploymentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "Deployment {}{}", self.run_id, mode)?;

        for tier in &self.tiers {
            writeln!(
                f,
                "  {:<20} {:<12} deployed {:>3}  rejected {:>3}  rules {:>4}",
                tier.tier,
                tier.switch,
                tier.deployed(),
                tier.rejected(),
                tier.total_rules()
            )?;
            for rejection in tier.rejections() {
                writeln!(f, "    rejected: {}", rejection.entity())?;
                for error in rejection.errors() {
                    writeln!(f, "      - {}", error)?;
                }
            }
        }

        write!(
            f,
            "Total: {} deployed, {} rejected, {} rules",
            self.deployed(),
            self.rejected(),
            self.total_rules()
        )
    }
}

/// A run aborted by a service failure
#[derive(Debug, Error)]
#[error("Deployment aborted at {}: {source}", abort_point(.tier, .entity))]
pub struct DeploymentError {
    /// Tier being deployed, `None` if the run failed before any tier
    pub tier: Option<String>,
    /// Entity whose call failed
    pub entity: Option<String>,
    /// Everything recorded before the failure, including the partial tier
    pub completed: DeploymentReport,
    #[source]
    pub source: ServiceError,
}

fn abort_point(tier: &Option<String>, entity: &Option<String>) -> String {
    match (tier, entity) {
        (Some(tier), Some(entity)) => format!("tier '{}', entity '{}'", tier, entity),
        (Some(tier), None) => format!("tier '{}'", tier),
        _ => "preflight".to_string(),
    }
}

/// Sequences tier deployments over an owned template service
pub struct DeploymentOrchestrator<S> {
    service: S,
    options: DeploymentOptions,
}

impl<S: TemplateService> DeploymentOrchestrator<S> {
    pub fn new(service: S, options: DeploymentOptions) -> Self {
        Self { service, options }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn options(&self) -> &DeploymentOptions {
        &self.options
    }

    /// Deploy every tier of a topology
    pub async fn deploy(&self, topology: &Topology) -> Result<DeploymentReport, DeploymentError> {
        let mut report = DeploymentReport::start(self.options.dry_run);

        info!(
            "Starting infrastructure deployment {} ({} tiers, {} entities, dry_run={})",
            report.run_id,
            topology.tiers.len(),
            topology.entity_count(),
            self.options.dry_run
        );

        if self.options.verify_templates {
            if let Err(source) = self.verify_templates(topology).await {
                error!("Template preflight failed: {}", source);
                report.finish();
                return Err(DeploymentError {
                    tier: None,
                    entity: None,
                    completed: report,
                    source,
                });
            }
        }

        let deployer = TierDeployer::new(&self.service, &self.options);

        for tier in topology.deployment_order() {
            match deployer.deploy_tier(tier).await {
                Ok(tier_report) => report.tiers.push(tier_report),
                Err(TierAborted {
                    tier,
                    entity,
                    partial,
                    source,
                }) => {
                    report.tiers.push(partial);
                    report.finish();
                    error!(
                        "Deployment {} aborted in tier '{}' after {} deployed entities: {}",
                        report.run_id,
                        tier,
                        report.deployed(),
                        source
                    );
                    return Err(DeploymentError {
                        tier: Some(tier),
                        entity: Some(entity),
                        completed: report,
                        source,
                    });
                }
            }
        }

        report.finish();
        info!(
            "Infrastructure deployment {} completed: {} deployed, {} rejected, {} rules",
            report.run_id,
            report.deployed(),
            report.rejected(),
            report.total_rules()
        );
        Ok(report)
    }

    /// Check that every template the topology needs is published
    pub async fn verify_templates(&self, topology: &Topology) -> ServiceResult<()> {
        let published: BTreeSet<String> = self
            .service
            .list_templates(None, &[])
            .await?
            .into_iter()
            .map(|template| template.id)
            .collect();

        match topology
            .template_ids()
            .into_iter()
            .find(|id| !published.contains(id))
        {
            Some(missing) => Err(ServiceError::UnknownTemplate(missing)),
            None => Ok(()),
        }
    }
}
