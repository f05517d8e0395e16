// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tier Deployer
//!
//! Deploys the entities of one tier, in tier order:
//!
//! ```text
//! entity ──build──> variables ──validate──> valid? ──instantiate──> Deployed
//!                                             │
//!                                             └─ no ──> Rejected (continue)
//! ```
//!
//! # Failure Semantics
//!
//! - A rejected variable set is a *soft* failure: it is recorded in the
//!   [`TierReport`] and the next entity is attempted.
//! - A [`ServiceError`] is a *hard* failure: no further entity of the tier is
//!   started and the error is returned as [`TierAborted`], together with the
//!   outcomes recorded so far.
//!
//! With `entity_concurrency > 1` several entities may be in flight. After a
//! hard failure no new entity is started, but those already in flight run to
//! completion and their outcomes (including entities listed after the failing
//! one) are recorded in the partial report. Outcomes stay in entity order.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::client::TemplateService;
use crate::config::DeploymentOptions;
use crate::domain::{EntityRef, Tier, TierKind};
use crate::errors::{ServiceError, ServiceResult};
use crate::variables::{build_variables, TierContext};

/// Result of deploying one entity, when the service was reachable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntityOutcome {
    /// Template instantiated; `rule_count` rules created (or previewed)
    Deployed {
        entity: String,
        template_id: String,
        rule_count: usize,
    },
    /// Template rejected the variable set; nothing was instantiated
    Rejected {
        entity: String,
        template_id: String,
        errors: Vec<String>,
    },
}

impl EntityOutcome {
    pub fn entity(&self) -> &str {
        match self {
            Self::Deployed { entity, .. } | Self::Rejected { entity, .. } => entity,
        }
    }

    pub fn is_deployed(&self) -> bool {
        matches!(self, Self::Deployed { .. })
    }

    pub fn rule_count(&self) -> usize {
        match self {
            Self::Deployed { rule_count, .. } => *rule_count,
            Self::Rejected { .. } => 0,
        }
    }

    /// Validation errors of a rejected entity
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Deployed { .. } => &[],
            Self::Rejected { errors, .. } => errors,
        }
    }
}

/// Outcomes of one tier, in entity order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierReport {
    pub tier: String,
    pub kind: TierKind,
    pub switch: String,
    pub outcomes: Vec<EntityOutcome>,
}

impl TierReport {
    pub fn new(tier: &Tier) -> Self {
        Self {
            tier: tier.name.clone(),
            kind: tier.kind(),
            switch: tier.switch.clone(),
            outcomes: Vec::new(),
        }
    }

    /// Entities whose template was instantiated
    pub fn deployed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_deployed()).count()
    }

    /// Entities rejected by validation
    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.deployed()
    }

    pub fn total_rules(&self) -> usize {
        self.outcomes.iter().map(EntityOutcome::rule_count).sum()
    }

    pub fn rejections(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter().filter(|o| !o.is_deployed())
    }
}

/// A tier stopped by a service failure
#[derive(Debug, Error)]
#[error("Tier '{tier}' aborted at entity '{entity}': {source}")]
pub struct TierAborted {
    pub tier: String,
    /// Entity whose call failed
    pub entity: String,
    /// Outcomes of every entity that completed, in-flight siblings included
    pub partial: TierReport,
    #[source]
    pub source: ServiceError,
}

/// Deploys tiers through a borrowed template service
pub struct TierDeployer<'a, S: ?Sized> {
    service: &'a S,
    options: &'a DeploymentOptions,
}

impl<'a, S> TierDeployer<'a, S>
where
    S: TemplateService + ?Sized,
{
    pub fn new(service: &'a S, options: &'a DeploymentOptions) -> Self {
        Self { service, options }
    }

    /// Deploy every entity of a tier
    pub async fn deploy_tier(&self, tier: &Tier) -> Result<TierReport, TierAborted> {
        info!(
            "Deploying {} tier '{}' on switch {} ({} entities)",
            tier.kind(),
            tier.name,
            tier.switch,
            tier.entities.len()
        );

        // Built before any call so every service sees the whole tier
        let ctx = TierContext::for_tier(tier);
        let mut report = TierReport::new(tier);

        // Set by the first hard failure; entities admitted afterwards are skipped
        let aborted = AtomicBool::new(false);

        let results = stream::iter(tier.entities.refs())
            .map(|entity| {
                let ctx = &ctx;
                let aborted = &aborted;
                // Checked when the entity is admitted to the window, not when first polled
                let skip = aborted.load(Ordering::SeqCst);
                async move {
                    if skip {
                        return (entity.name(), None);
                    }
                    let result = self.deploy_entity(ctx, entity).await;
                    if result.is_err() {
                        aborted.store(true, Ordering::SeqCst);
                    }
                    (entity.name(), Some(result))
                }
            })
            .buffered(self.options.entity_concurrency.max(1));
        tokio::pin!(results);

        let mut failure: Option<(&str, ServiceError)> = None;

        // Drain everything in flight so the report covers rules already created
        while let Some((entity, result)) = results.next().await {
            match result {
                Some(Ok(outcome)) => report.outcomes.push(outcome),
                Some(Err(source)) => {
                    error!(
                        "Service failure deploying {} in tier '{}': {}",
                        entity, tier.name, source
                    );
                    if failure.is_none() {
                        failure = Some((entity, source));
                    }
                }
                None => debug!("Skipping {} in tier '{}' after service failure", entity, tier.name),
            }
        }

        if let Some((entity, source)) = failure {
            return Err(TierAborted {
                tier: tier.name.clone(),
                entity: entity.to_string(),
                partial: report,
                source,
            });
        }

        info!(
            "Tier '{}' done: {} deployed, {} rejected, {} rules",
            tier.name,
            report.deployed(),
            report.rejected(),
            report.total_rules()
        );
        Ok(report)
    }

    /// Validate then instantiate one entity
    ///
    /// `Ok(Rejected)` means the tier should continue; `Err` means it must stop.
    pub async fn deploy_entity(
        &self,
        ctx: &TierContext<'_>,
        entity: EntityRef<'_>,
    ) -> ServiceResult<EntityOutcome> {
        let name = entity.name();
        let template_id = ctx.template_id;
        let variables = build_variables(entity, ctx);

        info!("Configuring {} ({}) with template {}", name, entity.ip(), template_id);

        let validation = self.service.validate(template_id, &variables).await?;
        if !validation.valid {
            warn!("Validation failed for {}: {:?}", name, validation.errors);
            return Ok(EntityOutcome::Rejected {
                entity: name.to_string(),
                template_id: template_id.to_string(),
                errors: validation.errors,
            });
        }

        let result = self
            .service
            .instantiate(template_id, &variables, Some(ctx.switch), self.options.dry_run)
            .await?;

        if self.options.dry_run {
            info!("Would create {} rules for {}", result.rule_count(), name);
        } else {
            info!("Created {} rules for {}", result.rule_count(), name);
        }

        Ok(EntityOutcome::Deployed {
            entity: name.to_string(),
            template_id: template_id.to_string(),
            rule_count: result.rule_count(),
        })
    }
}
