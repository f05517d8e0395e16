// Copyright (c) 2025 - Cowboy AI, Inc.
//! Policy Deployer
//!
//! Deploys network policy templates for every tier of a topology through the
//! platform's template API.
//!
//! Run with: cargo run --bin policy-deployer -- deploy --topology topology.yaml
//!
//! Prerequisites:
//! 1. Template API reachable (via TEMPLATE_API_URL, default localhost:8080)
//! 2. API token set (via TEMPLATE_API_TOKEN)
//!
//! Without `--topology` (or TOPOLOGY_PATH) the built-in reference topology is
//! used. `plan` works offline and needs no token.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use cim_policy_orchestrator::{
    client::{HttpTemplateClient, TemplateDescriptor, TemplateService},
    config::DeployerConfig,
    domain::{reference_topology, Topology},
    orchestrator::{DeploymentOrchestrator, DeploymentReport},
    variables::plan_topology,
};

#[derive(Parser)]
#[command(name = "policy-deployer")]
#[command(version)]
#[command(about = "Deploy policy templates across an infrastructure topology", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy every tier of a topology
    Deploy {
        /// Topology document (YAML or JSON)
        #[arg(long, short, env = "TOPOLOGY_PATH")]
        topology: Option<PathBuf>,
        /// Preview rules without creating them
        #[arg(long)]
        dry_run: bool,
        /// Entities of a tier deployed concurrently
        #[arg(long)]
        concurrency: Option<usize>,
        /// Fail before deploying if a required template is missing
        #[arg(long)]
        verify_templates: bool,
        /// Report format
        #[arg(long, short, default_value = "text")]
        format: OutputFormat,
    },
    /// List published templates
    Templates {
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Show a single template
        #[arg(long)]
        id: Option<String>,
    },
    /// Print every variable set a deployment would send
    Plan {
        #[arg(long, short, env = "TOPOLOGY_PATH")]
        topology: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn load_topology(path: Option<&PathBuf>) -> Result<Topology> {
    match path {
        Some(path) => {
            info!("Loading topology from {}", path.display());
            Topology::from_path(path)
                .with_context(|| format!("Failed to load topology {}", path.display()))
        }
        None => {
            info!("No topology given, using the reference topology");
            Ok(reference_topology())
        }
    }
}

fn print_report(report: &DeploymentReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => println!("{}", report),
    }
    Ok(())
}

fn print_template(template: &TemplateDescriptor) {
    println!("{} - {} [{}]", template.id, template.name, template.category);
    if !template.description.is_empty() {
        println!("    {}", template.description);
    }
    let required: Vec<&str> = template.required_variables().collect();
    if !required.is_empty() {
        println!("    required: {}", required.join(", "));
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Plan { topology } => {
            let topology = load_topology(topology.as_ref())?;
            let plan = plan_topology(&topology);
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }

        Commands::Templates { category, tags, id } => {
            let config = DeployerConfig::from_env().context("Failed to load configuration")?;
            let client = HttpTemplateClient::new(config.service)
                .context("Failed to create template client")?;

            match id {
                Some(id) => print_template(&client.get_template(&id).await?),
                None => {
                    let templates = client.list_templates(category.as_deref(), &tags).await?;
                    info!("{} templates found", templates.len());
                    templates.iter().for_each(print_template);
                }
            }
            Ok(())
        }

        Commands::Deploy {
            topology,
            dry_run,
            concurrency,
            verify_templates,
            format,
        } => {
            let mut config = DeployerConfig::from_env().context("Failed to load configuration")?;
            config.options.dry_run |= dry_run;
            config.options.verify_templates |= verify_templates;
            if let Some(concurrency) = concurrency {
                anyhow::ensure!(concurrency > 0, "--concurrency must be at least 1");
                config.options.entity_concurrency = concurrency;
            }

            info!("Template API: {}", config.service.base_url);
            let topology = load_topology(topology.as_ref())?;

            let client = HttpTemplateClient::new(config.service)
                .context("Failed to create template client")?;
            let orchestrator = DeploymentOrchestrator::new(client, config.options);

            match orchestrator.deploy(&topology).await {
                Ok(report) => print_report(&report, format),
                Err(err) => {
                    print_report(&err.completed, format)?;
                    Err(err.into())
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    run(Cli::parse()).await
}
