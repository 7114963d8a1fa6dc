// Copyright (c) 2025 - Cowboy AI, Inc.
//! Hetzner Cloud Network Subnet CLI
//!
//! Creates, reads and deletes network subnets through the subnet reconciler.
//!
//! Run with: cargo run --bin hcloud-subnet -- <command>
//!
//! Prerequisites:
//! 1. Hetzner Cloud API token (via HCLOUD_TOKEN environment variable or `--config` file)
//! 2. Optional overrides: HCLOUD_ENDPOINT, HCLOUD_MAX_ATTEMPTS, HCLOUD_POLL_INTERVAL_MS,
//!    HCLOUD_ACTION_TIMEOUT_SECS

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cim_network_subnet::{
    api::HcloudClient,
    domain::{SubnetKind, SubnetSpec, SubnetType},
    GoneReason, ReadOutcome, ReconcilerConfig, SubnetReconciler,
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "hcloud-subnet", version, about = "Manage Hetzner Cloud network subnets")]
struct Cli {
    /// TOML configuration file; environment variables are used when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a subnet to a network and wait for it to be ready
    Create {
        #[arg(long)]
        network_id: u64,
        /// cloud, server or vswitch
        #[arg(long = "type")]
        subnet_type: String,
        #[arg(long)]
        zone: String,
        #[arg(long)]
        ip_range: String,
        #[arg(long)]
        vswitch_id: Option<u64>,
    },
    /// Show a subnet by its `<network id>-<ip range>` id
    Read { id: String },
    /// Delete a subnet by its `<network id>-<ip range>` id
    Delete { id: String },
}

fn load_config(path: Option<&PathBuf>) -> Result<ReconcilerConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            ReconcilerConfig::from_toml_str(&text)?
        }
        None => ReconcilerConfig::from_env()?,
    };

    if config.token.is_empty() {
        bail!("No API token configured. Set HCLOUD_TOKEN or `token` in the config file");
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    info!("📋 Using endpoint {} (max attempts: {})", config.endpoint, config.max_attempts);

    let client = HcloudClient::new(&config).context("Failed to create API client")?;
    let reconciler = SubnetReconciler::from_config(Arc::new(client), &config);

    // Ctrl-C cancels any in-flight mutation or action wait
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ Interrupted, cancelling");
            trigger.cancel();
        }
    });

    match cli.command {
        Command::Create {
            network_id,
            subnet_type,
            zone,
            ip_range,
            vswitch_id,
        } => {
            let subnet_type: SubnetType = subnet_type.parse()?;
            let kind = SubnetKind::new(subnet_type, vswitch_id)?;
            let spec = SubnetSpec::new(network_id, &ip_range, &zone, kind)?;

            let state = reconciler
                .create_and_read(&spec, &cancel)
                .await
                .context("Failed to create network subnet")?;
            info!("✅ Created network subnet {}", state.id);
            println!("{}", serde_json::to_string_pretty(&state.to_fields())?);
        }
        Command::Read { id } => match reconciler.read(&id, &cancel).await? {
            ReadOutcome::Found(state) => {
                println!("{}", serde_json::to_string_pretty(&state.to_fields())?);
            }
            ReadOutcome::Gone(GoneReason::NotFound) => {
                bail!("Network subnet {} not found", id);
            }
            ReadOutcome::Gone(GoneReason::InvalidIdentifier(reason)) => {
                bail!("Invalid network subnet id {}: {}", id, reason);
            }
        },
        Command::Delete { id } => {
            reconciler
                .delete(&id, &cancel)
                .await
                .context("Failed to delete network subnet")?;
            info!("✅ Network subnet {} is absent", id);
        }
    }

    Ok(())
}
