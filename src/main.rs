// ABOUTME: Entry point for the lanattach CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use lanattach::attach::{AllocationPolicy, Attacher, PoolAllocator};
use lanattach::config::AttachConfig;
use lanattach::error::{Error, Result};
use lanattach::output::{Output, OutputMode};
use lanattach::provider::{AddressPool, Fixture, InMemoryProvider};
use lanattach::types::{DatacenterId, PoolId, ServerId};
use serde::Serialize;
use std::env;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output);
    let result = run(cli.command, output).await;

    if let Err(e) = result {
        Output::new(cli.output).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, mut output: Output) -> Result<()> {
    match command {
        Commands::Select {
            pool_file,
            policy,
            all,
        } => select(&pool_file, policy, all, &output),
        Commands::Simulate {
            fixture,
            config,
            datacenter,
            server,
            network,
            pool,
        } => {
            let config = match config {
                Some(path) => AttachConfig::load(&path)?,
                None => AttachConfig::discover(&env::current_dir()?)?,
            };
            output.start_timer();
            simulate(
                &fixture,
                &config,
                SimulateTarget {
                    datacenter: DatacenterId::parse(&datacenter)?,
                    server: ServerId::parse(&server)?,
                    network,
                    pool: pool.as_deref().map(PoolId::parse).transpose()?,
                },
                &output,
            )
            .await
        }
    }
}

/// Read a pool snapshot from YAML or JSON, by extension.
fn load_pool(path: &Path) -> Result<AddressPool> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yml" | "yaml") => Ok(serde_yaml::from_str(&content)?),
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Err(Error::UnsupportedFormat(PathBuf::from(path))),
    }
}

#[derive(Serialize)]
struct Selection {
    pool: String,
    policy: String,
    free: Vec<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<IpAddr>,
}

fn select(path: &Path, policy: AllocationPolicy, all: bool, output: &Output) -> Result<()> {
    let pool = load_pool(path)?;
    let free = pool.free_addresses();

    output.progress(&format!(
        "Pool {}: {} reserved, {} in use, {} free",
        pool.id,
        pool.addresses.len(),
        pool.addresses.len() - free.len(),
        free.len()
    ));

    if all {
        let listing = free
            .iter()
            .map(|ip| ip.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let report = Selection {
            pool: pool.id.to_string(),
            policy: policy.to_string(),
            free,
            selected: None,
        };
        output.success(&listing, Some(&report));
        return Ok(());
    }

    let selected = PoolAllocator::new(policy).allocate(&pool)?;
    let report = Selection {
        pool: pool.id.to_string(),
        policy: policy.to_string(),
        free,
        selected: Some(selected),
    };
    output.success(&selected.to_string(), Some(&report));
    Ok(())
}

struct SimulateTarget {
    datacenter: DatacenterId,
    server: ServerId,
    network: String,
    pool: Option<PoolId>,
}

#[derive(Serialize)]
struct SimulationReport {
    nic: String,
    request: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<IpAddr>,
}

async fn simulate(
    fixture: &Path,
    config: &AttachConfig,
    target: SimulateTarget,
    output: &Output,
) -> Result<()> {
    let provider = Arc::new(InMemoryProvider::from_fixture(Fixture::load(fixture)?));

    if let Some(pool) = &target.pool
        && provider.pool(pool).is_none()
    {
        return Err(Error::UnknownPool(pool.to_string()));
    }

    let attacher = Attacher::new(Arc::clone(&provider), config);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    output.progress(&format!(
        "  → Attaching server {} in datacenter {} to LAN {}...",
        target.server, target.datacenter, target.network
    ));

    let result = match &target.pool {
        Some(pool) => {
            output.progress(&format!("  → Taking an address from {}...", pool.labelled()));
            attacher
                .ensure_floating_attachment(
                    &target.datacenter,
                    &target.server,
                    &target.network,
                    pool,
                    &cancel,
                )
                .await
        }
        None => {
            attacher
                .ensure_plain_attachment(
                    &target.datacenter,
                    &target.server,
                    &target.network,
                    &cancel,
                )
                .await
        }
    };
    ctrl_c.abort();
    let attachment = result?;

    let message = match attachment.address {
        Some(ip) => format!("  ✓ Attached {} with {ip}", attachment.operation.nic_id.labelled()),
        None => format!("  ✓ Attached {}", attachment.operation.nic_id.labelled()),
    };
    let report = SimulationReport {
        nic: attachment.operation.nic_id.to_string(),
        request: attachment.operation.request_id.to_string(),
        address: attachment.address,
    };
    if output.mode() == OutputMode::Quiet {
        output.success(&report.nic, Some(&report));
    } else {
        output.success(&message, Some(&report));
    }
    Ok(())
}
