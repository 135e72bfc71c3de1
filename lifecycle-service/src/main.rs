// SPDX-License-Identifier: GPL-3.0-only

//! Disk lifecycle manager - standalone service binary
//!
//! Discovers storage volumes, reconciles them into the datastore, and
//! drives format/mount/unmount/wipe transitions through the controller.
//! Any richer presentation layer (web UI, D-Bus) would sit on the same
//! controller; this binary is the minimal local one.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use lifecycle_contracts::Datastore;
use lifecycle_service::{
    AllowAll, DiskLifecycleController, MemoryDatastore, OperationError, Reconciler, ServiceConfig,
};
use lifecycle_sys::{detect_platform, DiskDiscoverer, ProcessRunner};
use lifecycle_types::{Disk, DiskDraft, OperationOutcome, Principal};

#[derive(Parser)]
#[command(name = "disk-lifecycle-service", version, about = "Disk lifecycle manager")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit listings as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Reconcile discovered disks and, if configured, keep reconciling
    /// periodically
    Run,
    /// List known disks
    List,
    /// Register a disk that discovery has not seen
    Register {
        name: String,
        #[arg(long, default_value_t = 0)]
        size_mb: u64,
        #[arg(long, default_value = "ext4")]
        filesystem: String,
    },
    /// Format a disk (destroys its contents)
    Format { name: String },
    /// Mount a disk at the given mountpoint
    Mount { name: String, mountpoint: String },
    /// Unmount a mounted disk
    Unmount { name: String },
    /// Wipe filesystem signatures from a disk
    Wipe { name: String },
    /// Remove a disk record
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("lifecycle_service=info,lifecycle_sys=info,warn")
        }))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::load(cli.config.as_deref())?;
    let secret = config.load_secret()?;

    let platform = detect_platform()?;
    tracing::info!("platform strategy: {}", platform.name());

    let runner = Arc::new(ProcessRunner::new(secret, config.command_timeout()));
    let datastore: Arc<MemoryDatastore> = Arc::new(MemoryDatastore::new());
    let discoverer = DiskDiscoverer::new(platform.clone(), runner.clone());
    let reconciler = Reconciler::new(discoverer, datastore.clone());
    let controller = DiskLifecycleController::new(
        datastore.clone(),
        Arc::new(AllowAll),
        runner,
        platform,
    );

    let principal = Principal::new(std::env::var("USER").unwrap_or_else(|_| "local".to_string()));

    // Seed the datastore before any operation.
    let created = reconciler.reconcile().await?;
    tracing::info!("startup reconcile created {created} records");

    match cli.command {
        CliCommand::Run => {
            match config.reconcile_interval() {
                Some(interval) => {
                    tracing::info!("reconciling every {}s", interval.as_secs());
                    reconciler.run_periodic(interval).await;
                }
                None => {
                    print_listing(&controller.list().await?, cli.json);
                }
            }
            Ok(())
        }
        CliCommand::List => {
            print_listing(&controller.list().await?, cli.json);
            Ok(())
        }
        CliCommand::Register {
            name,
            size_mb,
            filesystem,
        } => {
            let draft = DiskDraft::new(name, size_mb, filesystem);
            finish(controller.register(&principal, draft).await, cli.json)
        }
        CliCommand::Format { name } => {
            let disk = resolve(datastore.as_ref(), &name).await?;
            finish(controller.format(&principal, disk.id).await, cli.json)
        }
        CliCommand::Mount { name, mountpoint } => {
            let disk = resolve(datastore.as_ref(), &name).await?;
            finish(controller.mount(&principal, disk.id, &mountpoint).await, cli.json)
        }
        CliCommand::Unmount { name } => {
            let disk = resolve(datastore.as_ref(), &name).await?;
            finish(controller.unmount(&principal, disk.id).await, cli.json)
        }
        CliCommand::Wipe { name } => {
            let disk = resolve(datastore.as_ref(), &name).await?;
            finish(controller.wipe(&principal, disk.id).await, cli.json)
        }
        CliCommand::Remove { name } => {
            let disk = resolve(datastore.as_ref(), &name).await?;
            finish(controller.remove(&principal, disk.id).await, cli.json)
        }
    }
}

async fn resolve(datastore: &dyn Datastore, name: &str) -> Result<Disk> {
    datastore
        .get_by_name(name)
        .await?
        .ok_or_else(|| anyhow!("disk '{name}' not found"))
}

fn finish(
    result: std::result::Result<OperationOutcome, OperationError>,
    json: bool,
) -> Result<()> {
    match result {
        Ok(outcome) => {
            println!("{}", outcome.message);
            print_listing(&outcome.disks, json);
            Ok(())
        }
        Err(failure) => {
            // The failure still carries a fresh listing so the caller sees
            // actual current state, not what it had in hand.
            print_listing(&failure.disks, json);
            Err(failure.error.into())
        }
    }
}

fn print_listing(disks: &[Disk], json: bool) {
    if json {
        match serde_json::to_string_pretty(disks) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => tracing::error!("could not serialize listing: {e}"),
        }
        return;
    }
    println!(
        "{:<12} {:<12} {:>10}  {:<8} {}",
        "NAME", "STATE", "SIZE (MB)", "FS", "MOUNTPOINT"
    );
    for disk in disks {
        println!(
            "{:<12} {:<12} {:>10}  {:<8} {}",
            disk.name, disk.state, disk.size_mb, disk.filesystem, disk.mountpoint
        );
    }
}
