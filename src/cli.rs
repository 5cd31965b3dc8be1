// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use lanattach::attach::AllocationPolicy;
use lanattach::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lanattach")]
#[command(about = "Attach servers to LANs with floating IPs and wait for convergence")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output mode: normal, quiet or json
    #[arg(long, global = true, default_value = "normal")]
    pub output: OutputMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which address would be taken from a floating pool snapshot
    Select {
        /// Pool snapshot (YAML or JSON)
        #[arg(long)]
        pool_file: PathBuf,

        /// Allocation policy: last-free, first-free or random
        #[arg(long, default_value = "last-free")]
        policy: AllocationPolicy,

        /// List every free address instead of picking one
        #[arg(long)]
        all: bool,
    },

    /// Run an attachment against an in-memory provider seeded from a fixture
    Simulate {
        /// Provider fixture (YAML)
        #[arg(long)]
        fixture: PathBuf,

        /// Config file (defaults to lanattach.yml discovery in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        datacenter: String,

        #[arg(long)]
        server: String,

        /// LAN id
        #[arg(long)]
        network: String,

        /// Floating pool (IP block) to take an address from
        #[arg(long)]
        pool: Option<String>,
    },
}
