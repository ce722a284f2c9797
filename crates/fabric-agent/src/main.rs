//! fabric-agent: inspect and exercise fabric interface selection.
//!
//! Builds the NUMA fabric the same way the agent does at startup (static
//! `fabric_ifaces` from the config file, else a discovery scan) and runs
//! selections or lookups against it.
//!
//! # Usage
//!
//! ```text
//! fabric-agent --config /etc/daos/daos_agent.toml status
//! fabric-agent --scan scan.json select --numa 1 --class infiniband --provider "ofi+verbs;ofi_rxm"
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fabric_select::{AgentConfig, NetDevClass};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

mod commands;

#[derive(Parser)]
#[command(
    name = "fabric-agent",
    about = "NUMA-aware fabric interface selection",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Agent config file (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Fabric scan result (JSON), used when the config declares no fabric_ifaces.
    #[arg(short, long, global = true)]
    scan: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fabric inventory grouped by NUMA node.
    Status,
    /// Select interfaces the way endpoint creation does.
    Select {
        /// NUMA node of the requesting client.
        #[arg(long, default_value = "0")]
        numa: u32,
        /// Device class (ether, infiniband, ...). Any class if omitted.
        #[arg(long)]
        class: Option<NetDevClass>,
        /// Fabric provider, e.g. ofi+tcp.
        #[arg(long)]
        provider: String,
        /// Number of consecutive selections.
        #[arg(long, default_value = "1")]
        count: usize,
    },
    /// Look up an interface by name.
    Find {
        #[arg(long)]
        iface: String,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long)]
        provider: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };
    init_tracing(&config, cli.log_json)?;

    let fabric = commands::build_fabric(&config, cli.scan.as_deref())?;

    match cli.command {
        Commands::Status => commands::status(&fabric),
        Commands::Select {
            numa,
            class,
            provider,
            count,
        } => commands::select(&fabric, numa, class, &provider, count),
        Commands::Find {
            iface,
            domain,
            provider,
        } => commands::find(&fabric, &iface, domain.as_deref(), provider.as_deref()),
    }
}

fn init_tracing(config: &AgentConfig, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let writer = match &config.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
