//! agentcal - MCP tool gateway for a shared calendar.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agentcal_activity::ActivityStatus;
use agentcal_gateway::demo::{self, Scenario};
use agentcal_gateway::{Gateway, GatewayConfig, McpServer, MCP_VERSION};

#[derive(Parser)]
#[command(name = "agentcal")]
#[command(about = "Agent tool gateway for a shared calendar", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding events.json and users.json; in-memory when omitted
    #[arg(short, long, global = true)]
    storage: Option<std::path::PathBuf>,

    /// Seed demo events when no saved calendar exists
    #[arg(long, global = true)]
    seed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP Server in stdio mode
    Stdio,

    /// List available tools
    ListTools,

    /// Print server info
    Info,

    /// Run a scripted multi-agent scenario and print the activity ledger
    Demo {
        /// Scenario to run
        #[arg(value_enum)]
        scenario: DemoScenario,

        /// Merge every agent branch afterwards
        #[arg(long)]
        merge: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DemoScenario {
    Single,
    Conflict,
}

impl From<DemoScenario> for Scenario {
    fn from(s: DemoScenario) -> Self {
        match s {
            DemoScenario::Single => Scenario::Single,
            DemoScenario::Conflict => Scenario::Conflict,
        }
    }
}

/// Logs go to stderr; stdout carries the protocol.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = GatewayConfig {
        storage_path: cli.storage,
        seed: cli.seed,
        ..Default::default()
    };
    let gateway = Arc::new(Gateway::open(&config).await?);

    match cli.command {
        Commands::Stdio => {
            let server = McpServer::new(config, gateway);
            server.start().await?;
        }

        Commands::ListTools => {
            let schemas = gateway.registry().schemas();
            println!("Available tools ({}):", schemas.len());
            for schema in schemas {
                let hints = &schema.annotations;
                let mut flags = Vec::new();
                if hints.read_only {
                    flags.push("read-only");
                }
                if hints.destructive {
                    flags.push("destructive");
                }
                if hints.idempotent && !hints.read_only {
                    flags.push("idempotent");
                }
                println!("  - {} [{}]", schema.name, flags.join(", "));
                println!("      {}", schema.description);
            }
        }

        Commands::Info => {
            let data = gateway.sessions().main_store().snapshot();
            println!("agentcal MCP Server v{}", config.version);
            println!("Protocol: MCP {}", MCP_VERSION);
            println!("Transport: stdio");
            println!("Tools: {}", gateway.registry().len());
            println!("Users: {}", data.users.len());
            println!("Events: {}", data.events.len());
            match &config.storage_path {
                Some(path) => println!("Storage: {}", path.display()),
                None => println!("Storage: in-memory"),
            }
        }

        Commands::Demo { scenario, merge } => {
            let report = demo::run(&gateway, scenario.into()).await?;
            for (agent, diff) in &report.previews {
                println!("{}: {}", agent, diff.summary());
                for event in &diff.added {
                    println!("  + {} ({} - {})", event.title, event.start_date, event.end_date);
                }
            }
            for (a, b) in &report.overlaps {
                println!("Overlap: {} / {}", a, b);
            }

            if merge {
                for session in gateway.sessions().list_active().await {
                    let outcome = gateway.merge(&session.agent_id).await?;
                    info!("Merged {} with {} conflict(s)", session.branch, outcome.conflicts.len());
                }
                println!("Main now holds {} events", gateway.sessions().main_store().event_count());
            }

            println!();
            println!(
                "Activity ({} entries, {} in the last {}s):",
                gateway.ledger().len(),
                gateway.recent_activity().len(),
                config.recent_window.as_secs()
            );
            for entry in gateway.ledger().entries() {
                let status = match entry.status {
                    ActivityStatus::None => String::new(),
                    other => format!(" ({})", other),
                };
                println!(
                    "  {} {} [{}] {}{}",
                    entry.kind.icon(),
                    entry.kind.label(),
                    entry.agent_name.as_deref().unwrap_or("user"),
                    entry.description,
                    status
                );
            }
        }
    }

    Ok(())
}
