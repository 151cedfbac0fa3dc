use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_rpc::{RpcConfig, RpcPeer};
use session_discovery::{claim_session, discover};
use tabwire_core_types::TabId;
use tabwire_relay::{serve, PageHost, RelayState, ToolRouter};

const BLANK_PAGE: &str = "<html><head><title>tabwire</title></head><body></body></html>";

/// Tabwire - accessibility-snapshot relay for remote page automation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Claim a session name and serve the relay endpoints
    Serve(ServeArgs),
    /// Scan the session port range and list live relays
    Discover(DiscoverArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// HTML file to load as the initial document
    #[arg(long, value_name = "FILE")]
    page: Option<PathBuf>,

    /// Ping cadence on the RPC connection, in seconds (0 disables)
    #[arg(long, default_value_t = 15)]
    heartbeat: u64,

    /// Default per-call deadline, in seconds
    #[arg(long, default_value_t = 30)]
    deadline: u64,
}

#[derive(Args)]
struct DiscoverArgs {
    /// Per-port probe budget, in milliseconds
    #[arg(long, default_value_t = 1500)]
    budget_ms: u64,

    /// Print machine-readable JSON instead of one line per session
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.debug)?;

    let result = match cli.command {
        Commands::Serve(args) => cmd_serve(args).await,
        Commands::Discover(args) => cmd_discover(args).await,
    };

    if let Err(e) = result {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

async fn cmd_serve(args: ServeArgs) -> Result<()> {
    let html = match &args.page {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => BLANK_PAGE.to_string(),
    };

    let claimed = claim_session()
        .await
        .context("no free session name in the port range")?;
    info!(
        "Serving session {:?} on 127.0.0.1:{}",
        claimed.name, claimed.port
    );

    let page = PageHost::spawn(html);
    let config = RpcConfig {
        default_deadline: Duration::from_secs(args.deadline),
        heartbeat_interval: (args.heartbeat > 0).then(|| Duration::from_secs(args.heartbeat)),
    };
    let peer = Arc::new(RpcPeer::with_handler(
        config,
        Arc::new(ToolRouter::new(page)),
    ));
    let state = RelayState {
        session_name: claimed.name.clone(),
        tab: TabId::new(),
        peer,
    };

    serve(claimed, state).await.context("relay server failed")
}

async fn cmd_discover(args: DiscoverArgs) -> Result<()> {
    let sessions = discover(Duration::from_millis(args.budget_ms)).await;

    if args.json {
        let rows: Vec<_> = sessions
            .iter()
            .map(|s| {
                serde_json::json!({
                    "name": s.name,
                    "port": s.port,
                    "status": s.status,
                    "connectedTab": s.connected_tab,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No live sessions.");
        return Ok(());
    }
    for s in &sessions {
        match &s.connected_tab {
            Some(tab) => println!("{}  127.0.0.1:{}  {}  tab={}", s.name, s.port, s.status, tab),
            None => println!("{}  127.0.0.1:{}  {}", s.name, s.port, s.status),
        }
    }
    Ok(())
}
