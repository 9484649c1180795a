//! Court Reserver CLI server
//!
//! Headless booking service suitable for deployment as a systemd service,
//! Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/court-reserver/config.toml)
//! court-reserver
//!
//! # Custom config path
//! court-reserver --config /etc/court-reserver/config.toml
//!
//! # Override the API port
//! court-reserver --port 8081
//!
//! # Validate config without starting
//! court-reserver --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use court_reserver::config::{AppConfig, CONFIG_ENV};
use court_reserver::server::{init_tracing, ServerHandle, ServerOptions};
use court_reserver::PortalRegistry;

/// Court Reserver: books courts the moment the portal opens.
#[derive(Parser, Debug)]
#[command(
    name = "court-reserver",
    version,
    about = "Scheduled court booking service",
    long_about = "Court Reserver: REST API + wake scheduler that books sports courts \
                  on a reservation portal as soon as its daily window opens.\n\n\
                  Default config: ~/.config/court-reserver/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Override the portal name from the configuration.
    #[arg(long)]
    portal: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(court_reserver::default_config_path);

    let mut config = if config_path.exists() {
        match AppConfig::load(&config_path) {
            Ok(cfg) => cfg,
            Err(e) if cli.check => {
                eprintln!("❌ Invalid configuration {}: {}", config_path.display(), e);
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        AppConfig::default()
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    if config_path.exists() {
        info!("Configuration loaded from {}", config_path.display());
    } else {
        info!(
            "No configuration at {}; using defaults",
            config_path.display()
        );
    }

    if let Some(port) = cli.port {
        info!("CLI override: api_port = {}", port);
        config.server.api_port = port;
    }
    if let Some(ref portal) = cli.portal {
        info!("CLI override: portal = {}", portal);
        config.portal.name = portal.clone();
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        if let Err(e) = config.validate() {
            error!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.api_host, config.server.api_port);
        println!("   Database    : {}", config.database.connection_url());
        println!("   Accounts    : {}", config.accounts.path);
        println!(
            "   Portal      : {}",
            if config.portal.name.is_empty() { "(none)" } else { &config.portal.name }
        );
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        portals: PortalRegistry::new(),
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    // Wait for shutdown signal, then clean up
    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
