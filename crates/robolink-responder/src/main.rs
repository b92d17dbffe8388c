// ============================================
// File: crates/robolink-responder/src/main.rs
// ============================================
//! # RoboLink Responder Entry Point
//!
//! ## Creation Reason
//! Main entry point for the responder binary. Handles CLI parsing,
//! logging setup and startup.
//!
//! ## Usage
//! ```bash
//! robolink-responder start --config /etc/robolink/responder.toml
//! robolink-responder validate --config /etc/robolink/responder.toml
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use robolink_responder::{Responder, ResponderConfig};

// ============================================
// CLI Definition
// ============================================

/// RoboLink responder: authenticated robot command endpoint
#[derive(Parser, Debug)]
#[command(name = "robolink-responder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start serving commands
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/robolink/responder.toml")]
        config: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/robolink/responder.toml")]
        config: PathBuf,
    },
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start { config } => cmd_start(config).await,
        Commands::Validate { config } => cmd_validate(config).await,
    };

    if let Err(e) = result {
        init_logging("info");
        error!("{:#}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Starts the responder.
async fn cmd_start(config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&config_path).await?;
    init_logging(&config.logging.level);

    info!("════════════════════════════════════════");
    info!("Listen:     {}", config.network.listen_addr);
    info!("Directory:  {}", config.directory.addr);
    info!("════════════════════════════════════════");

    let responder = Responder::new(config);
    responder.run().await?;
    Ok(())
}

/// Validates configuration file.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Responder will use default values.");
        return Ok(());
    }

    let config = ResponderConfig::load(&config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:       {}", config.network.listen_addr);
    println!();
    println!("Directory:");
    println!("   Address:      {}", config.directory.addr);
    println!("   Retries:      {}", config.directory.retries);
    println!();
    println!("Limits:");
    println!("   Read Timeout: {}s", config.limits.read_timeout_secs);
    println!("   Max Message:  {} bytes", config.limits.max_message_size);
    println!();
    println!("Key Exchange:");
    println!(
        "   Scalars:      [{}, {})",
        config.key_exchange.min, config.key_exchange.max
    );
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads the config file, or defaults plus environment overrides when
/// the file is absent.
async fn load_config(path: &Path) -> anyhow::Result<ResponderConfig> {
    if path.exists() {
        Ok(ResponderConfig::load(path).await?)
    } else {
        let mut config = ResponderConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
