// ============================================
// File: crates/robolink-initiator/src/main.rs
// ============================================
//! # RoboLink Initiator Entry Point
//!
//! ## Creation Reason
//! Main entry point for the initiator binary. Generates the signing key,
//! starts the key directory, connects to the responder and hands stdin
//! and stdout to the console.
//!
//! ## Usage
//! ```bash
//! robolink-initiator start --config /etc/robolink/initiator.toml
//! robolink-initiator validate --config /etc/robolink/initiator.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Logs go to stderr; stdout belongs to the console
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use robolink_core::crypto::SigningKey;
use robolink_initiator::{
    key_gate, Console, Dispatcher, InitiatorConfig, InitiatorSession, KeyDirectory,
};

// ============================================
// CLI Definition
// ============================================

/// RoboLink initiator: operator console for robot commands
#[derive(Parser, Debug)]
#[command(name = "robolink-initiator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and open the console
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/robolink/initiator.toml")]
        config: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/robolink/initiator.toml")]
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

/// Publishes the key, connects and runs the console.
async fn cmd_start(config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&config_path).await?;
    init_logging(&config.logging.level);

    info!("════════════════════════════════════════");
    info!("Responder:  {}", config.network.responder_addr);
    info!("Directory:  {}", config.directory.listen_addr);
    info!("Nonce:      {}", config.signing.nonce_policy);
    info!("════════════════════════════════════════");

    let signer = Arc::new(SigningKey::generate(config.signing.nonce_policy));

    let limits = config.limits.frame_limits();
    let (publisher, gate) = key_gate();
    let directory = KeyDirectory::new(gate, config.directory.connections, limits)
        .spawn(config.directory.listen_addr);
    publisher.publish(Arc::clone(&signer));

    let session = InitiatorSession::connect(
        &config.network.responder_addr,
        config.network.connect_timeout(),
        limits,
        signer,
        config.key_exchange,
    )
    .await?;

    let mut dispatcher = Dispatcher::new(session);
    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let result = console.run(&mut dispatcher).await;

    if let Err(e) = dispatcher.session_mut().close().await {
        warn!(error = %e, "Failed to close responder connection");
    }
    directory.abort();
    Ok(result?)
}

/// Validates configuration file.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Initiator will use default values.");
        return Ok(());
    }

    let config = InitiatorConfig::load(&config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Responder:    {}", config.network.responder_addr);
    println!();
    println!("Directory:");
    println!("   Listen:       {}", config.directory.listen_addr);
    println!("   Connections:  {}", config.directory.connections);
    println!();
    println!("Signing:");
    println!("   Nonce Policy: {}", config.signing.nonce_policy);
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber on stderr.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads the config file, or defaults plus environment overrides when
/// the file is absent.
async fn load_config(path: &Path) -> anyhow::Result<InitiatorConfig> {
    if path.exists() {
        Ok(InitiatorConfig::load(path).await?)
    } else {
        let mut config = InitiatorConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
