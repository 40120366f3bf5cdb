//! macrolink responder entry point.
//!
//! Binds the configured address and serves initiators one at a time.  Each
//! accepted connection gets a fresh [`ResponderSession`]; the macro registry
//! and the injector outlive sessions so replicated macros persist between
//! connections.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config() + CLI overrides   (--write-config → save_config(), exit)
//!  └─ MacroRegistry::open_boxed(open_configured(..)) + seed defaults
//!  └─ bind(host:port)
//!  └─ loop
//!       └─ ResponderSession::serve()   (Ctrl-C → SessionHandle::close)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use macrolink_core::config::{load_config, save_config};
use macrolink_core::storage::open_configured;
use macrolink_core::{default_macros, MacroRegistry, PeerConfig, TracingObserver};
use macrolink_responder::application::execute_command::ExecuteCommandUseCase;
use macrolink_responder::infrastructure::injection::logging::LoggingInjector;
use macrolink_responder::infrastructure::network::session::{bind, ResponderSession};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Executes macros sent by an authenticated macrolink initiator.
#[derive(Debug, Parser)]
#[command(
    name = "macrolink-responder",
    about = "Executes macros sent by an authenticated macrolink initiator",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.  Defaults apply when absent.
    #[arg(long, default_value = "macrolink.toml", env = "MACROLINK_CONFIG")]
    config: PathBuf,

    /// Address to listen on; overrides `network.host`.
    #[arg(long, env = "MACROLINK_HOST")]
    host: Option<String>,

    /// Port to listen on; overrides `network.port`.
    #[arg(long, env = "MACROLINK_PORT")]
    port: Option<u16>,

    /// Shared secret; overrides `auth.shared_secret`.
    #[arg(long, env = "MACROLINK_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Macro table file; overrides `storage.macro_file`.
    #[arg(long, env = "MACROLINK_MACRO_FILE")]
    macro_file: Option<PathBuf>,

    /// Write the effective configuration (file plus overrides) to
    /// `--config` and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<PeerConfig> {
        let mut config = load_config(&self.config)
            .with_context(|| format!("failed to load {}", self.config.display()))?;

        if let Some(host) = self.host {
            config.network.host = host;
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(secret) = self.secret {
            config.auth.shared_secret = secret;
        }
        if let Some(path) = self.macro_file {
            config.storage.macro_file = Some(path);
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();
    let write_config = cli.write_config;
    let config = cli.into_config()?;

    if write_config {
        save_config(&config_path, &config)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }
    let config = Arc::new(config);

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("macrolink responder starting");

    // ── Registry ──────────────────────────────────────────────────────────────
    let store = open_configured(&config.storage).context("failed to open macro store")?;
    let registry = Arc::new(MacroRegistry::open_boxed(store)?);
    let seeded = registry.seed_if_empty(default_macros())?;
    if seeded > 0 {
        info!(count = seeded, "installed default macros");
    }
    registry
        .hub()
        .subscribe(Arc::new(TracingObserver::new("responder")));

    let executor = Arc::new(ExecuteCommandUseCase::new(
        Arc::new(LoggingInjector::new()),
        Arc::clone(&registry),
    ));

    let listener = bind(&config).await?;
    info!(addr = %config.network.address(), "listening for initiators");

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = stop_tx.send(true);
        }
    });

    // ── Accept loop: one session at a time ───────────────────────────────────
    while !*stop_rx.borrow() {
        let (session, handle) = ResponderSession::new(Arc::clone(&config), Arc::clone(&executor));

        let mut stop = stop_rx.clone();
        let watcher = tokio::spawn(async move {
            if stop.wait_for(|stopped| *stopped).await.is_ok() {
                handle.close();
            }
        });

        if let Err(e) = session.serve(&listener).await {
            warn!(error = %e, "session ended with error");
        }
        watcher.abort();
    }

    info!("macrolink responder stopped");
    Ok(())
}
