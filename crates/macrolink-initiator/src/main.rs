//! macrolink initiator entry point.
//!
//! Loads the configuration, opens the macro registry, and runs one session
//! against the responder while a console task feeds key presses and macro
//! edits from stdin.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config() + CLI overrides   (--write-config → save_config(), exit)
//!  └─ MacroRegistry::open_boxed(open_configured(..)) + seed defaults
//!  └─ spawn
//!       ├─ console task   (stdin → HotkeyTrigger / MacroRegistry)
//!       └─ Ctrl-C handler (→ SessionHandle::close)
//!  └─ InitiatorSession::run()
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use macrolink_core::config::{load_config, save_config};
use macrolink_core::storage::open_configured;
use macrolink_core::{default_macros, HotkeyTrigger, MacroRegistry, PeerConfig, TracingObserver};
use macrolink_initiator::infrastructure::console::run_console;
use macrolink_initiator::infrastructure::network::session::{InitiatorSession, SessionOutcome};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Fires hotkey macros at a macrolink responder.
#[derive(Debug, Parser)]
#[command(
    name = "macrolink-initiator",
    about = "Fires hotkey macros at a remote macrolink responder",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.  Defaults apply when absent.
    #[arg(long, default_value = "macrolink.toml", env = "MACROLINK_CONFIG")]
    config: PathBuf,

    /// Responder host; overrides `network.host`.
    #[arg(long, env = "MACROLINK_HOST")]
    host: Option<String>,

    /// Responder port; overrides `network.port`.
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

    info!("macrolink initiator starting");

    // ── Registry ──────────────────────────────────────────────────────────────
    let store = open_configured(&config.storage).context("failed to open macro store")?;
    let registry = Arc::new(MacroRegistry::open_boxed(store)?);
    let seeded = registry.seed_if_empty(default_macros())?;
    if seeded > 0 {
        info!(count = seeded, "installed default macros");
    }
    registry
        .hub()
        .subscribe(Arc::new(TracingObserver::new("initiator")));

    let trigger = Arc::new(HotkeyTrigger::new(config.trigger.window()));
    let (session, handle) =
        InitiatorSession::new(Arc::clone(&config), Arc::clone(&registry), Arc::clone(&trigger));

    // ── Console task ──────────────────────────────────────────────────────────
    {
        let registry = Arc::clone(&registry);
        let trigger = Arc::clone(&trigger);
        let handle = handle.clone();
        tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            let stdout = tokio::io::stdout();
            if let Err(e) = run_console(stdin, stdout, &registry, &trigger, &handle).await {
                error!(error = %e, "console failed");
            }
        });
    }

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                handle.close();
            }
        });
    }

    match session.run().await? {
        SessionOutcome::ExitSent => info!("responder told to exit"),
        SessionOutcome::ClosedByUser => info!("session closed"),
    }

    info!("macrolink initiator stopped");
    Ok(())
}
