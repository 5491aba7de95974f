//! Art Remote host — entry point.
//!
//! Accepts JSON-over-WebSocket sessions from handheld remote devices and
//! turns their commands into keyboard shortcuts for the creative application
//! in the foreground (Krita, Clip Studio Paint).
//!
//! # Usage
//!
//! ```text
//! artremote-host [OPTIONS]
//!
//! Options:
//!   --config <PATH>            Config file [default: platform config dir]
//!   --bind <ADDR>              Listener bind address (overrides config)
//!   --port <PORT>              Listener port (overrides config)
//!   --no-auth                  Trust sessions without authentication
//!   --regenerate-credentials   Replace token + PIN, print them, and exit
//! ```
//!
//! CLI arguments take precedence over the config file; `RUST_LOG` takes
//! precedence over the configured log level.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use artremote_core::Platform;
use artremote_host::application::dispatch::Dispatcher;
use artremote_host::application::sessions::SessionManager;
use artremote_host::infrastructure::adapters::{
    AdapterRegistry, ClipStudioSource, KritaSource, ShortcutSource,
};
use artremote_host::infrastructure::config;
use artremote_host::infrastructure::credentials::{ConnectionInfo, CredentialStore};
use artremote_host::infrastructure::detect::{NullAppDetector, RateLimitedDetector};
use artremote_host::infrastructure::emit::LogOnlyEmitter;
use artremote_host::infrastructure::server::{run_server, HostContext};
use artremote_host::infrastructure::store::StorePool;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Art Remote host.
///
/// Listens for handheld remote devices and drives the foreground creative
/// application with synthesized keyboard shortcuts.
#[derive(Debug, Parser)]
#[command(
    name = "artremote-host",
    about = "WebSocket host for handheld creative-app remote controls",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// Defaults to the platform config directory
    /// (e.g. `~/.config/artremote/config.toml` on Linux).
    #[arg(long, env = "ARTREMOTE_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to bind the WebSocket listener to.
    ///
    /// `0.0.0.0` accepts connections from the whole LAN, `127.0.0.1` only
    /// from this machine.
    #[arg(long, env = "ARTREMOTE_BIND")]
    bind: Option<String>,

    /// TCP port for the WebSocket listener.
    #[arg(long, env = "ARTREMOTE_PORT")]
    port: Option<u16>,

    /// Disable authentication: every connecting device is trusted.
    ///
    /// Only sensible on a private network.
    #[arg(long)]
    no_auth: bool,

    /// Generate a fresh pairing token and PIN, print them, and exit.
    /// Previously paired devices must re-pair.
    #[arg(long)]
    regenerate_credentials: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    // First run writes a default config.toml for the user to edit.
    let cfg = config::load_or_init_config(cli.config.as_deref()).context("failed to load config")?;

    // Structured logging; RUST_LOG overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.logging.level.clone())),
        )
        .init();

    info!("Art Remote host starting");

    let auth_enabled = cfg.server.auth_enabled && !cli.no_auth;
    if !auth_enabled {
        warn!("authentication disabled; every connecting device is trusted");
    }

    // ── Credentials ───────────────────────────────────────────────────────────
    //
    // A host that cannot persist its credentials must not come up half
    // paired, so credential errors are fatal.
    let credentials = if auth_enabled || cli.regenerate_credentials {
        let dir = config::config_dir().context("cannot locate config directory")?;
        let mut store =
            CredentialStore::initialize(&dir).context("failed to initialize credentials")?;
        if cli.regenerate_credentials {
            let fresh = store.regenerate().context("failed to regenerate credentials")?;
            print_pairing_info(&fresh);
            return Ok(());
        }
        Some(Arc::new(store))
    } else {
        None
    };

    if let Some(store) = &credentials {
        print_pairing_info(&store.connection_info());
    }

    // ── Wiring ────────────────────────────────────────────────────────────────
    let platform = Platform::current();
    let pool = Arc::new(StorePool::new());

    let mut adapters = AdapterRegistry::new();
    adapters.register(Arc::new(ClipStudioSource::new(
        Arc::clone(&pool),
        cfg.clip_studio.base_dir.clone(),
        cfg.clip_studio.slot_offset,
        // The merged CSP table includes the fast-churning tool store, so the
        // whole entry lives on the shorter TTL.
        cfg.cache.tool_ttl(),
    )) as Arc<dyn ShortcutSource>);
    adapters.register(Arc::new(KritaSource::new(
        Arc::clone(&pool),
        cfg.krita.config_path.clone(),
        cfg.krita.resource_db.clone(),
        cfg.cache.menu_ttl(),
    )) as Arc<dyn ShortcutSource>);

    let detector = Arc::new(RateLimitedDetector::new(
        Arc::new(NullAppDetector::new()),
        cfg.dispatch.detect_interval(),
    ));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(adapters),
        detector,
        Arc::new(LogOnlyEmitter),
        platform,
        cfg.dispatch.step_delay(),
        cfg.dispatch.slow_warn(),
    ));

    let sessions = Arc::new(SessionManager::new(credentials, cfg.server.auth_timeout()));

    let bind = cli.bind.unwrap_or_else(|| cfg.server.bind_address.clone());
    let port = cli.port.unwrap_or(cfg.server.port);
    let bind_addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {bind}:{port}"))?;

    // ── Shutdown handling ─────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_signal = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received; shutting down");
            running_signal.store(false, Ordering::Relaxed);
        }
    });

    // ── Serve ─────────────────────────────────────────────────────────────────
    let ctx = Arc::new(HostContext {
        sessions,
        dispatcher,
    });
    run_server(bind_addr, ctx, running).await?;

    info!("Art Remote host stopped");
    Ok(())
}

/// Prints what the user needs to pair a device.  Goes to stdout rather than
/// the log: it is the product of the command, not diagnostics.
fn print_pairing_info(info: &ConnectionInfo) {
    println!("Pairing PIN:   {}", info.pin);
    println!("Access token:  {}", info.token);
    println!("QR payload:    {}", info.qr_data);
}
