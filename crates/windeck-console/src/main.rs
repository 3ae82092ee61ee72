//! windeck — operator console entry point.
//!
//! Connects to a remote Electron application's window-management RPC API and
//! drives it from the terminal: list windows, watch live snapshots, forward
//! input, adjust bounds.
//!
//! # Usage
//!
//! ```text
//! windeck [OPTIONS] <COMMAND>
//!
//! Commands:
//!   login <TOKEN>     Store a token and verify it against the server
//!   logout            Drop the stored token
//!   windows           List remote windows
//!   dashboard         Interactive console session
//!   watch <WIN_ID>    Watch-only snapshot loop for one window (no login)
//!   ping              Measure server round-trip time
//!
//! Options:
//!   --base-url <URL>      RPC server base URL [default: http://127.0.0.1:8101]
//!   --token <TOKEN>       Bootstrap the token store before the command runs
//!   --config-dir <DIR>    Override the settings/token directory
//!   --http-timeout <SECS> Per-request HTTP timeout [default: 15]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable              | Default                  | Description               |
//! |-----------------------|--------------------------|---------------------------|
//! | `WINDECK_BASE_URL`    | `http://127.0.0.1:8101`  | RPC server base URL       |
//! | `WINDECK_TOKEN`       | —                        | Token store bootstrap     |
//! | `WINDECK_CONFIG_DIR`  | platform config dir      | Settings/token directory  |
//! | `WINDECK_HTTP_TIMEOUT`| `15`                     | HTTP timeout (seconds)    |
//!
//! # Entry paths
//!
//! `--token` mirrors the panel's `?token=` URL parameter: it seeds the token
//! store before anything runs.  `watch` mirrors the `?win_id=` parameter: it
//! skips login entirely and reads capture settings from the persisted
//! settings store (defaults: interval 1000 ms, quality 80, scale 0.5).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use windeck_console::application::api::WindowApi;
use windeck_console::application::capture::CaptureLoop;
use windeck_console::application::session::ConsoleSession;
use windeck_console::domain::ConsoleConfig;
use windeck_console::infrastructure::console::run_dashboard;
use windeck_console::infrastructure::{
    FrameSurface, RpcClient, SettingsStore, TokenStore,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Operator console for an Electron window-management RPC API.
#[derive(Debug, Parser)]
#[command(
    name = "windeck",
    about = "Remote window monitoring and control over the Electron RPC API",
    version
)]
struct Cli {
    /// Base URL of the remote RPC server.
    #[arg(long, default_value = "http://127.0.0.1:8101", env = "WINDECK_BASE_URL")]
    base_url: String,

    /// Seed the token store before running the command.
    ///
    /// Equivalent to entering the panel with a `?token=` URL parameter: the
    /// token is persisted and every authenticated request uses it.
    #[arg(long, env = "WINDECK_TOKEN")]
    token: Option<String>,

    /// Directory for persisted settings and the token file.
    ///
    /// Defaults to the platform config directory.
    #[arg(long, env = "WINDECK_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 15, env = "WINDECK_HTTP_TIMEOUT")]
    http_timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a token and verify it against the server.
    Login { token: String },
    /// Drop the stored token.
    Logout,
    /// List remote windows.
    Windows,
    /// Interactive console session.
    Dashboard,
    /// Watch-only snapshot loop for one window; bypasses login.
    Watch { win_id: i64 },
    /// Measure server round-trip time.
    Ping,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ConsoleConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--base-url` is not a valid URL.
    fn console_config(&self) -> anyhow::Result<ConsoleConfig> {
        let base_url: Url = self
            .base_url
            .parse()
            .with_context(|| format!("invalid base URL: '{}'", self.base_url))?;

        Ok(ConsoleConfig {
            base_url,
            request_timeout: Duration::from_secs(self.http_timeout),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls verbosity; absent or invalid falls back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.console_config()?;

    let (settings_store, tokens) = match &cli.config_dir {
        Some(dir) => (SettingsStore::open(dir), TokenStore::open(dir)?),
        None => (
            SettingsStore::at_default_location()?,
            TokenStore::at_default_location()?,
        ),
    };
    let tokens = Arc::new(tokens);

    // The `?token=` entry path: seed the store before the command runs.
    if let Some(token) = &cli.token {
        tokens.set(token)?;
    }

    let client = Arc::new(RpcClient::new(&config, Arc::clone(&tokens))?);

    info!("windeck starting — server={}", config.base_url);

    match cli.command {
        Command::Login { token } => {
            let mut session = build_session(&client, &tokens, settings_store)?;
            let count = session.login(&token).await?;
            println!("logged in — {count} window(s) visible");
        }

        Command::Logout => {
            tokens.clear()?;
            println!("logged out");
        }

        Command::Windows => {
            let windows = client.get_windows().await?;
            if windows.is_empty() {
                println!("no active windows");
            }
            for win in windows {
                let title = if win.title.is_empty() { "(untitled)" } else { &win.title };
                println!(
                    "#{:<4} {:<40} {}x{} @ {},{}  {}",
                    win.id,
                    title,
                    win.bounds.width,
                    win.bounds.height,
                    win.bounds.x,
                    win.bounds.y,
                    win.url
                );
            }
        }

        Command::Dashboard => {
            let mut session = build_session(&client, &tokens, settings_store)?;
            // Best effort: an unreachable server still gets a usable prompt.
            if let Err(e) = session.resume().await {
                warn!("could not restore previous session state: {e}");
            }
            run_dashboard(&mut session).await?;
        }

        Command::Watch { win_id } => {
            run_watch(client, &settings_store, win_id).await?;
        }

        Command::Ping => {
            let latency = client.ping().await?;
            println!("{} ms", latency.as_millis());
        }
    }

    Ok(())
}

fn build_session(
    client: &Arc<RpcClient>,
    tokens: &Arc<TokenStore>,
    settings_store: SettingsStore,
) -> anyhow::Result<ConsoleSession<RpcClient>> {
    let surface = Arc::new(FrameSurface::in_temp_dir()?);
    Ok(ConsoleSession::new(
        Arc::clone(client),
        Arc::clone(tokens),
        settings_store,
        surface,
    )?)
}

/// Watch-only mode: the poll loop and nothing else.
///
/// Settings come from the persisted store (documented defaults when unset);
/// the token, if any, comes from the token store.  Runs until Ctrl+C.
async fn run_watch(
    client: Arc<RpcClient>,
    settings_store: &SettingsStore,
    win_id: i64,
) -> anyhow::Result<()> {
    let settings = settings_store.load()?;
    let surface = Arc::new(FrameSurface::in_temp_dir()?);
    let mut capture = CaptureLoop::new();

    println!(
        "watching window #{win_id} — every {} ms, quality {}, scale {}",
        settings.capture.interval_ms, settings.capture.quality, settings.capture.scale
    );
    println!("latest frame spools to {}", surface.spool_dir().display());
    println!("press Ctrl+C to stop");

    capture.start(client, Arc::clone(&surface), win_id, settings.capture);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("stopping watch of window {win_id}");

    capture.stop();
    surface.clear();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_base_url() {
        let cli = Cli::parse_from(["windeck", "windows"]);
        assert_eq!(cli.base_url, "http://127.0.0.1:8101");
    }

    #[test]
    fn test_cli_default_http_timeout() {
        let cli = Cli::parse_from(["windeck", "windows"]);
        assert_eq!(cli.http_timeout, 15);
    }

    #[test]
    fn test_cli_base_url_override() {
        let cli = Cli::parse_from(["windeck", "--base-url", "https://panel.example.net", "ping"]);
        assert_eq!(cli.base_url, "https://panel.example.net");
    }

    #[test]
    fn test_cli_token_bootstrap_flag() {
        let cli = Cli::parse_from(["windeck", "--token", "abc", "watch", "3"]);
        assert_eq!(cli.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_cli_watch_takes_a_window_id() {
        let cli = Cli::parse_from(["windeck", "watch", "7"]);
        assert!(matches!(cli.command, Command::Watch { win_id: 7 }));
    }

    #[test]
    fn test_cli_login_takes_a_token() {
        let cli = Cli::parse_from(["windeck", "login", "secret"]);
        match cli.command {
            Command::Login { token } => assert_eq!(token, "secret"),
            other => panic!("expected Login, got {other:?}"),
        }
    }

    #[test]
    fn test_console_config_default_parses() {
        let cli = Cli::parse_from(["windeck", "ping"]);
        let config = cli.console_config().unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8101/");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_console_config_invalid_base_url_returns_error() {
        let cli = Cli::parse_from(["windeck", "--base-url", "not a url", "ping"]);
        assert!(cli.console_config().is_err());
    }

    #[test]
    fn test_console_config_custom_timeout() {
        let cli = Cli::parse_from(["windeck", "--http-timeout", "30", "ping"]);
        let config = cli.console_config().unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
