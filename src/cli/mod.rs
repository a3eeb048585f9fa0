//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `start` (default) -- run the gateway server
//! - `trigger` -- send a power request to a running gateway
//! - `config show|path` -- inspect the resolved configuration
//! - `version` -- print build/version info

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::power::PowerAction;

/// offswitch power-control gateway.
#[derive(Parser, Debug)]
#[command(
    name = "offswitch",
    version = env!("CARGO_PKG_VERSION"),
    about = "offswitch, a remote power-control gateway"
)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Start,

    /// Send a power request to a running gateway.
    Trigger(TriggerArgs),

    /// Read the resolved configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Action to request.
    #[arg(value_enum)]
    pub action: TriggerAction,

    /// Host of the running gateway.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port of the running gateway (default: from config).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Token to present.
    #[arg(long, conflicts_with = "token_file")]
    pub token: Option<String>,

    /// Read the token to present from this file (default: the configured
    /// token file).
    #[arg(long, value_name = "FILE")]
    pub token_file: Option<PathBuf>,

    /// Seconds before the action runs (ignored by abort).
    #[arg(short, long, default_value_t = 0)]
    pub timeout: u64,

    /// Do not wait for applications to close gracefully (ignored by abort).
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, value_name = "BOOL")]
    pub forceful: bool,

    /// Client-side request deadline in milliseconds.
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    pub request_timeout_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully resolved configuration as JSON.
    Show,

    /// Print the resolved configuration file path.
    Path,
}

/// Power action names as accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerAction {
    Shutdown,
    Reboot,
    Abort,
}

impl From<TriggerAction> for PowerAction {
    fn from(action: TriggerAction) -> Self {
        match action {
            TriggerAction::Shutdown => PowerAction::Shutdown,
            TriggerAction::Reboot => PowerAction::Reboot,
            TriggerAction::Abort => PowerAction::Abort,
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

use std::sync::Arc;
use std::time::Duration;

use crate::client::{self, TriggerRequest};
use crate::config::{self, Settings};
use crate::credentials::FileCredentials;
use crate::power::{ActionParams, SystemPowerExecutor};
use crate::server::{self, AppState};

/// Run the `start` subcommand: bring up the gateway.
pub async fn handle_start(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = FileCredentials::new(settings.token_file.clone());
    // Fail fast on an unreadable token file; requests still re-read it fresh.
    credentials.verify_readable().await?;

    let state = AppState {
        credentials: Arc::new(credentials),
        executor: Arc::new(SystemPowerExecutor),
    };

    let addr = settings.socket_addr()?;
    server::serve(addr, state).await?;
    Ok(())
}

/// Run the `trigger` subcommand: send the request and report the verdict.
pub async fn handle_trigger(
    settings: &Settings,
    args: TriggerArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    // Token precedence: --token, then --token-file, then the configured file.
    // File contents are presented byte for byte, matching the gateway's read.
    let auth_token = match (args.token, args.token_file) {
        (Some(token), _) => token,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => std::fs::read_to_string(&settings.token_file)?,
    };

    let request = TriggerRequest {
        host: args.host,
        port: args.port.unwrap_or(settings.port),
        action: args.action.into(),
        auth_token,
        params: ActionParams {
            delay_secs: args.timeout,
            forceful: args.forceful,
        },
        request_timeout: Duration::from_millis(args.request_timeout_ms),
    };

    match client::send_trigger(&request).await {
        Ok(outcome) => {
            println!("{}", outcome);
            if !outcome.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Check the connection, and that the gateway is running: offswitch start");
            std::process::exit(1);
        }
    }
}

/// Run the `config show` subcommand.
pub fn handle_config_show(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path(explicit: Option<&Path>) {
    println!("{}", config::config_path(explicit).display());
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("offswitch {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("OFFSWITCH_BUILD_DATE"));
    println!("  Git commit: {}", env!("OFFSWITCH_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
