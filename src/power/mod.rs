//! Power actions and the OS command dispatcher.
//!
//! Maps a validated action to the platform shutdown command and spawns it
//! fire-and-forget: no exit status is captured, nothing is retried. The 202
//! receipt has already been sent by the time the process spawns, so the
//! gateway never confirms the action actually happened (it may lack the
//! privilege to power off, for example).

use std::fmt;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;

/// Program invoked for every action.
pub const SHUTDOWN_PROGRAM: &str = "shutdown";

pub const DEFAULT_DELAY_SECS: u64 = 0;
pub const DEFAULT_FORCEFUL: bool = true;

/// The closed set of power actions. Bound statically at the routing layer,
/// never parsed from request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Reboot,
    Abort,
}

impl PowerAction {
    /// Route the action is served under.
    pub fn path(self) -> &'static str {
        match self {
            PowerAction::Shutdown => "/shutdown",
            PowerAction::Reboot => "/reboot",
            PowerAction::Abort => "/abort",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PowerAction::Shutdown => "shutdown",
            PowerAction::Reboot => "reboot",
            PowerAction::Abort => "abort",
        }
    }

    /// Inverse of [`PowerAction::path`]. Routes are bound statically, so an
    /// unknown path here is a programming error, not a client error.
    pub fn from_path(path: &str) -> Result<Self, DispatchError> {
        match path {
            "/shutdown" => Ok(PowerAction::Shutdown),
            "/reboot" => Ok(PowerAction::Reboot),
            "/abort" => Ok(PowerAction::Abort),
            other => Err(DispatchError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a scheduled shutdown/reboot. Abort ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionParams {
    /// Delay before the action runs, in seconds.
    pub delay_secs: u64,
    /// Do not wait for applications to close gracefully.
    pub forceful: bool,
}

impl Default for ActionParams {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_DELAY_SECS,
            forceful: DEFAULT_FORCEFUL,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no power action is bound to route {0:?}")]
    UnknownAction(String),
}

/// Argument vector for [`SHUTDOWN_PROGRAM`].
///
/// Keeps the `shutdown.exe` flag dialect of the original deployment: `-s`
/// halt, `-r` restart, `-f` force, `-t` delay in seconds, `-a` abort. The
/// delay unit would silently change under a `shutdown(8)` translation, so no
/// per-platform rewriting happens here.
pub fn shutdown_args(action: PowerAction, params: ActionParams) -> Vec<String> {
    match action {
        PowerAction::Abort => vec!["-a".to_string()],
        PowerAction::Shutdown | PowerAction::Reboot => {
            let mut args = vec![if action == PowerAction::Shutdown {
                "-s".to_string()
            } else {
                "-r".to_string()
            }];
            if params.forceful {
                args.push("-f".to_string());
            }
            args.push("-t".to_string());
            args.push(params.delay_secs.to_string());
            args
        }
    }
}

/// Executes power actions. `dispatch` must not block on the spawned command.
pub trait PowerExecutor: Send + Sync {
    fn dispatch(&self, action: PowerAction, params: ActionParams);
}

/// Spawns the real OS command.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPowerExecutor;

impl PowerExecutor for SystemPowerExecutor {
    fn dispatch(&self, action: PowerAction, params: ActionParams) {
        let args = shutdown_args(action, params);
        tracing::debug!(action = %action, ?args, "spawning power command");
        match Command::new(SHUTDOWN_PROGRAM)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            // The child is deliberately not awaited; the client already holds
            // its 202 receipt.
            Ok(_child) => {}
            Err(err) => {
                tracing::warn!(action = %action, error = %err, "failed to spawn power command");
            }
        }
    }
}
