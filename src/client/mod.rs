//! Trigger client: issues a power request the way the mobile client does.
//!
//! Outcome mapping follows the protocol contract: 202 is the only success,
//! 401/403 are credential problems, anything else is outside the protocol,
//! and a transport failure is a connectivity problem reported distinctly from
//! every auth outcome.

use std::time::Duration;

use thiserror::Error;

use crate::power::{ActionParams, PowerAction};

/// The client's own request deadline. The gateway answers before dispatching,
/// so a healthy round trip is fast; a slow one means the network, not the
/// power command.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub host: String,
    pub port: u16,
    pub action: PowerAction,
    pub auth_token: String,
    pub params: ActionParams,
    pub request_timeout: Duration,
}

/// Server verdicts, as the user should understand them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// 202: dispatch attempted. Not a confirmation the machine acted on it.
    Accepted,
    /// 401: the request carried no usable token.
    TokenMissing,
    /// 403: the token was rejected.
    TokenRejected,
    /// Any other status is outside the protocol.
    Unexpected(u16),
}

impl TriggerOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            202 => TriggerOutcome::Accepted,
            401 => TriggerOutcome::TokenMissing,
            403 => TriggerOutcome::TokenRejected,
            other => TriggerOutcome::Unexpected(other),
        }
    }

    pub fn is_success(self) -> bool {
        self == TriggerOutcome::Accepted
    }
}

impl std::fmt::Display for TriggerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerOutcome::Accepted => {
                write!(f, "accepted: the gateway will run the power command")
            }
            TriggerOutcome::TokenMissing => {
                write!(f, "rejected: no token was presented (HTTP 401)")
            }
            TriggerOutcome::TokenRejected => {
                write!(f, "rejected: the token does not match (HTTP 403)")
            }
            TriggerOutcome::Unexpected(code) => {
                write!(f, "unexpected response from the gateway (HTTP {code})")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("could not reach {host}:{port}: {source}")]
    Connectivity {
        host: String,
        port: u16,
        #[source]
        source: reqwest::Error,
    },
}

/// Form fields for the request. Abort carries only the token; the other
/// actions also send their parameters.
fn form_fields(request: &TriggerRequest) -> Vec<(&'static str, String)> {
    let mut fields = vec![("auth_token", request.auth_token.clone())];
    if request.action != PowerAction::Abort {
        fields.push(("timeout", request.params.delay_secs.to_string()));
        fields.push(("forceful", request.params.forceful.to_string()));
    }
    fields
}

/// POST the power request and map the response onto a [`TriggerOutcome`].
pub async fn send_trigger(request: &TriggerRequest) -> Result<TriggerOutcome, TriggerError> {
    let connectivity = |source: reqwest::Error| TriggerError::Connectivity {
        host: request.host.clone(),
        port: request.port,
        source,
    };

    let url = format!(
        "http://{}:{}{}",
        request.host,
        request.port,
        request.action.path()
    );

    let client = reqwest::Client::builder()
        .timeout(request.request_timeout)
        .build()
        .map_err(connectivity)?;

    let response = client
        .post(&url)
        .form(&form_fields(request))
        .send()
        .await
        .map_err(connectivity)?;

    Ok(TriggerOutcome::from_status(response.status().as_u16()))
}
