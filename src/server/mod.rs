//! HTTP surface: routing, the authenticator wrapper, and request handlers.
//!
//! Control flow per request: route, then authenticator, then handler, then
//! dispatcher. The authenticator short-circuits with 401/403; on a match the
//! 202 receipt is produced immediately and the dispatch runs on a spawned
//! task, so the response never waits on the power command. A 202 means
//! "accepted and dispatch attempted", not "the machine powered off".

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{MatchedPath, RawQuery, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use thiserror::Error;
use url::form_urlencoded;

use crate::auth::{self, AuthFailure};
use crate::credentials::CredentialProvider;
use crate::power::{ActionParams, PowerAction, PowerExecutor, DEFAULT_DELAY_SECS, DEFAULT_FORCEFUL};

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialProvider>,
    pub executor: Arc<dyn PowerExecutor>,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the power router. Every route is POST with a form-urlencoded body.
pub fn power_router(state: AppState) -> Router {
    Router::new()
        .route(PowerAction::Shutdown.path(), post(action_handler))
        .route(PowerAction::Reboot.path(), post(action_handler))
        .route(PowerAction::Abort.path(), post(abort_handler))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), ServerError> {
    let app = power_router(state);

    tracing::info!(address = %addr, "listening for power requests");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    axum::serve(listener, app).await.map_err(ServerError::Serve)
}

/// Fields a power request may carry, in body or query form. Unknown fields
/// are ignored; on duplicates the last occurrence wins.
#[derive(Debug, Default)]
struct RequestFields {
    auth_token: Option<String>,
    timeout: Option<String>,
    forceful: Option<String>,
}

fn parse_fields(input: &[u8]) -> RequestFields {
    let mut fields = RequestFields::default();
    for (key, value) in form_urlencoded::parse(input) {
        match key.as_ref() {
            "auth_token" => fields.auth_token = Some(value.into_owned()),
            "timeout" => fields.timeout = Some(value.into_owned()),
            "forceful" => fields.forceful = Some(value.into_owned()),
            _ => {}
        }
    }
    fields
}

/// Resolve action parameters: body field, else query parameter, else default.
///
/// `timeout` skips values that do not parse as a non-negative integer.
/// `forceful` skips empty strings and is true only for the exact string
/// `"true"`, so `forceful=maybe` resolves to false.
fn resolve_params(body: &RequestFields, query: &RequestFields) -> ActionParams {
    let delay_secs = [body.timeout.as_deref(), query.timeout.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|raw| raw.parse::<u64>().ok())
        .unwrap_or(DEFAULT_DELAY_SECS);

    let forceful = [body.forceful.as_deref(), query.forceful.as_deref()]
        .into_iter()
        .flatten()
        .find(|raw| !raw.is_empty())
        .map(|raw| raw == "true")
        .unwrap_or(DEFAULT_FORCEFUL);

    ActionParams {
        delay_secs,
        forceful,
    }
}

/// Handler for `/shutdown` and `/reboot`. The action comes from the matched
/// route, never from request content.
async fn action_handler(
    State(state): State<AppState>,
    matched: MatchedPath,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> StatusCode {
    let action = match PowerAction::from_path(matched.as_str()) {
        Ok(action) => action,
        Err(err) => {
            tracing::error!(error = %err, "dispatch requested for an unroutable action");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let body_fields = parse_fields(&body);
    let query_fields = parse_fields(query.as_deref().unwrap_or("").as_bytes());
    let params = resolve_params(&body_fields, &query_fields);

    authenticate_then_dispatch(&state, body_fields.auth_token.as_deref(), action, params).await
}

/// Handler for `/abort`: takes no parameters, always issues the abort command
/// even when nothing is pending.
async fn abort_handler(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let body_fields = parse_fields(&body);

    authenticate_then_dispatch(
        &state,
        body_fields.auth_token.as_deref(),
        PowerAction::Abort,
        ActionParams::default(),
    )
    .await
}

/// The authenticator wrapper: resolves the three-way auth outcome and, on a
/// match, emits the 202 receipt while the dispatch runs on its own task.
async fn authenticate_then_dispatch(
    state: &AppState,
    presented: Option<&str>,
    action: PowerAction,
    params: ActionParams,
) -> StatusCode {
    // A missing token is rejected before the credential store is consulted.
    let Some(presented) = presented else {
        tracing::warn!(action = %action, "{}", AuthFailure::TokenMissing.message());
        return AuthFailure::TokenMissing.status();
    };

    let stored = match state.credentials.read_token().await {
        Ok(token) => token,
        Err(err) => {
            tracing::error!(action = %action, error = %err, "credential store unavailable");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    if let Err(failure) = auth::verify_token(&stored, presented) {
        tracing::warn!(action = %action, "{}", failure.message());
        return failure.status();
    }

    tracing::info!(
        action = %action,
        delay_secs = params.delay_secs,
        forceful = params.forceful,
        "power action accepted"
    );

    let executor = Arc::clone(&state.executor);
    tokio::spawn(async move { executor.dispatch(action, params) });

    StatusCode::ACCEPTED
}
