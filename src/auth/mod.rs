//! Request authentication.
//!
//! Every power request carries an `auth_token` form field that must match the
//! stored shared secret exactly. Three outcomes, and only three: missing token
//! (401), mismatch (403), accepted (202 at the HTTP layer). Failed attempts
//! are independent: no lockout, no backoff.

use axum::http::StatusCode;

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `auth_token` field was presented.
    TokenMissing,
    /// A token was presented but does not match the stored secret.
    TokenMismatch,
}

impl AuthFailure {
    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::TokenMissing => "unauthorized: token missing",
            AuthFailure::TokenMismatch => "forbidden: token mismatch",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            AuthFailure::TokenMissing => StatusCode::UNAUTHORIZED,
            AuthFailure::TokenMismatch => StatusCode::FORBIDDEN,
        }
    }
}

/// Timing-safe string equality.
pub fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut out = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        out |= x ^ y;
    }
    out == 0
}

/// Check a presented token against the stored secret.
///
/// Exact byte equality over the full strings: case-sensitive, no trimming.
/// A missing token never reaches this function; the caller rejects it before
/// the credential store is consulted.
pub fn verify_token(stored: &str, presented: &str) -> Result<(), AuthFailure> {
    if timing_safe_eq(stored, presented) {
        Ok(())
    } else {
        Err(AuthFailure::TokenMismatch)
    }
}
