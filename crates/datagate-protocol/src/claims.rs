//! Decoding a bearer token's payload into structured claims.
//!
//! The session layer never validates a token cryptographically — the
//! device did the issuing and will do the rejecting. All the client needs
//! from the token is its issued-at and expiry claims, to schedule renewal
//! *ahead* of the device rejecting it. So this module is a pure
//! deserialization utility: split the compact form, base64url-decode the
//! middle segment, parse the JSON inside.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// The decoded claims of a bearer token.
///
/// `iat` and `exp` are required — without them no renewal watermark can
/// be computed, and a token the client cannot schedule around is useless.
/// Everything else the device put in the payload is preserved in `extra`
/// for observability (`#[serde(flatten)]` collects all unknown fields
/// into the map instead of discarding them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Unix timestamp (seconds) at which the token was issued.
    pub iat: i64,

    /// Unix timestamp (seconds) at which the token expires.
    pub exp: i64,

    /// Any further claims the device included (user name, scopes, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decodes the payload segment of a compact-form bearer token.
///
/// The compact form is `header.payload.signature`; only the payload is
/// inspected. The signature is deliberately NOT verified here — see the
/// module docs.
///
/// # Errors
///
/// - [`ProtocolError::TokenSegments`] — not exactly three segments
/// - [`ProtocolError::TokenEncoding`] — payload is not valid base64url
/// - [`ProtocolError::TokenClaims`] — payload is not valid claims JSON,
///   or `iat`/`exp` are absent
pub fn decode_claims(token: &str) -> Result<TokenClaims, ProtocolError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ProtocolError::TokenSegments(segments.len()));
    }
    let payload = URL_SAFE_NO_PAD.decode(segments[1])?;
    Ok(serde_json::from_slice(&payload)?)
}
