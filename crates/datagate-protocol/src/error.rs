//! Error types for the protocol layer.
//!
//! Each crate in Datagate defines its own error enum. This keeps errors
//! specific and meaningful — a `ProtocolError` always means "the bytes
//! were there but their shape was wrong", never a networking or session
//! lifecycle failure.

/// Locally detected violations of the expected wire shapes.
///
/// Every variant here forces the owning session back to logged-out: a
/// grant or token that cannot be trusted must not be kept.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The authentication exchange succeeded at the HTTP level but the
    /// grant body was missing an expected field.
    #[error("token grant missing expected field `{0}`")]
    MissingGrantField(&'static str),

    /// The credential does not have the `header.payload.signature`
    /// three-segment shape.
    #[error("malformed token: expected 3 segments, found {0}")]
    TokenSegments(usize),

    /// The token's payload segment is not valid base64url.
    #[error("malformed token payload: {0}")]
    TokenEncoding(#[from] base64::DecodeError),

    /// The payload segment decoded, but its claims are not the expected
    /// JSON shape (malformed JSON, or missing `iat`/`exp`).
    #[error("invalid token claims: {0}")]
    TokenClaims(#[from] serde_json::Error),
}
