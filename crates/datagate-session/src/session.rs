//! Session types: the data structures that represent one device connection.
//!
//! A "session" is the client's record of its standing with the device.
//! It tracks:
//! - WHAT state the connection is in (logged out, authenticating, logged in)
//! - WHICH credential authorizes requests (token plus scheme label)
//! - WHEN that credential must be renewed (the watermark)

use std::time::{SystemTime, UNIX_EPOCH};

use datagate_protocol::TokenClaims;

/// Safety margin, in seconds, subtracted from a token's real lifetime to
/// get the renewal watermark. Renewal happens this far *ahead* of the
/// actual expiry, so an operation dispatched just before the watermark
/// still reaches the device on a token it will accept.
pub const RENEWAL_SKEW_SECS: i64 = 30;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The current state of the connection to one device.
///
/// This is a state machine with three states:
///
/// ```text
///   LoggedOut ──(login)──→ Authenticating ──(grant ok)──→ LoggedIn
///       ↑                        │                           │
///       ├────(exchange failed)───┘                           │
///       └──────────────(logout / decode error)───────────────┘
/// ```
///
/// The token material lives *inside* the `LoggedIn` variant. That makes
/// the core invariant — credential, scheme label, and decoded claims are
/// all present or all absent — structural: there is no representable
/// state with a token but no claims, so no code path needs to check for
/// one.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No valid session. Every operation fails until `login()` is called.
    LoggedOut,

    /// An authentication exchange is in flight. Observable by concurrent
    /// callers while one login awaits the device.
    Authenticating,

    /// A session is live; the carried [`TokenSet`] authorizes operations.
    LoggedIn(TokenSet),
}

impl SessionState {
    /// Whether a live token set is available.
    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionState::LoggedIn(_))
    }

    /// Stable label for log events.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::LoggedOut => "logged-out",
            SessionState::Authenticating => "authenticating",
            SessionState::LoggedIn(_) => "logged-in",
        }
    }
}

// ---------------------------------------------------------------------------
// TokenSet
// ---------------------------------------------------------------------------

/// The credential material of one live session.
///
/// Cloned as an immutable snapshot for the duration of one operation:
/// an in-flight request keeps using the token it started with even if a
/// concurrent renewal swaps the session's material underneath it.
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// The opaque bearer credential.
    pub token: String,

    /// The scheme label accompanying the token (e.g. `"Bearer"`), used
    /// verbatim when constructing authorization headers.
    pub kind: String,

    /// Decoded issued-at/expiry view of the token.
    pub claims: TokenClaims,

    /// Unix timestamp (seconds) past which the token is treated as stale
    /// and renewed before use. See [`renewal_watermark`].
    pub renew_at: i64,
}

impl TokenSet {
    /// Whether the token has crossed its renewal watermark.
    ///
    /// Strictly greater: a token observed exactly at its watermark is
    /// still used as-is.
    pub fn is_stale(&self, now: i64) -> bool {
        now > self.renew_at
    }
}

/// Computes the renewal watermark for a set of claims:
/// `issued-at + lifetime − skew`, i.e. the token's own expiry pulled
/// forward by [`RENEWAL_SKEW_SECS`].
pub fn renewal_watermark(claims: &TokenClaims) -> i64 {
    claims.iat + (claims.exp - claims.iat) - RENEWAL_SKEW_SECS
}

// ---------------------------------------------------------------------------
// LoginReceipt
// ---------------------------------------------------------------------------

/// What a successful `login()` hands back: the grant fields augmented
/// with the decoded claims and the computed watermark, so callers can
/// observe the session's schedule without reaching into internals.
#[derive(Debug, Clone)]
pub struct LoginReceipt {
    /// The issued bearer credential.
    pub access_token: String,

    /// The scheme label accompanying the credential.
    pub token_type: String,

    /// Decoded claims of the issued token.
    pub claims: TokenClaims,

    /// Unix timestamp (seconds) at which the session will renew.
    pub renew_at: i64,
}

/// Current wall-clock time as unix seconds. The watermark is an absolute
/// instant derived from the token's own claims, so wall-clock (not
/// monotonic) time is the correct axis to compare against.
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
