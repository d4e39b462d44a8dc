//! Error types for the session layer.

use datagate_protocol::{Problem, ProtocolError};
use datagate_transport::{CallError, TransportError};

/// Errors surfaced by session operations, tagged by taxonomy kind so
/// callers pattern-match instead of inspecting status fields informally.
///
/// The retry policy hangs off these tags: only `Device` problems that are
/// authorization failures ever trigger auto-reconnect; everything else is
/// terminal for the call that hit it.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The wire failed: connection, TLS, timeout. Never triggers
    /// reconnect logic.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The device answered with a structured problem body. An
    /// authorization-class status (401) is the one reconnect trigger.
    #[error(transparent)]
    Device(#[from] Problem),

    /// Locally detected protocol violation: grant missing fields, or the
    /// token would not decode. Always forces the session back to
    /// logged-out.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An operation was invoked without a live session. The caller must
    /// log in first; this never triggers any retry.
    #[error("not authenticated: call login() first")]
    NotLoggedIn,

    /// A freshly issued token was already past its renewal watermark, so
    /// renewing again could not make progress. Points at severe clock
    /// skew between client and device, or a token lifetime shorter than
    /// the renewal margin.
    #[error("freshly issued token is already past its renewal watermark")]
    RenewalStalled,
}

impl From<CallError> for SessionError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Transport(e) => SessionError::Transport(e),
            CallError::Problem(p) => SessionError::Device(p),
        }
    }
}
