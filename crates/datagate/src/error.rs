//! Unified error type for the Datagate client.

use datagate_protocol::{Problem, ProtocolError};
use datagate_session::SessionError;
use datagate_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `datagate` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DatagateError {
    /// A transport-level error (connection, TLS, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed grant or token).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A structured rejection from the device.
    #[error(transparent)]
    Device(#[from] Problem),

    /// A session-lifecycle error (usage, stalled renewal, or any of the
    /// above surfaced through a session operation).
    #[error(transparent)]
    Session(#[from] SessionError),
}
