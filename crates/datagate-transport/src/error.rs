//! Error types for the transport layer.

use datagate_protocol::Problem;

/// Errors raised by the wire itself.
///
/// These are deliberately distinct from [`Problem`]: a transport error
/// means the exchange never completed (or its body was unreadable), while
/// a problem means the device answered and said no. The session layer's
/// reconnect logic only ever reacts to problems, never to these.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client failed: connection refused, TLS handshake,
    /// request timeout. Gated with the `http` feature, like the
    /// implementation that produces it.
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured endpoint address could not be turned into a
    /// request URL.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),

    /// A success response carried a body that was not the expected JSON.
    #[error("unexpected response body: {0}")]
    Body(#[source] serde_json::Error),

    /// Connection-level failure from a transport not built on the HTTP
    /// client (in-memory doubles, alternative wire implementations).
    #[error("connection failed: {0}")]
    Connection(String),
}

/// The outcome taxonomy of one transport call.
///
/// Every [`DeviceTransport`](crate::DeviceTransport) method fails with
/// this type, so callers can pattern-match the two failure classes
/// instead of inspecting status fields informally.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The wire failed before the device could answer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The device answered with a structured problem body.
    #[error(transparent)]
    Problem(#[from] Problem),
}
