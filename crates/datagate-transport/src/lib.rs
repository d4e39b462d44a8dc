//! Transport abstraction layer for Datagate.
//!
//! Provides the [`DeviceTransport`] trait that abstracts the three wire
//! exchanges a session ever needs — authenticating, revoking a token, and
//! executing a data operation — plus the HTTPS implementation used
//! against real devices.
//!
//! The session layer is written entirely against the trait: production
//! code plugs in [`HttpTransport`], tests plug in scripted mocks, and the
//! lifecycle logic cannot tell the difference.
//!
//! # Feature Flags
//!
//! - `http` (default) — HTTPS transport via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::{CallError, TransportError};
#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportConfig};

use std::time::Duration;

use datagate_protocol::{Operation, TokenGrant};
use serde_json::Value;

/// The wire exchanges a session manager delegates to.
///
/// # Trait bounds
///
/// - `Send + Sync` → a transport is shared across the async tasks that
///   run concurrent operations against one device.
/// - `'static` → it owns its resources (client handles, configuration)
///   rather than borrowing temporary data.
///
/// Every method takes an optional per-call `timeout`; `None` means "use
/// whatever default the transport itself was configured with".
pub trait DeviceTransport: Send + Sync + 'static {
    /// Exchanges username/password for a token grant.
    ///
    /// # Errors
    /// [`CallError::Transport`] when the wire fails,
    /// [`CallError::Problem`] when the device rejects the credentials
    /// with a structured error body.
    async fn authenticate(
        &self,
        host: &str,
        username: &str,
        password: &str,
        timeout: Option<Duration>,
    ) -> Result<TokenGrant, CallError>;

    /// Revokes a previously issued token on the device.
    async fn revoke(
        &self,
        host: &str,
        kind: &str,
        token: &str,
        timeout: Option<Duration>,
    ) -> Result<(), CallError>;

    /// Executes one data operation against a node path, authorized with
    /// the given scheme label and credential.
    ///
    /// The result body is passed through as raw JSON — the transport
    /// imposes no schema on what the device stores.
    async fn execute(
        &self,
        op: Operation,
        host: &str,
        kind: &str,
        token: &str,
        path: &str,
        payload: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, CallError>;
}
