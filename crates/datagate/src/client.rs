//! `Client` construction: wiring the session manager over the HTTPS
//! transport.

use std::time::Duration;

use datagate_session::SessionManager;
use datagate_transport::{HttpTransport, HttpTransportConfig};

use crate::DatagateError;

/// A session-managed client for one device endpoint: the session manager
/// specialized to the HTTPS transport.
///
/// All the lifecycle and data-operation methods live on
/// [`SessionManager`] — `login`, `logout`, `read`, `write`, `create`,
/// `delete`, `browse`, `read_metadata`.
pub type Client = SessionManager<HttpTransport>;

/// Builder for configuring and constructing a [`Client`].
///
/// Host and credentials are required up front (they are immutable for the
/// client's lifetime); everything else has a default.
///
/// # Example
///
/// ```rust,no_run
/// use datagate::prelude::*;
/// use std::time::Duration;
///
/// # fn demo() -> Result<(), DatagateError> {
/// let client = ClientBuilder::new("192.168.1.1", "operator", "secret")
///     .accept_invalid_certs(true)
///     .request_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    host: String,
    username: String,
    password: String,
    accept_invalid_certs: bool,
    request_timeout: Option<Duration>,
    auto_reconnect: bool,
}

impl ClientBuilder {
    /// Creates a builder for the given device host and credentials.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            accept_invalid_certs: false,
            request_timeout: None,
            auto_reconnect: true,
        }
    }

    /// Accept self-signed device certificates. Off by default.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Deadline applied to every exchange with the device. Unset by
    /// default (the transport's own default applies).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Whether a 401 rejection triggers one transparent re-login and
    /// retry. On by default.
    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Builds the client. No I/O happens until `login()` is called.
    pub fn build(self) -> Result<Client, DatagateError> {
        let transport = HttpTransport::with_config(HttpTransportConfig {
            accept_invalid_certs: self.accept_invalid_certs,
            default_timeout: None,
        })?;

        let client = SessionManager::new(
            transport,
            self.host,
            self.username,
            self.password,
        );
        client.set_auto_reconnect(self.auto_reconnect);
        client.set_request_timeout(self.request_timeout);
        Ok(client)
    }
}
