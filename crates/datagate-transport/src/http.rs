//! HTTPS transport implementation using `reqwest`.
//!
//! Wire conventions: the token endpoint lives under the identity manager,
//! data nodes live under the automation tree, read sub-variants are
//! selected with a `type` query parameter, and a read argument travels
//! URL-encoded in a `data` query parameter. Non-success responses carry a
//! JSON problem body; when they don't, a problem is synthesized from the
//! status line.

use std::time::Duration;

use datagate_protocol::{Operation, Problem, ReadKind, TokenGrant};
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::{CallError, DeviceTransport, TransportError};

/// Path of the token endpoint on the device.
const TOKEN_ENDPOINT: &str = "/identity-manager/api/v2/auth/token";

/// Root of the data-layer node tree.
const NODES_ENDPOINT: &str = "/automation/api/v2/nodes";

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Accept certificates that fail verification. Industrial devices
    /// commonly ship self-signed certificates; leave this off unless the
    /// device's certificate genuinely cannot be trusted through a CA.
    ///
    /// Default: `false`.
    pub accept_invalid_certs: bool,

    /// Deadline applied to calls that don't carry their own timeout.
    /// `None` leaves the client without an overall deadline.
    ///
    /// Default: `None`.
    pub default_timeout: Option<Duration>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            default_timeout: None,
        }
    }
}

/// A [`DeviceTransport`] that speaks HTTPS to the device endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Creates a transport with the given configuration.
    pub fn with_config(
        config: HttpTransportConfig,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = config.default_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Http)?;
        Ok(Self { client })
    }

    /// Resolves a success body to JSON, or a non-success response to the
    /// problem the device described.
    async fn settle(resp: Response) -> Result<Value, CallError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::problem_from(status, resp).await.into());
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let bytes = resp.bytes().await.map_err(TransportError::Http)?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Body(e).into())
    }

    /// Extracts the problem body from a non-success response. A body
    /// that isn't a parseable problem gets one synthesized from the
    /// status line; a parseable body that omitted `status` gets it
    /// backfilled.
    async fn problem_from(status: StatusCode, resp: Response) -> Problem {
        let reason = status.canonical_reason().unwrap_or("unknown status");
        let bytes = resp.bytes().await.unwrap_or_default();
        match serde_json::from_slice::<Problem>(&bytes) {
            Ok(mut problem) => {
                if problem.status == 0 {
                    problem.status = status.as_u16();
                }
                problem
            }
            Err(_) => Problem::from_status(status.as_u16(), reason),
        }
    }

    fn apply_timeout(
        req: RequestBuilder,
        timeout: Option<Duration>,
    ) -> RequestBuilder {
        match timeout {
            Some(t) => req.timeout(t),
            None => req,
        }
    }
}

impl DeviceTransport for HttpTransport {
    async fn authenticate(
        &self,
        host: &str,
        username: &str,
        password: &str,
        timeout: Option<Duration>,
    ) -> Result<TokenGrant, CallError> {
        let base = base_url(host)?;
        tracing::debug!(host, username, "requesting token grant");

        let req = self
            .client
            .post(format!("{base}{TOKEN_ENDPOINT}"))
            .json(&serde_json::json!({
                "name": username,
                "password": password,
            }));
        let resp = Self::apply_timeout(req, timeout)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let body = Self::settle(resp).await?;
        serde_json::from_value(body)
            .map_err(|e| TransportError::Body(e).into())
    }

    async fn revoke(
        &self,
        host: &str,
        kind: &str,
        token: &str,
        timeout: Option<Duration>,
    ) -> Result<(), CallError> {
        let base = base_url(host)?;
        tracing::debug!(host, "revoking token");

        let req = self
            .client
            .delete(format!("{base}{TOKEN_ENDPOINT}"))
            .header(AUTHORIZATION, format!("{kind} {token}"));
        let resp = Self::apply_timeout(req, timeout)
            .send()
            .await
            .map_err(TransportError::Http)?;

        Self::settle(resp).await.map(|_| ())
    }

    async fn execute(
        &self,
        op: Operation,
        host: &str,
        kind: &str,
        token: &str,
        path: &str,
        payload: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, CallError> {
        let base = base_url(host)?;
        let url = node_url(&base, path);
        tracing::debug!(%op, path, "dispatching data operation");

        let req = match op {
            Operation::Read(read_kind) => {
                let mut req = self.client.get(&url);
                if read_kind != ReadKind::Data {
                    req = req.query(&[("type", read_kind.query_label())]);
                }
                // A read argument travels URL-encoded in the query, not
                // as a request body.
                if let Some(argument) = payload {
                    req = req.query(&[("data", argument.to_string())]);
                }
                req
            }
            Operation::Write => {
                let req = self.client.put(&url);
                match payload {
                    Some(value) => req.json(value),
                    None => req,
                }
            }
            Operation::Create => {
                let req = self.client.post(&url);
                match payload {
                    Some(value) => req.json(value),
                    None => req,
                }
            }
            Operation::Delete => self.client.delete(&url),
        };

        let req = req.header(AUTHORIZATION, format!("{kind} {token}"));
        let resp = Self::apply_timeout(req, timeout)
            .send()
            .await
            .map_err(TransportError::Http)?;

        Self::settle(resp).await
    }
}

/// Normalizes a configured host into a base URL. A bare hostname gets the
/// `https` scheme; an explicit scheme is kept so tests and plain-HTTP
/// gateways can opt out.
fn base_url(host: &str) -> Result<String, TransportError> {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(TransportError::InvalidUrl("empty host".into()));
    }
    if trimmed.contains("://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

/// Joins a node path onto the automation tree root. Node paths are
/// hierarchical (`plc/app/data/a`) and their slashes must survive into
/// the URL unencoded.
fn node_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{base}{NODES_ENDPOINT}/{path}")
}
