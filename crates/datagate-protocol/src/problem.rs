//! The structured error body a device sends when a request is rejected.

use serde::{Deserialize, Serialize};

/// An RFC-7807-style problem body, as returned by the device alongside a
/// non-success HTTP status.
///
/// This is both a data type (it parses straight off the wire) and an
/// error type (`thiserror` on a struct): a rejected request *is* the
/// problem the device described. The `status` field is what the session
/// layer branches on — an authorization-class status is the only thing
/// that ever triggers an automatic re-login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("device problem {status}: {}", headline(.title, .detail))]
pub struct Problem {
    /// A URI reference identifying the problem type, if the device sent
    /// one. Renamed because `type` is a Rust keyword.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Short, human-readable summary of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The HTTP-style status code. Defaults to 0 when the body omitted
    /// it; the transport backfills it from the response status line.
    #[serde(default)]
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference identifying this specific occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Picks the most useful one-liner out of an optional title/detail pair.
fn headline<'a>(title: &'a Option<String>, detail: &'a Option<String>) -> &'a str {
    title
        .as_deref()
        .or(detail.as_deref())
        .unwrap_or("no detail provided")
}

impl Problem {
    /// Synthesizes a problem from a bare HTTP status, for responses whose
    /// body is empty or not parseable as a problem.
    pub fn from_status(status: u16, reason: &str) -> Self {
        Self {
            kind: None,
            title: Some(reason.to_string()),
            status,
            detail: None,
            instance: None,
        }
    }

    /// Whether this problem is an authorization-class failure — the one
    /// condition that makes a session eligible for auto-reconnect.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}
