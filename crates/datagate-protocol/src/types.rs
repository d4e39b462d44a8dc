//! Core protocol types: the verbs a session can proxy and the shape of an
//! authentication grant.
//!
//! These types never perform I/O themselves — the transport layer turns
//! them into actual HTTP exchanges, and the session layer decides *when*
//! those exchanges happen.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Operation verbs
// ---------------------------------------------------------------------------

/// Selects among the read sub-variants of a node.
///
/// Reading a node can mean three different things, and the device expects
/// a discriminator rather than three separate endpoints:
///
/// - **Data**: the node's current value.
/// - **Metadata**: the node's type/unit/limit description.
/// - **Browse**: the names of the node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadKind {
    /// Read the node's value. This is the default read.
    Data,
    /// Read the node's self-description instead of its value.
    Metadata,
    /// List the node's children.
    Browse,
}

impl ReadKind {
    /// The label the device expects in the `type` query selector.
    pub fn query_label(self) -> &'static str {
        match self {
            ReadKind::Data => "data",
            ReadKind::Metadata => "metadata",
            ReadKind::Browse => "browse",
        }
    }
}

/// A data-layer operation proxied to the device once a session is live.
///
/// This is a Rust enum carrying data in one variant: `Read` holds WHICH
/// read is meant ([`ReadKind`]), while the write-class verbs need no
/// discriminator. Centralizing the verb set in one type means the session
/// layer has exactly one `invoke` path instead of six copy-pasted ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read a node (value, metadata, or children — see [`ReadKind`]).
    Read(ReadKind),
    /// Overwrite a node's value.
    Write,
    /// Create a node, optionally with an initial value.
    Create,
    /// Delete a node.
    Delete,
}

/// Display is used in log events (`tracing::info!(%op, ...)`), so the
/// labels are short and stable.
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Read(ReadKind::Data) => "read",
            Operation::Read(ReadKind::Metadata) => "read-metadata",
            Operation::Read(ReadKind::Browse) => "browse",
            Operation::Write => "write",
            Operation::Create => "create",
            Operation::Delete => "delete",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// TokenGrant
// ---------------------------------------------------------------------------

/// The body of a successful authentication exchange.
///
/// Both fields are `Option` **on purpose**: a device that answers `200`
/// with a body missing either field is violating the protocol, and that
/// violation is the *session* layer's to detect and classify (it must
/// reset the session and fail with a protocol-violation error). Parsing
/// with required fields would surface the same condition as an opaque
/// deserialization failure inside the transport instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    /// The opaque bearer credential.
    #[serde(default)]
    pub access_token: Option<String>,

    /// The scheme label accompanying the credential (e.g. `"Bearer"`),
    /// required to construct `Authorization` headers.
    #[serde(default)]
    pub token_type: Option<String>,
}
