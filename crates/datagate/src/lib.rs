//! # Datagate
//!
//! Bearer-token session client for HTTP device data endpoints.
//!
//! Datagate manages the part of talking to a device that is genuinely
//! stateful: establishing a session, renewing its token ahead of expiry,
//! serializing concurrent logins, and transparently recovering an
//! authorization failure mid-request. The data operations themselves
//! (read/write/create/delete/browse over node paths) are thin proxies
//! once a session is live.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datagate::prelude::*;
//!
//! # async fn demo() -> Result<(), DatagateError> {
//! let client = ClientBuilder::new("192.168.1.1", "operator", "secret")
//!     .accept_invalid_certs(true)
//!     .build()?;
//!
//! client.login().await?;
//! let value = client.read("plc/app/data/a").await?;
//! println!("{value}");
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{Client, ClientBuilder};
pub use error::DatagateError;

/// One-stop imports for typical use.
pub mod prelude {
    pub use crate::{Client, ClientBuilder, DatagateError};
    pub use datagate_protocol::{
        Operation, Problem, ReadKind, TokenClaims, TokenGrant,
    };
    pub use datagate_session::{
        LoginReceipt, SessionError, SessionManager, SessionState,
    };
    pub use datagate_transport::{
        CallError, DeviceTransport, HttpTransport, HttpTransportConfig,
        TransportError,
    };
}
