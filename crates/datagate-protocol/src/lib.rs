//! Wire vocabulary for Datagate.
//!
//! This crate defines the "language" spoken with a device endpoint:
//!
//! - **Types** ([`Operation`], [`ReadKind`], [`TokenGrant`]) — the verbs
//!   a session can proxy and the shape of an authentication grant.
//! - **Claims** ([`TokenClaims`], [`decode_claims`]) — the structured view
//!   of a bearer token's payload, used to schedule renewal.
//! - **Problem** ([`Problem`]) — the structured error body a device sends
//!   back when a request is rejected.
//! - **Errors** ([`ProtocolError`]) — locally detected violations of the
//!   expected wire shapes.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw HTTP exchanges) and
//! session (login/renewal orchestration). It performs no I/O — everything
//! here is pure data and pure decoding.
//!
//! ```text
//! Transport (HTTP) → Protocol (grants, claims, problems) → Session (lifecycle)
//! ```

mod claims;
mod error;
mod problem;
mod types;

pub use claims::{decode_claims, TokenClaims};
pub use error::ProtocolError;
pub use problem::Problem;
pub use types::{Operation, ReadKind, TokenGrant};
