//! Session and token lifecycle management for Datagate.
//!
//! This crate is the stateful heart of the client. It decides:
//!
//! 1. **When a session is valid** — the [`SessionState`] machine
//!    (logged out, authenticating, logged in with token material).
//! 2. **When a token must be renewed** — a renewal watermark computed at
//!    login time, checked lazily whenever an operation is invoked.
//! 3. **How concurrent logins converge** — a single-flight gate
//!    serializes overlapping `login()` calls onto one fresh session.
//! 4. **How an authorization failure is recovered** — exactly one
//!    re-login-and-retry cycle, and only when auto-reconnect is on.
//!
//! # How it fits in the stack
//!
//! ```text
//! Caller (above)      ← read/write/create/delete/browse one-liners
//!     ↕
//! Session (this crate) ← lifecycle, renewal, reconnect orchestration
//!     ↕
//! Transport (below)    ← the actual HTTP exchanges, behind a trait
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{
    LoginReceipt, SessionState, TokenSet, renewal_watermark,
    RENEWAL_SKEW_SECS,
};
