//! The session manager: owns one device session and orchestrates its
//! lifecycle.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Performing the authentication exchange and keeping its result
//! - Serializing concurrent login attempts onto one fresh session
//! - Renewing the token ahead of its expiry (lazily, at invoke time)
//! - Recovering an authorization failure with one re-login-and-retry
//! - Tearing the session down on logout, whatever the device says
//!
//! # Concurrency note
//!
//! The session state lives behind a `tokio::sync::Mutex`, but the lock is
//! only ever held to transition or to clone a snapshot — never across a
//! transport await. Operations on a valid token therefore run fully
//! concurrently, each against the immutable snapshot it started with.
//! Logins are the exception: a second mutex (the single-flight gate) is
//! held across the whole exchange, so overlapping `login()` calls queue
//! up and converge instead of racing to write token fields.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use datagate_protocol::{decode_claims, Operation, ProtocolError, ReadKind};
use datagate_transport::DeviceTransport;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::session::{now_unix, renewal_watermark};
use crate::{LoginReceipt, SessionError, SessionState, TokenSet};

/// Manages the session and token lifecycle for one device connection.
///
/// ## Lifecycle
///
/// ```text
/// login() ──→ [LoggedIn] ──→ invoke() ... invoke() ──→ logout()
///                 │               │                        │
///                 │               ├─ watermark crossed ──→ login(), retry
///                 │               └─ 401 + auto-reconnect → login(), retry
///                 ▼                                        ▼
///          (re-login converges                       [LoggedOut]
///           via single-flight gate)
/// ```
///
/// Credentials are immutable for the manager's lifetime; rotating them
/// means constructing a new manager. The mutable knobs — auto-reconnect
/// and the per-call timeout — are atomics, so flipping them contends
/// with nothing.
pub struct SessionManager<T: DeviceTransport> {
    transport: T,
    host: String,
    username: String,
    password: String,

    /// Current session state. Locked only to transition or snapshot.
    state: Mutex<SessionState>,

    /// Single-flight gate: held across a whole authentication exchange.
    /// Concurrent `login()` callers queue here; each one that acquires
    /// the gate converges through a best-effort logout, so the final
    /// state is always the last completed exchange's.
    login_gate: Mutex<()>,

    /// Whether a 401 rejection triggers one transparent re-login + retry.
    auto_reconnect: AtomicBool,

    /// Effective per-call timeout in milliseconds; `-1` means "use the
    /// transport's own default".
    timeout_ms: AtomicI64,
}

impl<T: DeviceTransport> SessionManager<T> {
    /// Creates a manager in the logged-out state. No I/O happens until
    /// `login()` is called.
    pub fn new(
        transport: T,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            host: host.into(),
            username: username.into(),
            password: password.into(),
            state: Mutex::new(SessionState::LoggedOut),
            login_gate: Mutex::new(()),
            auto_reconnect: AtomicBool::new(true),
            timeout_ms: AtomicI64::new(-1),
        }
    }

    /// The transport this manager delegates to.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The device host this manager was constructed for.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// A clone of the current session state, for observability.
    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Whether a 401 rejection triggers one automatic re-login + retry.
    /// Defaults to enabled.
    pub fn auto_reconnect(&self) -> bool {
        self.auto_reconnect.load(Ordering::Relaxed)
    }

    /// Enables or disables the automatic 401 recovery.
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.auto_reconnect.store(enabled, Ordering::Relaxed);
    }

    /// The effective per-call timeout; `None` defers to the transport's
    /// own default.
    pub fn request_timeout(&self) -> Option<Duration> {
        let ms = self.timeout_ms.load(Ordering::Relaxed);
        (ms >= 0).then(|| Duration::from_millis(ms as u64))
    }

    /// Sets the per-call timeout applied to every transport exchange.
    pub fn set_request_timeout(&self, timeout: Option<Duration>) {
        let ms = timeout.map_or(-1, |t| t.as_millis() as i64);
        self.timeout_ms.store(ms, Ordering::Relaxed);
    }

    // =====================================================================
    // login / logout
    // =====================================================================

    /// Establishes a fresh session, replacing any live one.
    ///
    /// Concurrent calls queue on the single-flight gate; each call that
    /// acquires the gate first tears down whatever session exists (the
    /// teardown's outcome is ignored) and then runs its own exchange, so
    /// any number of simultaneous logins ends in exactly one coherent
    /// logged-in state — the last completed exchange's.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Transport`] / [`SessionError::Device`] — the
    ///   exchange itself failed
    /// - [`SessionError::Protocol`] — the grant was missing a field, or
    ///   the issued token would not decode
    ///
    /// Every failure leaves the session logged out with all token
    /// material cleared.
    pub async fn login(&self) -> Result<LoginReceipt, SessionError> {
        let _gate = self.login_gate.lock().await;

        if !matches!(*self.state.lock().await, SessionState::LoggedOut) {
            // Best-effort teardown; a failed revocation must not block
            // the fresh exchange.
            if let Err(err) = self.logout().await {
                tracing::debug!(error = %err, "pre-login logout failed, continuing");
            }
        }

        self.exchange().await
    }

    /// Runs one authentication exchange. Caller holds the login gate.
    async fn exchange(&self) -> Result<LoginReceipt, SessionError> {
        *self.state.lock().await = SessionState::Authenticating;
        tracing::debug!(host = %self.host, username = %self.username, "authenticating");

        let grant = match self
            .transport
            .authenticate(
                &self.host,
                &self.username,
                &self.password,
                self.request_timeout(),
            )
            .await
        {
            Ok(grant) => grant,
            Err(err) => {
                self.clear().await;
                return Err(err.into());
            }
        };

        // A grant without both fields cannot authorize anything; treat it
        // as a protocol violation, not a partial success.
        let Some(token) = grant.access_token else {
            self.clear().await;
            return Err(ProtocolError::MissingGrantField("access_token").into());
        };
        let Some(kind) = grant.token_type else {
            self.clear().await;
            return Err(ProtocolError::MissingGrantField("token_type").into());
        };

        let claims = match decode_claims(&token) {
            Ok(claims) => claims,
            Err(err) => {
                self.clear().await;
                return Err(err.into());
            }
        };

        let renew_at = renewal_watermark(&claims);
        let set = TokenSet {
            token,
            kind,
            claims,
            renew_at,
        };
        let receipt = LoginReceipt {
            access_token: set.token.clone(),
            token_type: set.kind.clone(),
            claims: set.claims.clone(),
            renew_at,
        };
        *self.state.lock().await = SessionState::LoggedIn(set);
        tracing::info!(host = %self.host, renew_at, "session established");

        Ok(receipt)
    }

    /// Tears the session down.
    ///
    /// Local state is cleared *before* the remote revocation call: after
    /// `logout()` returns — success or failure — the caller never holds a
    /// token it believes is invalidated. A revocation failure is still
    /// surfaced, but it is purely informational; the session is already
    /// logged out. Logging out of a logged-out session is a no-op.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let snapshot = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, SessionState::LoggedOut) {
                SessionState::LoggedIn(set) => Some(set),
                _ => None,
            }
        };

        let Some(set) = snapshot else {
            return Ok(());
        };

        tracing::info!(host = %self.host, "session closed, revoking token");
        self.transport
            .revoke(&self.host, &set.kind, &set.token, self.request_timeout())
            .await?;
        Ok(())
    }

    // =====================================================================
    // invoke and the per-verb wrappers
    // =====================================================================

    /// Runs one data operation through the session, renewing and
    /// retrying per the lifecycle rules.
    ///
    /// 1. Fails with [`SessionError::NotLoggedIn`] when no session is
    ///    live — there is no implicit first login.
    /// 2. Renews the session first when the token has crossed its
    ///    watermark (at most once; a fresh-but-already-stale token fails
    ///    with [`SessionError::RenewalStalled`] instead of looping).
    /// 3. On a 401 problem with auto-reconnect enabled: one re-login and
    ///    one retry, whose outcome — success or failure — is final.
    /// 4. Every other failure propagates unchanged.
    pub async fn invoke(
        &self,
        op: Operation,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, SessionError> {
        let mut snapshot = self.authorized_token().await?;

        // Lazy renewal: no background timer ever runs; staleness is
        // checked here, at the moment the operation needs the token.
        if snapshot.is_stale(now_unix()) {
            tracing::debug!(%op, path, "token past renewal watermark, renewing session");
            self.login().await?;
            snapshot = self.authorized_token().await?;
            if snapshot.is_stale(now_unix()) {
                // A fresh token behind its own watermark means renewing
                // again cannot make progress (clock skew, or a token
                // lifetime shorter than the renewal margin).
                return Err(SessionError::RenewalStalled);
            }
        }

        match self.dispatch(op, path, payload, &snapshot).await {
            Err(SessionError::Device(problem))
                if problem.is_unauthorized() && self.auto_reconnect() =>
            {
                tracing::info!(
                    %op,
                    path,
                    status = problem.status,
                    "authorization rejected, re-authenticating once"
                );
                self.login().await?;
                let snapshot = self.authorized_token().await?;
                let outcome = self.dispatch(op, path, payload, &snapshot).await;
                self.reassert_logged_in().await;
                outcome
            }
            outcome => outcome,
        }
    }

    /// Reads a node's value.
    pub async fn read(&self, path: &str) -> Result<Value, SessionError> {
        self.invoke(Operation::Read(ReadKind::Data), path, None).await
    }

    /// Reads a node's value, passing an argument payload along.
    pub async fn read_with(
        &self,
        path: &str,
        argument: &Value,
    ) -> Result<Value, SessionError> {
        self.invoke(Operation::Read(ReadKind::Data), path, Some(argument))
            .await
    }

    /// Reads a node's metadata.
    pub async fn read_metadata(&self, path: &str) -> Result<Value, SessionError> {
        self.invoke(Operation::Read(ReadKind::Metadata), path, None)
            .await
    }

    /// Lists a node's children.
    pub async fn browse(&self, path: &str) -> Result<Value, SessionError> {
        self.invoke(Operation::Read(ReadKind::Browse), path, None)
            .await
    }

    /// Overwrites a node's value.
    pub async fn write(
        &self,
        path: &str,
        value: &Value,
    ) -> Result<Value, SessionError> {
        self.invoke(Operation::Write, path, Some(value)).await
    }

    /// Creates a node, optionally with an initial value.
    pub async fn create(
        &self,
        path: &str,
        value: Option<&Value>,
    ) -> Result<Value, SessionError> {
        self.invoke(Operation::Create, path, value).await
    }

    /// Deletes a node.
    pub async fn delete(&self, path: &str) -> Result<Value, SessionError> {
        self.invoke(Operation::Delete, path, None).await
    }

    // =====================================================================
    // internals
    // =====================================================================

    /// Snapshot of the live token set, or the usage error.
    async fn authorized_token(&self) -> Result<TokenSet, SessionError> {
        match &*self.state.lock().await {
            SessionState::LoggedIn(set) => Ok(set.clone()),
            _ => Err(SessionError::NotLoggedIn),
        }
    }

    /// One transport call with the given snapshot. No retry logic here —
    /// `invoke` owns the policy.
    async fn dispatch(
        &self,
        op: Operation,
        path: &str,
        payload: Option<&Value>,
        set: &TokenSet,
    ) -> Result<Value, SessionError> {
        self.transport
            .execute(
                op,
                &self.host,
                &set.kind,
                &set.token,
                path,
                payload,
                self.request_timeout(),
            )
            .await
            .map_err(SessionError::from)
    }

    /// Drops all token material and returns to logged-out. Used on every
    /// failed exchange: a token that failed to establish must not linger.
    async fn clear(&self) {
        *self.state.lock().await = SessionState::LoggedOut;
    }

    /// After a reconnect retry the state must be logged-in again; a
    /// concurrent logout can have drifted it. Drift is surfaced in the
    /// log, never silently repaired — fabricating token material here
    /// would break the all-or-nothing invariant.
    async fn reassert_logged_in(&self) {
        let state = self.state.lock().await;
        if !state.is_logged_in() {
            tracing::warn!(
                state = state.label(),
                "session state drifted during reconnect retry"
            );
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
