//! QR code login.
//!
//! A [`LoginSession`] moves through
//! `Created → AwaitingScan → Scanned → Done`, or ends in `Expired` or
//! `Error`. There is no internal timer: the caller invokes
//! [`LoginSession::poll`] at its own cadence until a terminal state is
//! reported. Reaching `Done` persists the returned credential.
//!
//! # Example
//!
//! ```rust
//! use bilicard_core::credential::Credential;
//! use bilicard_core::login::{LoginSession, LoginState, PollSignal};
//!
//! let mut session = LoginSession::resume("key");
//! session.apply(&PollSignal::Scanned);
//! assert_eq!(session.state(), LoginState::Scanned);
//!
//! session.apply(&PollSignal::Confirmed(Credential::new("s", "j", "b")));
//! assert!(session.state().is_terminal());
//! ```

use std::fmt;

use serde_json::json;
use time::OffsetDateTime;

use crate::credential::{Credential, CredentialStore};
use crate::{Response, Result};

/// Upstream poll code: confirmed on the device.
pub const CODE_DONE: i64 = 0;
/// Upstream poll code: scanned, waiting for confirmation.
pub const CODE_SCANNED: i64 = 86090;
/// Upstream poll code: not scanned yet.
pub const CODE_NOT_SCANNED: i64 = 86101;
/// Upstream poll code: the QR code expired.
pub const CODE_EXPIRED: i64 = 86038;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Created,
    AwaitingScan,
    Scanned,
    Done,
    Expired,
    Error,
}

impl LoginState {
    /// No transition leaves a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoginState::Done | LoginState::Expired | LoginState::Error)
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginState::Created => "created",
            LoginState::AwaitingScan => "awaiting_scan",
            LoginState::Scanned => "scanned",
            LoginState::Done => "done",
            LoginState::Expired => "expired",
            LoginState::Error => "error",
        };
        f.write_str(name)
    }
}

/// A freshly generated QR code: the displayable URL and the opaque key used
/// for polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrTicket {
    pub url: String,
    pub key: String,
}

/// What one remote poll reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollSignal {
    Confirmed(Credential),
    Scanned,
    NotScanned,
    Expired,
    Unknown(i64),
}

impl PollSignal {
    /// Maps an upstream poll code. `Confirmed` is built by the transport,
    /// since it needs the credential.
    pub fn from_code(code: i64) -> Self {
        match code {
            CODE_SCANNED => PollSignal::Scanned,
            CODE_NOT_SCANNED => PollSignal::NotScanned,
            CODE_EXPIRED => PollSignal::Expired,
            other => PollSignal::Unknown(other),
        }
    }
}

/// Remote side of the QR login flow.
#[allow(async_fn_in_trait)]
pub trait LoginTransport {
    async fn generate(&self) -> Result<QrTicket>;
    async fn poll(&self, key: &str) -> Result<PollSignal>;
}

/// One login attempt.
#[derive(Debug, Clone)]
pub struct LoginSession {
    key: String,
    url: String,
    state: LoginState,
    issued_at: OffsetDateTime,
}

impl LoginSession {
    fn new(key: String, url: String) -> Self {
        Self { key, url, state: LoginState::Created, issued_at: OffsetDateTime::now_utc() }
    }

    /// Generates a QR code and enters `AwaitingScan`. Nothing is persisted.
    pub async fn begin<T: LoginTransport>(transport: &T) -> Result<Self> {
        let ticket = transport.generate().await?;
        let mut session = Self::new(ticket.key, ticket.url);
        session.state = LoginState::AwaitingScan;
        tracing::debug!(key = %session.key, "login session started");
        Ok(session)
    }

    /// Rebuilds a session from a key issued by an earlier `begin`, as a
    /// separate process invocation does.
    pub fn resume(key: impl Into<String>) -> Self {
        let mut session = Self::new(key.into(), String::new());
        session.state = LoginState::AwaitingScan;
        session
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn issued_at(&self) -> OffsetDateTime {
        self.issued_at
    }

    /// `{url, key}` payload handed to whoever renders the QR code.
    pub fn ticket_response(&self) -> Response {
        Response::data(json!({ "url": self.url, "key": self.key }))
    }

    /// Queries the remote status once and advances the state.
    ///
    /// A terminal session answers from its current state without querying.
    /// A transport failure, or a confirmed credential that cannot be saved,
    /// leaves the state untouched so the caller can poll again.
    pub async fn poll<T, S>(&mut self, transport: &T, store: &S) -> Response
    where
        T: LoginTransport,
        S: CredentialStore,
    {
        if self.state.is_terminal() {
            return self.state_response();
        }

        let signal = match transport.poll(&self.key).await {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "login poll failed");
                return e.into();
            }
        };

        if let PollSignal::Confirmed(credential) = &signal {
            if let Err(e) = store.save(credential) {
                tracing::warn!(key = %self.key, error = %e, "credential save failed");
                return Response::error(format!("login confirmed but credential could not be saved: {}", e));
            }
            tracing::info!(key = %self.key, "login succeeded, credential saved");
        }

        self.apply(&signal)
    }

    /// Applies one poll signal and returns the response describing the new
    /// state. Pure: persisting a confirmed credential is the caller's job.
    pub fn apply(&mut self, signal: &PollSignal) -> Response {
        if self.state.is_terminal() {
            return self.state_response();
        }

        self.state = match signal {
            PollSignal::Confirmed(_) => LoginState::Done,
            PollSignal::Scanned => LoginState::Scanned,
            PollSignal::NotScanned => LoginState::AwaitingScan,
            PollSignal::Expired => LoginState::Expired,
            PollSignal::Unknown(code) => {
                tracing::warn!(key = %self.key, code, "unrecognized login poll code");
                LoginState::Error
            }
        };
        self.state_response()
    }

    fn state_response(&self) -> Response {
        match self.state {
            LoginState::Done => Response::message("login succeeded"),
            LoginState::Scanned => Response::pending(CODE_SCANNED, "scanned, confirm on device"),
            LoginState::Created | LoginState::AwaitingScan => Response::pending(CODE_NOT_SCANNED, "waiting for scan"),
            LoginState::Expired => Response::error_with_code(CODE_EXPIRED, "qr code expired"),
            LoginState::Error => Response::error("unknown login state"),
        }
    }
}
