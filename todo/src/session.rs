//! Signed-in session gate.
//!
//! The todo view is only reachable by a signed-in user. A [`SessionProvider`]
//! reports the current session; [`require_session`] turns that into a
//! [`SessionGate`] which [`TodoApp::mount`](crate::app::TodoApp::mount)
//! requires.

use chrono::{DateTime, Utc};
use std::future::Future;
use thiserror::Error;
use todo_form_core::environment::Clock;

/// Environment variable holding the signed-in username
pub const USERNAME_VAR: &str = "TODO_USERNAME";
/// Environment variable holding the user pool id token
pub const ID_TOKEN_VAR: &str = "TODO_ID_TOKEN";
/// Environment variable holding the session expiry (RFC 3339)
pub const EXPIRES_AT_VAR: &str = "TODO_SESSION_EXPIRES_AT";

/// Session lookup errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session data is present but malformed.
    #[error("invalid session: {0}")]
    Invalid(String),

    /// The identity backend could not be reached.
    #[error("session provider unavailable: {0}")]
    Unavailable(String),
}

/// A signed-in user
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Username shown by the front end
    pub username: String,
    /// Id token sent to the backend in user pool mode
    pub id_token: Option<String>,
    /// When the session stops being valid; `None` means it does not expire
    pub expires_at: Option<DateTime<Utc>>,
}

// Keep tokens out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    /// Creates a non-expiring session without a token
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            id_token: None,
            expires_at: None,
        }
    }

    /// Attach an id token
    #[must_use]
    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }

    /// Set the expiry
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the session has expired at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Source of the current session
pub trait SessionProvider: Send + Sync {
    /// Returns the signed-in session, or `None` if nobody is signed in
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session cannot be determined.
    fn current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Session>, SessionError>> + Send;
}

/// Outcome of the sign-in check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionGate {
    /// A valid session exists
    Authenticated(Session),
    /// Nobody is signed in, the session expired, or the lookup failed
    Unauthenticated,
}

impl SessionGate {
    /// Returns the session if authenticated
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Unauthenticated => None,
        }
    }
}

/// Check for a valid session
///
/// Provider errors are logged and treated as signed out.
pub async fn require_session<P, C>(provider: &P, clock: &C) -> SessionGate
where
    P: SessionProvider,
    C: Clock + ?Sized,
{
    match provider.current_session().await {
        Ok(Some(session)) if session.is_expired(clock.now()) => {
            tracing::info!(username = %session.username, "Session expired");
            SessionGate::Unauthenticated
        },
        Ok(Some(session)) => {
            tracing::debug!(username = %session.username, "Session accepted");
            SessionGate::Authenticated(session)
        },
        Ok(None) => {
            tracing::info!("No signed-in session");
            SessionGate::Unauthenticated
        },
        Err(error) => {
            tracing::warn!(error = %error, "Session lookup failed");
            SessionGate::Unauthenticated
        },
    }
}

/// Session read from environment variables
///
/// `TODO_USERNAME` marks a signed-in user; `TODO_ID_TOKEN` and
/// `TODO_SESSION_EXPIRES_AT` are optional.
#[derive(Debug, Clone, Default)]
pub struct EnvSessionProvider {
    username: Option<String>,
    id_token: Option<String>,
    expires_at: Option<String>,
}

impl EnvSessionProvider {
    /// Read the session variables from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the session variables through a lookup function
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            username: lookup(USERNAME_VAR).filter(|u| !u.is_empty()),
            id_token: lookup(ID_TOKEN_VAR).filter(|t| !t.is_empty()),
            expires_at: lookup(EXPIRES_AT_VAR),
        }
    }

    fn session(&self) -> Result<Option<Session>, SessionError> {
        let Some(username) = &self.username else {
            return Ok(None);
        };

        let expires_at = self
            .expires_at
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|e| SessionError::Invalid(format!("{EXPIRES_AT_VAR}: {e}")))
            })
            .transpose()?;

        Ok(Some(Session {
            username: username.clone(),
            id_token: self.id_token.clone(),
            expires_at,
        }))
    }
}

impl SessionProvider for EnvSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, SessionError> {
        self.session()
    }
}

/// Provider serving a fixed answer
#[derive(Debug, Clone)]
pub struct StaticSessionProvider {
    session: Option<Session>,
}

impl StaticSessionProvider {
    /// Always signed in as `session`
    #[must_use]
    pub const fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Never signed in
    #[must_use]
    pub const fn signed_out() -> Self {
        Self { session: None }
    }
}

impl SessionProvider for StaticSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.session.clone())
    }
}
