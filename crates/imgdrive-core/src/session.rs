//! Authentication session.
//!
//! `SessionManager` owns the token lifecycle: it is the only writer of the
//! persisted token and of the shared auth header. Its state is an explicit
//! machine:
//!
//! ```text
//! Anonymous(loading) ──login/register──▶ AuthInProgress ──▶ Authenticated(user)
//!        ▲                                     │
//!        │                                     └──────────▶ AuthFailed(error)
//!        └────────────────────── logout ◀── any state
//! ```
//!
//! After a successful login or register the user is always re-fetched from
//! the profile endpoint; the auth response is only trusted for the token.

use crate::api::{ApiClient, ApiError, Credentials, TokenResponse, User};
use crate::token::TokenStore;

const AUTH_FALLBACK: &str = "Authentication failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No user. `loading` is true only before `initialize` has run.
    Anonymous { loading: bool },
    /// A login, register or profile request is in flight.
    AuthInProgress,
    Authenticated { user: User },
    AuthFailed { error: String },
}

/// Flat view of the session for presentation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub user: Option<User>,
    pub error: Option<String>,
}

/// Result of a login/register/load attempt, for caller-side alerting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl AuthOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum AuthKind {
    Login,
    Register,
}

impl AuthKind {
    fn fallback(self) -> &'static str {
        match self {
            AuthKind::Login => "Login failed",
            AuthKind::Register => "Registration failed",
        }
    }
}

fn check_password_confirmation(password: &str, confirmation: &str) -> Result<(), ApiError> {
    if password == confirmation {
        Ok(())
    } else {
        Err(ApiError::validation("Passwords do not match"))
    }
}

pub struct SessionManager {
    api: ApiClient,
    store: Box<dyn TokenStore>,
    token: Option<String>,
    state: SessionState,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state)
            .field("has_token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(api: ApiClient, store: impl TokenStore + 'static) -> Self {
        Self {
            api,
            store: Box::new(store),
            token: None,
            state: SessionState::Anonymous { loading: true },
        }
    }

    /// The shared API client. Clones see the header this manager sets.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    pub fn session(&self) -> Session {
        let (is_authenticated, loading, user, error) = match &self.state {
            SessionState::Anonymous { loading } => (false, *loading, None, None),
            SessionState::AuthInProgress => (false, true, None, None),
            SessionState::Authenticated { user } => (true, false, Some(user.clone()), None),
            SessionState::AuthFailed { error } => (false, false, None, Some(error.clone())),
        };
        Session {
            token: self.token.clone(),
            is_authenticated,
            loading,
            user,
            error,
        }
    }

    /// Restores the persisted token (if any) and confirms it with the server.
    pub async fn initialize(&mut self) -> AuthOutcome {
        let persisted = self.store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read persisted token");
            None
        });

        match persisted {
            Some(token) => {
                tracing::debug!("restoring persisted session");
                self.api.set_auth_token(Some(&token));
                self.token = Some(token);
                self.load_user().await
            }
            None => {
                self.state = SessionState::Anonymous { loading: false };
                AuthOutcome::ok()
            }
        }
    }

    /// Fetches the profile for the current token.
    ///
    /// Any failure drops the token (persisted and in the header) and moves
    /// to `AuthFailed`.
    pub async fn load_user(&mut self) -> AuthOutcome {
        if self.token.is_none() {
            self.state = SessionState::Anonymous { loading: false };
            return AuthOutcome::ok();
        }

        self.state = SessionState::AuthInProgress;
        match self.api.current_user().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "user loaded");
                self.state = SessionState::Authenticated { user };
                AuthOutcome::ok()
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load user");
                self.drop_token();
                self.fail(err.server_message_or(AUTH_FALLBACK))
            }
        }
    }

    pub async fn login(&mut self, credentials: &Credentials) -> AuthOutcome {
        self.authenticate(AuthKind::Login, credentials).await
    }

    /// Creates an account and signs in with it.
    ///
    /// A `confirmation` that differs from the password fails with
    /// "Passwords do not match" and sends no request.
    pub async fn register(&mut self, credentials: &Credentials, confirmation: &str) -> AuthOutcome {
        if let Err(err) = check_password_confirmation(&credentials.password, confirmation) {
            return self.fail(err.message);
        }
        self.authenticate(AuthKind::Register, credentials).await
    }

    async fn authenticate(&mut self, kind: AuthKind, credentials: &Credentials) -> AuthOutcome {
        self.state = SessionState::AuthInProgress;
        tracing::info!(?kind, username = %credentials.username, "authenticating");

        let response = match kind {
            AuthKind::Login => self.api.login(credentials).await,
            AuthKind::Register => self.api.register(credentials).await,
        };

        let token = match response {
            Ok(TokenResponse { token: Some(token) }) if !token.trim().is_empty() => token,
            Ok(_) => {
                tracing::warn!(?kind, "auth response carried no token");
                return self.fail(kind.fallback());
            }
            Err(err) => {
                tracing::warn!(?kind, error = %err, "authentication failed");
                return self.fail(err.server_message_or(kind.fallback()));
            }
        };

        self.adopt_token(token);
        self.load_user().await
    }

    /// Forgets the token locally. No request is made; safe to call when
    /// already logged out.
    pub fn logout(&mut self) {
        self.drop_token();
        self.state = SessionState::Anonymous { loading: false };
        tracing::info!("logged out");
    }

    pub fn clear_error(&mut self) {
        if matches!(self.state, SessionState::AuthFailed { .. }) {
            self.state = SessionState::Anonymous { loading: false };
        }
    }

    fn fail(&mut self, error: impl Into<String>) -> AuthOutcome {
        let error = error.into();
        self.state = SessionState::AuthFailed {
            error: error.clone(),
        };
        AuthOutcome::failed(error)
    }

    fn adopt_token(&mut self, token: String) {
        if let Err(e) = self.store.save(&token) {
            tracing::warn!(error = %e, "could not persist token; session will not survive restart");
        }
        self.api.set_auth_token(Some(&token));
        self.token = Some(token);
    }

    fn drop_token(&mut self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "could not remove persisted token");
        }
        self.api.set_auth_token(None);
        self.token = None;
    }
}
