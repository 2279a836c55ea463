//! Authentication state shared by every request

use bridgeline_core::config::AuthConfig;
use parking_lot::RwLock;
use reqwest::RequestBuilder;
use std::fmt;
use std::sync::Arc;

/// Credentials attached to outgoing requests
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Cookie: <cookie>`
    Cookie(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Cookie(_) => f.write_str("Cookie(***)"),
        }
    }
}

/// Injected, swappable authentication state
///
/// Clones share the same state, so logging in or out through one handle is
/// seen by every client built from it.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    credentials: Arc<RwLock<Option<Credentials>>>,
}

impl AuthContext {
    /// Unauthenticated context
    pub fn new() -> Self {
        Self::default()
    }

    /// Context holding the given credentials
    pub fn with_credentials(credentials: Credentials) -> Self {
        let context = Self::new();
        context.set(credentials);
        context
    }

    /// Build from configuration; a token wins over a cookie
    pub fn from_config(config: &AuthConfig) -> Self {
        let context = Self::new();
        if let Some(token) = config.token.as_ref().filter(|t| !t.is_empty()) {
            context.set(Credentials::Bearer(token.clone()));
        } else if let Some(cookie) = config.cookie.as_ref().filter(|c| !c.is_empty()) {
            context.set(Credentials::Cookie(cookie.clone()));
        }
        context
    }

    /// Replace the credentials
    pub fn set(&self, credentials: Credentials) {
        *self.credentials.write() = Some(credentials);
    }

    /// Forget the credentials
    pub fn clear(&self) {
        *self.credentials.write() = None;
    }

    /// Current credentials
    pub fn current(&self) -> Option<Credentials> {
        self.credentials.read().clone()
    }

    /// Whether credentials are present
    pub fn is_authenticated(&self) -> bool {
        self.credentials.read().is_some()
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self.current() {
            Some(Credentials::Bearer(token)) => request.bearer_auth(token),
            Some(Credentials::Cookie(cookie)) => request.header(http::header::COOKIE, cookie),
            None => request,
        }
    }
}
