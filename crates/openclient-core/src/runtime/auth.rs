//! Credentials applied to outgoing requests.
//!
//! A [`SecurityContext`] holds at most one credential. Configuring a new one
//! replaces the old, and applying an empty context leaves the request as is.
//! Generated security units configure the process-wide [`global`] context.

use std::sync::{PoisonError, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use serde::Serialize;

use super::request::RequestParts;

/// Where an API key travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// One configured credential
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer { token: String },
    ApiKey {
        location: ApiKeyLocation,
        name: String,
        key: String,
    },
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    pub fn api_key(location: ApiKeyLocation, name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ApiKey {
            location,
            name: name.into(),
            key: key.into(),
        }
    }

    /// The `Authorization` header value, for schemes that use one
    pub fn authorization(&self) -> Option<String> {
        match self {
            Self::Basic { username, password } => Some(format!(
                "Basic {}",
                STANDARD.encode(format!("{username}:{password}"))
            )),
            Self::Bearer { token } => Some(format!("Bearer {token}")),
            Self::ApiKey { .. } => None,
        }
    }

    pub fn apply(&self, request: &mut RequestParts) {
        match self {
            Self::ApiKey {
                location: ApiKeyLocation::Header,
                name,
                key,
            } => request.set_header(name.as_str(), key.as_str()),
            Self::ApiKey {
                location: ApiKeyLocation::Query,
                name,
                key,
            } => request.query_pair(name.as_str(), key.as_str()),
            other => {
                if let Some(value) = other.authorization() {
                    request.set_header("Authorization", value);
                }
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    // Secrets stay out of logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
            Self::ApiKey { location, name, .. } => f
                .debug_struct("ApiKey")
                .field("location", location)
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

/// Holder of the active credential
#[derive(Debug, Default)]
pub struct SecurityContext {
    active: RwLock<Option<Credentials>>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `credentials` the active credential, replacing any other
    pub fn configure(&self, credentials: Credentials) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *active = Some(credentials);
    }

    pub fn clear(&self) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        *active = None;
    }

    pub fn active(&self) -> Option<Credentials> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply the active credential, if any
    pub fn apply(&self, request: &mut RequestParts) {
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(credentials) = active.as_ref() {
            credentials.apply(request);
        }
    }
}

static GLOBAL: Lazy<SecurityContext> = Lazy::new(SecurityContext::new);

/// The process-wide context used by generated operations
pub fn global() -> &'static SecurityContext {
    &GLOBAL
}
