use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::api::types::{User, UserRole};
use crate::error::{Error, Result};

use super::observable::Observable;

/// The logged-in user and when their session expires.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthState {
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.user, self.expires_at) {
            (Some(_), Some(expires_at)) => now < expires_at,
            _ => false,
        }
    }

    pub fn is_admin_at(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated_at(now)
            && self.user.as_ref().map(|u| u.role) == Some(UserRole::Admin)
    }
}

/// Process-wide authentication state.
///
/// Nothing here is cached as a boolean: `is_authenticated` and `is_admin`
/// are evaluated against the clock on every call, so an expired session is
/// noticed by the next observer without any timer.
#[derive(Clone)]
pub struct AuthStore {
    state: Observable<AuthState>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    pub fn new() -> Self {
        Self {
            state: Observable::new(AuthState::default()),
        }
    }

    pub fn global() -> Arc<AuthStore> {
        static GLOBAL: OnceLock<Arc<AuthStore>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(AuthStore::new())).clone()
    }

    /// Replace the session with `user`, expiring at `expires_at`.
    pub fn set_login(&self, user: User, expires_at: &str) -> Result<()> {
        let expires_at = parse_expiry(expires_at)?;

        log::info!("Logged in as {} until {}", user.username, expires_at);
        self.state.set(AuthState {
            user: Some(user),
            expires_at: Some(expires_at),
        });
        Ok(())
    }

    pub fn logout(&self) {
        self.state.set(AuthState::default());
    }

    pub fn state(&self) -> AuthState {
        self.state.get()
    }

    pub fn user(&self) -> Option<User> {
        self.state.with(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.with(|s| s.is_authenticated_at(Utc::now()))
    }

    pub fn is_admin(&self) -> bool {
        self.state.with(|s| s.is_admin_at(Utc::now()))
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

/// RFC 3339, or a timestamp without offset taken as UTC.
fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::InvalidTimestamp(value.to_string()))
}
