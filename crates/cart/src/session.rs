//! Authenticated session handed to the cart store.
//!
//! The store never reads ambient auth state. Callers pass a [`Session`] in
//! explicitly, or publish it on a `tokio::sync::watch` channel that
//! [`crate::store::watch_sessions`] observes.

use foodcourt_core::UserId;
use secrecy::{ExposeSecret, SecretString};

/// A logged-in user and the bearer token for the backend.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    user_id: UserId,
    access_token: SecretString,
}

impl Session {
    #[must_use]
    pub fn new(user_id: UserId, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            access_token: SecretString::from(access_token.into()),
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Value for the `Authorization` header.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}
