//! Shared authentication context
//!
//! One [`AuthContext`] lives for as long as its registry and is shared by
//! reference with every endpoint the registry builds. Endpoints only read it.
//! Token acquisition and refresh belong to whatever sets the credential.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Kinds of credential the context can hold
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CredentialKind {
    /// API key sent as the `key` query parameter
    ApiKey,
    /// Bearer token (OAuth access token, JWT, ...)
    BearerToken,
}

/// Credential value, wiped from memory on drop
#[derive(Clone)]
pub struct Credential {
    value: String,
    kind: CredentialKind,
}

impl Credential {
    pub fn api_key(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: CredentialKind::ApiKey,
        }
    }

    pub fn bearer(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: CredentialKind::BearerToken,
        }
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// Get the credential value (limited access)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// Credential holder shared by a registry and its endpoints
#[derive(Default)]
pub struct AuthContext {
    credential: RwLock<Option<Credential>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }

    /// Replace the current credential
    pub fn set_credential(&self, credential: Credential) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    pub fn clear_credential(&self) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn credential_kind(&self) -> Option<CredentialKind> {
        self.read(|c| c.kind())
    }

    /// `Authorization` header value for bearer credentials
    pub fn authorization_header(&self) -> Option<String> {
        self.read(|c| match c.kind() {
            CredentialKind::BearerToken => Some(format!("Bearer {}", c.expose_secret())),
            CredentialKind::ApiKey => None,
        })
        .flatten()
    }

    /// API key for the `key` query parameter
    pub fn api_key(&self) -> Option<String> {
        self.read(|c| match c.kind() {
            CredentialKind::ApiKey => Some(c.expose_secret().to_string()),
            CredentialKind::BearerToken => None,
        })
        .flatten()
    }

    fn read<T>(&self, f: impl FnOnce(&Credential) -> T) -> Option<T> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("credential", &self.credential_kind())
            .finish()
    }
}
