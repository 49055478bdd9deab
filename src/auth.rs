//! Shared-credential check for every endpoint.
//!
//! A single configured username/password pair guards the API. Comparison is plain string
//! equality; there are no accounts, hashes or tokens.

use serde::Deserialize;
use std::fmt;

/// Username/password pair presented by a caller.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Presented username.
    #[serde(default)]
    pub username: String,
    /// Presented password.
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Build a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Verifies presented credentials against the configured pair.
#[derive(Clone)]
pub struct CredentialVerifier {
    expected: Credentials,
}

impl CredentialVerifier {
    /// Accept exactly `expected`.
    pub fn new(expected: Credentials) -> Self {
        Self { expected }
    }

    /// Whether `presented` matches the configured pair exactly.
    pub fn verify(&self, presented: &Credentials) -> bool {
        presented.username == self.expected.username && presented.password == self.expected.password
    }
}
