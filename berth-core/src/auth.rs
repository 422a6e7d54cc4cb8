//! Registry credential validation and encoding.
//!
//! An [`AuthEntry`] carries either a pre-encoded `auth` token or a
//! `username`/`password` pair. Empty strings count as absent.

use std::collections::BTreeMap;
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// One `auths.<host>` entry as written in the desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// The authentication shape of a valid entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Empty,
    Token,
    CredentialPair,
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthKind::Empty => write!(f, "no authentication defined"),
            AuthKind::Token => write!(f, "token authentication"),
            AuthKind::CredentialPair => write!(f, "credential-pair authentication"),
        }
    }
}

/// Why an entry was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("only one variant may be defined: use either 'auth' or 'username' and 'password'")]
    BothVariants,

    #[error("missing credential half: both 'username' and 'password' are required")]
    MissingCredentialHalf,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl AuthEntry {
    pub fn token(auth: impl Into<String>) -> Self {
        Self {
            auth: Some(auth.into()),
            ..Self::default()
        }
    }

    pub fn credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth: None,
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Decide which authentication shape this entry has, if any is valid.
    pub fn validate(&self) -> Result<AuthKind, AuthError> {
        let auth = present(&self.auth);
        let username = present(&self.username);
        let password = present(&self.password);

        match (auth, username, password) {
            (None, None, None) => Ok(AuthKind::Empty),
            (Some(_), None, None) => Ok(AuthKind::Token),
            (Some(_), _, _) => Err(AuthError::BothVariants),
            (None, Some(_), Some(_)) => Ok(AuthKind::CredentialPair),
            (None, _, _) => Err(AuthError::MissingCredentialHalf),
        }
    }

    /// The transport token. An existing token is passed through unchecked.
    /// Returns `None` for an empty entry.
    pub fn encode(&self) -> Option<String> {
        if let Some(token) = present(&self.auth) {
            return Some(token.to_string());
        }
        match (present(&self.username), present(&self.password)) {
            (Some(user), Some(pass)) => Some(STANDARD.encode(format!("{user}:{pass}"))),
            _ => None,
        }
    }
}

/// What a caller does with invalid entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthPolicy {
    /// Any invalid entry fails the whole run; nothing is written.
    #[default]
    Strict,
    /// Invalid entries are dropped with a warning; the rest is written.
    Lenient,
}

impl fmt::Display for AuthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthPolicy::Strict => write!(f, "strict"),
            AuthPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// A rejected entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidAuth {
    pub host: String,
    pub reason: String,
}

/// Result of encoding a full `auths` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthReport {
    /// `host → {"auth": token}` (or `{}` for empty entries), sorted by host.
    pub auths: BTreeMap<String, Value>,
    pub invalid: Vec<InvalidAuth>,
}

impl AuthReport {
    pub fn has_invalid(&self) -> bool {
        !self.invalid.is_empty()
    }

    /// One line per rejected host.
    pub fn invalid_summary(&self) -> String {
        self.invalid
            .iter()
            .map(|i| format!("{}: {}", i.host, i.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate and encode every entry; invalid ones are collected, not dropped silently.
pub fn encode_auths(entries: &BTreeMap<String, AuthEntry>) -> AuthReport {
    let mut report = AuthReport::default();
    for (host, entry) in entries {
        match entry.validate() {
            Ok(_) => {
                let value = match entry.encode() {
                    Some(token) => json!({ "auth": token }),
                    None => json!({}),
                };
                report.auths.insert(host.clone(), value);
            }
            Err(err) => report.invalid.push(InvalidAuth {
                host: host.clone(),
                reason: err.to_string(),
            }),
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
