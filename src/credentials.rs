// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Validation of broker credentials secrets.
//!
//! A broker's credentials secret stores a JSON object under the
//! [`CREDENTIALS_SECRET_KEY`] data key:
//!
//! ```json
//! {"username": "broker-user", "password": "broker-pass"}
//! ```
//!
//! Extra fields are allowed and ignored. Validation is a pure function of the
//! secret payload.

use crate::constants::{
    CREDENTIALS_SECRET_KEY, PASSWORD_CREDENTIALS_KEY, USERNAME_CREDENTIALS_KEY,
};
use k8s_openapi::ByteString;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors produced while validating a credentials secret.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    /// The credentials key is missing or does not hold a JSON object.
    #[error("invalid credentials secret {secret:?}: {reason}")]
    MalformedCredentials {
        /// Name of the offending secret
        secret: String,
        /// Parser error
        reason: String,
    },

    /// The credentials object lacks a required field.
    #[error("broker credentials secret {secret:?} does not specify {field:?}")]
    MissingCredentialField {
        /// Name of the offending secret
        secret: String,
        /// The missing field
        field: &'static str,
    },
}

/// Credentials extracted from a validated secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validate the payload of a broker credentials secret.
///
/// # Arguments
///
/// * `secret_name` - Name of the secret, used in error messages
/// * `data` - The secret's `data` map, if any
///
/// # Errors
///
/// * [`CredentialsError::MalformedCredentials`] if the credentials key is absent or
///   is not a JSON object
/// * [`CredentialsError::MissingCredentialField`] if `username` or `password` is absent
///
/// # Example
///
/// ```rust
/// use catalogsync::credentials::validate_credentials;
/// use k8s_openapi::ByteString;
/// use std::collections::BTreeMap;
///
/// let mut data = BTreeMap::new();
/// data.insert(
///     "credentials".to_string(),
///     ByteString(br#"{"username":"u","password":"p"}"#.to_vec()),
/// );
///
/// let creds = validate_credentials("broker-creds", Some(&data)).unwrap();
/// assert_eq!(creds.username, "u");
/// ```
pub fn validate_credentials(
    secret_name: &str,
    data: Option<&BTreeMap<String, ByteString>>,
) -> Result<BrokerCredentials, CredentialsError> {
    let raw: &[u8] = data
        .and_then(|d| d.get(CREDENTIALS_SECRET_KEY))
        .map_or(&[], |bytes| bytes.0.as_slice());

    // A JSON `null` decodes to an empty object, so it is reported as a missing field
    let creds: Map<String, Value> = serde_json::from_slice::<Option<Map<String, Value>>>(raw)
        .map_err(|e| CredentialsError::MalformedCredentials {
            secret: secret_name.to_string(),
            reason: e.to_string(),
        })?
        .unwrap_or_default();

    let username = required_field(secret_name, &creds, USERNAME_CREDENTIALS_KEY)?;
    let password = required_field(secret_name, &creds, PASSWORD_CREDENTIALS_KEY)?;

    Ok(BrokerCredentials { username, password })
}

fn required_field(
    secret_name: &str,
    creds: &Map<String, Value>,
    field: &'static str,
) -> Result<String, CredentialsError> {
    match creds.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        // Presence is what matters; non-string values are used as their JSON text
        Some(other) => Ok(other.to_string()),
        None => Err(CredentialsError::MissingCredentialField {
            secret: secret_name.to_string(),
            field,
        }),
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod credentials_tests;
