// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `credentials.rs`

#[cfg(test)]
mod tests {
    use crate::credentials::{validate_credentials, CredentialsError};
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    fn secret_data(payload: &str) -> BTreeMap<String, ByteString> {
        let mut data = BTreeMap::new();
        data.insert(
            "credentials".to_string(),
            ByteString(payload.as_bytes().to_vec()),
        );
        data
    }

    #[test]
    fn test_valid_credentials() {
        let data = secret_data(r#"{"username":"broker-user","password":"broker-pass"}"#);

        let creds = validate_credentials("creds", Some(&data)).unwrap();

        assert_eq!(creds.username, "broker-user");
        assert_eq!(creds.password, "broker-pass");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let data = secret_data(r#"{"username":"u","password":"p","endpoint":"x"}"#);
        assert!(validate_credentials("creds", Some(&data)).is_ok());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let data = secret_data("{not json");

        let err = validate_credentials("creds", Some(&data)).unwrap_err();

        assert!(matches!(
            err,
            CredentialsError::MalformedCredentials { ref secret, .. } if secret == "creds"
        ));
        assert!(err.to_string().starts_with("invalid credentials secret \"creds\""));
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        let data = secret_data(r#"["username","password"]"#);
        let err = validate_credentials("creds", Some(&data)).unwrap_err();
        assert!(matches!(err, CredentialsError::MalformedCredentials { .. }));
    }

    #[test]
    fn test_missing_credentials_key_is_malformed() {
        let mut data = BTreeMap::new();
        data.insert("other".to_string(), ByteString(b"{}".to_vec()));

        let err = validate_credentials("creds", Some(&data)).unwrap_err();
        assert!(matches!(err, CredentialsError::MalformedCredentials { .. }));
    }

    #[test]
    fn test_secret_without_data_is_malformed() {
        let err = validate_credentials("creds", None).unwrap_err();
        assert!(matches!(err, CredentialsError::MalformedCredentials { .. }));
    }

    #[test]
    fn test_null_credentials_report_missing_username() {
        let data = secret_data("null");

        let err = validate_credentials("creds", Some(&data)).unwrap_err();

        assert_eq!(
            err,
            CredentialsError::MissingCredentialField {
                secret: "creds".to_string(),
                field: "username",
            }
        );
    }

    #[test]
    fn test_missing_username() {
        let data = secret_data(r#"{"password":"p"}"#);

        let err = validate_credentials("creds", Some(&data)).unwrap_err();

        assert_eq!(
            err,
            CredentialsError::MissingCredentialField {
                secret: "creds".to_string(),
                field: "username",
            }
        );
        assert_eq!(
            err.to_string(),
            "broker credentials secret \"creds\" does not specify \"username\""
        );
    }

    #[test]
    fn test_missing_password() {
        let data = secret_data(r#"{"username":"u"}"#);

        let err = validate_credentials("creds", Some(&data)).unwrap_err();

        assert!(matches!(
            err,
            CredentialsError::MissingCredentialField { field: "password", .. }
        ));
    }

    #[test]
    fn test_non_string_values_count_as_present() {
        let data = secret_data(r#"{"username":"u","password":12345}"#);

        let creds = validate_credentials("creds", Some(&data)).unwrap();
        assert_eq!(creds.password, "12345");
    }

    #[test]
    fn test_debug_redacts_password() {
        let data = secret_data(r#"{"username":"u","password":"hunter2"}"#);
        let creds = validate_credentials("creds", Some(&data)).unwrap();

        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
