//! Token endpoint responses as stored and handed to callers.

use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};

use crate::error::{credential_error, CredentialErrorKind, Error};

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn expose_opt<S: Serializer>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableCredentials {
    #[serde(serialize_with = "expose")]
    pub access_token: SecretString,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default, serialize_with = "expose_opt")]
    pub refresh_token: Option<SecretString>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSpotCredentials {
    #[serde(serialize_with = "expose")]
    pub access_token: SecretString,
    #[serde(serialize_with = "expose")]
    pub refresh_token: SecretString,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionCredentials {
    #[serde(serialize_with = "expose")]
    pub access_token: SecretString,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub workspace_icon: Option<String>,
    /// Owner object as returned by Notion (user or workspace).
    #[serde(default)]
    pub owner: Option<serde_json::Value>,
}

/// Parse a credential string produced by `get_credentials`.
pub fn parse<T: DeserializeOwned>(credentials: &str) -> Result<T, Error> {
    serde_json::from_str(credentials).map_err(|e| {
        credential_error(
            CredentialErrorKind::Invalid,
            &format!("Invalid credentials: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_airtable_optional_fields_default() {
        let creds: AirtableCredentials = parse(r#"{"access_token":"tok"}"#).unwrap();
        assert_eq!(creds.access_token.expose_secret(), "tok");
        assert!(creds.refresh_token.is_none());
        assert!(creds.expires_in.is_none());
    }

    #[test]
    fn test_serialization_exposes_tokens() {
        let creds: AirtableCredentials =
            parse(r#"{"access_token":"tok","refresh_token":"ref","expires_in":3600}"#).unwrap();
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["access_token"], "tok");
        assert_eq!(json["refresh_token"], "ref");
        assert_eq!(json["expires_in"], 3600);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let creds: NotionCredentials = parse(r#"{"access_token":"very-secret"}"#).unwrap();
        assert!(!format!("{creds:?}").contains("very-secret"));
    }

    #[test]
    fn test_hubspot_requires_refresh_token() {
        let err = parse::<HubSpotCredentials>(r#"{"access_token":"tok"}"#).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Credential(CredentialErrorKind::Invalid)
        );
    }

    #[test]
    fn test_notion_keeps_owner_object() {
        let creds: NotionCredentials = parse(
            r#"{"access_token":"tok","workspace_name":"Acme","owner":{"type":"user","user":{"id":"u1"}}}"#,
        )
        .unwrap();
        assert_eq!(creds.workspace_name.as_deref(), Some("Acme"));
        assert_eq!(creds.owner.unwrap()["user"]["id"], "u1");
    }

    #[test]
    fn test_garbage_is_invalid() {
        let err = parse::<NotionCredentials>("not json").unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Credential(CredentialErrorKind::Invalid)
        );
    }
}
