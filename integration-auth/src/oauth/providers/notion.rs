//! Notion OAuth provider implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{authorization_url, credentials_json, fetch_failed, ProviderConfig};
use crate::credentials::{self, CredentialStore, NotionCredentials};
use crate::error::Error;
use crate::http::{AuthenticatedClient, AuthenticatedClientBuilder};
use crate::item::{IntegrationItem, ItemType};
use crate::oauth::{
    CallbackParams, ClientAuth, CloseWindow, ProviderKind, Strategy, TokenEncoding, TokenRequest,
};
use crate::store::KeyValueStore;

const NAME: &str = ProviderKind::Notion.as_str();
const LABEL: &str = "Notion";
const NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// First non-null value stored under `key`, searching depth first.
fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if let Some(found) = map.get(key).filter(|v| !v.is_null()) {
                return Some(found);
            }
            map.values().find_map(|child| find_key(child, key))
        }
        Value::Array(values) => values.iter().find_map(|child| find_key(child, key)),
        _ => None,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_time(value: Option<&Value>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?.as_str()?)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// Id of the typed parent (`page_id`, `database_id`, `block_id`), none for the workspace.
fn parent_id(result: &Value) -> Option<String> {
    let parent = result.get("parent")?;
    let parent_type = parent.get("type")?.as_str()?;
    if parent_type == "workspace" {
        return None;
    }
    parent.get(parent_type)?.as_str().map(str::to_string)
}

fn search_item(result: &Value) -> IntegrationItem {
    let object = result.get("object").and_then(Value::as_str).unwrap_or("unknown");
    let name = result
        .get("properties")
        .and_then(|properties| find_key(properties, "content"))
        .or_else(|| find_key(result, "content"))
        .map(display)
        .unwrap_or_else(|| "multi_select".to_string());

    IntegrationItem {
        id: result.get("id").and_then(Value::as_str).map(str::to_string),
        item_type: match object {
            "page" => ItemType::Pages,
            "database" => ItemType::Databases,
            _ => ItemType::Unknown,
        },
        name: Some(format!("{object} {name}")),
        creation_time: parse_time(result.get("created_time")),
        last_modified_time: parse_time(result.get("last_edited_time")),
        parent_id: parent_id(result),
        ..Default::default()
    }
}

/// Notion OAuth provider.
///
/// Standard authorization code flow with a JSON token request and HTTP Basic
/// client authentication. Lists everything the integration can see through
/// `/v1/search`.
pub struct Provider {
    config: ProviderConfig,
    authorization_url: String,
    strategy: Strategy,
    credentials: CredentialStore,
    token_client: reqwest::Client,
    api_client: AuthenticatedClient,
}

impl Provider {
    /// Create a new Notion provider.
    pub fn new(
        config: ProviderConfig,
        store: Arc<dyn KeyValueStore>,
        http: &AuthenticatedClientBuilder,
    ) -> Result<Self, Error> {
        let authorization_url = authorization_url(
            &config.urls.auth_url,
            &[
                ("client_id", config.client.client_id.as_str()),
                ("response_type", "code"),
                ("owner", "user"),
                ("redirect_uri", config.redirect_uri.as_str()),
            ],
        );

        Ok(Self {
            authorization_url,
            strategy: Strategy::standard(NAME, store.clone()),
            credentials: CredentialStore::new(NAME, store, config.credentials_ttl),
            token_client: http.build_plain()?,
            api_client: http.build()?,
            config,
        })
    }
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn name(&self) -> &str {
        NAME
    }

    async fn authorize(&self, user_id: &str, org_id: &str) -> Result<String, Error> {
        let authorization = self
            .strategy
            .authorize(user_id, org_id, self.config.state_ttl)
            .await?;
        Ok(format!(
            "{}&state={}",
            self.authorization_url,
            urlencoding::encode(&authorization.encoded_state)
        ))
    }

    async fn oauth_callback(&self, params: &CallbackParams) -> Result<CloseWindow, Error> {
        let verified = self.strategy.callback(params).await?;

        let credentials: NotionCredentials = TokenRequest {
            provider: NAME,
            token_url: &self.config.urls.token_url,
            client: &self.config.client,
            auth: ClientAuth::Basic,
            encoding: TokenEncoding::Json,
            params: vec![
                ("grant_type", "authorization_code".to_string()),
                ("code", verified.code),
                ("redirect_uri", self.config.redirect_uri.clone()),
            ],
        }
        .send(&self.token_client)
        .await?;

        self.credentials
            .put(&verified.user_id, &verified.org_id, &credentials)
            .await?;
        Ok(CloseWindow)
    }

    async fn get_credentials(
        &self,
        user_id: &str,
        org_id: &str,
    ) -> Result<serde_json::Value, Error> {
        let credentials: NotionCredentials = self.credentials.take(user_id, org_id).await?;
        credentials_json(&credentials)
    }

    async fn list_items(&self, credentials: &str) -> Result<Vec<IntegrationItem>, Error> {
        let credentials: NotionCredentials = credentials::parse(credentials)?;

        let response = self
            .api_client
            .post(format!("{}/v1/search", self.config.urls.api_base_url))
            .bearer_auth(credentials.access_token.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| fetch_failed(LABEL, e))?;

        if !response.status().is_success() {
            return Err(fetch_failed(
                LABEL,
                format!("status={}", response.status()),
            ));
        }

        let search: SearchResponse = response.json().await.map_err(|e| fetch_failed(LABEL, e))?;
        let items: Vec<IntegrationItem> = search.results.iter().map(search_item).collect();

        info!("Retrieved {} Notion integration items", items.len());
        Ok(items)
    }
}
