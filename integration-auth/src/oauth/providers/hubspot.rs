//! HubSpot OAuth provider implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{error, info};

use super::{authorization_url, credentials_json, ProviderConfig};
use crate::credentials::{self, CredentialStore, HubSpotCredentials};
use crate::error::{items_error, Error, ErrorKind, ItemsErrorKind};
use crate::http::{AuthenticatedClient, AuthenticatedClientBuilder};
use crate::item::{IntegrationItem, ItemType};
use crate::oauth::{
    CallbackParams, ClientAuth, CloseWindow, ProviderKind, Strategy, TokenEncoding, TokenRequest,
};
use crate::store::KeyValueStore;

const NAME: &str = ProviderKind::Hubspot.as_str();
const APP_URL: &str = "https://app.hubspot.com";
const PAGE_LIMIT: &str = "100";
const ASSOCIATIONS: &str = "contacts,companies,deals";

/// How one CRM object type is fetched and named.
struct ObjectConfig {
    object_type: &'static str,
    item_type: ItemType,
    properties: &'static str,
    name_fields: &'static [&'static str],
    fallback_field: &'static str,
}

const OBJECT_CONFIGS: [ObjectConfig; 3] = [
    ObjectConfig {
        object_type: "contacts",
        item_type: ItemType::Contacts,
        properties: "firstname,lastname,email,phone,company,createdate,lastmodifieddate",
        name_fields: &["firstname", "lastname"],
        fallback_field: "email",
    },
    ObjectConfig {
        object_type: "companies",
        item_type: ItemType::Companies,
        properties: "name,domain,industry,city,state,country,createdate,lastmodifieddate",
        name_fields: &["name"],
        fallback_field: "domain",
    },
    ObjectConfig {
        object_type: "deals",
        item_type: ItemType::Deals,
        properties: "dealname,amount,dealstage,closedate,pipeline,createdate,lastmodifieddate",
        name_fields: &["dealname"],
        fallback_field: "amount",
    },
];

#[derive(Debug, Deserialize)]
struct ObjectsPage {
    #[serde(default)]
    results: Vec<CrmObject>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrmObject {
    id: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    associations: Map<String, Value>,
    #[serde(default)]
    archived: bool,
    updated_at: Option<String>,
}

/// Property values arrive as strings, occasionally as numbers.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts 13-digit epoch milliseconds or RFC 3339.
fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    if value.len() == 13 && value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse().ok().and_then(DateTime::from_timestamp_millis);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn object_name(object: &CrmObject, config: &ObjectConfig, object_id: &str) -> String {
    let parts: Vec<String> = config
        .name_fields
        .iter()
        .filter_map(|field| text(object.properties.get(*field)))
        .collect();
    if !parts.is_empty() {
        return parts.join(" ");
    }
    text(object.properties.get(config.fallback_field))
        .unwrap_or_else(|| format!("{} {}", title_case(config.object_type), object_id))
}

fn associated_ids(associations: &Map<String, Value>) -> Vec<String> {
    associations
        .values()
        .filter_map(|association| association.get("results")?.as_array())
        .flatten()
        .filter_map(|result| text(result.get("id")))
        .collect()
}

fn object_item(object: &CrmObject, config: &ObjectConfig) -> IntegrationItem {
    let object_id = object.id.clone().unwrap_or_else(|| "Unknown".to_string());
    let children = associated_ids(&object.associations);
    let last_modified = text(object.properties.get("lastmodifieddate")).or_else(|| object.updated_at.clone());

    IntegrationItem {
        name: Some(object_name(object, config, &object_id)),
        item_type: config.item_type,
        directory: config.item_type == ItemType::Companies,
        creation_time: text(object.properties.get("createdate")).and_then(|t| parse_time(&t)),
        last_modified_time: last_modified.and_then(|t| parse_time(&t)),
        url: Some(format!("{}/{}/{}", APP_URL, config.object_type, object_id)),
        children: (!children.is_empty()).then_some(children),
        mime_type: Some(format!("application/vnd.hubspot.{}", config.object_type)),
        delta: object.updated_at.clone(),
        visibility: Some(!object.archived),
        id: Some(object_id),
        ..Default::default()
    }
}

/// HubSpot OAuth provider.
///
/// Standard authorization code flow with the client secret in the token request
/// body. Lists contacts, companies and deals.
pub struct Provider {
    config: ProviderConfig,
    authorization_url: String,
    strategy: Strategy,
    credentials: CredentialStore,
    token_client: reqwest::Client,
    api_client: AuthenticatedClient,
}

impl Provider {
    /// Create a new HubSpot provider.
    pub fn new(
        config: ProviderConfig,
        store: Arc<dyn KeyValueStore>,
        http: &AuthenticatedClientBuilder,
    ) -> Result<Self, Error> {
        let mut params = vec![("client_id", config.client.client_id.as_str())];
        if let Some(scope) = &config.scope {
            params.push(("scope", scope.as_str()));
        }
        params.push(("redirect_uri", config.redirect_uri.as_str()));
        let authorization_url = authorization_url(&config.urls.auth_url, &params);

        Ok(Self {
            authorization_url,
            strategy: Strategy::standard(NAME, store.clone()),
            credentials: CredentialStore::new(NAME, store, config.credentials_ttl),
            token_client: http.build_plain()?,
            api_client: http.build()?,
            config,
        })
    }

    /// Page through one object type. A 401 fails the call; any other failing
    /// page ends pagination with what was collected.
    async fn fetch_objects(
        &self,
        access_token: &str,
        config: &ObjectConfig,
    ) -> Result<Vec<CrmObject>, Error> {
        let url = format!(
            "{}/crm/v3/objects/{}",
            self.config.urls.api_base_url, config.object_type
        );
        let mut objects = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![
                ("limit", PAGE_LIMIT),
                ("properties", config.properties),
                ("associations", ASSOCIATIONS),
            ];
            if let Some(after) = &after {
                query.push(("after", after.as_str()));
            }

            let response = self
                .api_client
                .get(&url)
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                error!("HubSpot rejected the access token while listing {}", config.object_type);
                return Err(items_error(
                    ItemsErrorKind::Unauthorized,
                    "Access token expired",
                ));
            }
            if !status.is_success() {
                error!("Failed to fetch {}: status={}", config.object_type, status);
                break;
            }

            let page: ObjectsPage = response.json().await?;
            objects.extend(page.results);

            match page.paging.and_then(|p| p.next).and_then(|n| n.after) {
                Some(next) if !next.is_empty() => after = Some(next),
                _ => break,
            }
        }

        Ok(objects)
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

        let credentials: HubSpotCredentials = TokenRequest {
            provider: NAME,
            token_url: &self.config.urls.token_url,
            client: &self.config.client,
            auth: ClientAuth::RequestBody,
            encoding: TokenEncoding::Form,
            params: vec![
                ("grant_type", "authorization_code".to_string()),
                ("client_id", self.config.client.client_id.clone()),
                ("redirect_uri", self.config.redirect_uri.clone()),
                ("code", verified.code),
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
        let credentials: HubSpotCredentials = self.credentials.take(user_id, org_id).await?;
        credentials_json(&credentials)
    }

    async fn list_items(&self, credentials: &str) -> Result<Vec<IntegrationItem>, Error> {
        let credentials: HubSpotCredentials = credentials::parse(credentials)?;
        let access_token = credentials.access_token.expose_secret();
        let mut items = Vec::new();

        for config in &OBJECT_CONFIGS {
            match self.fetch_objects(access_token, config).await {
                Ok(objects) => {
                    info!("Fetched {} {} from HubSpot", objects.len(), config.object_type);
                    items.extend(objects.iter().map(|object| object_item(object, config)));
                }
                Err(e) if e.error_kind == ErrorKind::Items(ItemsErrorKind::Unauthorized) => {
                    return Err(e)
                }
                // One object type failing does not hide the others.
                Err(e) => error!("Error fetching {} from HubSpot: {}", config.object_type, e),
            }
        }

        info!("Retrieved {} total HubSpot integration items", items.len());
        Ok(items)
    }
}
