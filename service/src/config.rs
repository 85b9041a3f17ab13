use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use integration_auth::http::HttpClientConfig;
use integration_auth::oauth::providers::{ProviderConfig, ProviderUrls};
use integration_auth::oauth::{ClientCredentials, ProviderKind};
use log::LevelFilter;
use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 8000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap_or(LevelFilter::Info)),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap_or(RustEnv::Development)),
    )]
    pub runtime_env: RustEnv,

    /// Timeout in seconds for every outbound call to a provider
    #[arg(long, env, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub http_timeout_secs: u64,

    /// Retries for provider listing calls. Token exchanges are never retried.
    #[arg(long, env, default_value_t = 2)]
    pub http_max_retries: u32,

    /// Seconds between purges of expired keys from the in-process store
    #[arg(long, env, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub store_sweep_interval_secs: u64,

    /// The OAuth client ID registered with Airtable.
    #[arg(long, env)]
    airtable_client_id: Option<String>,
    /// The OAuth client secret registered with Airtable.
    #[arg(long, env, hide_env_values = true)]
    airtable_client_secret: Option<String>,
    /// The redirect URI registered with Airtable.
    #[arg(long, env)]
    airtable_redirect_uri: Option<String>,
    /// Space separated Airtable scopes to request.
    #[arg(
        long,
        env,
        default_value = "data.records:read data.records:write data.recordComments:read data.recordComments:write schema.bases:read schema.bases:write"
    )]
    airtable_scope: String,
    #[arg(long, env, default_value_t = 600)]
    airtable_state_expiry_seconds: u64,
    #[arg(long, env, default_value_t = 600)]
    airtable_credentials_expiry_seconds: u64,

    /// The OAuth client ID registered with HubSpot.
    #[arg(long, env)]
    hubspot_client_id: Option<String>,
    /// The OAuth client secret registered with HubSpot.
    #[arg(long, env, hide_env_values = true)]
    hubspot_client_secret: Option<String>,
    /// The redirect URI registered with HubSpot.
    #[arg(long, env)]
    hubspot_redirect_uri: Option<String>,
    /// Space separated HubSpot scopes to request.
    #[arg(long, env, default_value = "crm.objects.contacts.read oauth")]
    hubspot_scope: String,
    #[arg(long, env, default_value_t = 600)]
    hubspot_state_expiry_seconds: u64,
    #[arg(long, env, default_value_t = 600)]
    hubspot_credentials_expiry_seconds: u64,

    /// The OAuth client ID of the Notion public integration.
    #[arg(long, env)]
    notion_client_id: Option<String>,
    /// The OAuth client secret of the Notion public integration.
    #[arg(long, env, hide_env_values = true)]
    notion_client_secret: Option<String>,
    /// The redirect URI registered with Notion.
    #[arg(long, env)]
    notion_redirect_uri: Option<String>,
    /// Notion grants capabilities per integration, so no scope is sent by default.
    #[arg(long, env)]
    notion_scope: Option<String>,
    #[arg(long, env, default_value_t = 600)]
    notion_state_expiry_seconds: u64,
    #[arg(long, env, default_value_t = 600)]
    notion_credentials_expiry_seconds: u64,
}

/// Raw per-provider settings as parsed.
struct ProviderSettings<'a> {
    client_id: &'a Option<String>,
    client_secret: &'a Option<String>,
    redirect_uri: &'a Option<String>,
    scope: Option<&'a str>,
    state_expiry_seconds: u64,
    credentials_expiry_seconds: u64,
    urls: ProviderUrls,
}

fn configured(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }

    pub fn store_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.store_sweep_interval_secs)
    }

    /// Settings shared by every provider's outbound HTTP clients.
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(self.http_timeout_secs),
            max_retries: self.http_max_retries,
            ..Default::default()
        }
    }

    fn provider_settings(&self, kind: ProviderKind) -> ProviderSettings<'_> {
        match kind {
            ProviderKind::Airtable => ProviderSettings {
                client_id: &self.airtable_client_id,
                client_secret: &self.airtable_client_secret,
                redirect_uri: &self.airtable_redirect_uri,
                scope: Some(self.airtable_scope.as_str()),
                state_expiry_seconds: self.airtable_state_expiry_seconds,
                credentials_expiry_seconds: self.airtable_credentials_expiry_seconds,
                urls: ProviderUrls::airtable(),
            },
            ProviderKind::Hubspot => ProviderSettings {
                client_id: &self.hubspot_client_id,
                client_secret: &self.hubspot_client_secret,
                redirect_uri: &self.hubspot_redirect_uri,
                scope: Some(self.hubspot_scope.as_str()),
                state_expiry_seconds: self.hubspot_state_expiry_seconds,
                credentials_expiry_seconds: self.hubspot_credentials_expiry_seconds,
                urls: ProviderUrls::hubspot(),
            },
            ProviderKind::Notion => ProviderSettings {
                client_id: &self.notion_client_id,
                client_secret: &self.notion_client_secret,
                redirect_uri: &self.notion_redirect_uri,
                scope: self.notion_scope.as_deref(),
                state_expiry_seconds: self.notion_state_expiry_seconds,
                credentials_expiry_seconds: self.notion_credentials_expiry_seconds,
                urls: ProviderUrls::notion(),
            },
        }
    }

    /// Returns the provider's configuration when its client id, client secret and
    /// redirect URI are all set.
    pub fn provider_config(&self, kind: ProviderKind) -> Option<ProviderConfig> {
        let settings = self.provider_settings(kind);
        let client_id = configured(settings.client_id)?;
        let client_secret = configured(settings.client_secret)?;
        let redirect_uri = configured(settings.redirect_uri)?;

        let client = ClientCredentials::new(
            client_id.to_string(),
            SecretString::from(client_secret.to_string()),
        );
        let mut config = ProviderConfig::new(client, redirect_uri, settings.urls)
            .with_state_ttl(Duration::from_secs(settings.state_expiry_seconds))
            .with_credentials_ttl(Duration::from_secs(settings.credentials_expiry_seconds));
        if let Some(scope) = settings.scope {
            config = config.with_scope(scope);
        }
        Some(config)
    }
}
