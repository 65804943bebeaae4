use anyhow::{Context, Result};
use booru_client::{BooruClientConfig, BooruCredentials};
use fa_client::{FaClientConfig, FaCookies};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub content: ContentConfig,
    /// Self-hosted Danbooru-compatible booru (optional)
    #[serde(default)]
    pub booru: Option<BooruSourceConfig>,
    #[serde(default)]
    pub e621: Option<BooruSourceConfig>,
    #[serde(default)]
    pub furaffinity: Option<FurAffinityConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Operator receiving failure alerts
    pub owner_id: Option<i64>,
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "data/logs".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Consecutive fetch failures before the operator is alerted (default: 5)
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Minutes between cycles when a source has no subscriptions (default: 5)
    #[serde(default = "default_interval_min")]
    pub default_interval_min: u64,
    /// Posts fetched per query (default: 5)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            default_interval_min: default_interval_min(),
            page_size: default_page_size(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_interval_min() -> u64 {
    5
}

fn default_page_size() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Whitespace-separated tags that need a content warning
    #[serde(default = "default_spoiler_tags")]
    pub spoiler_tags: String,
    /// Where users manage their feeds, linked under every post
    #[serde(default)]
    pub footer_url: Option<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            spoiler_tags: default_spoiler_tags(),
            footer_url: None,
        }
    }
}

fn default_spoiler_tags() -> String {
    "gore bestiality noncon".to_string()
}

impl ContentConfig {
    pub fn spoiler_tags(&self) -> impl Iterator<Item = &str> {
        self.spoiler_tags.split_whitespace()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BooruSourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Value stored in `subscriptions.service_type`; defaults per section
    pub service_type: Option<String>,
    pub base_url: String,
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub user_agent: Option<String>,
}

impl BooruSourceConfig {
    pub fn client_config(&self) -> BooruClientConfig {
        let credentials = match (&self.username, &self.api_key) {
            (Some(username), Some(api_key)) => Some(BooruCredentials {
                username: username.clone(),
                api_key: api_key.clone(),
            }),
            _ => None,
        };

        BooruClientConfig {
            base_url: self.base_url.clone(),
            credentials,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FurAffinityConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// FAExport instance
    pub api_host: Option<String>,
    /// FurAffinity session cookies `a` and `b`
    pub cookie_a: Option<String>,
    pub cookie_b: Option<String>,
}

impl FurAffinityConfig {
    pub fn client_config(&self) -> FaClientConfig {
        let defaults = FaClientConfig::default();
        let cookies = match (&self.cookie_a, &self.cookie_b) {
            (Some(a), Some(b)) => Some(FaCookies {
                a: a.clone(),
                b: b.clone(),
            }),
            _ => None,
        };

        FaClientConfig {
            api_host: self.api_host.clone().unwrap_or(defaults.api_host),
            cookies,
        }
    }
}

fn default_enabled() -> bool {
    true
}

impl Config {
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(config::Environment::with_prefix("FEED").separator("__"));

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.logging.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}
