use serde::Deserialize;
use std::time::Duration;

use crate::notify::pushplus::DEFAULT_ENDPOINT;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub router: RouterConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Account used for the handshake when the login request names none.
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between two renames of a batch.
    #[serde(default = "default_rename_pace_ms")]
    pub rename_pace_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            verify_ssl: false,
            timeout_secs: default_timeout_secs(),
            rename_pace_ms: default_rename_pace_ms(),
        }
    }
}

impl RouterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rename_pace(&self) -> Duration {
        Duration::from_millis(self.rename_pace_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding MAC -> last seen name.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// PushPlus token; notifications are off without one. `PUSHPLUS_TOKEN` overrides it.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_username() -> String {
    "admin".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_rename_pace_ms() -> u64 {
    500
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config = Self::load_from_str(&s)?;
        if let Ok(token) = std::env::var("PUSHPLUS_TOKEN") {
            config.notify.token = Some(token);
        }
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Token with blanks treated as unset.
    pub fn push_token(&self) -> Option<&str> {
        self.notify
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.router.username.is_empty(),
            "router.username must be non-empty"
        );
        anyhow::ensure!(
            self.router.timeout_secs > 0,
            "router.timeout_secs must be > 0, got {}",
            self.router.timeout_secs
        );
        anyhow::ensure!(!self.store.path.is_empty(), "store.path must be non-empty");
        anyhow::ensure!(
            self.notify.endpoint.starts_with("http://")
                || self.notify.endpoint.starts_with("https://"),
            "notify.endpoint must be an http(s) URL, got {:?}",
            self.notify.endpoint
        );
        anyhow::ensure!(
            self.notify.timeout_secs > 0,
            "notify.timeout_secs must be > 0, got {}",
            self.notify.timeout_secs
        );
        Ok(())
    }
}
