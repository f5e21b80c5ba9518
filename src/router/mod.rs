// Router adapter seam: handshake, host table, host naming

mod tplink;

pub use tplink::TplinkConnector;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid router address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-zero `error_code` in a router reply.
    #[error("router error {code}: {message}")]
    Vendor { code: i64, message: String },

    #[error("unexpected router response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One row of the router's host table, still in vendor representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouterHost {
    /// As reported, usually dash-delimited lowercase.
    pub mac: String,
    pub hostname: Option<String>,
    pub ip: String,
    /// Vendor link code (`"0"` wired, `"1"` wireless on TP-Link firmware).
    pub link_code: String,
    /// Vendor radio band code for wireless hosts.
    pub wifi_mode: Option<String>,
    pub is_guest: bool,
    pub active: bool,
    pub down_speed: Option<u64>,
    pub up_speed: Option<u64>,
    pub packets_sent: Option<u64>,
    pub packets_received: Option<u64>,
}

/// Authenticated session with a router. One handle per successful login.
#[async_trait]
pub trait RouterClient: Send + Sync {
    async fn hosts(&self) -> Result<Vec<RouterHost>, RouterError>;

    /// `mac` is in router (dash-delimited) format.
    async fn set_host_name(&self, mac: &str, name: &str) -> Result<(), RouterError>;
}

/// Performs the login handshake and hands back a session.
#[async_trait]
pub trait RouterConnector: Send + Sync {
    async fn connect(
        &self,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<Arc<dyn RouterClient>, RouterError>;
}

/// `192.168.0.1` becomes `http://192.168.0.1/`; explicit schemes are kept.
pub fn normalize_host(host: &str) -> Result<Url, RouterError> {
    let host = host.trim();
    let lower = host.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    Ok(Url::parse(&with_scheme)?)
}
