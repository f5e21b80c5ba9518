// TP-Link JSON "ds" API client (stok session in the request path)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::{Credentials, RouterClient, RouterConnector, RouterError, RouterHost};

/// Builds authenticated [`TplinkClient`]s.
#[derive(Debug, Clone)]
pub struct TplinkConnector {
    timeout: Duration,
    verify_ssl: bool,
}

impl TplinkConnector {
    pub fn new(timeout: Duration, verify_ssl: bool) -> Self {
        Self {
            timeout,
            verify_ssl,
        }
    }

    fn build_http(&self) -> Result<reqwest::Client, RouterError> {
        Ok(reqwest::Client::builder()
            // Home routers ship self-signed certificates.
            .danger_accept_invalid_certs(!self.verify_ssl)
            .cookie_store(true)
            .timeout(self.timeout)
            .build()?)
    }
}

#[async_trait]
impl RouterConnector for TplinkConnector {
    #[instrument(skip(self, credentials), fields(router = %base_url, operation = "login"))]
    async fn connect(
        &self,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<Arc<dyn RouterClient>, RouterError> {
        let http = self.build_http()?;
        let body = json!({
            "method": "do",
            "login": {
                "username": credentials.username,
                "password": credentials.password,
            }
        });
        let reply: LoginReply = http
            .post(base_url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_code(reply.error_code, reply.error_msg)?;
        let stok = reply
            .stok
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RouterError::Malformed("login reply carries no stok".into()))?;
        debug!("router session established");
        Ok(Arc::new(TplinkClient {
            http,
            ds_url: format!("{}/stok={}/ds", base_url.as_str().trim_end_matches('/'), stok),
        }))
    }
}

/// Session bound to one `stok`.
pub struct TplinkClient {
    http: reqwest::Client,
    ds_url: String,
}

impl TplinkClient {
    async fn ds<T: for<'de> Deserialize<'de>>(&self, body: Value) -> Result<T, RouterError> {
        Ok(self
            .http
            .post(&self.ds_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json; charset=UTF-8")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

#[async_trait]
impl RouterClient for TplinkClient {
    #[instrument(skip(self), fields(operation = "get_hosts"))]
    async fn hosts(&self) -> Result<Vec<RouterHost>, RouterError> {
        let reply: HostsReply = self
            .ds(json!({ "hosts_info": { "table": "host_info" }, "method": "get" }))
            .await?;
        check_code(reply.error_code, reply.error_msg)?;
        let table = reply
            .hosts_info
            .ok_or_else(|| RouterError::Malformed("missing hosts_info".into()))?;
        // Each list entry is a single-key object such as {"host_info_3": {...}}.
        let hosts = table
            .host_info
            .into_iter()
            .flat_map(BTreeMap::into_values)
            .map(RawHost::into_host)
            .collect();
        Ok(hosts)
    }

    #[instrument(skip(self), fields(operation = "set_name"))]
    async fn set_host_name(&self, mac: &str, name: &str) -> Result<(), RouterError> {
        let reply: StatusReply = self
            .ds(json!({
                "hosts_info": {
                    "set_name": {
                        "mac": mac,
                        "name": name,
                        "down_limit": "0",
                        "up_limit": "0",
                        "is_blocked": "0",
                    }
                },
                "method": "do"
            }))
            .await?;
        check_code(reply.error_code, reply.error_msg)
    }
}

fn check_code(code: Option<i64>, message: Option<String>) -> Result<(), RouterError> {
    match code.unwrap_or(0) {
        0 => Ok(()),
        code => Err(RouterError::Vendor {
            code,
            message: message.unwrap_or_else(|| "unknown error".into()),
        }),
    }
}

#[derive(Deserialize)]
struct LoginReply {
    error_code: Option<i64>,
    error_msg: Option<String>,
    stok: Option<String>,
}

#[derive(Deserialize)]
struct StatusReply {
    error_code: Option<i64>,
    error_msg: Option<String>,
}

#[derive(Deserialize)]
struct HostsReply {
    error_code: Option<i64>,
    error_msg: Option<String>,
    hosts_info: Option<HostTable>,
}

#[derive(Deserialize)]
struct HostTable {
    #[serde(default)]
    host_info: Vec<BTreeMap<String, RawHost>>,
}

/// Firmware reports most scalars as strings ("1", "0", "1024"); some report numbers.
#[derive(Deserialize)]
struct RawHost {
    mac: String,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    ip: String,
    #[serde(rename = "type", default)]
    link_code: Option<Value>,
    #[serde(default)]
    wifi_mode: Option<Value>,
    #[serde(default)]
    is_guest: Option<Value>,
    #[serde(default)]
    active: Option<Value>,
    #[serde(default)]
    down_speed: Option<Value>,
    #[serde(default)]
    up_speed: Option<Value>,
    #[serde(default)]
    packets_sent: Option<Value>,
    #[serde(default)]
    packets_received: Option<Value>,
}

impl RawHost {
    fn into_host(self) -> RouterHost {
        RouterHost {
            mac: self.mac,
            hostname: self.hostname.filter(|h| !h.trim().is_empty()),
            ip: self.ip,
            link_code: self.link_code.as_ref().map(scalar_text).unwrap_or_default(),
            wifi_mode: self.wifi_mode.as_ref().map(scalar_text),
            is_guest: self.is_guest.as_ref().is_some_and(flag),
            // Hosts without an activity field are in the table because they are online.
            active: self.active.as_ref().is_none_or(flag),
            down_speed: self.down_speed.as_ref().and_then(counter),
            up_speed: self.up_speed.as_ref().and_then(counter),
            packets_sent: self.packets_sent.as_ref().and_then(counter),
            packets_received: self.packets_received.as_ref().and_then(counter),
        }
    }
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true" | "on"),
        _ => false,
    }
}

fn counter(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
