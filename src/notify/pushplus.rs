// PushPlus (pushplus.plus) HTML notifications

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use super::{Notifier, NotifyError};
use crate::models::Device;

pub const DEFAULT_ENDPOINT: &str = "https://www.pushplus.plus/send";
const TITLE: &str = "有新的设备连接到家庭网络了";

pub struct PushPlusNotifier {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct PushPayload<'a> {
    token: &'a str,
    title: &'a str,
    content: String,
    template: &'a str,
}

#[derive(Deserialize)]
struct PushReply {
    code: Option<i64>,
    msg: Option<String>,
}

impl PushPlusNotifier {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
            timeout,
        }
    }

    /// HTML body listing each device's name, IP and MAC.
    pub fn compose_content(devices: &[Device]) -> String {
        let blocks: String = devices
            .iter()
            .map(|d| {
                format!(
                    r#"<div style="margin: 10px 0; padding: 10px; border: 1px solid #eee; border-radius: 5px;"><strong>设备名称:</strong> {}<br><strong>IP地址:</strong> {}<br><strong>MAC地址:</strong> {}</div>"#,
                    escape_html(&d.name),
                    escape_html(&d.ip_address),
                    d.mac_address,
                )
            })
            .collect();
        format!(
            r#"<div style="font-family: Arial, sans-serif; line-height: 1.6;"><h3 style="color: #333; border-bottom: 2px solid #007bff; padding-bottom: 10px;">检测到新设备连接</h3><p style="color: #666; margin-bottom: 20px;"><strong>请注意：</strong>以下设备是首次连接到家庭网络，请及时固定IP地址并修改设备名称。</p>{blocks}<p style="color: #888; font-size: 12px; margin-top: 20px;">-- TP-Link Device Manager 自动通知 --</p></div>"#
        )
    }
}

#[async_trait]
impl Notifier for PushPlusNotifier {
    async fn notify_new_devices(&self, devices: &[Device]) -> Result<(), NotifyError> {
        let payload = PushPayload {
            token: &self.token,
            title: TITLE,
            content: Self::compose_content(devices),
            template: "html",
        };
        let reply: PushReply = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?
            .json()
            .await?;
        if reply.code != Some(200) {
            return Err(NotifyError::Rejected {
                code: reply.code,
                message: reply.msg.unwrap_or_else(|| "unknown error".into()),
            });
        }
        info!(new_devices = devices.len(), "new-device notification sent");
        Ok(())
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
