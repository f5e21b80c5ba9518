// Device service: login, listing, renaming and batch renaming

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::csv_io;
use crate::error::DeviceError;
use crate::models::{Device, MacAddress, RenameRequest, RenameResult};
use crate::router::{
    Credentials, RouterClient, RouterConnector, RouterError, RouterHost, normalize_host,
};

pub struct DeviceService {
    connector: Arc<dyn RouterConnector>,
    client: RwLock<Option<Arc<dyn RouterClient>>>,
    rename_pace: Duration,
}

impl DeviceService {
    pub fn new(connector: Arc<dyn RouterConnector>, rename_pace: Duration) -> Self {
        Self {
            connector,
            client: RwLock::new(None),
            rename_pace,
        }
    }

    /// Replaces any previous session on success; a failed login leaves the old one in place.
    #[instrument(skip(self, credentials), fields(operation = "login", username = %credentials.username))]
    pub async fn login(&self, host: &str, credentials: &Credentials) -> Result<(), DeviceError> {
        if host.trim().is_empty() || credentials.password.is_empty() {
            return Err(DeviceError::Validation(
                "host and password are required".into(),
            ));
        }
        let base_url =
            normalize_host(host).map_err(|source| DeviceError::Authentication { source })?;
        let client = self
            .connector
            .connect(&base_url, credentials)
            .await
            .map_err(|source| DeviceError::Authentication { source })?;
        *self.client.write().await = Some(client);
        info!(router = %base_url, "connected to router");
        Ok(())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.client.read().await.is_some()
    }

    async fn session(&self) -> Result<Arc<dyn RouterClient>, DeviceError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(DeviceError::NotAuthenticated)
    }

    /// Devices in router order. Hosts whose MAC cannot be parsed are dropped with a warning.
    pub async fn list_devices(&self) -> Result<Vec<Device>, DeviceError> {
        let client = self.session().await?;
        let hosts = client.hosts().await?;
        Ok(hosts.into_iter().filter_map(to_device).collect())
    }

    #[instrument(skip(self, mac), fields(operation = "rename", mac = %mac))]
    pub async fn rename_device(&self, mac: &MacAddress, new_name: &str) -> Result<(), DeviceError> {
        let request =
            RenameRequest::new(mac.clone(), new_name).map_err(DeviceError::Validation)?;
        let client = self.session().await?;
        client
            .set_host_name(&request.mac_address.to_router_format(), &request.new_name)
            .await
            .map_err(|e| DeviceError::Rename {
                mac: mac.clone(),
                message: match e {
                    RouterError::Vendor { message, .. } => message,
                    other => other.to_string(),
                },
            })
    }

    /// Renames one device after another, pausing between calls. Item failures are recorded,
    /// never fatal; `on_progress(index, total, result)` runs after every item with a 1-based index.
    pub async fn batch_rename<F>(
        &self,
        updates: &[RenameRequest],
        mut on_progress: F,
    ) -> Result<Vec<RenameResult>, DeviceError>
    where
        F: FnMut(usize, usize, &RenameResult) + Send,
    {
        self.session().await?;
        let total = updates.len();
        let mut results = Vec::with_capacity(total);
        for (i, update) in updates.iter().enumerate() {
            if i > 0 && !self.rename_pace.is_zero() {
                tokio::time::sleep(self.rename_pace).await;
            }
            let result = match self
                .rename_device(&update.mac_address, &update.new_name)
                .await
            {
                Ok(()) => RenameResult::ok(update),
                Err(e) => {
                    warn!(mac = %update.mac_address, error = %e, "batch item failed");
                    RenameResult::failed(update, e.to_string())
                }
            };
            on_progress(i + 1, total, &result);
            results.push(result);
        }
        Ok(results)
    }

    pub async fn export_csv(&self) -> Result<Vec<u8>, DeviceError> {
        let devices = self.list_devices().await?;
        csv_io::export(&devices)
    }
}

fn to_device(host: RouterHost) -> Option<Device> {
    let mac = match MacAddress::parse(&host.mac) {
        Ok(mac) => mac,
        Err(e) => {
            warn!(error = %e, "skipping router host");
            return None;
        }
    };
    let connection_type = connection_label(&host);
    Some(Device {
        name: host.hostname.unwrap_or_else(|| mac.to_string()),
        mac_address: mac,
        ip_address: host.ip,
        connection_type,
        active: host.active,
        down_speed: host.down_speed,
        up_speed: host.up_speed,
        packets_sent: host.packets_sent,
        packets_received: host.packets_received,
    })
}

/// Maps vendor link/band codes to the labels the UI shows. Unknown codes pass through.
pub fn connection_label(host: &RouterHost) -> String {
    let base = match (host.link_code.as_str(), host.wifi_mode.as_deref()) {
        ("0" | "wired", _) => "wired".to_string(),
        ("1" | "wireless", Some("0")) => "wireless_2.4g".to_string(),
        ("1" | "wireless", Some("1")) => "wireless_5g".to_string(),
        ("1" | "wireless", Some("2")) => "wireless_6g".to_string(),
        ("1" | "wireless", _) => "wireless".to_string(),
        ("", _) => "unknown".to_string(),
        (other, _) => other.to_lowercase(),
    };
    if host.is_guest {
        format!("guest_{base}")
    } else {
        base
    }
}
