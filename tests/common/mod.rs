// Shared test helpers: in-memory router and notifier
#![allow(dead_code)]

use async_trait::async_trait;
use device_manager::models::Device;
use device_manager::notify::{Notifier, NotifyError};
use device_manager::router::{
    Credentials, RouterClient, RouterConnector, RouterError, RouterHost,
};
use device_manager::service::DeviceService;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const PASSWORD: &str = "secret";

pub fn host(mac: &str, hostname: Option<&str>, ip: &str, link_code: &str) -> RouterHost {
    RouterHost {
        mac: mac.to_string(),
        hostname: hostname.map(str::to_string),
        ip: ip.to_string(),
        link_code: link_code.to_string(),
        wifi_mode: (link_code == "1").then(|| "1".to_string()),
        active: true,
        ..Default::default()
    }
}

/// Three hosts: one named phone, one unnamed laptop, one named TV.
pub fn sample_hosts() -> Vec<RouterHost> {
    vec![
        host("aa-bb-cc-dd-ee-ff", Some("Phone"), "192.168.0.20", "1"),
        host("11-22-33-44-55-66", None, "192.168.0.5", "0"),
        host("de-ad-be-ef-00-01", Some("TV"), "192.168.0.12", "0"),
    ]
}

/// Router double. Renames update its host table; MACs in `reject` fail with a vendor error.
#[derive(Default)]
pub struct FakeRouter {
    pub hosts: Mutex<Vec<RouterHost>>,
    pub renames: Mutex<Vec<(String, String)>>,
    pub reject: Mutex<HashSet<String>>,
    pub logins: Mutex<Vec<Url>>,
}

impl FakeRouter {
    pub fn with_hosts(hosts: Vec<RouterHost>) -> Arc<Self> {
        Arc::new(Self {
            hosts: Mutex::new(hosts),
            ..Default::default()
        })
    }

    pub fn reject_mac(&self, router_mac: &str) {
        self.reject.lock().unwrap().insert(router_mac.to_string());
    }

    pub fn renames(&self) -> Vec<(String, String)> {
        self.renames.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouterClient for FakeRouter {
    async fn hosts(&self) -> Result<Vec<RouterHost>, RouterError> {
        Ok(self.hosts.lock().unwrap().clone())
    }

    async fn set_host_name(&self, mac: &str, name: &str) -> Result<(), RouterError> {
        if self.reject.lock().unwrap().contains(mac) {
            return Err(RouterError::Vendor {
                code: -40401,
                message: "name rejected".into(),
            });
        }
        self.renames
            .lock()
            .unwrap()
            .push((mac.to_string(), name.to_string()));
        for h in self.hosts.lock().unwrap().iter_mut() {
            if h.mac.eq_ignore_ascii_case(mac) {
                h.hostname = Some(name.to_string());
            }
        }
        Ok(())
    }
}

pub struct FakeConnector {
    pub router: Arc<FakeRouter>,
}

#[async_trait]
impl RouterConnector for FakeConnector {
    async fn connect(
        &self,
        base_url: &Url,
        credentials: &Credentials,
    ) -> Result<Arc<dyn RouterClient>, RouterError> {
        self.router.logins.lock().unwrap().push(base_url.clone());
        if credentials.password != PASSWORD {
            return Err(RouterError::Vendor {
                code: -40210,
                message: "wrong password".into(),
            });
        }
        Ok(self.router.clone())
    }
}

pub fn credentials(password: &str) -> Credentials {
    Credentials {
        username: "admin".into(),
        password: password.into(),
    }
}

pub fn service(router: &Arc<FakeRouter>) -> Arc<DeviceService> {
    paced_service(router, Duration::ZERO)
}

/// Service that pauses `pace` between batch renames.
pub fn paced_service(router: &Arc<FakeRouter>, pace: Duration) -> Arc<DeviceService> {
    Arc::new(DeviceService::new(
        Arc::new(FakeConnector {
            router: router.clone(),
        }),
        pace,
    ))
}

pub async fn logged_in_service(router: &Arc<FakeRouter>) -> Arc<DeviceService> {
    let service = service(router);
    service
        .login("192.168.0.1", &credentials(PASSWORD))
        .await
        .unwrap();
    service
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<Vec<Device>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<Device>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_new_devices(&self, devices: &[Device]) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push(devices.to_vec());
        if self.fail {
            return Err(NotifyError::Rejected {
                code: Some(500),
                message: "push service down".into(),
            });
        }
        Ok(())
    }
}
