// New-device detection against the known-device store

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::Device;
use crate::notify::Notifier;
use crate::store::{KnownDeviceStore, StoreError};

pub struct NewDeviceDetector {
    store: Mutex<KnownDeviceStore>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl NewDeviceDetector {
    /// `notifier = None` keeps the store current but sends nothing.
    pub fn new(store: KnownDeviceStore, notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self {
            store: Mutex::new(store),
            notifier,
        }
    }

    /// A device is new when its MAC was never recorded, or was recorded only under its own MAC.
    pub fn classify<'a>(store: &KnownDeviceStore, devices: &'a [Device]) -> Vec<&'a Device> {
        devices
            .iter()
            .filter(|d| {
                store
                    .get(d.mac_address.as_str())
                    .is_none_or(|name| name == d.mac_address.as_str())
            })
            .collect()
    }

    /// Returns the devices flagged as new. When any are found every current device is
    /// recorded, the store is persisted and the notifier is invoked. The notifier runs even
    /// when persisting fails; that error is returned afterwards. Notification failures are
    /// logged here.
    pub async fn check(&self, devices: &[Device]) -> Result<Vec<Device>, StoreError> {
        let (flagged, saved) = {
            let mut store = self.store.lock().await;
            let flagged: Vec<Device> = Self::classify(&store, devices)
                .into_iter()
                .cloned()
                .collect();
            if flagged.is_empty() {
                return Ok(flagged);
            }
            for d in devices {
                store.record(d.mac_address.as_str(), &d.name);
            }
            (flagged, store.save().await)
        };

        match &self.notifier {
            Some(notifier) => {
                if let Err(e) = notifier.notify_new_devices(&flagged).await {
                    warn!(error = %e, new_devices = flagged.len(), "new-device notification failed");
                }
            }
            None => debug!(
                new_devices = flagged.len(),
                "notifications disabled, skipping new-device push"
            ),
        }
        saved?;
        Ok(flagged)
    }

    /// Copy of the current records, for inspection.
    pub async fn known(&self) -> std::collections::BTreeMap<String, String> {
        self.store.lock().await.records().clone()
    }
}
