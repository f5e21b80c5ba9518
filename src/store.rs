// Known-device store: MAC -> last recorded name, persisted as a JSON object

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{instrument, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("known-device store I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("known-device store encoding: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct KnownDeviceStore {
    path: PathBuf,
    records: BTreeMap<String, String>,
}

impl KnownDeviceStore {
    /// Loads the file at `path`. A missing or unreadable file yields an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "known-device store is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read known-device store, starting empty");
                BTreeMap::new()
            }
        };
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, mac: &str) -> Option<&str> {
        self.records.get(mac).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &BTreeMap<String, String> {
        &self.records
    }

    pub fn record(&mut self, mac: &str, name: &str) {
        self.records.insert(mac.to_string(), name.to_string());
    }

    /// Rewrites the whole file: write a sibling temp file, then rename over the target.
    #[instrument(skip(self), fields(path = %self.path.display(), records = self.records.len()))]
    pub async fn save(&self) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let bytes = serde_json::to_vec_pretty(&self.records)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}
