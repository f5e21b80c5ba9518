// Rename requests, per-item results and batch progress

use serde::{Deserialize, Serialize};

use super::MacAddress;

/// One device to rename. Built through [`RenameRequest::new`], which trims and rejects empty names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRequest {
    pub mac_address: MacAddress,
    pub new_name: String,
}

impl RenameRequest {
    pub fn new(mac_address: MacAddress, new_name: &str) -> Result<Self, String> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(format!("new name for {mac_address} must not be empty"));
        }
        Ok(Self {
            mac_address,
            new_name: new_name.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameResult {
    pub mac_address: MacAddress,
    pub new_name: String,
    pub success: bool,
    pub error: Option<String>,
}

impl RenameResult {
    pub fn ok(request: &RenameRequest) -> Self {
        Self {
            mac_address: request.mac_address.clone(),
            new_name: request.new_name.clone(),
            success: true,
            error: None,
        }
    }

    pub fn failed(request: &RenameRequest, error: String) -> Self {
        Self {
            mac_address: request.mac_address.clone(),
            new_name: request.new_name.clone(),
            success: false,
            error: Some(error),
        }
    }
}

/// Lifecycle of the batch slot: `idle -> running -> {completed, completed_with_errors, failed}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl JobState {
    pub fn is_running(self) -> bool {
        self == JobState::Running
    }
}

/// What `GET /api/progress` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub state: JobState,
    pub current: usize,
    pub total: usize,
    pub percentage: f64,
    pub completed: bool,
    pub error: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub latest_result: Option<RenameResult>,
}

/// How a submitted batch was derived from its input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_devices: usize,
    pub updates_attempted: usize,
    pub skipped_count: usize,
    pub unchanged_count: usize,
    pub invalid_count: usize,
}
