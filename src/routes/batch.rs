// Batch rename submission (JSON and CSV upload) and progress polling

use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::Deserialize;
use std::collections::HashMap;

use super::AppState;
use crate::csv_io;
use crate::error::DeviceError;
use crate::models::{BatchSummary, MacAddress, RenameRequest};

#[derive(Debug, Deserialize)]
pub(super) struct BatchItem {
    mac_address: String,
    #[serde(default)]
    new_name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct BatchNameRequest {
    #[serde(default)]
    devices: Vec<BatchItem>,
}

fn started(summary: &BatchSummary) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": format!("started renaming {} devices", summary.updates_attempted),
        "summary": summary,
    }))
}

/// POST /api/devices/batch-name: same job slot as CSV import; poll /api/progress.
pub(super) async fn batch_name_handler(
    State(state): State<AppState>,
    payload: Result<Json<BatchNameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DeviceError> {
    let Json(req) = payload?;
    let mut summary = BatchSummary {
        total_devices: req.devices.len(),
        ..Default::default()
    };
    let mut updates = Vec::with_capacity(req.devices.len());
    for item in req.devices {
        let Ok(mac) = MacAddress::parse(&item.mac_address) else {
            summary.invalid_count += 1;
            continue;
        };
        match RenameRequest::new(mac, &item.new_name) {
            Ok(update) => updates.push(update),
            Err(_) => summary.skipped_count += 1,
        }
    }
    if updates.is_empty() {
        return Err(DeviceError::Validation(
            "no devices to update were provided".into(),
        ));
    }
    summary.updates_attempted = updates.len();
    state.jobs.submit(state.service.clone(), updates)?;
    Ok(started(&summary))
}

/// POST /api/devices/import: multipart field `file`, a CSV as produced by the export.
pub(super) async fn import_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, DeviceError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DeviceError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(DeviceError::Validation("please choose a file".into()));
        }
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(DeviceError::Validation("please upload a .csv file".into()));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DeviceError::Validation(e.body_text()))?;
        upload = Some(bytes);
        break;
    }
    let Some(data) = upload else {
        return Err(DeviceError::Validation("please upload a CSV file".into()));
    };

    // Names currently on the router decide which rows are unchanged. Without a
    // listing every named row is treated as an update.
    let on_record: HashMap<MacAddress, String> = match state.service.list_devices().await {
        Ok(devices) => devices.into_iter().map(|d| (d.mac_address, d.name)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "import", "could not load current names");
            HashMap::new()
        }
    };

    let plan = csv_io::plan_import(&data, &on_record)?;
    if plan.updates.is_empty() {
        return Err(DeviceError::NothingToUpdate {
            skipped: plan.summary.skipped_count,
            unchanged: plan.summary.unchanged_count,
            invalid: plan.summary.invalid_count,
        });
    }
    state.jobs.submit(state.service.clone(), plan.updates)?;
    Ok(started(&plan.summary))
}

/// GET /api/progress
pub(super) async fn progress_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.jobs.poll())
}
