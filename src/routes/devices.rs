// Device list, single rename and CSV export

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use crate::error::DeviceError;
use crate::models::{DeviceFilter, DeviceSort, MacAddress, filter_and_sort};

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListParams {
    filter: Option<String>,
    sort: Option<String>,
}

/// GET /api/devices: also runs new-device detection; its failures never fail the listing.
pub(super) async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, DeviceError> {
    let filter = params
        .filter
        .as_deref()
        .map(str::parse::<DeviceFilter>)
        .transpose()
        .map_err(DeviceError::Validation)?
        .unwrap_or_default();
    let sort = params
        .sort
        .as_deref()
        .map(str::parse::<DeviceSort>)
        .transpose()
        .map_err(DeviceError::Validation)?
        .unwrap_or_default();

    let devices = state.service.list_devices().await?;
    if let Err(e) = state.detector.check(&devices).await {
        tracing::error!(error = %e, operation = "detect_new_devices", "new-device check failed");
    }
    let devices = filter_and_sort(devices, filter, sort);
    Ok(Json(serde_json::json!({ "devices": devices })))
}

#[derive(Debug, Deserialize)]
pub(super) struct RenameBody {
    name: Option<String>,
}

/// PUT /api/device/{mac}/name
pub(super) async fn rename_handler(
    State(state): State<AppState>,
    Path(mac): Path<String>,
    payload: Result<Json<RenameBody>, JsonRejection>,
) -> Result<impl IntoResponse, DeviceError> {
    let Json(body) = payload?;
    let mac = MacAddress::parse(&mac).map_err(|e| DeviceError::Validation(e.to_string()))?;
    let name = body
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| DeviceError::Validation("name is required".into()))?;
    state.service.rename_device(&mac, &name).await?;
    Ok(Json(serde_json::json!({ "message": "rename successful" })))
}

/// GET /api/devices/export: CSV download named after the local time.
pub(super) async fn export_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, DeviceError> {
    let body = state.service.export_csv().await?;
    let file_name = format!(
        "tplink_devices_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    ))
}
