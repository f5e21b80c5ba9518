// GET /version, POST /api/login

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use serde::Deserialize;

use super::AppState;
use crate::error::DeviceError;
use crate::router::Credentials;

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    host: Option<String>,
    password: Option<String>,
    username: Option<String>,
}

/// POST /api/login: opens a router session that later calls reuse.
pub(super) async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DeviceError> {
    let Json(req) = payload?;
    let (Some(host), Some(password)) = (req.host, req.password) else {
        return Err(DeviceError::Validation(
            "host and password are required".into(),
        ));
    };
    let credentials = Credentials {
        username: req
            .username
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| state.config.router.username.clone()),
        password,
    };
    state.service.login(&host, &credentials).await?;
    Ok(Json(serde_json::json!({ "message": "login successful" })))
}
