// Domain errors and their HTTP mapping

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::MacAddress;
use crate::router::RouterError;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("login failed: {source}")]
    Authentication {
        #[source]
        source: RouterError,
    },

    #[error("not logged in, please log in first")]
    NotAuthenticated,

    #[error("failed to rename {mac}: {message}")]
    Rename { mac: MacAddress, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("failed to fetch device list: {0}")]
    Router(#[from] RouterError),

    #[error("a batch rename is already running")]
    BatchInProgress,

    #[error("no devices need updating")]
    NothingToUpdate {
        skipped: usize,
        unchanged: usize,
        invalid: usize,
    },

    #[error("csv error: {0}")]
    Csv(String),
}

impl DeviceError {
    pub fn status(&self) -> StatusCode {
        match self {
            DeviceError::Authentication { .. } | DeviceError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            DeviceError::Rename { .. } | DeviceError::Router(_) => StatusCode::BAD_GATEWAY,
            DeviceError::Validation(_) | DeviceError::NothingToUpdate { .. } | DeviceError::Csv(_) => {
                StatusCode::BAD_REQUEST
            }
            DeviceError::BatchInProgress => StatusCode::CONFLICT,
        }
    }
}

/// Malformed or missing JSON bodies get the same error body as every other failure.
impl From<JsonRejection> for DeviceError {
    fn from(rejection: JsonRejection) -> Self {
        DeviceError::Validation(rejection.body_text())
    }
}

impl IntoResponse for DeviceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        if let DeviceError::NothingToUpdate {
            skipped,
            unchanged,
            invalid,
        } = self
        {
            body["details"] = serde_json::json!({
                "skipped_count": skipped,
                "unchanged_count": unchanged,
                "invalid_count": invalid,
            });
        }
        (status, Json(body)).into_response()
    }
}
