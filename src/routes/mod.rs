// HTTP routes

mod batch;
mod devices;
mod http;

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::detector::NewDeviceDetector;
use crate::jobs::BatchJobManager;
use crate::service::DeviceService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: Arc<DeviceService>,
    pub(crate) jobs: Arc<BatchJobManager>,
    pub(crate) detector: Arc<NewDeviceDetector>,
    pub(crate) config: AppConfig,
}

pub fn app(
    service: Arc<DeviceService>,
    jobs: Arc<BatchJobManager>,
    detector: Arc<NewDeviceDetector>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        service,
        jobs,
        detector,
        config,
    };
    Router::new()
        .route("/", get(|| async { "TP-Link device manager" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/login", post(http::login_handler)) // POST /api/login
        .route("/api/devices", get(devices::list_handler)) // GET /api/devices?filter=&sort=
        .route("/api/device/{mac}/name", put(devices::rename_handler)) // PUT /api/device/{mac}/name
        .route("/api/devices/export", get(devices::export_handler)) // GET /api/devices/export
        .route("/api/devices/batch-name", post(batch::batch_name_handler)) // POST /api/devices/batch-name
        .route("/api/devices/import", post(batch::import_handler)) // POST /api/devices/import
        .route("/api/progress", get(batch::progress_handler)) // GET /api/progress
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
