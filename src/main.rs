use anyhow::Result;
use device_manager::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let connector = Arc::new(router::TplinkConnector::new(
        app_config.router.timeout(),
        app_config.router.verify_ssl,
    ));
    let service = Arc::new(service::DeviceService::new(
        connector,
        app_config.router.rename_pace(),
    ));

    let store = store::KnownDeviceStore::load(&app_config.store.path).await;
    tracing::info!(
        path = %store.path().display(),
        known_devices = store.len(),
        "known-device store loaded"
    );
    let notifier: Option<Arc<dyn notify::Notifier>> = match app_config.push_token() {
        Some(token) => Some(Arc::new(notify::PushPlusNotifier::new(
            app_config.notify.endpoint.clone(),
            token,
            app_config.notify.timeout(),
        ))),
        None => {
            tracing::info!("no push token configured, new-device notifications disabled");
            None
        }
    };
    let detector = Arc::new(detector::NewDeviceDetector::new(store, notifier));
    let jobs = Arc::new(jobs::BatchJobManager::new());

    let app = routes::app(service, jobs.clone(), detector, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if jobs.is_running() {
        tracing::warn!(progress = ?jobs.poll(), "exiting with a batch rename still running");
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
