use crate::config::MriConfig;
use crate::handlers;
use crate::models::Dataset;
use crate::services::{load_dataset, CompositeRenderer};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub renderer: CompositeRenderer,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::read_root))
        .route("/image", get(handlers::get_random_composite_image))
        .route("/image/", get(handlers::get_random_composite_image))
        .route("/image/:index", get(handlers::get_composite_image))
        .route("/raw_image/:index", get(handlers::get_raw_image))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Loads the dataset and binds the listener. Nothing is served until
    /// [`Application::run_until_stopped`].
    pub async fn build(config: MriConfig) -> Result<Self, AppError> {
        let csv_path = config.dataset.csv_path.clone();
        let image_root = config.dataset.image_root.clone();
        let dataset = tokio::task::spawn_blocking(move || load_dataset(&csv_path, image_root))
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Dataset load task failed: {}", e)))?
            .map_err(|e| {
                tracing::error!(
                    "Failed to load dataset from {}: {}",
                    config.dataset.csv_path.display(),
                    e
                );
                e
            })?;

        let state = AppState {
            dataset: Arc::new(dataset),
            renderer: CompositeRenderer::new(&config.render),
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            rows = state.dataset.len(),
            "MRI image service listening"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn dataset(&self) -> &Dataset {
        &self.state.dataset
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
