//! Application startup and lifecycle management.

use crate::config::{MongoConfig, ProductConfig};
use crate::handlers;
use crate::services::{DisconnectedStore, MongoProductStore, ProductStore};
use axum::{
    body::Body,
    middleware::from_fn,
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, request_span};
use service_core::shutdown::shutdown_signal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state. Handlers hold no state of their own.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/products/latest", get(handlers::latest_products))
        .route("/products/search/:name", get(handlers::search_products))
        .route(
            "/products/:id",
            get(handlers::get_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/my-exports/:email", get(handlers::my_exports))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// Opens the product store. Never fails: a missing or unparseable
/// connection string is logged and yields a [`DisconnectedStore`], and an
/// unreachable server is logged and left for each query to report.
pub async fn connect_store(config: &MongoConfig) -> Arc<dyn ProductStore> {
    let Some(uri) = config.uri.as_deref() else {
        tracing::error!("MongoDB connection error: MONGODB_URI is not set");
        return Arc::new(DisconnectedStore::new("MONGODB_URI is not set"));
    };

    let store = match MongoProductStore::connect(uri, &config.database).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("MongoDB connection error: {}", e);
            return Arc::new(DisconnectedStore::new(e.to_string()));
        }
    };

    match store.ping().await {
        Ok(()) => tracing::info!("Pinged your deployment. You successfully connected to MongoDB!"),
        Err(e) => tracing::error!("MongoDB connection error: {}", e),
    }

    Arc::new(store)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ProductConfig) -> Result<Self, AppError> {
        let store = connect_store(&config.mongodb).await;
        Self::with_store(config.common.port, store).await
    }

    /// Binds the listener (port 0 = random port for testing) around an
    /// already opened store.
    pub async fn with_store(port: u16, store: Arc<dyn ProductStore>) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state: AppState::new(store),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves until SIGINT/SIGTERM, then closes the store connection.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let store = self.state.store.clone();
        let app = build_router(self.state);

        tracing::info!("Import Export Hub Server is running on port {}", self.port);

        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Err(e) = &result {
            tracing::error!("HTTP server error: {}", e);
        }

        store.shutdown().await;
        result
    }
}
