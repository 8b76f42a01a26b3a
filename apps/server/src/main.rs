// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FragView Server - model-hosting backend for fragment viewers.
//!
//! Exposes the model lifecycle controller over a REST API: upload IFC
//! or fragment files, track the loaded model set, unload or clear
//! models, export loaded bundles, and follow lifecycle events over
//! Server-Sent Events.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /api/v1/models` - Upload and load a model (multipart)
//! - `GET /api/v1/models` - List loaded models
//! - `DELETE /api/v1/models/:id` - Unload one model
//! - `DELETE /api/v1/models` - Clear all models
//! - `GET /api/v1/models/:id/export` - Download the loaded bundle
//! - `POST /api/v1/models/from-cache/:hash` - Re-load a cached payload
//! - `GET /api/v1/cache/check/:hash` - Payload cache probe
//! - `GET /api/v1/events` - Lifecycle event stream (SSE)

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use fragview_lifecycle::ModelLifecycle;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::cache::DiskCache;
use services::decoder::NativeDecoder;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<ModelLifecycle>,
    pub cache: Arc<DiskCache>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,fragview_server=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        cache_dir = %config.cache_dir,
        max_file_size_mb = config.max_file_size_mb,
        "Starting FragView Server"
    );

    // Initialize payload cache and the lifecycle controller
    let cache = Arc::new(DiskCache::new(&config.cache_dir).await);
    let lifecycle = Arc::new(ModelLifecycle::new(Arc::new(NativeDecoder)));

    let state = AppState {
        lifecycle,
        cache,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Model endpoints
        .route(
            "/api/v1/models",
            post(routes::models::upload)
                .get(routes::models::list)
                .delete(routes::models::clear),
        )
        .route("/api/v1/models/:id", delete(routes::models::unload))
        .route("/api/v1/models/:id/export", get(routes::models::export))
        .route(
            "/api/v1/models/from-cache/:hash",
            post(routes::models::from_cache),
        )
        // Cache probe
        .route("/api/v1/cache/check/:hash", get(routes::cache::check))
        // Lifecycle event stream
        .route("/api/v1/events", get(routes::events::stream))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_file_size_mb * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
