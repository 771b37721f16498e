//! HTTP gateway for assistd.
//!
//! Serves the assistants resource API (assistants, threads, messages, runs)
//! at the root and under `/v1`, plus `GET /health`.
//!
//! Built on Axum.

pub mod assistants;
pub mod cursor;
pub mod dto;
pub mod error;
pub mod mapper;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::response::Json;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use assistd_agent::AgentEngine;
use assistd_config::{AppConfig, GatewayConfig};

pub use assistants::{ApiState, Caller};
pub use error::ApiError;
pub use mapper::ResourceMapper;

use crate::dto::HealthResponse;

/// Build the full router: health, resource routes at `/` and `/v1`.
///
/// Layers applied:
/// - Request body size limit (`gateway.body_limit_bytes`)
/// - CORS, when `gateway.cors_origin` is set
/// - HTTP trace logging
pub fn build_router(state: ApiState, gateway: &GatewayConfig) -> Router {
    let api = assistants::router(state);

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .merge(api.clone())
        .nest("/v1", api)
        .layer(DefaultBodyLimit::max(gateway.body_limit_bytes));

    if let Some(origin) = &gateway.cors_origin {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                let cors = CorsLayer::new()
                    .allow_origin(AllowOrigin::exact(origin))
                    .allow_methods([Method::GET, Method::POST, Method::DELETE])
                    .allow_headers([
                        header::CONTENT_TYPE,
                        header::AUTHORIZATION,
                        HeaderName::from_static(assistants::USER_HEADER),
                    ])
                    .max_age(Duration::from_secs(3600));
                app = app.layer(cors);
            }
            Err(e) => warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin"),
        }
    }

    app.layer(tower_http::trace::TraceLayer::new_for_http())
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Wire stores, provider, and engine from configuration into API state.
pub async fn build_state(config: &AppConfig) -> Result<ApiState, BoxError> {
    let stores = assistd_store::build_from_config(&config.store).await?;

    let router = assistd_providers::build_from_config(config)?;
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not registered", config.default_provider))?;
    if !config.has_api_key() {
        warn!("No API key configured; runs will fail unless the provider needs none");
    }

    let engine = AgentEngine::new(
        stores.agents,
        stores.messages,
        provider,
        config.agent_defaults(),
    );

    Ok(ApiState {
        mapper: Arc::new(ResourceMapper::new(engine)),
        default_user: Arc::from(config.gateway.default_user.as_str()),
    })
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), BoxError> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = build_state(&config).await?;
    let app = build_router(state, &config.gateway);

    info!(
        addr = %addr,
        store = %config.store.backend,
        provider = %config.default_provider,
        model = %config.default_model,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
