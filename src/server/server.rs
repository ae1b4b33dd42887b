use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use tracing::{error, info};

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use super::game_routes::make_game_routes;
use super::metrics::metrics_handler;
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub build_id: String,
    pub variants: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let snapshot = state.play_service.snapshot();
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        build_id: snapshot.table.build_id().to_string(),
        variants: snapshot.table.len(),
    };
    Json(stats)
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
}

async fn health(State(catalog_store): State<GuardedCatalogStore>) -> impl IntoResponse {
    match catalog_store.ping() {
        Ok(()) => (StatusCode::OK, Json(HealthStatus { status: "healthy" })),
        Err(err) => {
            error!("Health check failed: {:#}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "unhealthy",
                }),
            )
        }
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        play_service: GuardedPlayService,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            play_service,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    play_service: GuardedPlayService,
) -> Result<Router> {
    let state = ServerState::new(config, catalog_store, play_service);

    let home_router: Router = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .with_state(state.clone());

    let app: Router = home_router
        .nest("/api/game", make_game_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(CorsLayer::permissive());

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn run_server(
    catalog_store: GuardedCatalogStore,
    play_service: GuardedPlayService,
    config: ServerConfig,
    metrics_port: u16,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, catalog_store, play_service)?;

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
