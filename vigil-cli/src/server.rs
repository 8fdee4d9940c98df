//! HTTP surface: one fresh monitoring cycle per request

use crate::cycle::Cycle;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use vigil_health::Report;

/// Build the router
pub fn router(cycle: Arc<Cycle>) -> Router {
    Router::new()
        .route("/health", get(health_html))
        .route("/health/plain", get(health_plain))
        .with_state(cycle)
}

/// Serve until Ctrl-C
pub async fn serve(cycle: Arc<Cycle>, listen: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(listen = %listener.local_addr()?, "Health endpoint listening");

    axum::serve(listener, router(cycle))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Health endpoint stopped");
    Ok(())
}

async fn run_cycle(cycle: Arc<Cycle>) -> Result<Report, Response> {
    tokio::task::spawn_blocking(move || cycle.run_and_log())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Monitoring cycle aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Monitoring cycle aborted: {e}"),
            )
                .into_response()
        })
}

fn status_code(report: &Report) -> StatusCode {
    if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn health_html(State(cycle): State<Arc<Cycle>>) -> Response {
    match run_cycle(cycle).await {
        Ok(report) => (status_code(&report), Html(report.render_html())).into_response(),
        Err(response) => response,
    }
}

async fn health_plain(State(cycle): State<Arc<Cycle>>) -> Response {
    match run_cycle(cycle).await {
        Ok(report) => (status_code(&report), report.render_plain()).into_response(),
        Err(response) => response,
    }
}
