// src/server.rs

//! HTTP surface: the feed and a liveness probe.

use std::future::Future;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::Result;
use crate::services::FeedReader;

const RSS_CONTENT_TYPE: &str = "application/rss+xml";

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
}

/// Build the router serving `/rss.xml` and `/api/v1/status`.
pub fn router(feed: FeedReader) -> Router {
    Router::new()
        .route("/rss.xml", get(rss_handler))
        .route("/api/v1/status", get(status_handler))
        .with_state(feed)
}

/// Current feed, or an empty body before the first successful cycle.
async fn rss_handler(State(feed): State<FeedReader>) -> impl IntoResponse {
    let body = feed
        .current()
        .map(|doc| doc.xml.clone())
        .unwrap_or_default();
    ([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], body)
}

async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(bind: &str, feed: FeedReader, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(feed))
        .with_graceful_shutdown(shutdown)
        .await?;

    log::info!("HTTP server stopped");
    Ok(())
}
