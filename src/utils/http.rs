// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &SourceConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body, treating any non-2xx status as a failure.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;

    async fn spawn_listing_server() -> String {
        let app = Router::new()
            .route("/ok", get(|| async { "<div id=\"event1\"></div>" }))
            .route(
                "/broken",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_fetch_text_returns_body_on_success() {
        let base = spawn_listing_server().await;
        let client = create_async_client(&SourceConfig::default()).unwrap();

        let body = fetch_text(&client, &format!("{base}/ok")).await.unwrap();
        assert_eq!(body, "<div id=\"event1\"></div>");
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_server_error() {
        let base = spawn_listing_server().await;
        let client = create_async_client(&SourceConfig::default()).unwrap();
        let url = format!("{base}/broken");

        let err = fetch_text(&client, &url).await.unwrap_err();
        match err {
            AppError::Fetch { url: failed, status } => {
                assert_eq!(status, 500);
                assert_eq!(failed, url);
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
