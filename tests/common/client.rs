//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Server Endpoints
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    /// GET /health
    pub async fn health(&self) -> Response {
        self.get("/health").await
    }

    // ========================================================================
    // Game Endpoints
    // ========================================================================

    /// GET /api/game/play/{key}
    pub async fn play(&self, key: &str) -> Response {
        self.get(&format!("/api/game/play/{}", key)).await
    }

    /// GET /api/game/variants
    pub async fn variants(&self) -> Response {
        self.get("/api/game/variants").await
    }

    /// GET /api/game/variants?subset={subset}
    pub async fn variants_subset(&self, subset: &str) -> Response {
        self.get(&format!("/api/game/variants?subset={}", subset))
            .await
    }

    /// POST /api/game/songs/{id}/report
    pub async fn report_song(&self, song_id: &str, category: &str, message: Option<&str>) -> Response {
        let mut body = json!({ "category": category });
        if let Some(message) = message {
            body["message"] = json!(message);
        }
        self.client
            .post(format!("{}/api/game/songs/{}/report", self.base_url, song_id))
            .json(&body)
            .send()
            .await
            .expect("Report request failed")
    }
}
