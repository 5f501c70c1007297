//! Record API HTTP client
//!
//! Thin typed wrapper over `reqwest` for the record document store:
//! `GET /records/{id}` and `PUT /records/{id}`, authenticated with a bearer
//! credential obtained from the injected token provider. Failures carry the
//! HTTP status and response body so retry classification and logs have
//! something to work with.

use std::sync::Arc;

use anyhow::{Context, Result};
use cardbox_core::domain::newtypes::RecordId;
use cardbox_core::ports::auth::AccessTokenProvider;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use tracing::debug;

/// HTTP client for the record API
pub struct RemoteRecordClient {
    http: Client,
    base_url: String,
    app_id: Option<String>,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl RemoteRecordClient {
    /// Creates a client against the given base URL
    pub fn new(
        base_url: impl Into<String>,
        app_id: Option<String>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id,
            tokens,
        }
    }

    fn record_url(&self, record_id: &RecordId) -> String {
        format!("{}/records/{}", self.base_url, record_id)
    }

    /// Fetches the raw record document as a JSON object
    pub async fn get_record(&self, record_id: &RecordId) -> Result<Map<String, Value>> {
        let token = self
            .tokens
            .access_token()
            .await
            .context("Failed to obtain access token")?;
        let url = self.record_url(record_id);
        debug!(%url, "Fetching record");

        let mut request = self.http.get(&url).bearer_auth(token);
        if let Some(app_id) = &self.app_id {
            request = request.header("X-Application-Id", app_id);
        }

        let response = request
            .send()
            .await
            .context("Failed to send record fetch request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read record fetch response body")?;

        if !status.is_success() {
            anyhow::bail!("Record fetch failed: {} - {}", status, truncate(&body));
        }

        let value: Value =
            serde_json::from_str(&body).context("Record fetch response is not JSON")?;
        match value {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!("Record fetch response is not an object: {}", other),
        }
    }

    /// Writes a partial record update as a single document PUT
    pub async fn put_record(
        &self,
        record_id: &RecordId,
        body: &Map<String, Value>,
    ) -> Result<StatusCode> {
        let token = self
            .tokens
            .access_token()
            .await
            .context("Failed to obtain access token")?;
        let url = self.record_url(record_id);
        debug!(%url, fields = body.len(), "Writing record");

        let mut request = self.http.put(&url).bearer_auth(token).json(body);
        if let Some(app_id) = &self.app_id {
            request = request.header("X-Application-Id", app_id);
        }

        let response = request
            .send()
            .await
            .context("Failed to send record write request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Record write failed: {} - {}", status, truncate(&body));
        }

        Ok(status)
    }
}

/// Keeps error messages and logs bounded on large response bodies
fn truncate(body: &str) -> &str {
    const MAX: usize = 512;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbox_core::ports::auth::StaticTokenProvider;

    #[test]
    fn test_record_url_joins_cleanly() {
        let client = RemoteRecordClient::new(
            "https://records.example.com/v1/",
            None,
            Arc::new(StaticTokenProvider::new("t")),
        );
        let id = RecordId::new("r1").unwrap();
        assert_eq!(
            client.record_url(&id),
            "https://records.example.com/v1/records/r1"
        );
    }

    #[test]
    fn test_truncate_bounds_long_bodies() {
        let long = "x".repeat(2_000);
        assert_eq!(truncate(&long).len(), 512);
        assert_eq!(truncate("short"), "short");
    }
}
