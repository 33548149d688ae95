use crate::config::EverflowConfig;
use crate::domain::ports::ReportingApi;
use crate::utils::error::{DashError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

pub const API_KEY_HEADER: &str = "X-Eflow-API-Key";

/// 以 reqwest 呼叫 Everflow API，每個請求都帶上 API key 與逾時設定
#[derive(Debug, Clone)]
pub struct EverflowClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EverflowClient {
    pub fn new(config: &EverflowConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder().timeout(timeout).build()?;

        tracing::info!(
            "🔧 Everflow client initialized (api_url: {}, api_key: {})",
            config.base_url(),
            config.masked_api_key()
        );

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            api_key: config.api_key().map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(DashError::MissingApiKey)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Value> {
        let response = request
            .header(API_KEY_HEADER, self.api_key()?)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 Everflow response status: {} ({})", status, url);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("⚠️ Everflow request to {} failed with {}", url, status);
            return Err(DashError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ReportingApi for EverflowClient {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("📡 GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Content-Type", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }

        self.send(request, &url).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("📡 POST {}", url);

        let request = self.client.post(&url).json(body);
        self.send(request, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str, api_key: Option<&str>) -> EverflowConfig {
        EverflowConfig {
            api_url: api_url.to_string(),
            api_key: api_key.map(str::to_string),
            ..EverflowConfig::default()
        }
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = EverflowClient::new(&config("https://api.eflow.team/v1/", Some("k"))).unwrap();
        assert_eq!(client.base_url(), "https://api.eflow.team/v1");
        assert_eq!(
            client.url("/networks/offers"),
            "https://api.eflow.team/v1/networks/offers"
        );
        assert_eq!(
            client.url("networks"),
            "https://api.eflow.team/v1/networks"
        );
    }

    #[test]
    fn test_missing_api_key() {
        let client = EverflowClient::new(&config("https://api.eflow.team/v1", None)).unwrap();
        assert!(matches!(client.api_key(), Err(DashError::MissingApiKey)));

        let blank = EverflowClient::new(&config("https://api.eflow.team/v1", Some("  "))).unwrap();
        assert!(matches!(blank.api_key(), Err(DashError::MissingApiKey)));
    }
}
