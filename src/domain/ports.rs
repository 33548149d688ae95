use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// 對上游報表 API 的已驗證 HTTP 存取。`path` 為相對於 API base URL 的路徑。
#[async_trait]
pub trait ReportingApi: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value>;
}
