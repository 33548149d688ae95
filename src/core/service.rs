use crate::config::EverflowConfig;
use crate::core::dashboard::DashboardSummary;
use crate::core::normalizer::normalize;
use crate::domain::model::{DateRange, EntityKind, NormalizedResult};
use crate::domain::ports::ReportingApi;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const ENTITY_TABLE_PATH: &str = "networks/reporting/entity/table";
pub const CONVERSIONS_PATH: &str = "networks/reporting/conversions";
pub const AFFILIATE_DASHBOARD_PATH: &str = "affiliates/dashboard/summary";

/// 列表端點允許轉送的查詢參數
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListFilters {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl ListFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(status) = &self.status {
            query.push(("status".to_string(), status.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Everflow 報表服務：組裝請求內容、呼叫上游並正規化回應
pub struct EverflowService<A: ReportingApi> {
    api: A,
    timezone_id: i64,
    currency_id: String,
}

impl<A: ReportingApi> EverflowService<A> {
    pub fn new(api: A, config: &EverflowConfig) -> Self {
        Self {
            api,
            timezone_id: config.timezone_id,
            currency_id: config.currency_id.clone(),
        }
    }

    pub fn entity_table_payload(&self, kind: EntityKind, range: &DateRange) -> Value {
        let columns: Vec<Value> = kind
            .columns()
            .iter()
            .map(|column| json!({ "column": column }))
            .collect();

        json!({
            "from": range.from_param(),
            "to": range.to_param(),
            "timezone_id": self.timezone_id,
            "currency_id": self.currency_id,
            "columns": columns,
            "query": { "filters": [] },
        })
    }

    pub async fn entity_stats(&self, kind: EntityKind, range: &DateRange) -> Result<NormalizedResult> {
        tracing::info!(
            "📊 Fetching {} stats for {} → {}",
            kind.as_str(),
            range.from_param(),
            range.to_param()
        );

        let payload = self.entity_table_payload(kind, range);
        let response = self.api.post_json(ENTITY_TABLE_PATH, &payload).await?;
        Ok(normalize(&response))
    }

    pub async fn offer_stats(&self, range: &DateRange) -> Result<NormalizedResult> {
        self.entity_stats(EntityKind::Offer, range).await
    }

    pub async fn affiliate_stats(&self, range: &DateRange) -> Result<NormalizedResult> {
        self.entity_stats(EntityKind::Affiliate, range).await
    }

    pub async fn advertiser_stats(&self, range: &DateRange) -> Result<NormalizedResult> {
        self.entity_stats(EntityKind::Advertiser, range).await
    }

    /// 三種實體報表同時查詢後彙總。
    ///
    /// 單一實體失敗只讓該區塊變成 unrecognized；三個都失敗才回傳錯誤。
    pub async fn dashboard_stats(&self, range: &DateRange) -> Result<DashboardSummary> {
        let (offers, affiliates, advertisers) = tokio::join!(
            self.offer_stats(range),
            self.affiliate_stats(range),
            self.advertiser_stats(range),
        );

        let (offers, affiliates, advertisers) = match (offers, affiliates, advertisers) {
            (Err(e), Err(_), Err(_)) => return Err(e),
            (offers, affiliates, advertisers) => (
                degrade(EntityKind::Offer, offers),
                degrade(EntityKind::Affiliate, affiliates),
                degrade(EntityKind::Advertiser, advertisers),
            ),
        };

        Ok(DashboardSummary::build(range, &offers, &affiliates, &advertisers))
    }

    pub async fn conversions(&self, range: &DateRange) -> Result<Value> {
        let payload = json!({
            "from": range.from_param(),
            "to": range.to_param(),
            "timezone_id": self.timezone_id,
            "show_conversions": true,
            "show_events": false,
            "query": { "filters": [] },
        });

        let response = self.api.post_json(CONVERSIONS_PATH, &payload).await?;
        Ok(into_data(response))
    }

    pub async fn affiliate_dashboard(&self) -> Result<Value> {
        let payload = json!({ "timezone_id": self.timezone_id });
        let response = self.api.post_json(AFFILIATE_DASHBOARD_PATH, &payload).await?;
        Ok(into_data(response))
    }

    pub async fn offers(&self, filters: &ListFilters) -> Result<Value> {
        self.api.get_json("networks/offers", &filters.to_query()).await
    }

    pub async fn affiliates(&self, filters: &ListFilters) -> Result<Value> {
        self.api.get_json("networks/affiliates", &filters.to_query()).await
    }

    pub async fn affiliate_tiers(&self) -> Result<Value> {
        self.api.get_json("networks/affiliate_tiers", &[]).await
    }

    pub async fn advertisers(&self, filters: &ListFilters) -> Result<Value> {
        self.api.get_json("networks/advertisers", &filters.to_query()).await
    }

    pub async fn advertiser(&self, advertiser_id: u64) -> Result<Value> {
        let path = format!("networks/advertisers/{}", advertiser_id);
        self.api.get_json(&path, &[]).await
    }

    /// 連線測試永遠回傳狀態，不往外丟錯
    pub async fn test_connection(&self) -> ConnectionStatus {
        match self.api.get_json("networks", &[]).await {
            Ok(data) => {
                tracing::info!("✅ Everflow connection OK");
                ConnectionStatus {
                    success: true,
                    message: "Everflow connection successful".to_string(),
                    data: Some(data),
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Everflow connection test failed: {}", e);
                ConnectionStatus {
                    success: false,
                    message: format!("Everflow connection failed: {}", e.user_friendly_message()),
                    data: None,
                }
            }
        }
    }
}

/// 儀表板用：查詢失敗的實體改以 unrecognized 呈現
fn degrade(kind: EntityKind, result: Result<NormalizedResult>) -> NormalizedResult {
    result.unwrap_or_else(|e| {
        tracing::warn!("⚠️ {} stats unavailable for dashboard: {}", kind.as_str(), e);
        NormalizedResult::Unrecognized {
            message: e.user_friendly_message(),
            raw: json!({ "error": e.to_string() }),
        }
    })
}

/// 有非 null 的 `data` 欄位就取出，否則回傳整個回應
fn into_data(mut response: Value) -> Value {
    if response.get("data").is_some_and(|data| !data.is_null()) {
        return response["data"].take();
    }
    response
}
