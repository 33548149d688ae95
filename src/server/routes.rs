use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::dashboard::DashboardSummary;
use crate::core::service::{ConnectionStatus, ListFilters};
use crate::domain::model::{DateRange, EntityKind, NormalizedResult};
use crate::utils::error::Result;

use super::state::AppState;

const SAMPLE_START_DATE: &str = "2024-01-01";
const SAMPLE_END_DATE: &str = "2024-01-31";

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

impl StatsQuery {
    fn range(&self) -> Result<DateRange> {
        DateRange::parse(
            self.start_date.as_deref().unwrap_or_default(),
            self.end_date.as_deref().unwrap_or_default(),
        )
    }
}

async fn entity_stats(
    state: &AppState,
    kind: EntityKind,
    query: &StatsQuery,
) -> Result<Json<NormalizedResult>> {
    let range = query.range()?;
    let result = state.service.entity_stats(kind, &range).await?;
    Ok(Json(result))
}

pub async fn offer_stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<NormalizedResult>> {
    entity_stats(&state, EntityKind::Offer, &query).await
}

pub async fn affiliate_stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<NormalizedResult>> {
    entity_stats(&state, EntityKind::Affiliate, &query).await
}

pub async fn advertiser_stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<NormalizedResult>> {
    entity_stats(&state, EntityKind::Advertiser, &query).await
}

pub async fn dashboard_stats_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<DashboardSummary>> {
    let range = query.range()?;
    let summary = state.service.dashboard_stats(&range).await?;
    Ok(Json(summary))
}

pub async fn conversions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Value>> {
    let range = query.range()?;
    Ok(Json(state.service.conversions(&range).await?))
}

pub async fn offers_handler(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ListFilters>,
) -> Result<Json<Value>> {
    Ok(Json(state.service.offers(&filters).await?))
}

pub async fn affiliates_handler(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ListFilters>,
) -> Result<Json<Value>> {
    Ok(Json(state.service.affiliates(&filters).await?))
}

pub async fn affiliate_tiers_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    Ok(Json(state.service.affiliate_tiers().await?))
}

pub async fn advertisers_handler(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ListFilters>,
) -> Result<Json<Value>> {
    Ok(Json(state.service.advertisers(&filters).await?))
}

pub async fn advertiser_handler(
    State(state): State<Arc<AppState>>,
    Path(advertiser_id): Path<u64>,
) -> Result<Json<Value>> {
    Ok(Json(state.service.advertiser(advertiser_id).await?))
}

pub async fn affiliate_dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>> {
    Ok(Json(state.service.affiliate_dashboard().await?))
}

pub async fn test_connection_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status: ConnectionStatus = state.service.test_connection().await;
    let code = if status.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

pub async fn debug_config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "everflow": state.config.everflow.snapshot() }))
}

/// 以固定區間跑一次 offer 報表，檢查 API key 與回應格式
pub async fn debug_sample_call_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let range = DateRange::parse(SAMPLE_START_DATE, SAMPLE_END_DATE)?;
    let result = state.service.offer_stats(&range).await?;
    let data_count = result.count();

    Ok(Json(json!({
        "result": result,
        "has_data": data_count > 0,
        "data_count": data_count,
    })))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "everflow-dash",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
