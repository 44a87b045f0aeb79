//! HTTP处理器

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use klinik_core::{KlinikError, NewVisit, VisitFilter};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiResult;
use crate::server::AppState;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Klinik Visit API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "visits": "/api/v1/visits",
            "summary": "/api/v1/summary"
        }
    }))
}

/// 健康检查处理器
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "spreadsheet": state.service.has_spreadsheet()
    }))
}

/// 就诊记录查询参数，`date` 与旧参数 `tanggal` 同时出现时以 `date` 为准
#[derive(Debug, Default, Deserialize)]
pub struct VisitQueryParams {
    pub date: Option<String>,
    pub tanggal: Option<String>,
    pub month: Option<String>,
}

impl VisitQueryParams {
    fn filter(&self) -> ApiResult<VisitFilter> {
        let date = self.date.as_deref().or(self.tanggal.as_deref());
        Ok(VisitFilter::from_params(date, self.month.as_deref())?)
    }
}

/// 删除参数，旧前端使用 `?index=`，也接受 `?id=`
#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    pub index: Option<String>,
    pub id: Option<String>,
}

/// 就诊记录查询处理器
pub async fn get_visits(
    State(state): State<AppState>,
    params: Result<Query<VisitQueryParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    info!("Getting visits with query: {:?}", params);

    let outcome = state.service.fetch(&params.filter()?).await?;
    Ok(Json(outcome))
}

/// 新增就诊记录处理器
pub async fn create_visit(
    State(state): State<AppState>,
    payload: Result<Json<NewVisit>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(visit) = payload?;
    let record = state.service.create(visit).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "visit record created",
            "data": record
        })),
    ))
}

/// 按路径删除就诊记录
pub async fn delete_visit(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    remove(&state, &id).await
}

/// 按查询参数删除就诊记录
pub async fn delete_visit_by_query(
    State(state): State<AppState>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    let id = params
        .index
        .or(params.id)
        .ok_or_else(|| KlinikError::Validation("record id is required".to_string()))?;
    remove(&state, &id).await
}

async fn remove(state: &AppState, raw_id: &str) -> ApiResult<Json<serde_json::Value>> {
    let id = state.service.delete(raw_id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("visit record {} deleted", id),
        "origin": id.origin()
    })))
}

/// 统计处理器
pub async fn get_summary(
    State(state): State<AppState>,
    params: Result<Query<VisitQueryParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    info!("Getting summary with query: {:?}", params);

    let (summary, warnings) = state.service.summary(&params.filter()?).await?;
    let mut body = json!({ "data": summary });
    if !warnings.is_empty() {
        body["warnings"] = json!(warnings);
    }
    Ok(Json(body))
}
