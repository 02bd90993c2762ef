use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::Utc;
use docvoice_core::{
    ChatMessage, HistoryKind, HistoryQuery, PaginatedHistory, ServiceError, SortOrder,
    UploadOutcome,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub type_filter: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl TryFrom<HistoryParams> for HistoryQuery {
    type Error = ServiceError;

    fn try_from(params: HistoryParams) -> Result<Self, Self::Error> {
        let defaults = HistoryQuery::default();
        let type_filter = params
            .type_filter
            .filter(|value| !value.is_empty())
            .map(|value| value.parse::<HistoryKind>())
            .transpose()?;
        let sort = params
            .sort
            .map(|value| value.parse::<SortOrder>())
            .transpose()?
            .unwrap_or(defaults.sort);

        let query = HistoryQuery {
            page: params.page.unwrap_or(defaults.page),
            per_page: params.per_page.unwrap_or(defaults.per_page),
            type_filter,
            search: params.search,
            sort,
        };
        query.validate()?;
        Ok(query)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    pub audio_data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub transcript: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub history_items: usize,
    pub uptime_secs: i64,
}

fn rejected(detail: impl ToString) -> ApiError {
    ApiError::Validation(detail.to_string())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        history_items: state.service.history_store().len(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

pub async fn get_history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<PaginatedHistory>, ApiError> {
    let Query(params) = params.map_err(|rejection| rejected(rejection.body_text()))?;
    let query = HistoryQuery::try_from(params)?;
    Ok(Json(state.service.history(&query)?))
}

pub async fn delete_history_item(
    State(state): State<AppState>,
    item_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(item_id) = item_id.map_err(|rejection| rejected(rejection.body_text()))?;
    state.service.delete(item_id);
    Ok(Json(MessageResponse {
        message: "Item deleted successfully".to_string(),
    }))
}

pub async fn transcribe(
    State(state): State<AppState>,
    body: Result<Json<TranscriptionRequest>, JsonRejection>,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| rejected(rejection.body_text()))?;
    let transcript = state.service.transcribe(&request.audio_data).await?;
    Ok(Json(TranscriptionResponse { transcript }))
}

pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| rejected(rejection.body_text()))?;
    let response = state.service.chat(&request.messages).await?;
    Ok(Json(ChatResponse { response }))
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadOutcome>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| rejected(rejection.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| rejected(error.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| rejected("file field has no filename"))?;
        let bytes = field.bytes().await.map_err(|error| rejected(error.body_text()))?;

        let outcome = state.service.upload(&filename, bytes.to_vec()).await?;
        return Ok(Json(outcome));
    }

    Err(rejected("multipart body has no file field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_to_first_page_newest_first() {
        let query = HistoryQuery::try_from(HistoryParams::default()).expect("defaults are valid");
        assert_eq!(query, HistoryQuery::default());
    }

    #[test]
    fn params_reject_unknown_filter_and_sort() {
        let bad_filter = HistoryParams {
            type_filter: Some("image".to_string()),
            ..HistoryParams::default()
        };
        assert!(HistoryQuery::try_from(bad_filter).is_err());

        let bad_sort = HistoryParams {
            sort: Some("oldest".to_string()),
            ..HistoryParams::default()
        };
        assert!(HistoryQuery::try_from(bad_sort).is_err());

        let too_many = HistoryParams {
            per_page: Some(101),
            ..HistoryParams::default()
        };
        assert!(HistoryQuery::try_from(too_many).is_err());
    }
}
