//! HTTP API Request Handlers
//!
//! Handlers map requests onto the record store. Store calls do blocking file
//! I/O, so they run on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use super::types::*;
use crate::store::{RecordStore, StorageError};
use crate::types::Record;

/// Maximum number of records accepted in one upsert request
const MAX_UPSERT_BATCH: usize = 10_000;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List records in table order
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Response {
    let store = state.store.clone();
    let records = match tokio::task::spawn_blocking(move || store.read_all()).await {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => return storage_failure(e),
        Err(e) => return task_failure(e),
    };

    let include_archived = query.include_archived.unwrap_or(true);
    let records: Vec<Record> = records
        .into_iter()
        .filter(|r| include_archived || !r.archived)
        .filter(|r| query.source.as_deref().map_or(true, |s| r.source == s))
        .collect();

    debug!("HTTP list request: {} records", records.len());
    (StatusCode::OK, Json(records)).into_response()
}

/// Upsert records by id (flag edits, archiving)
pub async fn upsert_records(
    State(state): State<AppState>,
    Json(records): Json<Vec<Record>>,
) -> Response {
    if records.len() > MAX_UPSERT_BATCH {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!(
                "at most {} records per request",
                MAX_UPSERT_BATCH
            ))),
        )
            .into_response();
    }
    if let Some(bad) = records.iter().find(|r| r.url.is_empty() || r.source.is_empty()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!(
                "record {} must have a source and a url",
                bad.id
            ))),
        )
            .into_response();
    }

    debug!("HTTP upsert request: {} records", records.len());
    let updated = records.len();
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || store.upsert_by_key(records)).await {
        Ok(Ok(())) => (StatusCode::OK, Json(UpsertResponse { updated })).into_response(),
        Ok(Err(e)) => storage_failure(e),
        Err(e) => task_failure(e),
    }
}

fn storage_failure(e: StorageError) -> Response {
    match e {
        StorageError::InvalidRecord(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(message)),
        )
            .into_response(),
        other => {
            error!("Record store failure: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(other.to_string())),
            )
                .into_response()
        }
    }
}

fn task_failure(e: tokio::task::JoinError) -> Response {
    error!("Record store task failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal_error("Record store task failed")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordDraft;
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> AppState {
        let store = Arc::new(RecordStore::new(dir.path().join("links.csv")));
        store
            .append_new(vec![
                RecordDraft::new("board", "https://x/1", 100),
                RecordDraft::new("feed", "https://y/1", 200),
            ])
            .unwrap();
        AppState { store }
    }

    #[tokio::test]
    async fn test_list_filters() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let mut archived = state.store.read_all().unwrap()[1].clone();
        archived.archived = true;
        state.store.upsert_by_key(vec![archived]).unwrap();

        let all = list_records(State(state.clone()), Query(RecordsQuery::default())).await;
        assert_eq!(all.status(), StatusCode::OK);

        let query = RecordsQuery {
            source: None,
            include_archived: Some(false),
        };
        let response = list_records(State(state.clone()), Query(query)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let records: Vec<Record> = serde_json::from_slice(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "board");
    }

    #[tokio::test]
    async fn test_upsert_updates_flags() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let mut edited = state.store.read_all().unwrap()[0].clone();
        edited.seen = true;
        edited.cost = "free".to_string();

        let response = upsert_records(State(state.clone()), Json(vec![edited.clone()])).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.store.read_all().unwrap()[0], edited);
    }

    #[tokio::test]
    async fn test_upsert_rejects_zero_id() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let mut bad = state.store.read_all().unwrap()[0].clone();
        bad.id = 0;

        let response = upsert_records(State(state), Json(vec![bad])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upsert_rejects_missing_url() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let mut bad = state.store.read_all().unwrap()[0].clone();
        bad.url.clear();

        let response = upsert_records(State(state), Json(vec![bad])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
