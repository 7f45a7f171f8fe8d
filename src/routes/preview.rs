use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, Method},
    routing::{get, post, put},
    Json, Router,
};
use bytes::BytesMut;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::{AppError, IngestError},
    models::{ColumnSummary, Notification, PreviewModel, ProgressState, RawFile},
    services::validator::FileCandidate,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/uploads", post(upload_file))
        .route("/preview", get(get_preview))
        .route("/preview/target", put(set_target))
        .route("/preview/columns", get(get_columns))
        .route("/progress", get(get_progress))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    name: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    preview: PreviewModel,
    notification: Notification,
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    target: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    target: Option<String>,
    columns: Vec<ColumnSummary>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, AppError> {
    let content_type = header_str(&headers, header::CONTENT_TYPE).map(str::to_string);
    let declared_size = header_str(&headers, header::CONTENT_LENGTH)
        .and_then(|value| value.trim().parse::<u64>().ok());

    tracing::info!(
        "Received upload {}, declared type: {:?}, declared size: {:?}",
        params.name,
        content_type,
        declared_size
    );

    // Reject on the declared metadata before reading anything.
    if let Some(size) = declared_size {
        state.ingestor.precheck(&FileCandidate {
            name: &params.name,
            size,
            content_type: content_type.as_deref(),
        })?;
    }

    let limit = state.ingestor.max_file_size();
    let mut buffer = BytesMut::new();
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload body: {}", e)))?;
        let size = (buffer.len() + chunk.len()) as u64;
        if size > limit {
            tracing::warn!("Upload {} exceeded {} bytes while streaming", params.name, limit);
            return Err(IngestError::TooLarge { size, limit }.into());
        }
        buffer.extend_from_slice(&chunk);
    }

    let file = RawFile::new(params.name, content_type, buffer.freeze());
    let outcome = state.ingestor.ingest(file).await?;

    Ok(Json(UploadResponse {
        preview: PreviewModel::clone(&outcome.model),
        notification: outcome.notification,
    }))
}

async fn get_preview(State(state): State<Arc<AppState>>) -> Result<Json<PreviewModel>, AppError> {
    state
        .reader
        .read()
        .map(|model| Json(PreviewModel::clone(&model)))
        .ok_or_else(|| AppError::NotFound("No file has been uploaded yet".to_string()))
}

async fn set_target(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TargetRequest>,
) -> Result<Json<PreviewModel>, AppError> {
    tracing::info!("Setting target variable to {:?}", request.target);
    let model = state.ingestor.set_target_variable(request.target)?;
    Ok(Json(PreviewModel::clone(&model)))
}

async fn get_columns(State(state): State<Arc<AppState>>) -> Result<Json<ColumnsResponse>, AppError> {
    let model = state
        .reader
        .read()
        .ok_or_else(|| AppError::NotFound("No file has been uploaded yet".to_string()))?;

    let columns = state
        .analyzer
        .analyze(&model.preview, model.target.as_deref());

    Ok(Json(ColumnsResponse {
        target: model.target.clone(),
        columns,
    }))
}

async fn get_progress(State(state): State<Arc<AppState>>) -> Json<ProgressState> {
    Json(state.ingestor.progress())
}
