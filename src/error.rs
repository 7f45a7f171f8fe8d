use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;

use crate::models::Notification;

/// Failures of a single ingestion. All of them are local: the preview store keeps
/// whatever it held before the failed attempt.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("file too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("invalid file type for {name} (declared {content_type:?})")]
    WrongType {
        name: String,
        content_type: Option<String>,
    },
    #[error("failed to parse file: {0}")]
    ParseFailure(String),
}

impl IngestError {
    pub fn notification(&self) -> Notification {
        match self {
            IngestError::TooLarge { .. } => Notification::error(
                "File too large",
                "Please upload a file smaller than 50MB.",
            ),
            IngestError::WrongType { .. } => Notification::error(
                "Invalid file type",
                "Please upload a CSV file.",
            ),
            IngestError::ParseFailure(_) => Notification::error(
                "Error processing file",
                "Please check your CSV format and try again.",
            ),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            IngestError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            IngestError::WrongType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            IngestError::ParseFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    NotFound(String),
    Ingest(IngestError),
    Superseded(u64),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Ingest(err) => write!(f, "Ingestion error: {}", err),
            AppError::Superseded(id) => write!(f, "Ingestion {} was superseded by a newer upload", id),
        }
    }
}

impl std::error::Error for AppError {}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::Ingest(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, notification) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Ingest(err) => (err.status(), err.to_string(), Some(err.notification())),
            AppError::Superseded(id) => (
                StatusCode::CONFLICT,
                format!("ingestion {} was superseded", id),
                Some(Notification::error(
                    "Upload replaced",
                    "A newer file was uploaded before this one finished processing.",
                )),
            ),
        };

        let body = match notification {
            Some(notification) => Json(json!({
                "error": message,
                "notification": notification,
            })),
            None => Json(json!({
                "error": message
            })),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationLevel;

    #[test]
    fn ingest_errors_carry_user_facing_notifications() {
        let too_large = IngestError::TooLarge { size: 60_000_000, limit: 52_428_800 };
        let n = too_large.notification();
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.title, "File too large");
        assert_eq!(n.description, "Please upload a file smaller than 50MB.");

        let wrong_type = IngestError::WrongType {
            name: "report.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
        };
        assert_eq!(wrong_type.notification().title, "Invalid file type");
        assert_eq!(wrong_type.notification().description, "Please upload a CSV file.");

        let parse = IngestError::ParseFailure("no header line".to_string());
        assert_eq!(parse.notification().title, "Error processing file");
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let resp = AppError::from(IngestError::TooLarge { size: 2, limit: 1 }).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let resp = AppError::from(IngestError::ParseFailure("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = AppError::InvalidInput("bad body".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::NotFound("no preview".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::Superseded(3).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
