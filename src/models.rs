use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use smallvec::SmallVec;

use crate::services::utils::format_size_label;

pub const SAMPLE_SIZE: usize = 3;

/// A file as received from the client. Never modified after construction.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub received_at: DateTime<Utc>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content_type,
            bytes,
            received_at: Utc::now(),
        }
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            size: self.size,
            size_label: format_size_label(self.size),
            content_type: self.content_type.clone(),
            received_at: self.received_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub content_type: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
    pub size_label: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct ProgressState {
    pub ingestion_id: u64,
    pub percent: u8,
}

/// The store tuple: one ingestion's file, preview, target choice and progress.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewModel {
    pub ingestion_id: u64,
    pub file: FileInfo,
    pub preview: ParsedPreview,
    pub target: Option<String>,
    pub progress: ProgressState,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: String,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
    pub non_empty_count: usize,
    pub is_target: bool,
}
