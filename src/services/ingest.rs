use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, IngestError};
use crate::models::{Notification, ParsedPreview, PreviewModel, ProgressState, RawFile};
use crate::services::parser::PreviewParser;
use crate::services::progress::{Clock, ProgressHandle, ProgressReporter, PROGRESS_DONE};
use crate::services::store::{PreviewReader, PreviewStore, StoreError};
use crate::services::target::infer_target;
use crate::services::utils::decode_text_async;
use crate::services::validator::{FileCandidate, Validator};

#[derive(Debug)]
pub struct IngestOutcome {
    pub model: Arc<PreviewModel>,
    pub notification: Notification,
}

/// Runs uploads through validate, decode, parse and target inference, and is the only
/// writer of the preview store.
pub struct Ingestor {
    validator: Validator,
    parser: PreviewParser,
    reporter: ProgressReporter,
    store: Arc<PreviewStore>,
    active: Mutex<Option<ProgressHandle>>,
}

impl Ingestor {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            validator: Validator::new(config.max_file_size),
            parser: PreviewParser::new(config.parse_mode, config.preview_rows),
            reporter: ProgressReporter::new(clock, config.progress_tick),
            store: Arc::new(PreviewStore::new()),
            active: Mutex::new(None),
        }
    }

    pub fn reader(&self) -> PreviewReader {
        PreviewReader::new(Arc::clone(&self.store))
    }

    pub fn progress(&self) -> ProgressState {
        self.reporter.current()
    }

    pub fn max_file_size(&self) -> u64 {
        self.validator.max_file_size()
    }

    /// Validation on declared metadata only, for rejecting uploads before their body
    /// is read.
    pub fn precheck(&self, candidate: &FileCandidate<'_>) -> Result<(), IngestError> {
        self.validator.validate(candidate).map_err(|e| {
            warn!("Rejected upload {}: {}", candidate.name, e);
            e
        })
    }

    pub async fn ingest(&self, file: RawFile) -> Result<IngestOutcome, AppError> {
        let start = std::time::Instant::now();

        let candidate = FileCandidate {
            name: &file.name,
            size: file.size,
            content_type: file.content_type.as_deref(),
        };
        self.precheck(&candidate)?;

        let ingestion_id = self.begin();
        info!(
            "Starting ingestion {} for {} ({} bytes)",
            ingestion_id, file.name, file.size
        );

        let preview = match self.decode_and_parse(&file).await {
            Ok(preview) => preview,
            Err(e) => {
                warn!("Ingestion {} failed: {}", ingestion_id, e);
                drop(self.take_handle(ingestion_id));
                return Err(e.into());
            }
        };

        let handle = match self.take_handle(ingestion_id) {
            Some(handle) => handle,
            None => {
                info!("Discarding result of superseded ingestion {}", ingestion_id);
                return Err(AppError::Superseded(ingestion_id));
            }
        };
        handle.complete();

        let target = infer_target(&preview.headers);
        let notification = Notification::success(
            "File uploaded successfully",
            format!(
                "Loaded {} rows with {} columns.",
                preview.row_count,
                preview.headers.len()
            ),
        );

        let model = PreviewModel {
            ingestion_id,
            file: file.info(),
            preview,
            target,
            progress: ProgressState {
                ingestion_id,
                percent: PROGRESS_DONE,
            },
        };

        if !self.store.replace(model) {
            info!("Discarding result of superseded ingestion {}", ingestion_id);
            return Err(AppError::Superseded(ingestion_id));
        }

        let model = self
            .store
            .read()
            .filter(|current| current.ingestion_id == ingestion_id)
            .ok_or(AppError::Superseded(ingestion_id))?;

        info!(
            "Ingestion {} completed in {:?}: {} rows, {} columns, target {:?}",
            ingestion_id,
            start.elapsed(),
            model.preview.row_count,
            model.preview.headers.len(),
            model.target
        );

        Ok(IngestOutcome { model, notification })
    }

    /// User override of the suggested target column.
    pub fn set_target_variable(&self, target: Option<String>) -> Result<Arc<PreviewModel>, AppError> {
        self.store.set_target_variable(target).map_err(|e| match e {
            StoreError::Empty => AppError::NotFound(e.to_string()),
            StoreError::UnknownHeader(_) => AppError::InvalidInput(e.to_string()),
        })
    }

    /// Makes a new ingestion current and starts its progress. The previous ingestion's
    /// progress handle is dropped here, which stops its ticks.
    fn begin(&self) -> u64 {
        let mut active = self.active.lock();
        let ingestion_id = self.store.begin_ingestion();
        let handle = self.reporter.start(ingestion_id);
        *active = Some(handle);
        ingestion_id
    }

    fn take_handle(&self, ingestion_id: u64) -> Option<ProgressHandle> {
        let mut active = self.active.lock();
        match active.as_ref() {
            Some(handle) if handle.ingestion_id() == ingestion_id => active.take(),
            _ => None,
        }
    }

    async fn decode_and_parse(&self, file: &RawFile) -> Result<ParsedPreview, IngestError> {
        let text = decode_text_async(file.bytes.clone()).await?;
        self.parser.parse(&text, file.size)
    }
}
