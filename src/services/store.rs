use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::PreviewModel;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no file has been ingested yet")]
    Empty,
    #[error("{0:?} is not a column of the current preview")]
    UnknownHeader(String),
}

#[derive(Default)]
struct StoreState {
    generation: u64,
    current: Option<Arc<PreviewModel>>,
}

/// Holds the single current ingestion result.
///
/// `generation` is the id of the most recently started ingestion. A model is only
/// accepted if it belongs to that ingestion, which is checked under the same lock as
/// the swap.
#[derive(Default)]
pub struct PreviewStore {
    state: RwLock<StoreState>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a new ingestion as current and returns its id.
    pub fn begin_ingestion(&self) -> u64 {
        let mut state = self.state.write();
        state.generation += 1;
        state.generation
    }

    #[cfg(test)]
    pub fn is_current(&self, ingestion_id: u64) -> bool {
        self.state.read().generation == ingestion_id
    }

    /// Swaps in `model` as a whole. Returns false, leaving the store untouched, when
    /// the model comes from an ingestion that has since been superseded.
    pub fn replace(&self, model: PreviewModel) -> bool {
        let mut state = self.state.write();
        if model.ingestion_id != state.generation {
            return false;
        }
        state.current = Some(Arc::new(model));
        true
    }

    /// Overwrites the target column of the current model. `None` clears it.
    pub fn set_target_variable(
        &self,
        target: Option<String>,
    ) -> Result<Arc<PreviewModel>, StoreError> {
        let mut state = self.state.write();
        let current = state.current.as_ref().ok_or(StoreError::Empty)?;

        if let Some(name) = &target {
            if !current.preview.headers.iter().any(|header| header == name) {
                return Err(StoreError::UnknownHeader(name.clone()));
            }
        }

        let mut next = PreviewModel::clone(current);
        next.target = target;
        let next = Arc::new(next);
        state.current = Some(Arc::clone(&next));
        Ok(next)
    }

    pub fn read(&self) -> Option<Arc<PreviewModel>> {
        self.state.read().current.clone()
    }
}

/// Read-only view of the store for downstream consumers.
#[derive(Clone)]
pub struct PreviewReader {
    store: Arc<PreviewStore>,
}

impl PreviewReader {
    pub fn new(store: Arc<PreviewStore>) -> Self {
        Self { store }
    }

    pub fn read(&self) -> Option<Arc<PreviewModel>> {
        self.store.read()
    }
}
