use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::ProgressState;

pub const PROGRESS_STEP: u8 = 10;
pub const PROGRESS_SOFT_CAP: u8 = 95;
pub const PROGRESS_DONE: u8 = 100;

/// Time source for progress ticks.
pub trait Clock: Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Simulated progress for the ingestion currently in flight.
///
/// The value lives in a watch channel keyed by ingestion id. Only the ingestion whose
/// id is in the channel can move it, so a tick or completion from a replaced upload
/// is a no-op.
pub struct ProgressReporter {
    clock: Arc<dyn Clock>,
    tick: Duration,
    state: Arc<watch::Sender<ProgressState>>,
}

impl ProgressReporter {
    pub fn new(clock: Arc<dyn Clock>, tick: Duration) -> Self {
        let (state, _) = watch::channel(ProgressState::default());
        Self {
            clock,
            tick,
            state: Arc::new(state),
        }
    }

    pub fn current(&self) -> ProgressState {
        *self.state.borrow()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.state.subscribe()
    }

    /// Resets progress to 0 for `ingestion_id` and starts ticking. Ids older than the
    /// one already tracked get an inert handle.
    pub fn start(&self, ingestion_id: u64) -> ProgressHandle {
        let started = self.state.send_if_modified(|state| {
            if ingestion_id < state.ingestion_id {
                return false;
            }
            *state = ProgressState { ingestion_id, percent: 0 };
            true
        });

        let task = if started {
            let clock = Arc::clone(&self.clock);
            let state = Arc::clone(&self.state);
            Some(tokio::spawn(run_ticks(clock, self.tick, state, ingestion_id)))
        } else {
            debug!("Ignoring progress start for stale ingestion {}", ingestion_id);
            None
        };

        ProgressHandle {
            ingestion_id,
            state: Arc::clone(&self.state),
            task,
        }
    }
}

async fn run_ticks(
    clock: Arc<dyn Clock>,
    tick: Duration,
    state: Arc<watch::Sender<ProgressState>>,
    ingestion_id: u64,
) {
    loop {
        clock.sleep(tick).await;

        let mut advancing = false;
        state.send_if_modified(|current| {
            if current.ingestion_id != ingestion_id || current.percent >= PROGRESS_SOFT_CAP {
                return false;
            }
            current.percent = (current.percent + PROGRESS_STEP).min(PROGRESS_SOFT_CAP);
            advancing = current.percent < PROGRESS_SOFT_CAP;
            true
        });

        if !advancing {
            debug!("Progress ticks stopped for ingestion {}", ingestion_id);
            break;
        }
    }
}

/// Owns the tick task of one ingestion. Dropping it stops the ticks.
pub struct ProgressHandle {
    ingestion_id: u64,
    state: Arc<watch::Sender<ProgressState>>,
    task: Option<JoinHandle<()>>,
}

impl ProgressHandle {
    pub fn ingestion_id(&self) -> u64 {
        self.ingestion_id
    }

    #[cfg(test)]
    pub fn is_ticking(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Stops ticking and jumps to 100. Returns false when a newer ingestion owns the
    /// progress value, in which case nothing changes.
    pub fn complete(self) -> bool {
        self.stop();
        let id = self.ingestion_id;
        self.state.send_if_modified(|current| {
            if current.ingestion_id != id {
                return false;
            }
            current.percent = PROGRESS_DONE;
            true
        })
    }

    fn stop(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
