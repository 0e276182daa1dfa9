use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use studymind_logging::{sm_debug, sm_warn};
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{ClientEvent, EventSink, IngestStatus, PollStop, StudyApi};

struct PollEntry {
    id: u64,
    abort: AbortHandle,
}

/// Active status pollers keyed by filename. At most one per name.
#[derive(Default)]
pub struct PollRegistry {
    tasks: Mutex<HashMap<String, PollEntry>>,
    next_id: AtomicU64,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_polling(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Stops the poller for `name`. Returns false if none was running.
    pub fn cancel(&self, name: &str) -> bool {
        match self.lock().remove(name) {
            Some(entry) => {
                entry.abort.abort();
                sm_debug!("Cancelled polling for {}", name);
                true
            }
            None => false,
        }
    }

    /// Stops every poller and returns how many were running.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        for (_, entry) in &drained {
            entry.abort.abort();
        }
        drained.len()
    }

    /// Removes the entry only if it still belongs to task `id`.
    fn release(&self, name: &str, id: u64) {
        let mut tasks = self.lock();
        if tasks.get(name).is_some_and(|entry| entry.id == id) {
            tasks.remove(name);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PollEntry>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Spawns per-file status pollers on the current tokio runtime.
pub struct Poller {
    api: Arc<dyn StudyApi>,
    registry: Arc<PollRegistry>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
}

impl Poller {
    pub fn new(
        api: Arc<dyn StudyApi>,
        registry: Arc<PollRegistry>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            registry,
            sink,
            interval,
        }
    }

    pub fn registry(&self) -> &Arc<PollRegistry> {
        &self.registry
    }

    /// Starts polling `name` unless a poller already exists for it.
    ///
    /// Must be called from within a tokio runtime. Returns whether a new task was started.
    pub fn start(&self, name: &str) -> bool {
        let mut tasks = self.registry.lock();
        if tasks.contains_key(name) {
            sm_debug!("Already polling {}", name);
            return false;
        }
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let task = tokio::spawn(poll_loop(
            self.api.clone(),
            self.registry.clone(),
            self.sink.clone(),
            name.to_string(),
            self.interval,
            id,
        ));
        tasks.insert(
            name.to_string(),
            PollEntry {
                id,
                abort: task.abort_handle(),
            },
        );
        true
    }
}

async fn poll_loop(
    api: Arc<dyn StudyApi>,
    registry: Arc<PollRegistry>,
    sink: Arc<dyn EventSink>,
    name: String,
    interval: Duration,
    id: u64,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = loop {
        ticker.tick().await;
        match api.ingest_status(&name).await {
            Ok(None) => break PollStop::NotFound,
            Ok(Some(report)) if report.status == IngestStatus::NotFound => {
                break PollStop::NotFound
            }
            Ok(Some(report)) => {
                let status = report.status;
                sink.emit(ClientEvent::StatusPolled {
                    name: name.clone(),
                    report,
                });
                if status.is_terminal() {
                    break PollStop::Terminal(status);
                }
            }
            Err(err) => {
                // No retry: tracking for this file simply ends.
                sm_warn!("Status polling for {} stopped: {}", name, err);
                break PollStop::Failed(err);
            }
        }
    };

    registry.release(&name, id);
    sink.emit(ClientEvent::PollingStopped { name, reason });
}
