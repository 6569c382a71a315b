use crate::domain::{Clock, DocumentId, ExpirationPolicy, Lifecycle};
use crate::error::{AppError, Result};
use crate::storage::{BlobStorage, DocumentRepository};
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    sweeps: Counter<u64>,
    reclaimed: Counter<u64>,
    blob_delete_failures: Counter<u64>,
    errors: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("homeclip");
        Self {
            sweeps: meter
                .u64_counter("documents_cleanup_sweeps_total")
                .with_description("Total number of cleanup sweeps performed")
                .build(),
            reclaimed: meter
                .u64_counter("documents_reclaimed_total")
                .with_description("Total number of expired documents reclaimed")
                .build(),
            blob_delete_failures: meter
                .u64_counter("documents_cleanup_blob_failures_total")
                .with_description("Total number of attachment files that could not be deleted during cleanup")
                .build(),
            errors: meter
                .u64_counter("documents_cleanup_errors_total")
                .with_description("Total number of errors encountered during document cleanup")
                .build(),
        }
    }
}

/// Everything a sweep needs, shared between the worker handle and its task.
struct Sweeper {
    repo: Arc<dyn DocumentRepository>,
    blobs: Arc<dyn BlobStorage>,
    clock: Arc<dyn Clock>,
    policy: ExpirationPolicy,
    metrics: Metrics,
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper").field("policy", &self.policy).field("clock", &self.clock).finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum State {
    Stopped,
    Running { token: CancellationToken, handle: JoinHandle<()> },
}

/// Periodically reclaims documents that are past their grace period.
///
/// The worker owns at most one background task. `start` while running and
/// `stop` while stopped are no-ops; `stop` returns only after the task exited.
#[derive(Debug)]
pub struct DocumentCleanupWorker {
    sweeper: Arc<Sweeper>,
    interval: StdDuration,
    state: Mutex<State>,
}

impl DocumentCleanupWorker {
    #[must_use]
    pub fn new(
        repo: Arc<dyn DocumentRepository>,
        blobs: Arc<dyn BlobStorage>,
        clock: Arc<dyn Clock>,
        policy: ExpirationPolicy,
        interval: StdDuration,
    ) -> Self {
        Self {
            sweeper: Arc::new(Sweeper { repo, blobs, clock, policy, metrics: Metrics::new() }),
            interval,
            state: Mutex::new(State::Stopped),
        }
    }

    /// Launches the background task. It sweeps once right away, then on every
    /// interval tick until `stop` is called or `shutdown` turns true.
    pub async fn start(&self, shutdown: watch::Receiver<bool>) {
        let mut state = self.state.lock().await;
        if let State::Running { handle, .. } = &*state
            && !handle.is_finished()
        {
            tracing::debug!("Document cleanup already running");
            return;
        }

        let token = CancellationToken::new();
        let task = Arc::clone(&self.sweeper).run(self.interval, token.clone(), shutdown);
        let handle = tokio::spawn(task);
        *state = State::Running { token, handle };
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            grace_period_secs = self.sweeper.policy.grace_period().whole_seconds(),
            "Document cleanup started"
        );
    }

    /// Signals the background task and waits for it to exit.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let State::Running { token, handle } = std::mem::replace(&mut *state, State::Stopped) else {
            return;
        };

        token.cancel();
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Document cleanup task ended abnormally");
        }
    }

    pub async fn is_running(&self) -> bool {
        matches!(&*self.state.lock().await, State::Running { handle, .. } if !handle.is_finished())
    }

    /// Runs one sweep over every stored document. Returns how many were reclaimed.
    ///
    /// # Errors
    /// Returns an error only if the document ids cannot be listed.
    pub async fn perform_sweep(&self) -> Result<u64> {
        self.sweeper.perform_sweep().await
    }

    /// Reclaims a single document if it is still eligible.
    ///
    /// # Errors
    /// Propagates repository failures other than `AppError::DocumentNotFound`.
    pub async fn cleanup_document(&self, id: &DocumentId) -> Result<bool> {
        self.sweeper.cleanup_document(id).await
    }
}

impl Sweeper {
    async fn run(self: Arc<Self>, interval: StdDuration, token: CancellationToken, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    async {
                        tracing::debug!("Running document cleanup...");
                        self.metrics.sweeps.add(1, &[]);
                        if let Err(e) = self.perform_sweep().await {
                            tracing::error!(error = %e, "Document cleanup cycle failed");
                            self.metrics.errors.add(1, &[]);
                        }
                    }
                    .instrument(tracing::info_span!("document_cleanup_iteration"))
                    .await;
                }
                () = token.cancelled() => break,
                res = shutdown.changed() => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Document cleanup loop shutting down...");
    }

    #[tracing::instrument(err, skip(self), fields(reclaimed_count = tracing::field::Empty))]
    async fn perform_sweep(&self) -> Result<u64> {
        let ids = self.repo.list_ids().await?;
        let now = self.clock.now();

        let mut reclaimed = 0;
        for id in ids {
            let document = match self.repo.find_by_id(&id).await {
                Ok(document) => document,
                Err(AppError::DocumentNotFound) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, document_id = %id, "Failed to load document during cleanup");
                    self.metrics.errors.add(1, &[]);
                    continue;
                }
            };

            if !self.policy.should_cleanup(&document, now) {
                continue;
            }

            match self.cleanup_document(&id).await {
                Ok(true) => reclaimed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, document_id = %id, "Failed to clean up document");
                    self.metrics.errors.add(1, &[]);
                }
            }
        }

        tracing::Span::current().record("reclaimed_count", reclaimed);
        if reclaimed > 0 {
            self.metrics.reclaimed.add(reclaimed, &[]);
            tracing::info!(reclaimed_count = reclaimed, "Document cleanup completed");
        }
        Ok(reclaimed)
    }

    /// Deletes the document's files and then its record. The record is kept if
    /// any file could not be deleted so the next sweep retries it, or if it was
    /// written to after the re-check.
    async fn cleanup_document(&self, id: &DocumentId) -> Result<bool> {
        async {
            let document = match self.repo.find_by_id(id).await {
                Ok(document) => document,
                Err(AppError::DocumentNotFound) => return Ok(false),
                Err(e) => return Err(e),
            };

            // Re-check: the document may have been cleared since the sweep looked at it.
            let lifecycle = self.policy.lifecycle(&document, self.clock.now());
            if lifecycle != Lifecycle::Reclaimable {
                tracing::debug!(?lifecycle, "Document no longer reclaimable");
                return Ok(false);
            }

            let mut failures = 0_u64;
            for attachment in document.attachments() {
                if let Err(e) = self.blobs.delete(attachment.id()).await {
                    tracing::warn!(error = %e, attachment_id = %attachment.id(), "Failed to delete attachment file");
                    failures += 1;
                }
            }

            if failures > 0 {
                self.metrics.blob_delete_failures.add(failures, &[]);
                return Ok(false);
            }

            // A write since the re-check bumped the version and keeps the record.
            let removed = self.repo.delete_if_version(id, document.version()).await?;
            if !removed {
                tracing::info!("Document changed during cleanup, keeping it");
            }
            Ok(removed)
        }
        .instrument(tracing::info_span!("cleanup_document", "document.id" = %id))
        .await
    }
}
