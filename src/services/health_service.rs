use crate::domain::{AttachmentId, DocumentId};
use crate::storage::{BlobStorage, DocumentRepository};
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const CHECK_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
struct Metrics {
    status: Gauge<i64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("homeclip");
        Self {
            status: meter
                .i64_gauge("homeclip_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

/// Readiness probes for the two stores.
#[derive(Clone)]
pub struct HealthService {
    repo: Arc<dyn DocumentRepository>,
    blobs: Arc<dyn BlobStorage>,
    metrics: Metrics,
}

impl std::fmt::Debug for HealthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthService").field("metrics", &self.metrics).finish_non_exhaustive()
    }
}

impl HealthService {
    #[must_use]
    pub fn new(repo: Arc<dyn DocumentRepository>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { repo, blobs, metrics: Metrics::new() }
    }

    /// Checks that the document store answers.
    ///
    /// # Errors
    /// Returns a string describing the failure if the store errors or times out.
    pub async fn check_documents(&self) -> Result<(), String> {
        let probe = DocumentId::new("__readyz__");
        let res = timeout(CHECK_TIMEOUT, self.repo.exists(&probe)).await;
        self.record("documents", res)
    }

    /// Checks that the blob store answers.
    ///
    /// # Errors
    /// Returns a string describing the failure if the store errors or times out.
    pub async fn check_storage(&self) -> Result<(), String> {
        let probe = AttachmentId::new("__readyz__");
        let res = timeout(CHECK_TIMEOUT, self.blobs.exists(&probe)).await;
        self.record("storage", res)
    }

    fn record(
        &self,
        component: &'static str,
        res: Result<crate::error::Result<bool>, tokio::time::error::Elapsed>,
    ) -> Result<(), String> {
        let outcome = match res {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(format!("{component} check failed: {e}")),
            Err(_) => Err(format!("{component} check timed out")),
        };
        let status = i64::from(outcome.is_ok());
        self.metrics.status.record(status, &[KeyValue::new("component", component)]);
        outcome
    }
}
