#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod storage;
pub mod telemetry;
pub mod workers;

use crate::api::ServiceContainer;
use crate::config::Config;
use crate::domain::{Clock, ExpirationPolicy, SystemClock};
use crate::services::{AttachmentService, DocumentService, HealthService};
use crate::storage::{BlobStorage, DocumentRepository, InMemoryBlobStorage, InMemoryDocumentRepository};
use crate::workers::DocumentCleanupWorker;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::watch;

/// Wires stores, services and workers together. Every collaborator defaults to
/// its in-memory or system implementation and can be swapped for tests.
pub struct AppBuilder {
    config: Config,
    clock: Option<Arc<dyn Clock>>,
    repo: Option<Arc<dyn DocumentRepository>>,
    blobs: Option<Arc<dyn BlobStorage>>,
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder").field("config", &self.config).field("clock", &self.clock).finish_non_exhaustive()
    }
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, clock: None, repo: None, blobs: None }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn with_document_repository(mut self, repo: Arc<dyn DocumentRepository>) -> Self {
        self.repo = Some(repo);
        self
    }

    #[must_use]
    pub fn with_blob_storage(mut self, blobs: Arc<dyn BlobStorage>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    #[must_use]
    pub fn build(self) -> App {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let repo = self.repo.unwrap_or_else(|| Arc::new(InMemoryDocumentRepository::new()));
        let blobs = self.blobs.unwrap_or_else(|| Arc::new(InMemoryBlobStorage::new()));

        let document_service =
            DocumentService::new(Arc::clone(&repo), Arc::clone(&clock), self.config.documents.max_content_bytes);
        let attachment_service = AttachmentService::new(
            document_service.clone(),
            Arc::clone(&repo),
            Arc::clone(&blobs),
            self.config.documents.max_file_bytes,
        );
        let health_service = HealthService::new(Arc::clone(&repo), Arc::clone(&blobs));

        let cleanup = self.config.cleanup.enabled.then(|| {
            let grace = time::Duration::seconds(i64::try_from(self.config.cleanup.grace_period_secs).unwrap_or(i64::MAX));
            Arc::new(DocumentCleanupWorker::new(
                repo,
                blobs,
                clock,
                ExpirationPolicy::new(grace),
                StdDuration::from_secs(self.config.cleanup.interval_secs.max(1)),
            ))
        });

        App {
            config: self.config,
            services: ServiceContainer { document_service, attachment_service },
            health_service,
            workers: Workers { cleanup },
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub services: ServiceContainer,
    pub health_service: HealthService,
    pub workers: Workers,
}

/// Background tasks owned by the application.
#[derive(Debug, Clone, Default)]
pub struct Workers {
    pub cleanup: Option<Arc<DocumentCleanupWorker>>,
}

impl Workers {
    pub async fn start_all(&self, shutdown_rx: watch::Receiver<bool>) {
        if let Some(cleanup) = &self.cleanup {
            cleanup.start(shutdown_rx).await;
        } else {
            tracing::info!("Document cleanup disabled");
        }
    }

    /// Stops every worker and waits for each to exit.
    pub async fn stop_all(&self) {
        if let Some(cleanup) = &self.cleanup {
            cleanup.stop().await;
        }
    }
}

/// Flips `shutdown_tx` to `true` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
            () = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log sink.
pub fn setup_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "Thread panicked");
        default_hook(info);
    }));
}
