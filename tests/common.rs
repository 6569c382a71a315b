#![allow(dead_code)]
use homeclip::api::MgmtState;
use homeclip::config::Config;
use homeclip::domain::{Clock, ManualClock};
use homeclip::storage::{BlobStorage, DocumentRepository, InMemoryBlobStorage, InMemoryDocumentRepository};
use homeclip::{AppBuilder, Workers};
use std::net::SocketAddr;
use std::sync::{Arc, Once};
use tokio::net::TcpListener;
use tokio::sync::watch;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("homeclip=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub fn get_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0; // 0 means let OS choose
    config.server.mgmt_port = 0;
    config.cleanup.enabled = false;
    config
}

pub struct TestApp {
    pub config: Config,
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub clock: Arc<ManualClock>,
    pub repo: Arc<InMemoryDocumentRepository>,
    pub blobs: Arc<InMemoryBlobStorage>,
    pub workers: Workers,
    shutdown_tx: watch::Sender<bool>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        setup_tracing();

        let clock = Arc::new(ManualClock::default());
        let repo = Arc::new(InMemoryDocumentRepository::new());
        let blobs = Arc::new(InMemoryBlobStorage::new());

        let app = AppBuilder::new(config.clone())
            .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .with_document_repository(Arc::clone(&repo) as Arc<dyn DocumentRepository>)
            .with_blob_storage(Arc::clone(&blobs) as Arc<dyn BlobStorage>)
            .build();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        app.workers.start_all(shutdown_rx.clone()).await;

        let app_router = homeclip::api::app_router(app.config, app.services);
        let mgmt_router = homeclip::api::mgmt_router(MgmtState { health_service: app.health_service });

        let server_url = serve(app_router, shutdown_rx.clone()).await;
        let mgmt_url = serve(mgmt_router, shutdown_rx).await;

        Self {
            config,
            server_url,
            mgmt_url,
            client: reqwest::Client::new(),
            clock,
            repo,
            blobs,
            workers: app.workers,
            shutdown_tx,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    pub async fn upload(&self, document: Option<&str>, name: &str, mime: Option<&str>, data: &[u8]) -> reqwest::Response {
        let url = match document {
            Some(document) => self.url(&format!("/api/files?name={name}&document={document}")),
            None => self.url(&format!("/api/files?name={name}")),
        };
        let mut request = self.client.post(url).body(data.to_vec());
        if let Some(mime) = mime {
            request = request.header("content-type", mime);
        }
        request.send().await.unwrap()
    }

    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, serde_json::Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn serve(router: axum::Router, shutdown_rx: watch::Receiver<bool>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut rx = shutdown_rx;
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move {
                let _ = rx.wait_for(|&s| s).await;
            })
            .await
            .unwrap();
    });

    format!("http://{addr}")
}
