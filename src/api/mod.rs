use crate::config::Config;
use crate::services::{AttachmentService, DocumentService, HealthService};
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod content;
pub mod files;
pub mod health;
pub mod middleware;
pub mod schemas;

/// JSON envelopes escape control characters, so leave headroom over the raw content limit.
const JSON_OVERHEAD_FACTOR: usize = 2;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub document_service: DocumentService,
    pub attachment_service: AttachmentService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Clone, Debug)]
pub struct ServiceContainer {
    pub document_service: DocumentService,
    pub attachment_service: AttachmentService,
}

/// Configures and returns the primary application router.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let content_limit = config.documents.max_content_bytes.saturating_mul(JSON_OVERHEAD_FACTOR).max(64 * 1024);
    let file_limit = usize::try_from(config.documents.max_file_bytes).unwrap_or(usize::MAX);
    let enable_file_uploads = config.documents.enable_file_uploads;

    let state = AppState {
        config,
        document_service: services.document_service,
        attachment_service: services.attachment_service,
    };

    let content_routes = Router::new()
        .route(
            "/content",
            get(content::get_content).post(content::update_content).delete(content::clear_content),
        )
        .route("/content/extend", post(content::extend_expiration))
        .layer(DefaultBodyLimit::max(content_limit));

    let mut api_routes = content_routes;
    if enable_file_uploads {
        let file_routes = Router::new()
            .route("/files", get(files::list_files).post(files::upload_file))
            .route("/files/{id}", get(files::download_file).delete(files::delete_file))
            .layer(DefaultBodyLimit::max(file_limit));
        api_routes = api_routes.merge(file_routes);
    } else {
        tracing::info!("File uploads disabled; file routes not mounted");
    }

    Router::new()
        .nest("/api", api_routes)
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = response.status();
                        span.record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
