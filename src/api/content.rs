use crate::api::AppState;
use crate::api::schemas::content::{ContentResponse, DocumentQuery, ExtendExpirationRequest, UpdateContentRequest};
use crate::domain::DocumentId;
use crate::error::Result;
use axum::{
    Json,
    extract::{Query, State},
};
use time::Duration;

/// Returns the document's content and live attachments, creating it on first access.
///
/// # Errors
/// Returns a storage error if the document store fails.
pub async fn get_content(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<ContentResponse>> {
    let id = DocumentId::or_default(query.document.as_deref());
    let view = state.document_service.get_content(&id).await?;
    Ok(Json(ContentResponse::from(&view)))
}

/// Replaces the document's content.
///
/// # Errors
/// Returns `AppError::ContentTooLarge` or `AppError::Expired` if the update is rejected.
pub async fn update_content(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
    Json(payload): Json<UpdateContentRequest>,
) -> Result<Json<ContentResponse>> {
    let id = DocumentId::or_default(query.document.as_deref());
    let document = state.document_service.update_content(&id, payload.content).await?;
    Ok(Json(ContentResponse::new(&document, state.document_service.now())))
}

/// Empties the document's content.
///
/// # Errors
/// Returns a storage error if the document store fails.
pub async fn clear_content(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<ContentResponse>> {
    let id = DocumentId::or_default(query.document.as_deref());
    let document = state.document_service.clear(&id).await?;
    Ok(Json(ContentResponse::new(&document, state.document_service.now())))
}

/// Pushes the document's expiration forward.
///
/// # Errors
/// Returns `AppError::DocumentNotFound` or `AppError::Expired` if the document cannot be extended.
pub async fn extend_expiration(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
    Json(payload): Json<ExtendExpirationRequest>,
) -> Result<Json<ContentResponse>> {
    let id = DocumentId::or_default(query.document.as_deref());
    let by = Duration::seconds(i64::try_from(payload.seconds).unwrap_or(i64::MAX));
    let document = state.document_service.extend_expiration(&id, by).await?;
    Ok(Json(ContentResponse::new(&document, state.document_service.now())))
}
