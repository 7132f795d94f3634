use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::notification::NotificationRow;
use crate::notifications::feed;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked: u64,
}

/// GET /api/v1/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    let notifications = feed::list(&state.db, identity.id, query.unread_only).await?;
    Ok(Json(notifications))
}

/// GET /api/v1/notifications/unread-count
pub async fn handle_unread_count(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = feed::unread_count(&state.db, identity.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationRow>, AppError> {
    let notification = feed::mark_read(&state.db, identity.id, id).await?;
    Ok(Json(notification))
}

/// POST /api/v1/notifications/read-all
pub async fn handle_mark_all_read(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let marked = feed::mark_all_read(&state.db, identity.id).await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
