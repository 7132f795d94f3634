use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::question::QuestionRow;
use crate::questions::models::{OrderAssignment, QuestionDraft, QuestionPatch, SyncEntry};
use crate::questions::store;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub questions: Vec<OrderAssignment>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub questions: Vec<SyncEntry>,
}

/// GET /api/v1/opportunities/:id/questions
pub async fn handle_list_questions(
    State(state): State<AppState>,
    _identity: Identity,
    Path(opportunity_id): Path<Uuid>,
) -> Result<Json<Vec<QuestionRow>>, AppError> {
    let questions = store::list_questions(&state.db, opportunity_id).await?;
    Ok(Json(questions))
}

/// POST /api/v1/opportunities/:id/questions
pub async fn handle_create_question(
    State(state): State<AppState>,
    identity: Identity,
    Path(opportunity_id): Path<Uuid>,
    Json(draft): Json<QuestionDraft>,
) -> Result<(StatusCode, Json<QuestionRow>), AppError> {
    identity.require_admin()?;
    let question = store::create_question(&state.db, opportunity_id, draft).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// PUT /api/v1/opportunities/:id/questions
///
/// Bulk reorder: applies `{id, order}` pairs and returns the refreshed list.
pub async fn handle_reorder_questions(
    State(state): State<AppState>,
    identity: Identity,
    Path(opportunity_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<QuestionRow>>, AppError> {
    identity.require_admin()?;
    let questions = store::reorder(&state.db, opportunity_id, &request.questions).await?;
    Ok(Json(questions))
}

/// PUT /api/v1/opportunities/:id/questions/sync
///
/// Replaces the whole question list with the desired one in a single transaction.
pub async fn handle_sync_questions(
    State(state): State<AppState>,
    identity: Identity,
    Path(opportunity_id): Path<Uuid>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<Vec<QuestionRow>>, AppError> {
    identity.require_admin()?;
    let questions = store::sync_questions(&state.db, opportunity_id, request.questions).await?;
    Ok(Json(questions))
}

/// GET /api/v1/questions/:id
pub async fn handle_get_question(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionRow>, AppError> {
    Ok(Json(store::get_question(&state.db, id).await?))
}

/// PUT /api/v1/questions/:id
pub async fn handle_update_question(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(patch): Json<QuestionPatch>,
) -> Result<Json<QuestionRow>, AppError> {
    identity.require_admin()?;
    let question = store::update_question(&state.db, id, patch).await?;
    Ok(Json(question))
}

/// DELETE /api/v1/questions/:id
pub async fn handle_delete_question(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    identity.require_admin()?;
    store::delete_question(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
