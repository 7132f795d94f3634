use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::applications::models::{
    ApplicationDetail, ApplicationFilters, StatusUpdateRequest, SubmitApplicationRequest,
    SubmittedApplication,
};
use crate::applications::store;
use crate::applications::submission::submit_application;
use crate::auth::{Identity, Role};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/applications
///
/// Submits the caller's application. The agent is always the caller.
pub async fn handle_submit_application(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<SubmitApplicationRequest>,
) -> Result<(StatusCode, Json<SubmittedApplication>), AppError> {
    if identity.role != Role::Agent {
        return Err(AppError::Forbidden);
    }

    // The confirmation email finishes in the background.
    let submission = submit_application(
        &state.db,
        state.dispatcher.clone(),
        &state.config,
        identity.id,
        request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(submission.submitted)))
}

/// GET /api/v1/applications
///
/// Agents only ever see their own applications, whatever `agent_id` says.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    identity: Identity,
    Query(mut filters): Query<ApplicationFilters>,
) -> Result<Json<Vec<ApplicationDetail>>, AppError> {
    if !identity.is_admin() {
        filters.agent_id = Some(identity.id);
    }
    let applications = store::list_applications(&state.db, &filters).await?;
    Ok(Json(applications))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationDetail>, AppError> {
    let application = store::get_application(&state.db, id).await?;
    identity.require_self_or_admin(application.application.agent_id)?;
    Ok(Json(application))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<ApplicationDetail>, AppError> {
    identity.require_admin()?;
    let application = store::update_status(&state.db, &state.config, id, request.status).await?;
    Ok(Json(application))
}
