use axum::{extract::State, Json};

use crate::agents::profile::{self, ProfilePatch};
use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::agent::AgentRow;
use crate::state::AppState;

/// GET /api/v1/agents/me
pub async fn handle_get_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<AgentRow>, AppError> {
    Ok(Json(profile::get_profile(&state.db, identity.id).await?))
}

/// PUT /api/v1/agents/me
pub async fn handle_update_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<AgentRow>, AppError> {
    let agent = profile::update_profile(&state.db, identity.id, &patch).await?;
    Ok(Json(agent))
}
