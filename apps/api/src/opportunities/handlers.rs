use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::opportunity::OpportunityRow;
use crate::opportunities::store::{self, OpportunityDetail};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OpportunityQuery {
    pub status: Option<String>,
}

/// GET /api/v1/opportunities
pub async fn handle_list_opportunities(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<OpportunityQuery>,
) -> Result<Json<Vec<OpportunityRow>>, AppError> {
    let opportunities = store::list_opportunities(&state.db, query.status.as_deref()).await?;
    Ok(Json(opportunities))
}

/// GET /api/v1/opportunities/:id
///
/// Returns the opportunity with its ordered questions, the snapshot applicants answer against.
pub async fn handle_get_opportunity(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<OpportunityDetail>, AppError> {
    Ok(Json(store::get_opportunity(&state.db, id).await?))
}
