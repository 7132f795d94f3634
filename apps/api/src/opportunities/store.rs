use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::opportunity::OpportunityRow;
use crate::models::question::QuestionRow;
use crate::questions::store::fetch_questions;

pub const OPPORTUNITY_STATUSES: [&str; 3] = ["draft", "open", "closed"];

/// An opportunity together with its ordered question snapshot.
#[derive(Debug, Serialize)]
pub struct OpportunityDetail {
    #[serde(flatten)]
    pub opportunity: OpportunityRow,
    pub questions: Vec<QuestionRow>,
}

pub async fn list_opportunities(
    pool: &PgPool,
    status: Option<&str>,
) -> Result<Vec<OpportunityRow>, AppError> {
    if let Some(status) = status {
        if !OPPORTUNITY_STATUSES.contains(&status) {
            return Err(AppError::Validation(format!(
                "status must be one of: {}",
                OPPORTUNITY_STATUSES.join(", ")
            )));
        }
    }

    Ok(sqlx::query_as::<_, OpportunityRow>(
        r#"
        SELECT * FROM opportunities
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(status)
    .fetch_all(pool)
    .await?)
}

pub async fn get_opportunity(pool: &PgPool, id: Uuid) -> Result<OpportunityDetail, AppError> {
    let opportunity =
        sqlx::query_as::<_, OpportunityRow>("SELECT * FROM opportunities WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Opportunity {id} not found")))?;
    let questions = fetch_questions(pool, id).await?;

    Ok(OpportunityDetail {
        opportunity,
        questions,
    })
}
