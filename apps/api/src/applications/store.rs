use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::models::{
    AgentSummary, ApplicationDetail, ApplicationFilters, ApplicationStatus, OpportunitySummary,
};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::agent::AgentRow;
use crate::models::application::{AnswerRow, ApplicationRow};
use crate::models::opportunity::OpportunityRow;
use crate::notifications::feed::{self, NewNotification, NotificationKind};

pub async fn get_application(pool: &PgPool, id: Uuid) -> Result<ApplicationDetail, AppError> {
    let application =
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    load_details(pool, vec![application])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

/// Applications matching every given filter, newest first.
pub async fn list_applications(
    pool: &PgPool,
    filters: &ApplicationFilters,
) -> Result<Vec<ApplicationDetail>, AppError> {
    let applications = sqlx::query_as::<_, ApplicationRow>(
        r#"
        SELECT * FROM applications
        WHERE ($1::uuid IS NULL OR agent_id = $1)
          AND ($2::uuid IS NULL OR opportunity_id = $2)
          AND ($3::text IS NULL OR status = $3)
        ORDER BY submitted_at DESC, id
        "#,
    )
    .bind(filters.agent_id)
    .bind(filters.opportunity_id)
    .bind(filters.status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    load_details(pool, applications).await
}

/// Moves an application through the review workflow and notifies the agent.
pub async fn update_status(
    pool: &PgPool,
    config: &Config,
    id: Uuid,
    next: ApplicationStatus,
) -> Result<ApplicationDetail, AppError> {
    let mut tx = pool.begin().await?;
    let current =
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let from = ApplicationStatus::parse(&current.status).ok_or_else(|| {
        anyhow::anyhow!("application {id} has unknown status '{}'", current.status)
    })?;
    if !from.can_transition_to(next) {
        return Err(AppError::Validation(format!(
            "Cannot move application from {} to {}",
            from.as_str(),
            next.as_str()
        )));
    }

    let updated = sqlx::query_as::<_, ApplicationRow>(
        "UPDATE applications SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(next.as_str())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    info!("Application {id} moved from {} to {}", from.as_str(), next.as_str());

    let detail = load_details(pool, vec![updated])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let notification = NewNotification {
        recipient_id: detail.application.agent_id,
        kind: NotificationKind::ApplicationStatusChanged,
        title: format!("Application update: {}", next.label()),
        body: format!(
            "Your application for {} is now: {}.",
            detail.opportunity.title,
            next.label()
        ),
        link: Some(config.application_link(id)),
    };
    if let Err(e) = feed::push(pool, &notification).await {
        warn!("Could not add status notification for application {id}: {e}");
    }

    Ok(detail)
}

/// Loads opportunities, agents and answers for `applications` in three queries.
async fn load_details(
    pool: &PgPool,
    applications: Vec<ApplicationRow>,
) -> Result<Vec<ApplicationDetail>, AppError> {
    if applications.is_empty() {
        return Ok(Vec::new());
    }
    let application_ids: Vec<Uuid> = applications.iter().map(|a| a.id).collect();
    let opportunity_ids: Vec<Uuid> = applications.iter().map(|a| a.opportunity_id).collect();
    let agent_ids: Vec<Uuid> = applications.iter().map(|a| a.agent_id).collect();

    let opportunities =
        sqlx::query_as::<_, OpportunityRow>("SELECT * FROM opportunities WHERE id = ANY($1)")
            .bind(&opportunity_ids)
            .fetch_all(pool)
            .await?;
    let agents = sqlx::query_as::<_, AgentRow>("SELECT * FROM agents WHERE id = ANY($1)")
        .bind(&agent_ids)
        .fetch_all(pool)
        .await?;
    let answers = sqlx::query_as::<_, AnswerRow>(
        r#"
        SELECT a.* FROM application_answers a
        JOIN opportunity_questions q ON q.id = a.question_id
        WHERE a.application_id = ANY($1)
        ORDER BY q.order_index
        "#,
    )
    .bind(&application_ids)
    .fetch_all(pool)
    .await?;

    Ok(assemble_details(applications, &opportunities, &agents, answers))
}

/// Nests related rows under each application, keeping application order.
/// Applications whose opportunity or agent is missing are skipped.
fn assemble_details(
    applications: Vec<ApplicationRow>,
    opportunities: &[OpportunityRow],
    agents: &[AgentRow],
    answers: Vec<AnswerRow>,
) -> Vec<ApplicationDetail> {
    let opportunities: HashMap<Uuid, &OpportunityRow> =
        opportunities.iter().map(|o| (o.id, o)).collect();
    let agents: HashMap<Uuid, &AgentRow> = agents.iter().map(|a| (a.id, a)).collect();
    let mut answers_by_application: HashMap<Uuid, Vec<AnswerRow>> = HashMap::new();
    for answer in answers {
        answers_by_application
            .entry(answer.application_id)
            .or_default()
            .push(answer);
    }

    applications
        .into_iter()
        .filter_map(|application| {
            let opportunity = opportunities.get(&application.opportunity_id)?;
            let agent = agents.get(&application.agent_id)?;
            let answers = answers_by_application
                .remove(&application.id)
                .unwrap_or_default();
            Some(ApplicationDetail {
                opportunity: OpportunitySummary::from(*opportunity),
                agent: AgentSummary::from(*agent),
                answers,
                application,
            })
        })
        .collect()
}
