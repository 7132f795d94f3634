use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::agent::AgentRow;

/// Partial profile update; absent fields are untouched, a `null` phone clears it.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    pub language: Option<String>,
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ProfilePatch {
    /// Applies the patch to `agent`, rejecting values that would leave the profile invalid.
    pub fn apply(&self, agent: &mut AgentRow) -> Result<(), AppError> {
        if let Some(email) = &self.email {
            let email = email.trim();
            if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
                return Err(AppError::Validation(format!("'{email}' is not an email address")));
            }
            agent.email = email.to_lowercase();
        }
        if let Some(first_name) = &self.first_name {
            agent.first_name = non_blank("first_name", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            agent.last_name = non_blank("last_name", last_name)?;
        }
        if let Some(phone) = &self.phone {
            agent.phone = phone
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty());
        }
        if let Some(language) = &self.language {
            agent.language = non_blank("language", language)?.to_lowercase();
        }
        Ok(())
    }
}

fn non_blank(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

pub async fn get_profile(pool: &PgPool, agent_id: Uuid) -> Result<AgentRow, AppError> {
    sqlx::query_as::<_, AgentRow>("SELECT * FROM agents WHERE id = $1")
        .bind(agent_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Agent profile {agent_id} not found")))
}

pub async fn update_profile(
    pool: &PgPool,
    agent_id: Uuid,
    patch: &ProfilePatch,
) -> Result<AgentRow, AppError> {
    let mut agent = get_profile(pool, agent_id).await?;
    patch.apply(&mut agent)?;

    let updated = sqlx::query_as::<_, AgentRow>(
        r#"
        UPDATE agents
        SET email = $2, first_name = $3, last_name = $4, phone = $5, language = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(agent_id)
    .bind(&agent.email)
    .bind(&agent.first_name)
    .bind(&agent.last_name)
    .bind(&agent.phone)
    .bind(&agent.language)
    .fetch_one(pool)
    .await
    .map_err(|e| match crate::db::unique_violation(&e) {
        Some("agents_email_key") => {
            AppError::Validation("That email is already in use".to_string())
        }
        _ => AppError::Storage(e),
    })?;

    info!("Updated profile for agent {agent_id}");
    Ok(updated)
}
