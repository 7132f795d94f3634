use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub opportunity_id: Uuid,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub confirmation_email_sent: bool,
    pub confirmation_email_sent_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub question_id: Uuid,
    /// Tagged `AnswerValue` JSON.
    pub value: Value,
    pub created_at: DateTime<Utc>,
}
