use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::questions::models::{QuestionFields, QuestionType, ValidationRules};
use crate::questions::ordering::Slot;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub opportunity_id: Uuid,
    pub prompt: String,
    pub prompt_secondary: Option<String>,
    pub question_type: String,
    pub required: bool,
    #[serde(rename = "order")]
    pub order_index: i32,
    pub options: Vec<String>,
    pub placeholder: Option<String>,
    pub placeholder_secondary: Option<String>,
    pub validation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuestionRow {
    pub fn kind(&self) -> Option<QuestionType> {
        QuestionType::parse(&self.question_type)
    }

    /// Stored rules, or no rules when the column is empty or unreadable.
    pub fn rules(&self) -> ValidationRules {
        self.validation
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn slot(&self) -> Slot {
        Slot {
            id: self.id,
            order: self.order_index,
        }
    }

    pub fn fields(&self) -> Option<QuestionFields> {
        Some(QuestionFields {
            prompt: self.prompt.clone(),
            prompt_secondary: self.prompt_secondary.clone(),
            question_type: self.kind()?,
            required: self.required,
            options: self.options.clone(),
            placeholder: self.placeholder.clone(),
            placeholder_secondary: self.placeholder_secondary.clone(),
            validation: self
                .validation
                .as_ref()
                .map(|_| self.rules())
                .filter(|rules| !rules.is_empty()),
        })
    }
}
