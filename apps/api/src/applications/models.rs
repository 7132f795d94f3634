use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::agent::AgentRow;
use crate::models::application::{AnswerRow, ApplicationRow};
use crate::models::opportunity::OpportunityRow;

/// An applicant's response, tagged by shape.
/// Wire and storage form: `{"kind": "choice", "value": "Evenings"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    MultiText(Vec<String>),
    Choice(String),
    MultiChoice(Vec<String>),
    Bool(bool),
    Number(f64),
}

impl AnswerValue {
    /// Blank text and empty lists count as no answer. Bools and numbers never do.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => text.trim().is_empty(),
            AnswerValue::MultiText(items) | AnswerValue::MultiChoice(items) => {
                items.iter().all(|item| item.trim().is_empty())
            }
            AnswerValue::Bool(_) | AnswerValue::Number(_) => false,
        }
    }

    /// Drops blank entries from free-text lists; other shapes are returned as is.
    pub fn without_blank_items(self) -> Self {
        match self {
            AnswerValue::MultiText(items) => AnswerValue::MultiText(
                items
                    .into_iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerInput {
    pub question_id: Uuid,
    pub value: AnswerValue,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApplicationStatus::Pending),
            "reviewing" => Some(ApplicationStatus::Reviewing),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    /// Review workflow: pending -> reviewing -> accepted | rejected, with a
    /// direct decision from pending allowed. Decisions are final.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Reviewing)
                | (Pending, Accepted)
                | (Pending, Rejected)
                | (Reviewing, Accepted)
                | (Reviewing, Rejected)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Reviewing => "Under review",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Not selected",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub opportunity_id: Uuid,
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationFilters {
    pub agent_id: Option<Uuid>,
    pub opportunity_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Serialize)]
pub struct SubmittedApplication {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub answers: Vec<AnswerRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpportunitySummary {
    pub id: Uuid,
    pub title: String,
    pub status: String,
}

impl From<&OpportunityRow> for OpportunitySummary {
    fn from(row: &OpportunityRow) -> Self {
        OpportunitySummary {
            id: row.id,
            title: row.title.clone(),
            status: row.status.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&AgentRow> for AgentSummary {
    fn from(row: &AgentRow) -> Self {
        AgentSummary {
            id: row.id,
            name: row.full_name(),
            email: row.email.clone(),
        }
    }
}

/// An application with its opportunity, agent and answers nested.
#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub opportunity: OpportunitySummary,
    pub agent: AgentSummary,
    pub answers: Vec<AnswerRow>,
}
