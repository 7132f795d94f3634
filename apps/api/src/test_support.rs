//! Fixtures for tests that run against a real database (`#[sqlx::test]`).

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::questions::models::{QuestionDraft, QuestionFields, QuestionType};

pub async fn insert_opportunity(pool: &PgPool, status: &str) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO opportunities (title, status)
        VALUES ('Bilingual support agent', $1)
        RETURNING id
        "#,
    )
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_agent(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO agents (id, email, first_name, last_name) VALUES ($1, $2, 'Ana', 'Lima')",
    )
    .bind(id)
    .bind(format!("{id}@example.com"))
    .execute(pool)
    .await
    .unwrap();
    id
}

pub fn draft(prompt: &str, required: bool, order: Option<i32>) -> QuestionDraft {
    QuestionDraft {
        fields: QuestionFields {
            prompt: prompt.to_string(),
            prompt_secondary: None,
            question_type: QuestionType::ShortText,
            required,
            options: vec![],
            placeholder: None,
            placeholder_secondary: None,
            validation: None,
        },
        order,
    }
}

pub fn text_answer(question_id: Uuid, text: &str) -> serde_json::Value {
    json!({ "question_id": question_id, "value": { "kind": "text", "value": text } })
}
