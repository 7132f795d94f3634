//! Persistence for per-opportunity questions.
//!
//! Every mutation runs in one transaction that first takes a row lock on the
//! owning opportunity, so concurrent edits to the same question list are
//! serialized and order assignment never races. Order arithmetic lives in
//! [`crate::questions::ordering`]; this module only reads the current layout
//! and writes the rows whose order changed.

use std::collections::{HashMap, HashSet};

use serde_json::json;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::foreign_key_violation;
use crate::errors::AppError;
use crate::models::question::QuestionRow;
use crate::questions::models::{
    OrderAssignment, QuestionDraft, QuestionFields, QuestionPatch, SyncEntry,
};
use crate::questions::ordering::{
    changed_slots, plan_insert, plan_move, plan_remove, plan_reorder, Slot,
};
use crate::questions::sync::plan_sync;
use crate::questions::validation::{validate_answered_change, validate_definition};

/// Questions of an opportunity ascending by order. Empty when there are none.
pub async fn list_questions(
    pool: &PgPool,
    opportunity_id: Uuid,
) -> Result<Vec<QuestionRow>, AppError> {
    Ok(fetch_questions(pool, opportunity_id).await?)
}

pub async fn get_question(pool: &PgPool, question_id: Uuid) -> Result<QuestionRow, AppError> {
    sqlx::query_as::<_, QuestionRow>(
        "SELECT * FROM opportunity_questions WHERE id = $1 AND archived_at IS NULL",
    )
    .bind(question_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| question_not_found(question_id))
}

/// Creates a question. Without an explicit order it is appended; an explicit
/// order in `1..=N+1` takes that slot and shifts later questions down.
pub async fn create_question(
    pool: &PgPool,
    opportunity_id: Uuid,
    draft: QuestionDraft,
) -> Result<QuestionRow, AppError> {
    let fields = draft.fields.normalized();
    validate_definition(&fields)?;

    let mut tx = pool.begin().await?;
    lock_opportunity(&mut tx, opportunity_id).await?;

    let current = slots(&fetch_questions(&mut *tx, opportunity_id).await?);
    let id = Uuid::new_v4();
    let layout = plan_insert(&current, id, draft.order)?;
    write_orders(&mut tx, &changed_slots(&current, &layout)).await?;

    let order = order_in(&layout, id);
    let question = insert_question(&mut tx, opportunity_id, id, order, &fields).await?;
    tx.commit().await?;

    info!("Created question {id} at order {order} on opportunity {opportunity_id}");
    Ok(question)
}

/// Applies a partial update. An `order` in the patch moves the question.
pub async fn update_question(
    pool: &PgPool,
    question_id: Uuid,
    patch: QuestionPatch,
) -> Result<QuestionRow, AppError> {
    let opportunity_id = get_question(pool, question_id).await?.opportunity_id;

    let mut tx = pool.begin().await?;
    lock_opportunity(&mut tx, opportunity_id).await?;
    let existing = fetch_question_locked(&mut tx, question_id).await?;

    if patch.changes_fields() {
        let mut fields = existing.fields().ok_or_else(|| {
            anyhow::anyhow!(
                "question {question_id} has unknown type '{}'",
                existing.question_type
            )
        })?;
        let current = fields.clone();
        patch.apply(&mut fields);
        let fields = fields.normalized();
        validate_definition(&fields)?;
        if !answered_questions(&mut tx, &[question_id]).await?.is_empty() {
            validate_answered_change(&current, &fields)?;
        }
        update_fields(&mut tx, question_id, &fields).await?;
    }

    if let Some(to) = patch.order {
        let current = slots(&fetch_questions(&mut *tx, opportunity_id).await?);
        let layout = plan_move(&current, question_id, to)?;
        write_orders(&mut tx, &changed_slots(&current, &layout)).await?;
    }

    let updated = fetch_question_locked(&mut tx, question_id).await?;
    tx.commit().await?;

    info!("Updated question {question_id}");
    Ok(updated)
}

/// Removes a question and renumbers its siblings so orders stay `1..=N`.
/// A question that already has answers is archived instead of deleted.
pub async fn delete_question(pool: &PgPool, question_id: Uuid) -> Result<(), AppError> {
    let opportunity_id = get_question(pool, question_id).await?.opportunity_id;

    let mut tx = pool.begin().await?;
    lock_opportunity(&mut tx, opportunity_id).await?;
    fetch_question_locked(&mut tx, question_id).await?;

    let current = slots(&fetch_questions(&mut *tx, opportunity_id).await?);
    retire_questions(&mut tx, &[question_id]).await?;

    let layout = plan_remove(&current, question_id)?;
    write_orders(&mut tx, &changed_slots(&current, &layout)).await?;
    tx.commit().await?;

    info!("Removed question {question_id} from opportunity {opportunity_id}");
    Ok(())
}

/// Applies `{id, order}` pairs atomically and returns the refreshed list.
pub async fn reorder(
    pool: &PgPool,
    opportunity_id: Uuid,
    assignments: &[OrderAssignment],
) -> Result<Vec<QuestionRow>, AppError> {
    let mut tx = pool.begin().await?;
    lock_opportunity(&mut tx, opportunity_id).await?;

    let current = slots(&fetch_questions(&mut *tx, opportunity_id).await?);
    let layout = plan_reorder(&current, assignments)?;
    let changed = changed_slots(&current, &layout);
    write_orders(&mut tx, &changed).await?;

    let questions = fetch_questions(&mut *tx, opportunity_id).await?;
    tx.commit().await?;

    info!(
        "Reordered {} question(s) on opportunity {opportunity_id}",
        changed.len()
    );
    Ok(questions)
}

/// Replaces the question list with `desired` in one transaction.
pub async fn sync_questions(
    pool: &PgPool,
    opportunity_id: Uuid,
    desired: Vec<SyncEntry>,
) -> Result<Vec<QuestionRow>, AppError> {
    let mut tx = pool.begin().await?;
    lock_opportunity(&mut tx, opportunity_id).await?;

    let existing = fetch_questions(&mut *tx, opportunity_id).await?;
    let existing_ids: Vec<Uuid> = existing.iter().map(|q| q.id).collect();
    let plan = plan_sync(&existing_ids, desired)?;
    for planned in plan.updates.iter().chain(plan.creates.iter()) {
        validate_definition(&planned.fields)?;
    }

    let updated_ids: Vec<Uuid> = plan.updates.iter().map(|q| q.id).collect();
    let answered = answered_questions(&mut tx, &updated_ids).await?;
    let current: HashMap<Uuid, &QuestionRow> = existing.iter().map(|q| (q.id, q)).collect();
    for planned in plan.updates.iter().filter(|q| answered.contains(&q.id)) {
        if let Some(fields) = current.get(&planned.id).and_then(|q| q.fields()) {
            validate_answered_change(&fields, &planned.fields)?;
        }
    }

    retire_questions(&mut tx, &plan.deletes).await?;
    for planned in &plan.updates {
        update_fields(&mut tx, planned.id, &planned.fields).await?;
    }
    write_orders(
        &mut tx,
        &plan
            .updates
            .iter()
            .map(|q| Slot {
                id: q.id,
                order: q.order,
            })
            .collect::<Vec<_>>(),
    )
    .await?;
    for planned in &plan.creates {
        insert_question(
            &mut tx,
            opportunity_id,
            planned.id,
            planned.order,
            &planned.fields,
        )
        .await?;
    }

    let questions = fetch_questions(&mut *tx, opportunity_id).await?;
    tx.commit().await?;

    info!(
        "Synced questions on opportunity {opportunity_id}: {} created, {} updated, {} removed",
        plan.creates.len(),
        plan.updates.len(),
        plan.deletes.len()
    );
    Ok(questions)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn question_not_found(question_id: Uuid) -> AppError {
    AppError::NotFound(format!("Question {question_id} not found"))
}

fn slots(questions: &[QuestionRow]) -> Vec<Slot> {
    questions.iter().map(QuestionRow::slot).collect()
}

fn order_in(layout: &[Slot], id: Uuid) -> i32 {
    layout
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.order)
        .unwrap_or(layout.len() as i32)
}

pub(crate) async fn fetch_questions<'e, E>(
    executor: E,
    opportunity_id: Uuid,
) -> Result<Vec<QuestionRow>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT * FROM opportunity_questions
        WHERE opportunity_id = $1 AND archived_at IS NULL
        ORDER BY order_index, id
        "#,
    )
    .bind(opportunity_id)
    .fetch_all(executor)
    .await
}

/// Takes the per-opportunity lock that serializes question edits.
async fn lock_opportunity(conn: &mut PgConnection, opportunity_id: Uuid) -> Result<(), AppError> {
    let found: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM opportunities WHERE id = $1 FOR UPDATE")
            .bind(opportunity_id)
            .fetch_optional(&mut *conn)
            .await?;
    found
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Opportunity {opportunity_id} not found")))
}

async fn fetch_question_locked(
    conn: &mut PgConnection,
    question_id: Uuid,
) -> Result<QuestionRow, AppError> {
    sqlx::query_as::<_, QuestionRow>(
        "SELECT * FROM opportunity_questions WHERE id = $1 AND archived_at IS NULL FOR UPDATE",
    )
    .bind(question_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| question_not_found(question_id))
}

/// The subset of `ids` that already have stored answers.
async fn answered_questions(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<HashSet<Uuid>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let answered: Vec<Uuid> = sqlx::query_scalar(
        "SELECT DISTINCT question_id FROM application_answers WHERE question_id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
    Ok(answered.into_iter().collect())
}

/// Takes questions out of the live set. Answered questions are archived so
/// submitted answers keep their question; the rest are deleted.
async fn retire_questions(conn: &mut PgConnection, ids: &[Uuid]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }

    let archived = sqlx::query(
        r#"
        UPDATE opportunity_questions AS q
        SET archived_at = NOW(), updated_at = NOW()
        WHERE q.id = ANY($1)
          AND EXISTS (SELECT 1 FROM application_answers a WHERE a.question_id = q.id)
        "#,
    )
    .bind(ids)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let deleted = sqlx::query(
        "DELETE FROM opportunity_questions WHERE id = ANY($1) AND archived_at IS NULL",
    )
    .bind(ids)
    .execute(&mut *conn)
    .await
    .map_err(|e| match foreign_key_violation(&e) {
        Some(_) => AppError::Validation(
            "A question was answered while it was being removed; try again".to_string(),
        ),
        None => AppError::Storage(e),
    })?
    .rows_affected();

    debug!("Retired questions: {archived} archived, {deleted} deleted");
    Ok(())
}

/// Writes new orders for the given rows in a single statement.
async fn write_orders(conn: &mut PgConnection, changed: &[Slot]) -> Result<(), sqlx::Error> {
    if changed.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = changed.iter().map(|s| s.id).collect();
    let orders: Vec<i32> = changed.iter().map(|s| s.order).collect();

    sqlx::query(
        r#"
        UPDATE opportunity_questions AS q
        SET order_index = v.order_index, updated_at = NOW()
        FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, order_index)
        WHERE q.id = v.id
        "#,
    )
    .bind(&ids)
    .bind(&orders)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_question(
    conn: &mut PgConnection,
    opportunity_id: Uuid,
    id: Uuid,
    order: i32,
    fields: &QuestionFields,
) -> Result<QuestionRow, sqlx::Error> {
    sqlx::query_as::<_, QuestionRow>(
        r#"
        INSERT INTO opportunity_questions
            (id, opportunity_id, prompt, prompt_secondary, question_type, required,
             order_index, options, placeholder, placeholder_secondary, validation)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(opportunity_id)
    .bind(&fields.prompt)
    .bind(&fields.prompt_secondary)
    .bind(fields.question_type.as_str())
    .bind(fields.required)
    .bind(order)
    .bind(&fields.options)
    .bind(&fields.placeholder)
    .bind(&fields.placeholder_secondary)
    .bind(fields.validation.as_ref().map(|rules| json!(rules)))
    .fetch_one(&mut *conn)
    .await
}

async fn update_fields(
    conn: &mut PgConnection,
    id: Uuid,
    fields: &QuestionFields,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE opportunity_questions
        SET prompt = $2, prompt_secondary = $3, question_type = $4, required = $5,
            options = $6, placeholder = $7, placeholder_secondary = $8, validation = $9,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&fields.prompt)
    .bind(&fields.prompt_secondary)
    .bind(fields.question_type.as_str())
    .bind(fields.required)
    .bind(&fields.options)
    .bind(&fields.placeholder)
    .bind(&fields.placeholder_secondary)
    .bind(fields.validation.as_ref().map(|rules| json!(rules)))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::applications::submission::submit_application;
    use crate::config::test_config;
    use crate::notifications::dispatcher::tests::RecordingDispatcher;
    use crate::questions::models::QuestionType;
    use crate::test_support::{draft, insert_agent, insert_opportunity, text_answer};

    fn assign(id: Uuid, order: i32) -> OrderAssignment {
        OrderAssignment { id, order }
    }

    fn orders(questions: &[QuestionRow]) -> Vec<(Uuid, i32)> {
        questions.iter().map(|q| (q.id, q.order_index)).collect()
    }

    /// Submits one application answering every given question; returns its id.
    async fn answer_all(pool: &PgPool, opportunity_id: Uuid, questions: &[Uuid]) -> Uuid {
        let agent_id = insert_agent(pool).await;
        let answers: Vec<_> = questions
            .iter()
            .map(|id| text_answer(*id, "Evenings and weekends"))
            .collect();
        let request = serde_json::from_value(
            serde_json::json!({ "opportunity_id": opportunity_id, "answers": answers }),
        )
        .unwrap();
        let dispatcher = Arc::new(RecordingDispatcher::default());
        submit_application(pool, dispatcher, &test_config(), agent_id, request)
            .await
            .unwrap()
            .submitted
            .application
            .id
    }

    async fn answer_count(pool: &PgPool, application_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM application_answers WHERE application_id = $1")
            .bind(application_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_appended_questions_are_numbered_in_creation_order(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;
        assert!(list_questions(&pool, opportunity_id).await.unwrap().is_empty());

        let mut created = Vec::new();
        for prompt in ["Name", "City", "Availability"] {
            created.push(
                create_question(&pool, opportunity_id, draft(prompt, true, None))
                    .await
                    .unwrap()
                    .id,
            );
        }

        let listed = list_questions(&pool, opportunity_id).await.unwrap();
        assert_eq!(
            orders(&listed),
            vec![(created[0], 1), (created[1], 2), (created[2], 3)]
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_explicit_order_shifts_and_delete_renumbers(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;
        let a = create_question(&pool, opportunity_id, draft("A", false, None)).await.unwrap();
        let b = create_question(&pool, opportunity_id, draft("B", false, None)).await.unwrap();
        let first = create_question(&pool, opportunity_id, draft("First", false, Some(1)))
            .await
            .unwrap();
        assert_eq!(first.order_index, 1);

        let listed = list_questions(&pool, opportunity_id).await.unwrap();
        assert_eq!(orders(&listed), vec![(first.id, 1), (a.id, 2), (b.id, 3)]);

        delete_question(&pool, a.id).await.unwrap();
        let listed = list_questions(&pool, opportunity_id).await.unwrap();
        assert_eq!(orders(&listed), vec![(first.id, 1), (b.id, 2)]);

        assert!(matches!(
            delete_question(&pool, a.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_reorder_is_atomic_and_idempotent(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;
        let a = create_question(&pool, opportunity_id, draft("A", false, None)).await.unwrap();
        let b = create_question(&pool, opportunity_id, draft("B", false, None)).await.unwrap();
        let c = create_question(&pool, opportunity_id, draft("C", false, None)).await.unwrap();

        let mapping = vec![assign(a.id, 3), assign(b.id, 1), assign(c.id, 2)];
        let first = reorder(&pool, opportunity_id, &mapping).await.unwrap();
        assert_eq!(orders(&first), vec![(b.id, 1), (c.id, 2), (a.id, 3)]);
        let second = reorder(&pool, opportunity_id, &mapping).await.unwrap();
        assert_eq!(orders(&second), orders(&first));

        // A colliding mapping is rejected and leaves the list untouched.
        let bad = vec![assign(a.id, 1)];
        assert!(matches!(
            reorder(&pool, opportunity_id, &bad).await,
            Err(AppError::Validation(_))
        ));
        let after = list_questions(&pool, opportunity_id).await.unwrap();
        assert_eq!(orders(&after), orders(&first));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_partial_update_leaves_other_fields(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;
        let mut d = draft("Why this role?", true, None);
        d.fields.placeholder = Some("Tell us".to_string());
        let original = create_question(&pool, opportunity_id, d).await.unwrap();

        let patch = QuestionPatch {
            required: Some(false),
            ..Default::default()
        };
        let updated = update_question(&pool, original.id, patch).await.unwrap();

        assert!(!updated.required);
        assert_eq!(updated.prompt, original.prompt);
        assert_eq!(updated.placeholder, original.placeholder);
        assert_eq!(updated.question_type, original.question_type);
        assert_eq!(updated.order_index, original.order_index);

        assert!(matches!(
            update_question(&pool, Uuid::new_v4(), QuestionPatch::default()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_sync_applies_whole_list(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;
        let a = create_question(&pool, opportunity_id, draft("A", false, None)).await.unwrap();
        let b = create_question(&pool, opportunity_id, draft("B", false, None)).await.unwrap();

        let desired: Vec<SyncEntry> = serde_json::from_value(serde_json::json!([
            { "id": b.id, "prompt": "B renamed", "question_type": "short_text" },
            { "prompt": "New", "question_type": "boolean", "required": true }
        ]))
        .unwrap();
        let synced = sync_questions(&pool, opportunity_id, desired).await.unwrap();

        assert_eq!(synced.len(), 2);
        assert_eq!(synced[0].id, b.id);
        assert_eq!(synced[0].prompt, "B renamed");
        assert_eq!(synced[0].order_index, 1);
        assert_eq!(synced[1].question_type, "boolean");
        assert_eq!(synced[1].order_index, 2);
        assert!(synced.iter().all(|q| q.id != a.id));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_removing_answered_question_keeps_answers(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;
        let q1 = create_question(&pool, opportunity_id, draft("Name", true, None)).await.unwrap();
        let q2 = create_question(&pool, opportunity_id, draft("City", true, None)).await.unwrap();
        let q3 = create_question(&pool, opportunity_id, draft("Notes", false, None))
            .await
            .unwrap();
        let application_id = answer_all(&pool, opportunity_id, &[q1.id, q2.id]).await;
        assert_eq!(answer_count(&pool, application_id).await, 2);

        delete_question(&pool, q2.id).await.unwrap();
        delete_question(&pool, q3.id).await.unwrap();

        assert_eq!(answer_count(&pool, application_id).await, 2);
        let live = list_questions(&pool, opportunity_id).await.unwrap();
        assert_eq!(orders(&live), vec![(q1.id, 1)]);
        assert!(matches!(
            get_question(&pool, q2.id).await,
            Err(AppError::NotFound(_))
        ));

        // Answered questions are archived, unanswered ones are gone.
        let remaining: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM opportunity_questions WHERE opportunity_id = $1")
                .bind(opportunity_id)
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&q2.id));
        assert!(!remaining.contains(&q3.id));

        // The freed slot can be taken again.
        let q4 = create_question(&pool, opportunity_id, draft("Phone", false, None))
            .await
            .unwrap();
        assert_eq!(q4.order_index, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_sync_archives_answered_questions(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;
        let a = create_question(&pool, opportunity_id, draft("A", true, None)).await.unwrap();
        let b = create_question(&pool, opportunity_id, draft("B", true, None)).await.unwrap();
        let application_id = answer_all(&pool, opportunity_id, &[a.id, b.id]).await;

        let desired: Vec<SyncEntry> = serde_json::from_value(serde_json::json!([
            { "id": b.id, "prompt": "B", "question_type": "short_text", "required": true }
        ]))
        .unwrap();
        let synced = sync_questions(&pool, opportunity_id, desired).await.unwrap();

        assert_eq!(orders(&synced), vec![(b.id, 1)]);
        assert_eq!(answer_count(&pool, application_id).await, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_answered_question_type_is_fixed(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;
        let q = create_question(&pool, opportunity_id, draft("Availability", true, None))
            .await
            .unwrap();
        answer_all(&pool, opportunity_id, &[q.id]).await;

        let retype = QuestionPatch {
            question_type: Some(QuestionType::Number),
            ..Default::default()
        };
        assert!(matches!(
            update_question(&pool, q.id, retype).await,
            Err(AppError::Validation(_))
        ));

        let reword = QuestionPatch {
            prompt: Some("When are you available?".to_string()),
            ..Default::default()
        };
        let updated = update_question(&pool, q.id, reword).await.unwrap();
        assert_eq!(updated.question_type, "short_text");
        assert_eq!(updated.prompt, "When are you available?");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_appends_stay_gapless(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "open").await;

        let mut handles = Vec::new();
        for n in 0..12 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let prompt = format!("Question {n}");
                create_question(&pool, opportunity_id, draft(&prompt, false, None)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let listed = list_questions(&pool, opportunity_id).await.unwrap();
        let numbers: Vec<i32> = listed.iter().map(|q| q.order_index).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
    }
}
