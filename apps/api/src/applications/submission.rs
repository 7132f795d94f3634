//! Application submission.
//!
//! Steps, each a hard precondition for the next:
//! 1. reject a second application from the same agent to the same opportunity
//! 2. load the opportunity and the agent profile
//! 3. validate answers against the opportunity's current questions
//! 4. insert the application and its answers in one transaction
//! 5. best-effort: confirmation email in the background, in-app notification
//!
//! The unique constraint on `(agent_id, opportunity_id)` is the real guard for
//! step 1; the upfront check only gives the common case a fast, clean rejection.

use std::sync::Arc;

use serde_json::json;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::models::{
    AnswerInput, ApplicationStatus, SubmitApplicationRequest, SubmittedApplication,
};
use crate::applications::validation::validate_answers;
use crate::config::Config;
use crate::db::unique_violation;
use crate::errors::AppError;
use crate::models::agent::AgentRow;
use crate::models::application::{AnswerRow, ApplicationRow};
use crate::models::opportunity::OpportunityRow;
use crate::notifications::dispatcher::{
    dispatch_confirmation, ConfirmationDispatcher, ConfirmationEmail,
};
use crate::notifications::feed::{self, NewNotification, NotificationKind};
use crate::questions::store::fetch_questions;

pub const APPLICATION_UNIQUE_CONSTRAINT: &str = "applications_agent_opportunity_key";

/// A stored application plus its confirmation email, which is still on its way.
pub struct Submission {
    pub submitted: SubmittedApplication,
    /// Resolves to whether the email went out. Dropping it leaves the task running.
    pub confirmation: JoinHandle<bool>,
}

pub async fn submit_application(
    pool: &PgPool,
    dispatcher: Arc<dyn ConfirmationDispatcher>,
    config: &Config,
    agent_id: Uuid,
    request: SubmitApplicationRequest,
) -> Result<Submission, AppError> {
    let opportunity_id = request.opportunity_id;

    // 1. Fast duplicate rejection
    if application_exists(pool, agent_id, opportunity_id).await? {
        return Err(AppError::DuplicateApplication);
    }

    // 2. Opportunity and profile
    let opportunity =
        sqlx::query_as::<_, OpportunityRow>("SELECT * FROM opportunities WHERE id = $1")
            .bind(opportunity_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Opportunity {opportunity_id} not found")))?;
    let agent = sqlx::query_as::<_, AgentRow>("SELECT * FROM agents WHERE id = $1")
        .bind(agent_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Agent profile {agent_id} not found")))?;

    if !opportunity.is_open() {
        return Err(AppError::Validation(format!(
            "Opportunity {opportunity_id} is not accepting applications"
        )));
    }

    // 3. Answers against the current question snapshot
    let questions = fetch_questions(pool, opportunity_id).await?;
    let answers = validate_answers(&questions, request.answers)?;

    // 4. Application + answers as one unit
    let (application, answer_rows) =
        insert_application(pool, agent_id, opportunity_id, &answers).await?;
    info!(
        "Application {} submitted by {agent_id} for opportunity {opportunity_id} ({} answers)",
        application.id,
        answer_rows.len()
    );

    // 5. Best-effort follow-ups; nothing below may fail the submission
    let email = confirmation_email(config, &application, &agent, &opportunity);
    let confirmation = tokio::spawn(send_confirmation(pool.clone(), dispatcher, email));

    let notification = NewNotification {
        recipient_id: agent_id,
        kind: NotificationKind::ApplicationSubmitted,
        title: "Application received".to_string(),
        body: format!(
            "We received your application for {}. We'll let you know when its status changes.",
            opportunity.title
        ),
        link: Some(config.application_link(application.id)),
    };
    if let Err(e) = feed::push(pool, &notification).await {
        warn!(
            "Could not add submission notification for application {}: {e}",
            application.id
        );
    }

    Ok(Submission {
        submitted: SubmittedApplication {
            application,
            answers: answer_rows,
        },
        confirmation,
    })
}

async fn application_exists(
    pool: &PgPool,
    agent_id: Uuid,
    opportunity_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM applications WHERE agent_id = $1 AND opportunity_id = $2)",
    )
    .bind(agent_id)
    .bind(opportunity_id)
    .fetch_one(pool)
    .await
}

/// Maps a losing insert in a duplicate-submission race to `DuplicateApplication`.
fn insert_error(err: sqlx::Error) -> AppError {
    if unique_violation(&err) == Some(APPLICATION_UNIQUE_CONSTRAINT) {
        AppError::DuplicateApplication
    } else {
        AppError::Storage(err)
    }
}

async fn insert_application(
    pool: &PgPool,
    agent_id: Uuid,
    opportunity_id: Uuid,
    answers: &[AnswerInput],
) -> Result<(ApplicationRow, Vec<AnswerRow>), AppError> {
    let mut tx = pool.begin().await?;

    let application = sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications (id, agent_id, opportunity_id, status)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(agent_id)
    .bind(opportunity_id)
    .bind(ApplicationStatus::Pending.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(insert_error)?;

    let mut rows = Vec::with_capacity(answers.len());
    for answer in answers {
        let row = sqlx::query_as::<_, AnswerRow>(
            r#"
            INSERT INTO application_answers (id, application_id, question_id, value)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(application.id)
        .bind(answer.question_id)
        .bind(json!(answer.value))
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await.map_err(insert_error)?;
    Ok((application, rows))
}

fn confirmation_email(
    config: &Config,
    application: &ApplicationRow,
    agent: &AgentRow,
    opportunity: &OpportunityRow,
) -> ConfirmationEmail {
    ConfirmationEmail {
        template: "application_submitted",
        application_id: application.id,
        to: agent.email.clone(),
        recipient_name: agent.full_name(),
        language: agent.language.clone(),
        opportunity_title: opportunity.title.clone(),
        link: config.application_link(application.id),
        submitted_at: application.submitted_at,
    }
}

/// Sends the confirmation email and, only if it went out, records that on the
/// application. Returns whether the email was delivered.
async fn send_confirmation(
    pool: PgPool,
    dispatcher: Arc<dyn ConfirmationDispatcher>,
    email: ConfirmationEmail,
) -> bool {
    if !dispatch_confirmation(dispatcher.as_ref(), &email).await {
        return false;
    }

    let marked = sqlx::query(
        r#"
        UPDATE applications
        SET confirmation_email_sent = TRUE, confirmation_email_sent_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(email.application_id)
    .execute(&pool)
    .await;

    if let Err(e) = marked {
        warn!(
            "Confirmation email sent but flag not recorded for application {}: {e}",
            email.application_id
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::validation::AnswerError;
    use crate::config::test_config;
    use crate::notifications::dispatcher::tests::RecordingDispatcher;
    use crate::questions::store::create_question;
    use crate::test_support::{draft, insert_agent, insert_opportunity, text_answer};

    struct Fixture {
        opportunity_id: Uuid,
        agent_id: Uuid,
        first: Uuid,
        second: Uuid,
    }

    async fn two_required_questions(pool: &PgPool) -> Fixture {
        let opportunity_id = insert_opportunity(pool, "open").await;
        let agent_id = insert_agent(pool).await;
        let first = create_question(pool, opportunity_id, draft("Full name", true, None))
            .await
            .unwrap()
            .id;
        let second = create_question(pool, opportunity_id, draft("Languages", true, None))
            .await
            .unwrap()
            .id;
        Fixture {
            opportunity_id,
            agent_id,
            first,
            second,
        }
    }

    impl Fixture {
        fn complete_request(&self) -> SubmitApplicationRequest {
            request(
                self.opportunity_id,
                vec![
                    text_answer(self.first, "Ana Lima"),
                    text_answer(self.second, "English, Portuguese"),
                ],
            )
        }
    }

    fn request(opportunity_id: Uuid, answers: Vec<serde_json::Value>) -> SubmitApplicationRequest {
        serde_json::from_value(json!({ "opportunity_id": opportunity_id, "answers": answers }))
            .unwrap()
    }

    async fn submit(
        pool: &PgPool,
        dispatcher: &Arc<RecordingDispatcher>,
        agent_id: Uuid,
        request: SubmitApplicationRequest,
    ) -> Result<Submission, AppError> {
        submit_application(pool, dispatcher.clone(), &test_config(), agent_id, request).await
    }

    async fn application_count(pool: &PgPool, agent_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE agent_id = $1")
            .bind(agent_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn confirmation_flag(pool: &PgPool, application_id: Uuid) -> bool {
        sqlx::query_scalar("SELECT confirmation_email_sent FROM applications WHERE id = $1")
            .bind(application_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_submission_stores_answers_and_confirms(pool: PgPool) {
        let f = two_required_questions(&pool).await;
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let submission = submit(&pool, &dispatcher, f.agent_id, f.complete_request())
            .await
            .unwrap();
        let application = &submission.submitted.application;
        assert_eq!(application.status, "pending");
        assert_eq!(submission.submitted.answers.len(), 2);

        assert!(submission.confirmation.await.unwrap());
        assert!(confirmation_flag(&pool, application.id).await);
        assert_eq!(*dispatcher.sent.lock().unwrap(), vec![application.id]);

        let unread = feed::unread_count(&pool, f.agent_id).await.unwrap();
        assert_eq!(unread, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_missing_required_answer_is_rejected(pool: PgPool) {
        let f = two_required_questions(&pool).await;
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let partial = request(f.opportunity_id, vec![text_answer(f.first, "Ana Lima")]);

        match submit(&pool, &dispatcher, f.agent_id, partial).await {
            Err(AppError::Answer(AnswerError::MissingRequired { question_id })) => {
                assert_eq!(question_id, f.second)
            }
            Err(other) => panic!("expected missing answer error, got {other:?}"),
            Ok(_) => panic!("expected missing answer error, got a stored application"),
        }
        assert_eq!(application_count(&pool, f.agent_id).await, 0);
        assert!(dispatcher.sent.lock().unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_second_submission_is_a_duplicate(pool: PgPool) {
        let f = two_required_questions(&pool).await;
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let original = submit(&pool, &dispatcher, f.agent_id, f.complete_request())
            .await
            .unwrap()
            .submitted
            .application;

        let again = submit(&pool, &dispatcher, f.agent_id, f.complete_request()).await;
        assert!(matches!(again, Err(AppError::DuplicateApplication)));
        assert_eq!(application_count(&pool, f.agent_id).await, 1);

        let stored: ApplicationRow = sqlx::query_as("SELECT * FROM applications WHERE id = $1")
            .bind(original.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored.status, original.status);
        assert_eq!(stored.submitted_at, original.submitted_at);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_losing_insert_maps_to_duplicate(pool: PgPool) {
        let f = two_required_questions(&pool).await;
        let dispatcher = Arc::new(RecordingDispatcher::default());
        submit(&pool, &dispatcher, f.agent_id, f.complete_request())
            .await
            .unwrap();

        // Skips the upfront check, so only the unique constraint can reject it.
        let result = insert_application(&pool, f.agent_id, f.opportunity_id, &[]).await;
        assert!(matches!(result, Err(AppError::DuplicateApplication)));
        assert_eq!(application_count(&pool, f.agent_id).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_submissions_store_exactly_one(pool: PgPool) {
        let f = two_required_questions(&pool).await;
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let dispatcher = dispatcher.clone();
            let request = f.complete_request();
            let agent_id = f.agent_id;
            handles.push(tokio::spawn(async move {
                submit(&pool, &dispatcher, agent_id, request)
                    .await
                    .map(|submission| submission.submitted.application.id)
            }));
        }

        let mut stored = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => stored += 1,
                Err(AppError::DuplicateApplication) => duplicates += 1,
                Err(other) => panic!("unexpected submission error: {other:?}"),
            }
        }
        assert_eq!((stored, duplicates), (1, 7));
        assert_eq!(application_count(&pool, f.agent_id).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_failed_confirmation_keeps_application(pool: PgPool) {
        let f = two_required_questions(&pool).await;
        let dispatcher = Arc::new(RecordingDispatcher {
            fail: true,
            ..Default::default()
        });

        let submission = submit(&pool, &dispatcher, f.agent_id, f.complete_request())
            .await
            .unwrap();
        let application_id = submission.submitted.application.id;
        assert!(!submission.submitted.application.confirmation_email_sent);

        assert!(!submission.confirmation.await.unwrap());
        assert!(!confirmation_flag(&pool, application_id).await);
        assert_eq!(application_count(&pool, f.agent_id).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_closed_opportunity_rejects_submissions(pool: PgPool) {
        let opportunity_id = insert_opportunity(&pool, "closed").await;
        let agent_id = insert_agent(&pool).await;
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let result = submit(&pool, &dispatcher, agent_id, request(opportunity_id, vec![])).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
