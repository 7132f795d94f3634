use sqlx::{PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::NotificationRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    ApplicationSubmitted,
    ApplicationStatusChanged,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ApplicationSubmitted => "application_submitted",
            NotificationKind::ApplicationStatusChanged => "application_status_changed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

/// Appends a notification to the recipient's feed.
pub async fn push<'e, E>(executor: E, new: &NewNotification) -> Result<NotificationRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, NotificationRow>(
        r#"
        INSERT INTO notifications (id, recipient_id, kind, title, body, link)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.recipient_id)
    .bind(new.kind.as_str())
    .bind(&new.title)
    .bind(&new.body)
    .bind(&new.link)
    .fetch_one(executor)
    .await
}

/// The recipient's notifications, newest first.
pub async fn list(
    pool: &PgPool,
    recipient_id: Uuid,
    unread_only: bool,
) -> Result<Vec<NotificationRow>, AppError> {
    Ok(sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT * FROM notifications
        WHERE recipient_id = $1 AND (NOT $2 OR read_at IS NULL)
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(recipient_id)
    .bind(unread_only)
    .fetch_all(pool)
    .await?)
}

pub async fn unread_count(pool: &PgPool, recipient_id: Uuid) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read_at IS NULL",
    )
    .bind(recipient_id)
    .fetch_one(pool)
    .await?)
}

/// Marks one notification read. Already-read notifications keep their original
/// `read_at`, so repeating the call changes nothing.
pub async fn mark_read(
    pool: &PgPool,
    recipient_id: Uuid,
    notification_id: Uuid,
) -> Result<NotificationRow, AppError> {
    sqlx::query_as::<_, NotificationRow>(
        r#"
        UPDATE notifications
        SET read_at = COALESCE(read_at, NOW())
        WHERE id = $1 AND recipient_id = $2
        RETURNING *
        "#,
    )
    .bind(notification_id)
    .bind(recipient_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Notification {notification_id} not found")))
}

/// Marks every unread notification read; returns how many changed.
pub async fn mark_all_read(pool: &PgPool, recipient_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE notifications SET read_at = NOW() WHERE recipient_id = $1 AND read_at IS NULL",
    )
    .bind(recipient_id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!(
            "Marked {} notification(s) read for {recipient_id}",
            result.rows_affected()
        );
    }
    Ok(result.rows_affected())
}
