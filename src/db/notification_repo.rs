// src/db/notification_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::notifications::AdminNotification};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // emit_admin_notification
    pub async fn emit<'e, E>(
        &self,
        executor: E,
        notification_type: &str,
        message: &str,
        related_id: Option<Uuid>,
        metadata: serde_json::Value,
    ) -> Result<AdminNotification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, AdminNotification>(
            r#"
            INSERT INTO admin_notifications (notification_type, message, related_id, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING id, notification_type, message, related_id, metadata, read_at, created_at
            "#,
        )
        .bind(notification_type)
        .bind(message)
        .bind(related_id)
        .bind(metadata)
        .fetch_one(executor)
        .await?;
        Ok(notification)
    }

    // Não lidas primeiro, depois as mais recentes
    pub async fn list(&self, limit: i64) -> Result<Vec<AdminNotification>, AppError> {
        let items = sqlx::query_as::<_, AdminNotification>(
            r#"
            SELECT id, notification_type, message, related_id, metadata, read_at, created_at
            FROM admin_notifications
            ORDER BY (read_at IS NULL) DESC, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Option<AdminNotification>, AppError> {
        let item = sqlx::query_as::<_, AdminNotification>(
            r#"
            UPDATE admin_notifications
            SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1
            RETURNING id, notification_type, message, related_id, metadata, read_at, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }
}
