// src/services/notification_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::NotificationRepository,
    models::notifications::AdminNotification,
};

const MAX_LIST: i64 = 200;

#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
}

impl NotificationService {
    pub fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    pub async fn emit_admin_notification<'e, E>(
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
        let notification = self
            .notification_repo
            .emit(executor, notification_type, message, related_id, metadata)
            .await?;
        tracing::debug!(id = %notification.id, kind = notification_type, "notificação emitida");
        Ok(notification)
    }

    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<AdminNotification>, AppError> {
        let limit = limit.unwrap_or(50).clamp(1, MAX_LIST);
        self.notification_repo.list(limit).await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<AdminNotification, AppError> {
        self.notification_repo
            .mark_read(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("notification {id}")))
    }
}
