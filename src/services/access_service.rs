// src/services/access_service.rs

use serde_json::json;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AccessRepository, NotificationRepository},
    models::{
        access::{FeaturePermissions, Profile, Role, UserRoleRow, UserWithRole, VerificationStatus},
        notifications::ROLE_CHANGED,
    },
};

// Gestão de acesso: papéis, verificação de cadastro e promoção a administrador
#[derive(Clone)]
pub struct AccessService {
    access_repo: AccessRepository,
    notification_repo: NotificationRepository,
}

impl AccessService {
    pub fn new(access_repo: AccessRepository, notification_repo: NotificationRepository) -> Self {
        Self { access_repo, notification_repo }
    }

    pub async fn list_users<'e, E>(&self, executor: E) -> Result<Vec<UserWithRole>, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        self.access_repo.list_users_with_roles(executor).await
    }

    pub async fn set_role<'e, E>(
        &self,
        executor: E,
        changed_by: Uuid,
        user_id: Uuid,
        role: Role,
        permissions: Option<&FeaturePermissions>,
    ) -> Result<UserRoleRow, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        if self.access_repo.find_user_id_by_id(&mut *tx, user_id).await?.is_none() {
            return Err(AppError::UserNotFound);
        }

        let row = self.access_repo.set_role(&mut *tx, user_id, role, permissions).await?;

        self.notification_repo
            .emit(
                &mut *tx,
                ROLE_CHANGED,
                &format!("Papel alterado para {:?}", role),
                Some(user_id),
                json!({ "changedBy": changed_by, "role": role }),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(%user_id, %changed_by, ?role, "papel atualizado");
        Ok(row)
    }

    // Verificar também aprova (is_approved)
    pub async fn set_verification<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        status: VerificationStatus,
    ) -> Result<Profile, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let profile = self
            .access_repo
            .set_verification(executor, user_id, status)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!(%user_id, ?status, "status de verificação atualizado");
        Ok(profile)
    }

    /// add_admin_user: promove um usuário existente, localizado pelo e-mail.
    pub async fn add_admin_user<'e, E>(&self, executor: E, changed_by: Uuid, email: &str) -> Result<UserRoleRow, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let user_id = self
            .access_repo
            .find_user_id_by_email(&mut *conn, email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.set_role(&mut *conn, changed_by, user_id, Role::Admin, None).await
    }
}
