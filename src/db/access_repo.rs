// src/db/access_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::access::{FeaturePermissions, Profile, Role, UserRoleRow, UserWithRole, VerificationStatus},
};

const PROFILE_COLUMNS: &str = "id, email, first_name, last_name, department, title, phone, \
     verification_status, is_approved, created_at, updated_at";

// Perfis (profiles) e papéis (user_roles)
#[derive(Clone)]
pub struct AccessRepository {
    pool: PgPool,
}

impl AccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_profile<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        email: &str,
        first_name: &str,
        last_name: &str,
        department: Option<&str>,
    ) -> Result<Profile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles (id, email, first_name, last_name, department)
            VALUES ($1, lower($2), $3, $4, $5)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(department)
        .fetch_one(executor)
        .await?;

        Ok(profile)
    }

    pub async fn create_user_role<'e, E>(&self, executor: E, user_id: Uuid, role: Role) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user_id)
            .bind(role)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn find_role(&self, user_id: Uuid) -> Result<Option<UserRoleRow>, AppError> {
        let row = sqlx::query_as::<_, UserRoleRow>(
            "SELECT user_id, role, permissions FROM user_roles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_users_with_roles<'e, E>(&self, executor: E) -> Result<Vec<UserWithRole>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, UserWithRole>(
            r#"
            SELECT p.id, p.email, p.first_name, p.last_name, p.department, p.title, p.phone,
                   p.verification_status, p.is_approved, p.created_at, p.updated_at,
                   COALESCE(ur.role, 'standard'::app_role) AS role
            FROM profiles p
            LEFT JOIN user_roles ur ON ur.user_id = p.id
            ORDER BY p.verification_status, p.last_name, p.first_name
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    // UPSERT: usuários antigos podem não ter linha em user_roles
    pub async fn set_role<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        role: Role,
        permissions: Option<&FeaturePermissions>,
    ) -> Result<UserRoleRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, UserRoleRow>(
            r#"
            INSERT INTO user_roles (user_id, role, permissions)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET role = EXCLUDED.role, permissions = EXCLUDED.permissions, updated_at = NOW()
            RETURNING user_id, role, permissions
            "#,
        )
        .bind(user_id)
        .bind(role)
        .bind(permissions.map(Json))
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn set_verification<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        status: VerificationStatus,
    ) -> Result<Option<Profile>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles
            SET verification_status = $2,
                is_approved = ($2 = 'verified'::verification_status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(profile)
    }

    pub async fn find_user_id_by_id<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(id)
    }

    pub async fn find_user_id_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(id)
    }
}
