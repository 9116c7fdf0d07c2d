// src/db/personnel_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::personnel::{PersonnelCsvRow, PersonnelMinimal, PersonnelProfile},
};

const PERSONNEL_COLUMNS: &str = "id, first_name, last_name, email, phone, department, title, \
     is_active, created_at, updated_at";

/// Resultado de um upsert por e-mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Clone)]
pub struct PersonnelRepository {
    pool: PgPool,
}

impl PersonnelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // list_personnel_profiles_minimal
    pub async fn list_minimal<'e, E>(&self, executor: E) -> Result<Vec<PersonnelMinimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, PersonnelMinimal>(
            r#"
            SELECT id, first_name || ' ' || last_name AS full_name, department, title
            FROM personnel_profiles
            WHERE is_active
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<PersonnelProfile>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, PersonnelProfile>(&format!(
            "SELECT {PERSONNEL_COLUMNS} FROM personnel_profiles ORDER BY last_name, first_name"
        ))
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<PersonnelProfile>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, PersonnelProfile>(&format!(
            "SELECT {PERSONNEL_COLUMNS} FROM personnel_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Upsert pela coluna `email`. `xmax = 0` indica que a linha foi inserida.
    pub async fn upsert_by_email<'e, E>(&self, executor: E, row: &PersonnelCsvRow) -> Result<UpsertOutcome, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO personnel_profiles (first_name, last_name, email, phone, department, title, is_active)
            VALUES ($1, $2, lower($3), $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                phone = EXCLUDED.phone,
                department = EXCLUDED.department,
                title = EXCLUDED.title,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(row.email.as_deref())
        .bind(row.phone.as_deref())
        .bind(row.department.as_deref())
        .bind(row.title.as_deref())
        .bind(row.is_active)
        .fetch_one(executor)
        .await?;

        Ok(if inserted { UpsertOutcome::Inserted } else { UpsertOutcome::Updated })
    }

    pub async fn insert<'e, E>(&self, executor: E, row: &PersonnelCsvRow) -> Result<PersonnelProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, PersonnelProfile>(&format!(
            r#"
            INSERT INTO personnel_profiles (first_name, last_name, phone, department, title, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PERSONNEL_COLUMNS}
            "#
        ))
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(row.phone.as_deref())
        .bind(row.department.as_deref())
        .bind(row.title.as_deref())
        .bind(row.is_active)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }
}
