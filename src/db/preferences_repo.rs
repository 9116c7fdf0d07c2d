// src/db/preferences_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::preferences::UserPreferences};

// Todas as consultas daqui rodam dentro de uma transação RLS (política por user_id)
#[derive(Clone, Default)]
pub struct PreferencesRepository;

impl PreferencesRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get<'e, E>(&self, executor: E, user_id: Uuid) -> Result<UserPreferences, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            "SELECT completed_tours, ui_preferences FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        // Sem linha ainda = nada concluído
        Ok(prefs.unwrap_or_else(|| UserPreferences {
            completed_tours: Vec::new(),
            ui_preferences: serde_json::json!({}),
        }))
    }

    // Idempotente: a rota só entra uma vez no array
    pub async fn add_completed_tour<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        route: &str,
    ) -> Result<UserPreferences, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
            INSERT INTO user_preferences (user_id, completed_tours)
            VALUES ($1, ARRAY[$2::text])
            ON CONFLICT (user_id) DO UPDATE SET
                completed_tours = CASE
                    WHEN $2::text = ANY(user_preferences.completed_tours) THEN user_preferences.completed_tours
                    ELSE array_append(user_preferences.completed_tours, $2::text)
                END,
                updated_at = NOW()
            RETURNING completed_tours, ui_preferences
            "#,
        )
        .bind(user_id)
        .bind(route)
        .fetch_one(executor)
        .await?;
        Ok(prefs)
    }

    pub async fn reset_tours<'e, E>(&self, executor: E, user_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE user_preferences SET completed_tours = '{}', updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Grava o objeto de preferências já mesclado.
    pub async fn save_ui_preferences<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        ui_preferences: &serde_json::Value,
    ) -> Result<UserPreferences, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
            INSERT INTO user_preferences (user_id, ui_preferences)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET ui_preferences = EXCLUDED.ui_preferences, updated_at = NOW()
            RETURNING completed_tours, ui_preferences
            "#,
        )
        .bind(user_id)
        .bind(ui_preferences)
        .fetch_one(executor)
        .await?;
        Ok(prefs)
    }
}
