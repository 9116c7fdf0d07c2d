// src/services/preference_service.rs

use serde_json::{Map, Value};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::PreferencesRepository,
    models::preferences::{TourView, UserPreferences},
    services::tours,
};

const ALLOWED_PREFIXES: [&str; 2] = ["issues.", "ui."];

fn field_error(field: &'static str, code: &'static str) -> AppError {
    let mut err = ValidationError::new(code);
    err.message = Some(code.into());
    let mut errors = ValidationErrors::new();
    errors.add(field, err);
    AppError::ValidationError(errors)
}

/// Aplica o patch sobre as preferências atuais. `null` remove a chave.
pub fn merge_ui_preferences(current: &Value, patch: &Map<String, Value>) -> Result<Value, AppError> {
    if let Some(key) = patch.keys().find(|k| !ALLOWED_PREFIXES.iter().any(|p| k.starts_with(p))) {
        tracing::debug!(%key, "chave de preferência recusada");
        return Err(field_error("values", "preference_key"));
    }

    let mut merged = current.as_object().cloned().unwrap_or_default();
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

// Tours concluídos e preferências de tela, sempre dentro da transação RLS do usuário
#[derive(Clone)]
pub struct PreferenceService {
    preferences_repo: PreferencesRepository,
}

impl PreferenceService {
    pub fn new(preferences_repo: PreferencesRepository) -> Self {
        Self { preferences_repo }
    }

    pub async fn get<'e, E>(&self, executor: E, user_id: Uuid) -> Result<UserPreferences, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.preferences_repo.get(executor, user_id).await
    }

    pub async fn tours<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Vec<TourView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prefs = self.preferences_repo.get(executor, user_id).await?;
        Ok(tours::tour_views(&prefs.completed_tours))
    }

    // Idempotente; rota sem tour é erro de validação
    pub async fn complete_tour<'e, E>(&self, executor: E, user_id: Uuid, route: &str) -> Result<UserPreferences, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if tours::find_tour(route).is_none() {
            return Err(field_error("route", "unknown_tour"));
        }
        self.preferences_repo.add_completed_tour(executor, user_id, route).await
    }

    pub async fn reset_tours<'e, E>(&self, executor: E, user_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.preferences_repo.reset_tours(executor, user_id).await
    }

    pub async fn patch_ui<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        patch: &Map<String, Value>,
    ) -> Result<UserPreferences, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Lê com lock para não perder escritas concorrentes do mesmo usuário
        sqlx::query("SELECT 1 FROM user_preferences WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let current = self.preferences_repo.get(&mut *tx, user_id).await?;
        let merged = merge_ui_preferences(&current.ui_preferences, patch)?;
        let saved = self.preferences_repo.save_ui_preferences(&mut *tx, user_id, &merged).await?;

        tx.commit().await?;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn patch_adds_and_replaces_keys() {
        let current = json!({ "issues.view": "cards", "ui.sidebar": "open" });
        let merged = merge_ui_preferences(&current, &patch(json!({ "issues.view": "table", "ui.density": "compact" }))).unwrap();

        assert_eq!(merged["issues.view"], "table");
        assert_eq!(merged["ui.sidebar"], "open");
        assert_eq!(merged["ui.density"], "compact");
    }

    #[test]
    fn null_removes_key() {
        let current = json!({ "issues.filters": { "status": "open" } });
        let merged = merge_ui_preferences(&current, &patch(json!({ "issues.filters": null }))).unwrap();
        assert!(merged.get("issues.filters").is_none());
    }

    #[test]
    fn keys_outside_allowed_namespaces_are_rejected() {
        let err = merge_ui_preferences(&json!({}), &patch(json!({ "completedTours": ["/"] }))).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
