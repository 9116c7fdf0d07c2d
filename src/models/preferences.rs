// src/models/preferences.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// O que antes ficava no localStorage do navegador
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub completed_tours: Vec<String>,
    #[schema(value_type = Object)]
    pub ui_preferences: serde_json::Value,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CompleteTourPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "/spaces")]
    pub route: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PatchPreferencesPayload {
    /// Chaves com valor null são removidas.
    #[schema(value_type = Object)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TourStep {
    /// Seletor do elemento destacado
    #[schema(example = "[data-tour='spaces-list']")]
    pub target: &'static str,
    pub title: &'static str,
    pub content: &'static str,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TourView {
    pub route: &'static str,
    pub steps: Vec<TourStep>,
    pub completed: bool,
}
