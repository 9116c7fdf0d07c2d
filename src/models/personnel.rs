// src/models/personnel.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Ficha do diretório de pessoal (não precisa ter login)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelProfile {
    pub id: Uuid,
    #[schema(example = "João")]
    pub first_name: String,
    #[schema(example = "Pereira")]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Secretaria da 2ª Vara")]
    pub department: Option<String>,
    #[schema(example = "Oficial de Justiça")]
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelMinimal {
    pub id: Uuid,
    #[schema(example = "João Pereira")]
    pub full_name: String,
    pub department: Option<String>,
    pub title: Option<String>,
}

/// Linha do CSV de importação/exportação. Os cabeçalhos são os nomes dos campos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelCsvRow {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl From<&PersonnelProfile> for PersonnelCsvRow {
    fn from(p: &PersonnelProfile) -> Self {
        Self {
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            department: p.department.clone(),
            title: p.title.clone(),
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub inserted: u32,
    pub updated: u32,
    pub skipped: u32,
}
