// src/models.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod access;
pub mod auth;
pub mod navigation;
pub mod notifications;
pub mod personnel;
pub mod preferences;
pub mod session;
pub mod spaces;
pub mod supply;
pub mod tasks;

// Prioridade compartilhada entre pedidos de suprimento e tarefas
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "priority_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}
