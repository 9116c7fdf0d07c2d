// src/models/notifications.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const NEW_SUPPLY_REQUEST: &str = "new_supply_request";
pub const NEW_USER_PENDING: &str = "new_user_pending";
pub const ROLE_CHANGED: &str = "role_changed";

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotification {
    pub id: Uuid,
    #[schema(example = "new_supply_request")]
    pub notification_type: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    /// Padrão 50, máximo 200
    pub limit: Option<i64>,
}
