// src/models/supply.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Priority;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "supply_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SupplyRequestStatus {
    Submitted,
    Received,
    Picking,
    Ready,
    Completed,
    Rejected,
}

impl SupplyRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SupplyRequestStatus::Submitted => "submitted",
            SupplyRequestStatus::Received => "received",
            SupplyRequestStatus::Picking => "picking",
            SupplyRequestStatus::Ready => "ready",
            SupplyRequestStatus::Completed => "completed",
            SupplyRequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SupplyRequestStatus::Completed | SupplyRequestStatus::Rejected)
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    #[schema(example = "Papel A4 para a 2ª Vara")]
    pub title: String,
    pub description: Option<String>,
    pub status: SupplyRequestStatus,
    pub priority: Priority,
    pub fulfiller_id: Option<Uuid>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
    pub fulfillment_started_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyRequestItem {
    pub id: Uuid,
    pub request_id: Uuid,
    pub inventory_item_id: Uuid,
    #[schema(example = 10)]
    pub quantity_requested: i32,
    pub quantity_fulfilled: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    #[schema(example = "Resma de papel A4")]
    pub name: String,
    #[schema(example = "resma")]
    pub unit: String,
    pub quantity: i32,
    pub minimum_quantity: i32,
    pub location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyRequestDetail {
    #[serde(flatten)]
    pub request: SupplyRequest,
    pub items: Vec<SupplyRequestItem>,
}

/// Quadro do almoxarifado: cada pedido cai em exatamente uma coluna.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentBoard {
    pub new_orders: Vec<SupplyRequest>,
    pub in_progress: Vec<SupplyRequest>,
    pub ready_for_pickup: Vec<SupplyRequest>,
    pub closed: Vec<SupplyRequest>,
}

impl FulfillmentBoard {
    pub fn len(&self) -> usize {
        self.new_orders.len() + self.in_progress.len() + self.ready_for_pickup.len() + self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// --- Payloads ---

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyItemInput {
    pub inventory_item_id: Uuid,
    #[validate(range(min = 1, message = "quantity"))]
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplyRequestPayload {
    #[validate(length(min = 1, message = "required"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[validate(length(min = 1, message = "items"), nested)]
    pub items: Vec<SupplyItemInput>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectSupplyRequestPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Item fora de linha")]
    pub reason: String,
}
