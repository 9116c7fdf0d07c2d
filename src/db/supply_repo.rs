// src/db/supply_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        supply::{SupplyItemInput, SupplyRequest, SupplyRequestItem, SupplyRequestStatus},
        Priority,
    },
};

const REQUEST_COLUMNS: &str = "id, requester_id, title, description, status, priority, fulfiller_id, \
     notes, rejection_reason, created_at, updated_at, received_at, fulfillment_started_at, \
     fulfilled_at, completed_at";

/// Campos que acompanham uma mudança de status.
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub fulfiller_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub fulfillment_started_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// Sem pool própria: toda consulta roda no executor do chamador
#[derive(Clone, Default)]
pub struct SupplyRepository;

impl SupplyRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_request<'e, E>(
        &self,
        executor: E,
        requester_id: Uuid,
        title: &str,
        description: Option<&str>,
        priority: Priority,
    ) -> Result<SupplyRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SupplyRequest>(&format!(
            r#"
            INSERT INTO supply_requests (requester_id, title, description, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(requester_id)
        .bind(title)
        .bind(description)
        .bind(priority)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        item: &SupplyItemInput,
    ) -> Result<SupplyRequestItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, SupplyRequestItem>(
            r#"
            INSERT INTO supply_request_items (request_id, inventory_item_id, quantity_requested, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, request_id, inventory_item_id, quantity_requested, quantity_fulfilled, notes
            "#,
        )
        .bind(request_id)
        .bind(item.inventory_item_id)
        .bind(item.quantity)
        .bind(item.notes.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<SupplyRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SupplyRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM supply_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    pub async fn list_items<'e, E>(&self, executor: E, request_id: Uuid) -> Result<Vec<SupplyRequestItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SupplyRequestItem>(
            r#"
            SELECT id, request_id, inventory_item_id, quantity_requested, quantity_fulfilled, notes
            FROM supply_request_items
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_by_requester<'e, E>(&self, executor: E, requester_id: Uuid) -> Result<Vec<SupplyRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let requests = sqlx::query_as::<_, SupplyRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM supply_requests WHERE requester_id = $1 ORDER BY created_at DESC"
        ))
        .bind(requester_id)
        .fetch_all(executor)
        .await?;
        Ok(requests)
    }

    // Quadro do almoxarifado: abertos + fechados nos últimos 7 dias
    pub async fn list_for_board<'e, E>(&self, executor: E) -> Result<Vec<SupplyRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let requests = sqlx::query_as::<_, SupplyRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM supply_requests
            WHERE status NOT IN ('completed', 'rejected')
               OR updated_at > NOW() - INTERVAL '7 days'
            ORDER BY priority DESC, created_at ASC
            "#
        ))
        .fetch_all(executor)
        .await?;
        Ok(requests)
    }

    /// Atualização condicional: só aplica se o status atual estiver em `from`.
    /// `None` significa que a pré-condição não valia (ou o pedido não existe).
    pub async fn transition<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        from: &[SupplyRequestStatus],
        to: SupplyRequestStatus,
        fields: &TransitionFields,
    ) -> Result<Option<SupplyRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SupplyRequest>(&format!(
            r#"
            UPDATE supply_requests
            SET status = $3,
                fulfiller_id = COALESCE($4, fulfiller_id),
                rejection_reason = COALESCE($5, rejection_reason),
                received_at = COALESCE($6, received_at),
                fulfillment_started_at = COALESCE($7, fulfillment_started_at),
                fulfilled_at = COALESCE($8, fulfilled_at),
                completed_at = COALESCE($9, completed_at),
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($2)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(fields.fulfiller_id)
        .bind(fields.rejection_reason.as_deref())
        .bind(fields.received_at)
        .bind(fields.fulfillment_started_at)
        .bind(fields.fulfilled_at)
        .bind(fields.completed_at)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    pub async fn mark_items_fulfilled<'e, E>(&self, executor: E, request_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE supply_request_items SET quantity_fulfilled = quantity_requested WHERE request_id = $1",
        )
        .bind(request_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
