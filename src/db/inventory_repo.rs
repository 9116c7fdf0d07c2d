// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::supply::InventoryItem};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_items(&self) -> Result<Vec<InventoryItem>, AppError> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT id, name, unit, quantity, minimum_quantity, location, updated_at
            FROM inventory_items
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Baixa condicional: só debita se houver saldo. `None` = estoque insuficiente.
    pub async fn deduct_stock<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET quantity = quantity - $2, updated_at = NOW()
            WHERE id = $1 AND quantity >= $2
            RETURNING id, name, unit, quantity, minimum_quantity, location, updated_at
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }
}
