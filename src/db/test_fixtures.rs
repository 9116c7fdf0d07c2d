// src/db/test_fixtures.rs

//! Linhas mínimas para os testes `#[sqlx::test]`.

use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_user(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, 'hash')")
        .bind(id)
        .bind(format!("{id}@tribunal.test"))
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn insert_inventory_item(pool: &PgPool, name: &str, quantity: i32) -> Uuid {
    sqlx::query_scalar("INSERT INTO inventory_items (name, quantity) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(quantity)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn stock_of(pool: &PgPool, item_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT quantity FROM inventory_items WHERE id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
