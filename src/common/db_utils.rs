// src/common/db_utils.rs

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

// ---
// Helper RLS: a "chave" para o banco de dados
// ---
/// Abre uma transação e define `app.user_id` para as políticas de RLS.
/// `set_config(.., true)` vale só até o fim da transação, então a conexão
/// volta limpa para a pool.
pub async fn begin_rls(pool: &PgPool, user_id: Uuid) -> Result<Transaction<'static, Postgres>, AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Transaction<'static, Postgres>, AppError> {
    begin_rls(&app_state.db_pool, user.id()).await
}

/// Constraint violada, quando o erro é de unicidade.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or("unique").to_string())
        }
        _ => None,
    }
}
