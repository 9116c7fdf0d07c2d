// src/handlers/access.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireAdmin},
    models::access::{AddAdminPayload, Profile, SetRolePayload, SetVerificationPayload, UserRoleRow, UserWithRole},
};

#[utoipa::path(
    get,
    path = "/api/access/users",
    tag = "Access",
    responses(
        (status = 200, description = "Usuários com papel", body = Vec<UserWithRole>),
        (status = 403, description = "Somente admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
) -> Result<Json<Vec<UserWithRole>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let users = app_state
        .access_service
        .list_users(&mut *rls_conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

#[utoipa::path(
    put,
    path = "/api/access/users/{id}/role",
    tag = "Access",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = SetRolePayload,
    responses(
        (status = 200, description = "Papel e permissões gravados", body = UserRoleRow),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_user_role(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetRolePayload>,
) -> Result<Json<UserRoleRow>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let row = app_state
        .access_service
        .set_role(&mut *rls_conn, user.id(), user_id, payload.role, payload.permissions.as_ref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(row))
}

#[utoipa::path(
    put,
    path = "/api/access/users/{id}/verification",
    tag = "Access",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = SetVerificationPayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = Profile),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_user_verification(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetVerificationPayload>,
) -> Result<Json<Profile>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let profile = app_state
        .access_service
        .set_verification(&mut *rls_conn, user_id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/access/admins",
    tag = "Access",
    request_body = AddAdminPayload,
    responses(
        (status = 200, description = "Usuário promovido a admin", body = UserRoleRow),
        (status = 404, description = "Nenhum usuário com esse e-mail")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_admin_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireAdmin,
    Json(payload): Json<AddAdminPayload>,
) -> Result<Json<UserRoleRow>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let row = app_state
        .access_service
        .add_admin_user(&mut *rls_conn, user.id(), &payload.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(row))
}
