// src/handlers/notifications.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, rbac::RequireAdmin},
    models::notifications::{AdminNotification, NotificationQuery},
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationQuery),
    responses((status = 200, description = "Notificações mais recentes primeiro", body = Vec<AdminNotification>)),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<AdminNotification>>, ApiError> {
    let notifications = app_state
        .notification_service
        .list(query.limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notifications))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Notificação lida", body = AdminNotification),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_notification_read(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminNotification>, ApiError> {
    let notification = app_state
        .notification_service
        .mark_read(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notification))
}
