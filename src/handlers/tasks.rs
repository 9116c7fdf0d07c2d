// src/handlers/tasks.rs

// A TaskService abre a própria transação RLS (via TaskStore), então aqui não
// há get_rls_connection.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermTasksAdmin, PermTasksRead, PermTasksWrite, RequirePermission},
    },
    models::tasks::{AssignTaskPayload, CreateTaskPayload, StaffTask, TaskFilter},
    services::task_service::TaskActor,
};

fn actor(user: &AuthenticatedUser) -> TaskActor {
    TaskActor::new(user.id(), user.permissions())
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    request_body = CreateTaskPayload,
    responses(
        (status = 201, description = "Tarefa criada já aprovada", body = StaffTask),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksAdmin>,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let task = app_state
        .task_service
        .create(actor(&user), payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    params(TaskFilter),
    responses((status = 200, description = "Tarefas filtradas", body = Vec<StaffTask>)),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksRead>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<StaffTask>>, ApiError> {
    let tasks = app_state
        .task_service
        .list(actor(&user), &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tasks))
}

#[utoipa::path(
    get,
    path = "/api/tasks/available",
    tag = "Tasks",
    responses((status = 200, description = "Tarefas aprovadas e livres", body = Vec<StaffTask>)),
    security(("api_jwt" = []))
)]
pub async fn list_available_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksRead>,
) -> Result<Json<Vec<StaffTask>>, ApiError> {
    let tasks = app_state
        .task_service
        .available(actor(&user))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tasks))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa", body = StaffTask),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffTask>, ApiError> {
    let task = app_state
        .task_service
        .get(actor(&user), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/claim",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa reivindicada", body = StaffTask),
        (status = 409, description = "Outro usuário reivindicou antes")
    ),
    security(("api_jwt" = []))
)]
pub async fn claim_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffTask>, ApiError> {
    let task = app_state
        .task_service
        .claim(actor(&user), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/unclaim",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa devolvida para approved", body = StaffTask),
        (status = 403, description = "Tarefa de outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn unclaim_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffTask>, ApiError> {
    let task = app_state
        .task_service
        .unclaim(actor(&user), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/assign",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = AssignTaskPayload,
    responses(
        (status = 200, description = "Tarefa atribuída", body = StaffTask),
        (status = 409, description = "Tarefa já reivindicada")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignTaskPayload>,
) -> Result<Json<StaffTask>, ApiError> {
    let task = app_state
        .task_service
        .assign(actor(&user), id, payload.user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/start",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "claimed -> in_progress", body = StaffTask),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffTask>, ApiError> {
    let task = app_state
        .task_service
        .start(actor(&user), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/complete",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "in_progress -> completed", body = StaffTask),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffTask>, ApiError> {
    let task = app_state
        .task_service
        .complete(actor(&user), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/cancel",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa cancelada", body = StaffTask),
        (status = 403, description = "Só admin ou quem criou"),
        (status = 409, description = "Tarefa já encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTasksWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffTask>, ApiError> {
    let task = app_state
        .task_service
        .cancel(actor(&user), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}
