// src/handlers/spaces.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
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
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSpacesRead, PermSpacesWrite, RequirePermission},
    },
    models::spaces::{
        Building, ConnectionQuery, CreateBuildingPayload, CreateConnectionPayload, CreateFloorPayload,
        CreateRoomPayload, Floor, Room, SpaceConnection, UpdateRoomPayload,
    },
    services::space_service::SpaceChange,
};

// ---
// Prédios
// ---

#[utoipa::path(
    get,
    path = "/api/buildings",
    tag = "Spaces",
    responses((status = 200, description = "Prédios ativos", body = Vec<Building>)),
    security(("api_jwt" = []))
)]
pub async fn list_buildings(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSpacesRead>,
) -> Result<Json<Vec<Building>>, ApiError> {
    let buildings = app_state
        .space_service
        .list_buildings()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(buildings))
}

#[utoipa::path(
    post,
    path = "/api/buildings",
    tag = "Spaces",
    request_body = CreateBuildingPayload,
    responses((status = 201, description = "Prédio criado", body = Building)),
    security(("api_jwt" = []))
)]
pub async fn create_building(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Json(payload): Json<CreateBuildingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let building = app_state
        .space_service
        .create_building(&mut *rls_conn, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::BuildingCreated).await;

    Ok((StatusCode::CREATED, Json(building)))
}

#[utoipa::path(
    delete,
    path = "/api/buildings/{id}",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID do prédio")),
    responses(
        (status = 204, description = "Prédio removido (soft delete)"),
        (status = 404, description = "Prédio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_building(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .space_service
        .delete_building(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::BuildingRemoved).await;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Andares
// ---

#[utoipa::path(
    get,
    path = "/api/buildings/{id}/floors",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID do prédio")),
    responses((status = 200, description = "Andares do prédio", body = Vec<Floor>)),
    security(("api_jwt" = []))
)]
pub async fn list_floors(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSpacesRead>,
    Path(building_id): Path<Uuid>,
) -> Result<Json<Vec<Floor>>, ApiError> {
    let floors = app_state
        .space_service
        .list_floors(building_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(floors))
}

#[utoipa::path(
    post,
    path = "/api/buildings/{id}/floors",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID do prédio")),
    request_body = CreateFloorPayload,
    responses(
        (status = 201, description = "Andar criado", body = Floor),
        (status = 404, description = "Prédio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_floor(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Path(building_id): Path<Uuid>,
    Json(payload): Json<CreateFloorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let floor = app_state
        .space_service
        .create_floor(&mut *rls_conn, building_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::FloorCreated).await;

    Ok((StatusCode::CREATED, Json(floor)))
}

#[utoipa::path(
    delete,
    path = "/api/floors/{id}",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID do andar")),
    responses(
        (status = 204, description = "Andar removido (soft delete)"),
        (status = 404, description = "Andar não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_floor(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .space_service
        .delete_floor(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::FloorRemoved).await;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Salas
// ---

#[utoipa::path(
    get,
    path = "/api/floors/{id}/rooms",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID do andar")),
    responses((status = 200, description = "Salas do andar", body = Vec<Room>)),
    security(("api_jwt" = []))
)]
pub async fn list_rooms(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSpacesRead>,
    Path(floor_id): Path<Uuid>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let rooms = app_state
        .space_service
        .list_rooms(floor_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rooms))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Sala", body = Room),
        (status = 404, description = "Sala não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_room(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Room>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let room = app_state
        .space_service
        .get_room(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(room))
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Spaces",
    request_body = CreateRoomPayload,
    responses(
        (status = 201, description = "Sala criada", body = Room),
        (status = 404, description = "Andar não encontrado"),
        (status = 409, description = "Número de sala repetido no andar")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_room(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let room = app_state
        .space_service
        .create_room(&mut *rls_conn, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::Room).await;

    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    patch,
    path = "/api/rooms/{id}",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID da sala")),
    request_body = UpdateRoomPayload,
    responses(
        (status = 200, description = "Sala atualizada", body = Room),
        (status = 404, description = "Sala não encontrada"),
        (status = 409, description = "Sala alterada por outra pessoa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_room(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoomPayload>,
) -> Result<Json<Room>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let room = app_state
        .space_service
        .update_room(&mut *rls_conn, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::Room).await;

    Ok(Json(room))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 204, description = "Sala removida (soft delete)"),
        (status = 404, description = "Sala não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_room(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .space_service
        .delete_room(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::Room).await;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Conexões entre espaços
// ---

#[utoipa::path(
    get,
    path = "/api/connections",
    tag = "Spaces",
    params(ConnectionQuery),
    responses((status = 200, description = "Conexões ativas do espaço", body = Vec<SpaceConnection>)),
    security(("api_jwt" = []))
)]
pub async fn list_connections(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSpacesRead>,
    Query(query): Query<ConnectionQuery>,
) -> Result<Json<Vec<SpaceConnection>>, ApiError> {
    let connections = app_state
        .space_service
        .list_connections(query.space_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(connections))
}

#[utoipa::path(
    post,
    path = "/api/connections",
    tag = "Spaces",
    request_body = CreateConnectionPayload,
    responses(
        (status = 201, description = "Conexão criada", body = SpaceConnection),
        (status = 400, description = "Espaço conectado a si mesmo"),
        (status = 409, description = "Par já conectado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_connection(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Json(payload): Json<CreateConnectionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let connection = app_state
        .space_service
        .create_connection(&mut *rls_conn, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::Connection).await;

    Ok((StatusCode::CREATED, Json(connection)))
}

#[utoipa::path(
    delete,
    path = "/api/connections/{id}",
    tag = "Spaces",
    params(("id" = Uuid, Path, description = "ID da conexão")),
    responses(
        (status = 200, description = "Conexão desativada", body = SpaceConnection),
        (status = 404, description = "Conexão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_connection(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSpacesWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<SpaceConnection>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let connection = app_state
        .space_service
        .delete_connection(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.space_service.invalidate(SpaceChange::Connection).await;

    Ok(Json(connection))
}
