// src/handlers/supply.rs

use axum::{
    extract::{Path, State},
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
        rbac::{
            PermInventoryRead, PermSupplyFulfillmentRead, PermSupplyFulfillmentWrite, PermSupplyRequestsWrite,
            RequirePermission,
        },
    },
    models::{
        access::{AccessLevel, Feature},
        supply::{
            CreateSupplyRequestPayload, FulfillmentBoard, InventoryItem, RejectSupplyRequestPayload, SupplyRequest,
            SupplyRequestDetail,
        },
    },
};

// ---
// Solicitante
// ---

#[utoipa::path(
    post,
    path = "/api/supply-requests",
    tag = "Supply",
    request_body = CreateSupplyRequestPayload,
    responses(
        (status = 201, description = "Pedido criado com status submitted", body = SupplyRequestDetail),
        (status = 400, description = "Pedido sem itens ou quantidade inválida"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supply_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSupplyRequestsWrite>,
    Json(payload): Json<CreateSupplyRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .supply_service
        .create(&mut *rls_conn, user.id(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/supply-requests/mine",
    tag = "Supply",
    responses((status = 200, description = "Pedidos do usuário logado", body = Vec<SupplyRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_supply_requests(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<Vec<SupplyRequest>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let requests = app_state
        .supply_service
        .list_mine(&mut *rls_conn, user.id())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

// O dono sempre vê o próprio pedido; os demais precisam ler o almoxarifado
#[utoipa::path(
    get,
    path = "/api/supply-requests/{id}",
    tag = "Supply",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com itens", body = SupplyRequestDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_supply_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SupplyRequestDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .supply_service
        .get(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    let is_owner = detail.request.requester_id == user.id();
    if !is_owner && !user.permissions().allows(Feature::SupplyFulfillment, AccessLevel::Read) {
        return Err(AppError::Forbidden("supply_fulfillment:read".into()).to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/api/inventory",
    tag = "Supply",
    responses((status = 200, description = "Itens de estoque", body = Vec<InventoryItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let items = app_state
        .supply_service
        .list_inventory()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(items))
}

// ---
// Almoxarifado
// ---

#[utoipa::path(
    get,
    path = "/api/supply-requests/board",
    tag = "Supply",
    responses((status = 200, description = "Quadro de atendimento por coluna", body = FulfillmentBoard)),
    security(("api_jwt" = []))
)]
pub async fn get_fulfillment_board(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSupplyFulfillmentRead>,
) -> Result<Json<FulfillmentBoard>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let board = app_state
        .supply_service
        .board(&mut *rls_conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(board))
}

#[utoipa::path(
    post,
    path = "/api/supply-requests/{id}/receive",
    tag = "Supply",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "submitted -> received", body = SupplyRequest),
        (status = 409, description = "Transição inválida ou corrida perdida")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_supply_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSupplyFulfillmentWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<SupplyRequest>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .supply_service
        .receive(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/supply-requests/{id}/start",
    tag = "Supply",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "received -> processing, atendente registrado", body = SupplyRequest),
        (status = 409, description = "Transição inválida ou corrida perdida")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_fulfillment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSupplyFulfillmentWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<SupplyRequest>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .supply_service
        .start_fulfillment(&mut *rls_conn, id, user.id())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/supply-requests/{id}/ready",
    tag = "Supply",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "processing -> ready, estoque baixado", body = SupplyRequestDetail),
        (status = 409, description = "Estoque insuficiente ou transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_ready(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSupplyFulfillmentWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<SupplyRequestDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .supply_service
        .mark_ready(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.supply_service.invalidate_inventory().await;

    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/supply-requests/{id}/complete",
    tag = "Supply",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "ready -> completed", body = SupplyRequest),
        (status = 409, description = "Transição inválida ou corrida perdida")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_supply_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSupplyFulfillmentWrite>,
    Path(id): Path<Uuid>,
) -> Result<Json<SupplyRequest>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .supply_service
        .complete(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/supply-requests/{id}/reject",
    tag = "Supply",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = RejectSupplyRequestPayload,
    responses(
        (status = 200, description = "Pedido rejeitado", body = SupplyRequest),
        (status = 409, description = "Pedido já encerrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_supply_request(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSupplyFulfillmentWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectSupplyRequestPayload>,
) -> Result<Json<SupplyRequest>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .supply_service
        .reject(&mut *rls_conn, id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}
