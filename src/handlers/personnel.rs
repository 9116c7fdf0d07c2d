// src/handlers/personnel.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermPersonnelAdmin, PermPersonnelRead, RequirePermission},
    },
    models::personnel::{ImportSummary, PersonnelMinimal, PersonnelProfile},
};

#[utoipa::path(
    get,
    path = "/api/personnel",
    tag = "Personnel",
    responses((status = 200, description = "Lista enxuta para seletores", body = Vec<PersonnelMinimal>)),
    security(("api_jwt" = []))
)]
pub async fn list_personnel(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPersonnelRead>,
) -> Result<Json<Vec<PersonnelMinimal>>, ApiError> {
    let personnel = app_state
        .personnel_service
        .list_minimal()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(personnel))
}

#[utoipa::path(
    get,
    path = "/api/personnel/{id}",
    tag = "Personnel",
    params(("id" = Uuid, Path, description = "ID do colaborador")),
    responses(
        (status = 200, description = "Cadastro completo", body = PersonnelProfile),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_personnel(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPersonnelRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<PersonnelProfile>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let profile = app_state
        .personnel_service
        .get(&mut *rls_conn, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/personnel/export",
    tag = "Personnel",
    responses((status = 200, description = "CSV com cabeçalho", content_type = "text/csv", body = String)),
    security(("api_jwt" = []))
)]
pub async fn export_personnel_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPersonnelAdmin>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let csv = app_state
        .personnel_service
        .export_csv(&mut *rls_conn)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"personnel.csv\""),
        ],
        csv,
    ))
}

// Corpo cru em CSV (text/csv)
#[utoipa::path(
    post,
    path = "/api/personnel/import",
    tag = "Personnel",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Resumo da importação", body = ImportSummary),
        (status = 400, description = "CSV malformado")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_personnel_csv(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPersonnelAdmin>,
    body: String,
) -> Result<Json<ImportSummary>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .personnel_service
        .import_csv(&mut *rls_conn, &body)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    app_state.personnel_service.invalidate_personnel().await;

    Ok(Json(summary))
}
