// src/handlers/preferences.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::preferences::{CompleteTourPayload, PatchPreferencesPayload, TourView, UserPreferences},
};

#[utoipa::path(
    get,
    path = "/api/preferences",
    tag = "Preferences",
    responses((status = 200, description = "Tours concluídos e preferências de tela", body = UserPreferences)),
    security(("api_jwt" = []))
)]
pub async fn get_preferences(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<UserPreferences>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let prefs = app_state
        .preference_service
        .get(&mut *rls_conn, user.id())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(prefs))
}

#[utoipa::path(
    patch,
    path = "/api/preferences/ui",
    tag = "Preferences",
    request_body = PatchPreferencesPayload,
    responses(
        (status = 200, description = "Preferências atualizadas", body = UserPreferences),
        (status = 400, description = "Chave fora de issues.* / ui.*")
    ),
    security(("api_jwt" = []))
)]
pub async fn patch_ui_preferences(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<PatchPreferencesPayload>,
) -> Result<Json<UserPreferences>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let prefs = app_state
        .preference_service
        .patch_ui(&mut *rls_conn, user.id(), &payload.values)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(prefs))
}

#[utoipa::path(
    get,
    path = "/api/tours",
    tag = "Preferences",
    responses((status = 200, description = "Catálogo de tours com status de conclusão", body = Vec<TourView>)),
    security(("api_jwt" = []))
)]
pub async fn list_tours(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<Vec<TourView>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tours = app_state
        .preference_service
        .tours(&mut *rls_conn, user.id())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tours))
}

#[utoipa::path(
    post,
    path = "/api/tours/complete",
    tag = "Preferences",
    request_body = CompleteTourPayload,
    responses(
        (status = 200, description = "Tour marcado como concluído", body = UserPreferences),
        (status = 400, description = "Rota sem tour")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_tour(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CompleteTourPayload>,
) -> Result<Json<UserPreferences>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let prefs = app_state
        .preference_service
        .complete_tour(&mut *rls_conn, user.id(), &payload.route)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(prefs))
}

#[utoipa::path(
    delete,
    path = "/api/tours",
    tag = "Preferences",
    responses((status = 204, description = "Tours reiniciados")),
    security(("api_jwt" = []))
)]
pub async fn reset_tours(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .preference_service
        .reset_tours(&mut *rls_conn, user.id())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
