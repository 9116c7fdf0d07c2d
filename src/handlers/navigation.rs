// src/handlers/navigation.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::navigation::{NavigationPathQuery, NavigationPathResponse, NavigationTab},
    services::navigation::{get_navigation_path, get_role_based_navigation},
};

// Menu do usuário logado
#[utoipa::path(
    get,
    path = "/api/navigation",
    tag = "Navigation",
    responses(
        (status = 200, description = "Abas visíveis para o papel e permissões", body = Vec<NavigationTab>)
    ),
    security(("api_jwt" = []))
)]
pub async fn my_navigation(user: AuthenticatedUser) -> Json<Vec<NavigationTab>> {
    Json(get_role_based_navigation(user.permissions(), user.role()))
}

#[utoipa::path(
    get,
    path = "/api/navigation/path",
    tag = "Navigation",
    params(NavigationPathQuery),
    responses(
        (status = 200, description = "Rota do item de menu", body = NavigationPathResponse),
        (status = 404, description = "Título sem rota")
    )
)]
pub async fn navigation_path(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<NavigationPathQuery>,
) -> Result<Json<NavigationPathResponse>, ApiError> {
    let path = get_navigation_path(&query.title, query.admin).ok_or_else(|| {
        AppError::ResourceNotFound(format!("menu '{}'", query.title)).to_api_error(&locale, &app_state.i18n_store)
    })?;

    Ok(Json(NavigationPathResponse { title: query.title, path: path.to_string() }))
}
