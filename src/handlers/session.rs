// src/handlers/session.rs

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::{
    config::AppState,
    middleware::auth::bearer_token,
    models::session::{SessionQuery, SessionView},
    services::session::{session_view, AuthEvent, AuthSnapshot, SessionState},
};

// Rota pública: o token é opcional. Token inválido ou expirado = não autenticado.
#[utoipa::path(
    get,
    path = "/api/session",
    tag = "Session",
    params(SessionQuery),
    responses(
        (status = 200, description = "Estado da sessão e redirecionamento sugerido", body = SessionView)
    )
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Json<SessionView> {
    let snapshot = match bearer_token(&headers) {
        None => None,
        Some(token) => match app_state.auth_service.load_context(token).await {
            Ok(context) => Some(AuthSnapshot {
                role: context.role,
                verified: context.role.is_admin() || context.profile.is_verified(),
            }),
            Err(e) => {
                tracing::debug!(error = %e, "token de sessão recusado");
                None
            }
        },
    };

    let state = SessionState::Loading.apply(AuthEvent::Polled(snapshot));
    Json(session_view(state, query.path.as_deref(), app_state.config.redirect_debounce))
}
