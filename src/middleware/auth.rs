// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::i18n::Locale,
    models::access::{AuthContext, FeaturePermissions, Role},
};

/// Token do cabeçalho `Authorization: Bearer ...`, se houver.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn locale_of(headers: &HeaderMap) -> Locale {
    Locale::from_header(headers.get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()))
}

// O middleware em si: valida o token e carrega o contexto (perfil, papel, permissões)
pub async fn auth_guard(State(app_state): State<AppState>, mut request: Request, next: Next) -> Response {
    let locale = locale_of(request.headers());

    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        return AppError::InvalidToken
            .to_api_error(&locale, &app_state.i18n_store)
            .into_response();
    };

    match app_state.auth_service.load_context(&token).await {
        Ok(context) => {
            tracing::debug!(user_id = %context.user.id, role = ?context.role, "requisição autenticada");
            // Insere o usuário nos "extensions" da requisição
            request.extensions_mut().insert(AuthenticatedUser(context));
            next.run(request).await
        }
        Err(e) => e.to_api_error(&locale, &app_state.i18n_store).into_response(),
    }
}

// Rotas de trabalho exigem cadastro verificado; administradores passam direto.
pub async fn verified_guard(State(app_state): State<AppState>, request: Request, next: Next) -> Response {
    let locale = locale_of(request.headers());

    let allowed = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.is_admin() || user.0.profile.is_verified());

    match allowed {
        Some(true) => next.run(request).await,
        Some(false) => AppError::VerificationPending
            .to_api_error(&locale, &app_state.i18n_store)
            .into_response(),
        None => AppError::InvalidToken
            .to_api_error(&locale, &app_state.i18n_store)
            .into_response(),
    }
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthContext);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0.user.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.role.is_admin()
    }

    pub fn permissions(&self) -> &FeaturePermissions {
        &self.0.permissions
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
