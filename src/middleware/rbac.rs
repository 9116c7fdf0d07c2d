// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::access::{AccessLevel, Feature},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn feature() -> Feature;
    fn level() -> AccessLevel;

    fn slug() -> String {
        format!("{}:{}", Self::feature().slug(), Self::level().slug())
    }
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
// Usa o mapa de permissões já carregado pelo `auth_guard`, sem ir ao banco.
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_header(
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
        );

        // A. Extrai Usuário
        let Some(user) = parts.extensions.get::<AuthenticatedUser>() else {
            return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
        };

        // B. Confere o nível exigido
        if !user.permissions().allows(T::feature(), T::level()) {
            tracing::warn!(user_id = %user.id(), required = %T::slug(), "acesso negado");
            return Err(AppError::Forbidden(T::slug()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

/// Gestão de acesso e notificações: só o papel admin, independente do mapa.
pub struct RequireAdmin;

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_header(
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok()),
        );

        match parts.extensions.get::<AuthenticatedUser>() {
            Some(user) if user.is_admin() => Ok(RequireAdmin),
            Some(user) => {
                tracing::warn!(user_id = %user.id(), "acesso administrativo negado");
                Err(AppError::Forbidden("admin".into()).to_api_error(&locale, &app_state.i18n_store))
            }
            None => Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store)),
        }
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $feature:expr, $level:expr) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn feature() -> Feature {
                $feature
            }
            fn level() -> AccessLevel {
                $level
            }
        }
    };
}

permission!(PermSpacesRead, Feature::Spaces, AccessLevel::Read);
permission!(PermSpacesWrite, Feature::Spaces, AccessLevel::Write);
permission!(PermInventoryRead, Feature::Inventory, AccessLevel::Read);
permission!(PermSupplyRequestsWrite, Feature::SupplyRequests, AccessLevel::Write);
permission!(PermSupplyFulfillmentRead, Feature::SupplyFulfillment, AccessLevel::Read);
permission!(PermSupplyFulfillmentWrite, Feature::SupplyFulfillment, AccessLevel::Write);
permission!(PermTasksRead, Feature::Tasks, AccessLevel::Read);
permission!(PermTasksWrite, Feature::Tasks, AccessLevel::Write);
permission!(PermTasksAdmin, Feature::Tasks, AccessLevel::Admin);
permission!(PermPersonnelRead, Feature::Personnel, AccessLevel::Read);
permission!(PermPersonnelAdmin, Feature::Personnel, AccessLevel::Admin);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_combine_feature_and_level() {
        assert_eq!(PermSupplyFulfillmentWrite::slug(), "supply_fulfillment:write");
        assert_eq!(PermTasksAdmin::slug(), "tasks:admin");
    }
}
