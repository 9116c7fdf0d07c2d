// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erros de domínio. Cada variante tem uma chave de tradução (ver `code`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Permissão necessária: {0}")]
    Forbidden(String),

    #[error("Cadastro aguardando verificação")]
    VerificationPending,

    // Pré-condição de transição violada (ex.: tarefa já reivindicada, registro desatualizado)
    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Transição inválida de {from} para {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Estoque insuficiente para o item {0}")]
    InsufficientStock(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Erro de CSV: {0}")]
    CsvError(#[from] csv::Error),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::CsvError(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists
            | AppError::Conflict(_)
            | AppError::InvalidTransition { .. }
            | AppError::InsufficientStock(_)
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) | AppError::VerificationPending => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave usada no catálogo de mensagens (`locales/*.json`).
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "error.validation",
            AppError::EmailAlreadyExists => "error.email_exists",
            AppError::InvalidCredentials => "error.invalid_credentials",
            AppError::InvalidToken => "error.invalid_token",
            AppError::UserNotFound => "error.user_not_found",
            AppError::ResourceNotFound(_) => "error.not_found",
            AppError::Forbidden(_) => "error.forbidden",
            AppError::VerificationPending => "error.verification_pending",
            AppError::Conflict(_) => "error.conflict",
            AppError::InvalidTransition { .. } => "error.invalid_transition",
            AppError::InsufficientStock(_) => "error.insufficient_stock",
            AppError::UniqueConstraintViolation(_) => "error.unique_violation",
            AppError::CsvError(_) => "error.csv",
            _ => "error.internal",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            AppError::ResourceNotFound(d)
            | AppError::Forbidden(d)
            | AppError::Conflict(d)
            | AppError::InsufficientStock(d)
            | AppError::UniqueConstraintViolation(d) => Some(d.clone()),
            AppError::InvalidTransition { from, to } => Some(format!("{from} -> {to}")),
            AppError::CsvError(e) => Some(e.to_string()),
            _ => None,
        }
    }

    /// Converte o erro de domínio na resposta HTTP traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada; o cliente recebe só a genérica.
            tracing::error!(error = ?self, "Erro Interno do Servidor: {}", self);
        }

        let error = i18n.format(locale.as_str(), self.code(), self.detail().as_deref());

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                            i18n.translate(locale.as_str(), &format!("validation.{key}"))
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// O erro que efetivamente vira resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => Json(json!({ "error": self.error, "details": details })),
            None => Json(json!({ "error": self.error })),
        };
        (self.status, body).into_response()
    }
}

// Usado onde não há `Locale` disponível (ex.: middlewares); responde em inglês.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::fallback()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn store() -> I18nStore {
        I18nStore::load_embedded().unwrap()
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(AppError::Conflict("task".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidTransition { from: "ready".into(), to: "picking".into() }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::InsufficientStock("paper".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("tasks:admin".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::VerificationPending.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("segredo do banco"));
        let api = err.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        let mut e = ValidationError::new("length");
        e.message = Some("required".into());
        errors.add("title", e);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert!(details.get("title").is_some());
    }

    #[test]
    fn messages_are_localized() {
        let store = store();
        let en = AppError::InvalidCredentials.to_api_error(&Locale("en".into()), &store);
        let pt = AppError::InvalidCredentials.to_api_error(&Locale("pt".into()), &store);
        assert_ne!(en.error, pt.error);
    }
}
