// src/models/session.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::access::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Unauthenticated,
    PendingVerification,
    Authenticated,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionQuery {
    /// Rota atual do cliente (ex.: `/spaces`)
    pub path: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub status: SessionStatus,
    pub role: Option<Role>,
    /// Para onde o cliente deve ir, se a rota atual não serve
    pub redirect: Option<String>,
    /// Página inicial do papel
    pub home: Option<String>,
    /// Janela em que o cliente deve coalescer redirecionamentos
    pub redirect_debounce_ms: u64,
}
