// src/models/navigation.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::access::Feature;

// Uma entrada do menu lateral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTab {
    #[schema(example = "Supply Requests")]
    pub title: String,
    #[schema(example = "/admin/supply-requests")]
    pub path: String,
    #[schema(example = "package")]
    pub icon: String,
    pub feature: Option<Feature>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NavigationPathQuery {
    /// Título do item de menu
    pub title: String,
    /// Resolve na tabela de rotas do administrador
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NavigationPathResponse {
    pub title: String,
    pub path: String,
}
