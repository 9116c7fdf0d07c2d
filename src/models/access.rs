// src/models/access.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::User;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "app_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Standard,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

/// Áreas do sistema que aparecem no menu e protegem endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Spaces,
    Operations,
    Occupants,
    Inventory,
    SupplyRequests,
    SupplyFulfillment,
    Tasks,
    Personnel,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::Spaces,
        Feature::Operations,
        Feature::Occupants,
        Feature::Inventory,
        Feature::SupplyRequests,
        Feature::SupplyFulfillment,
        Feature::Tasks,
        Feature::Personnel,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Feature::Spaces => "spaces",
            Feature::Operations => "operations",
            Feature::Occupants => "occupants",
            Feature::Inventory => "inventory",
            Feature::SupplyRequests => "supply_requests",
            Feature::SupplyFulfillment => "supply_fulfillment",
            Feature::Tasks => "tasks",
            Feature::Personnel => "personnel",
        }
    }
}

// A ordem importa: read < write < admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    pub fn slug(self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Admin => "admin",
        }
    }
}

/// Mapa de permissões por área. `None` (null no JSON) significa sem acesso.
///
/// Os padrões vêm do papel; `user_roles.permissions` sobrescreve por chave,
/// e um null explícito revoga.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeaturePermissions(BTreeMap<Feature, Option<AccessLevel>>);

impl FeaturePermissions {
    pub fn for_role(role: Role) -> Self {
        let mut map = BTreeMap::new();
        for feature in Feature::ALL {
            let level = match role {
                Role::Admin => Some(AccessLevel::Admin),
                Role::Standard => match feature {
                    Feature::SupplyRequests | Feature::Tasks => Some(AccessLevel::Write),
                    Feature::Inventory => Some(AccessLevel::Read),
                    _ => None,
                },
            };
            map.insert(feature, level);
        }
        Self(map)
    }

    pub fn with_overrides(mut self, overrides: &FeaturePermissions) -> Self {
        for (feature, level) in &overrides.0 {
            self.0.insert(*feature, *level);
        }
        self
    }

    pub fn set(&mut self, feature: Feature, level: Option<AccessLevel>) {
        self.0.insert(feature, level);
    }

    pub fn level(&self, feature: Feature) -> Option<AccessLevel> {
        self.0.get(&feature).copied().flatten()
    }

    pub fn allows(&self, feature: Feature, required: AccessLevel) -> bool {
        self.level(feature).is_some_and(|level| level >= required)
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    #[schema(example = "maria.souza@tribunal.gov")]
    pub email: String,
    #[schema(example = "Maria")]
    pub first_name: String,
    #[schema(example = "Souza")]
    pub last_name: String,
    pub department: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub verification_status: VerificationStatus,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified && self.is_approved
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleRow {
    pub user_id: Uuid,
    pub role: Role,
    #[schema(value_type = Option<Object>)]
    pub permissions: Option<sqlx::types::Json<FeaturePermissions>>,
}

impl UserRoleRow {
    pub fn effective_permissions(&self) -> FeaturePermissions {
        let base = FeaturePermissions::for_role(self.role);
        match &self.permissions {
            Some(overrides) => base.with_overrides(&overrides.0),
            None => base,
        }
    }
}

// Listagem da gestão de acesso: perfil + papel
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRole {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub profile: Profile,
    pub role: Role,
}

/// Tudo que o middleware de autenticação sabe sobre quem chamou.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub profile: Profile,
    pub role: Role,
    pub permissions: FeaturePermissions,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub profile: Profile,
    pub role: Role,
    #[schema(value_type = Object)]
    pub permissions: FeaturePermissions,
}

// --- Payloads ---

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetRolePayload {
    pub role: Role,
    #[schema(value_type = Option<Object>)]
    pub permissions: Option<FeaturePermissions>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetVerificationPayload {
    pub status: VerificationStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddAdminPayload {
    #[validate(email(message = "email"))]
    #[schema(example = "chefe.manutencao@tribunal.gov")]
    pub email: String,
}
