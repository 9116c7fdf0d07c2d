// src/models/spaces.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "room_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Active,
    Inactive,
    UnderMaintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "space_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SpaceKind {
    Room,
    Hallway,
    Door,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "connection_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    #[default]
    Direct,
    Door,
    Secured,
    Transition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "connection_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Active,
    Inactive,
}

// --- Hierarquia ---

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: Uuid,
    #[schema(example = "Fórum Central")]
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: Uuid,
    pub building_id: Uuid,
    #[schema(example = "3º andar")]
    pub name: String,
    #[schema(example = 3)]
    pub floor_number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub floor_id: Uuid,
    #[schema(example = "301")]
    pub room_number: String,
    #[schema(example = "Sala de Audiências 1")]
    pub name: String,
    #[schema(example = "courtroom")]
    pub room_type: String,
    pub status: RoomStatus,
    pub capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// --- Conexões ---

/// Uma ponta de conexão.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpaceRef {
    pub id: Uuid,
    pub kind: SpaceKind,
}

/// Par canônico de uma aresta não-direcionada: (a, b) e (b, a) viram o mesmo par.
pub fn canonical_pair(a: SpaceRef, b: SpaceRef) -> (SpaceRef, SpaceRef) {
    if (a.id, a.kind) <= (b.id, b.kind) { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpaceConnection {
    pub id: Uuid,
    pub from_space_id: Uuid,
    pub from_space_kind: SpaceKind,
    pub to_space_id: Uuid,
    pub to_space_kind: SpaceKind,
    pub connection_type: ConnectionType,
    #[schema(example = "north")]
    pub direction: Option<String>,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SpaceConnection {
    /// A outra ponta, vista a partir de `space_id`.
    pub fn neighbor_of(&self, space_id: Uuid) -> Option<SpaceRef> {
        if self.from_space_id == space_id {
            Some(SpaceRef { id: self.to_space_id, kind: self.to_space_kind })
        } else if self.to_space_id == space_id {
            Some(SpaceRef { id: self.from_space_id, kind: self.from_space_kind })
        } else {
            None
        }
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Anexo Administrativo")]
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFloorPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub floor_number: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomPayload {
    pub floor_id: Uuid,
    #[validate(length(min = 1, message = "required"))]
    pub room_number: String,
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(length(min = 1, message = "required"))]
    pub room_type: String,
    #[validate(range(min = 0, message = "capacity"))]
    pub capacity: Option<i32>,
}

/// Atualização com concorrência otimista: `expectedUpdatedAt` precisa bater.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomPayload {
    pub expected_updated_at: DateTime<Utc>,
    pub name: Option<String>,
    pub room_type: Option<String>,
    pub status: Option<RoomStatus>,
    #[validate(range(min = 0, message = "capacity"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_distinct_ends", skip_on_field_errors = false))]
pub struct CreateConnectionPayload {
    pub from: SpaceRef,
    pub to: SpaceRef,
    #[serde(default)]
    pub connection_type: ConnectionType,
    pub direction: Option<String>,
}

fn validate_distinct_ends(payload: &CreateConnectionPayload) -> Result<(), ValidationError> {
    if payload.from.id == payload.to.id {
        let mut err = ValidationError::new("self_connection");
        err.message = Some("self_connection".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConnectionQuery {
    pub space_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(kind: SpaceKind) -> SpaceRef {
        SpaceRef { id: Uuid::new_v4(), kind }
    }

    #[test]
    fn canonical_pair_ignores_direction() {
        let a = space(SpaceKind::Room);
        let b = space(SpaceKind::Hallway);
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
    }

    #[test]
    fn neighbor_is_resolved_from_either_end() {
        let room = space(SpaceKind::Room);
        let hall = space(SpaceKind::Hallway);
        let (from, to) = canonical_pair(room, hall);
        let now = Utc::now();
        let conn = SpaceConnection {
            id: Uuid::new_v4(),
            from_space_id: from.id,
            from_space_kind: from.kind,
            to_space_id: to.id,
            to_space_kind: to.kind,
            connection_type: ConnectionType::Door,
            direction: None,
            status: ConnectionStatus::Active,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(conn.neighbor_of(room.id), Some(hall));
        assert_eq!(conn.neighbor_of(hall.id), Some(room));
        assert_eq!(conn.neighbor_of(Uuid::new_v4()), None);
    }

    #[test]
    fn self_connection_fails_validation() {
        let a = space(SpaceKind::Room);
        let payload = CreateConnectionPayload {
            from: a,
            to: a,
            connection_type: ConnectionType::Direct,
            direction: None,
        };
        assert!(payload.validate().is_err());
    }
}
