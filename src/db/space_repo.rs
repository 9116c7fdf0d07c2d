// src/db/space_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::violated_constraint, error::AppError},
    models::spaces::{
        Building, ConnectionType, CreateBuildingPayload, CreateFloorPayload, CreateRoomPayload, Floor,
        Room, SpaceConnection, SpaceRef, UpdateRoomPayload,
    },
};

const ROOM_COLUMNS: &str = "id, floor_id, room_number, name, room_type, status, capacity, \
     created_at, updated_at, deleted_at";

const CONNECTION_COLUMNS: &str = "id, from_space_id, from_space_kind, to_space_id, to_space_kind, \
     connection_type, direction, status, created_at, updated_at";

// Prédios, andares, salas e conexões entre espaços
#[derive(Clone)]
pub struct SpaceRepository {
    pool: PgPool,
}

impl SpaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // --- Prédios ---

    pub async fn create_building<'e, E>(&self, executor: E, payload: &CreateBuildingPayload) -> Result<Building, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO buildings (name, address)
            VALUES ($1, $2)
            RETURNING id, name, address, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&payload.name)
        .bind(payload.address.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(building)
    }

    pub async fn list_buildings<'e, E>(&self, executor: E) -> Result<Vec<Building>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let buildings = sqlx::query_as::<_, Building>(
            r#"
            SELECT id, name, address, created_at, updated_at, deleted_at
            FROM buildings
            WHERE deleted_at IS NULL
            ORDER BY name
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(buildings)
    }

    pub async fn soft_delete_building<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE buildings SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Andares ---

    pub async fn create_floor<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        payload: &CreateFloorPayload,
    ) -> Result<Floor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let floor = sqlx::query_as::<_, Floor>(
            r#"
            INSERT INTO floors (building_id, name, floor_number)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM buildings WHERE id = $1 AND deleted_at IS NULL)
            RETURNING id, building_id, name, floor_number, created_at, updated_at, deleted_at
            "#,
        )
        .bind(building_id)
        .bind(&payload.name)
        .bind(payload.floor_number)
        .fetch_optional(executor)
        .await?;

        floor.ok_or_else(|| AppError::ResourceNotFound(format!("building {building_id}")))
    }

    pub async fn list_floors<'e, E>(&self, executor: E, building_id: Uuid) -> Result<Vec<Floor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let floors = sqlx::query_as::<_, Floor>(
            r#"
            SELECT id, building_id, name, floor_number, created_at, updated_at, deleted_at
            FROM floors
            WHERE building_id = $1
              AND deleted_at IS NULL
              AND EXISTS (SELECT 1 FROM buildings b WHERE b.id = floors.building_id AND b.deleted_at IS NULL)
            ORDER BY floor_number
            "#,
        )
        .bind(building_id)
        .fetch_all(executor)
        .await?;
        Ok(floors)
    }

    pub async fn soft_delete_floor<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE floors SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Salas ---

    pub async fn create_room<'e, E>(&self, executor: E, payload: &CreateRoomPayload) -> Result<Room, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, Room>(&format!(
            r#"
            INSERT INTO rooms (floor_id, room_number, name, room_type, capacity)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM floors WHERE id = $1 AND deleted_at IS NULL)
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(payload.floor_id)
        .bind(&payload.room_number)
        .bind(&payload.name)
        .bind(&payload.room_type)
        .bind(payload.capacity)
        .fetch_optional(executor)
        .await
        .map_err(|e| match violated_constraint(&e) {
            Some(constraint) => AppError::UniqueConstraintViolation(constraint),
            None => e.into(),
        })?;

        room.ok_or_else(|| AppError::ResourceNotFound(format!("floor {}", payload.floor_id)))
    }

    pub async fn list_rooms<'e, E>(&self, executor: E, floor_id: Uuid) -> Result<Vec<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // andar ou prédio removido esconde as salas
        let rooms = sqlx::query_as::<_, Room>(&format!(
            r#"
            SELECT {ROOM_COLUMNS} FROM rooms
            WHERE floor_id = $1
              AND deleted_at IS NULL
              AND EXISTS (
                  SELECT 1 FROM floors f
                  JOIN buildings b ON b.id = f.building_id
                  WHERE f.id = rooms.floor_id AND f.deleted_at IS NULL AND b.deleted_at IS NULL
              )
            ORDER BY room_number
            "#
        ))
        .bind(floor_id)
        .fetch_all(executor)
        .await?;
        Ok(rooms)
    }

    pub async fn find_room<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, Room>(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(room)
    }

    /// Concorrência otimista: só atualiza se `updated_at` ainda for o que o cliente leu.
    pub async fn update_room<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateRoomPayload,
    ) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, Room>(&format!(
            r#"
            UPDATE rooms
            SET name = COALESCE($3, name),
                room_type = COALESCE($4, room_type),
                status = COALESCE($5, status),
                capacity = COALESCE($6, capacity),
                updated_at = NOW()
            WHERE id = $1 AND updated_at = $2 AND deleted_at IS NULL
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payload.expected_updated_at)
        .bind(payload.name.as_deref())
        .bind(payload.room_type.as_deref())
        .bind(payload.status)
        .bind(payload.capacity)
        .fetch_optional(executor)
        .await?;
        Ok(room)
    }

    pub async fn soft_delete_room<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE rooms SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Conexões ---

    /// `from`/`to` já devem estar em ordem canônica.
    pub async fn create_connection<'e, E>(
        &self,
        executor: E,
        from: SpaceRef,
        to: SpaceRef,
        connection_type: ConnectionType,
        direction: Option<&str>,
    ) -> Result<SpaceConnection, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let connection = sqlx::query_as::<_, SpaceConnection>(&format!(
            r#"
            INSERT INTO space_connections
                (from_space_id, from_space_kind, to_space_id, to_space_kind, connection_type, direction)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CONNECTION_COLUMNS}
            "#
        ))
        .bind(from.id)
        .bind(from.kind)
        .bind(to.id)
        .bind(to.kind)
        .bind(connection_type)
        .bind(direction)
        .fetch_one(executor)
        .await
        .map_err(|e| match violated_constraint(&e).as_deref() {
            Some("idx_space_connections_active_pair") => {
                AppError::Conflict(format!("connection {} <-> {}", from.id, to.id))
            }
            Some(other) => AppError::UniqueConstraintViolation(other.to_string()),
            None => e.into(),
        })?;
        Ok(connection)
    }

    pub async fn list_connections<'e, E>(&self, executor: E, space_id: Uuid) -> Result<Vec<SpaceConnection>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let connections = sqlx::query_as::<_, SpaceConnection>(&format!(
            r#"
            SELECT {CONNECTION_COLUMNS} FROM space_connections
            WHERE (from_space_id = $1 OR to_space_id = $1) AND status = 'active'
            ORDER BY created_at
            "#
        ))
        .bind(space_id)
        .fetch_all(executor)
        .await?;
        Ok(connections)
    }

    pub async fn deactivate_connection<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<SpaceConnection>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let connection = sqlx::query_as::<_, SpaceConnection>(&format!(
            r#"
            UPDATE space_connections
            SET status = 'inactive', updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING {CONNECTION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(connection)
    }
}
