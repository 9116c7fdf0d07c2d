// src/services/space_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        cache::{CacheEntity, CacheKey, QueryCache},
        error::AppError,
    },
    db::SpaceRepository,
    models::spaces::{
        canonical_pair, Building, CreateBuildingPayload, CreateConnectionPayload, CreateFloorPayload,
        CreateRoomPayload, Floor, Room, SpaceConnection, UpdateRoomPayload,
    },
};

/// Escritas de espaço que tornam listagens em cache obsoletas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceChange {
    BuildingCreated,
    // remover um prédio esconde os andares e salas abaixo dele
    BuildingRemoved,
    FloorCreated,
    FloorRemoved,
    Room,
    Connection,
}

impl SpaceChange {
    pub fn affected(self) -> &'static [CacheEntity] {
        match self {
            SpaceChange::BuildingCreated => &[CacheEntity::Buildings],
            SpaceChange::BuildingRemoved => &[CacheEntity::Buildings, CacheEntity::Floors, CacheEntity::Rooms],
            SpaceChange::FloorCreated => &[CacheEntity::Floors],
            SpaceChange::FloorRemoved => &[CacheEntity::Floors, CacheEntity::Rooms],
            SpaceChange::Room => &[CacheEntity::Rooms],
            SpaceChange::Connection => &[CacheEntity::SpaceConnections],
        }
    }
}

// Leituras passam pelo cache. As escritas não tocam nele: quem é dono da
// transação chama `invalidate` depois do commit.
#[derive(Clone)]
pub struct SpaceService {
    space_repo: SpaceRepository,
    cache: QueryCache,
}

impl SpaceService {
    pub fn new(space_repo: SpaceRepository, cache: QueryCache) -> Self {
        Self { space_repo, cache }
    }

    /// Só depois do commit: antes dele uma leitura concorrente recarrega o estado antigo.
    pub async fn invalidate(&self, change: SpaceChange) {
        self.cache.invalidate_entities(change.affected()).await;
    }

    // --- Prédios ---

    pub async fn list_buildings(&self) -> Result<Vec<Building>, AppError> {
        let repo = self.space_repo.clone();
        self.cache
            .get_or_load(CacheKey::new(CacheEntity::Buildings, "active"), || async move {
                repo.list_buildings(repo.pool()).await
            })
            .await
    }

    pub async fn create_building<'e, E>(&self, executor: E, payload: &CreateBuildingPayload) -> Result<Building, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = self.space_repo.create_building(executor, payload).await?;
        tracing::info!(building_id = %building.id, "prédio criado");
        Ok(building)
    }

    pub async fn delete_building<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.space_repo.soft_delete_building(executor, id).await? {
            return Err(AppError::ResourceNotFound(format!("building {id}")));
        }
        Ok(())
    }

    // --- Andares ---

    pub async fn list_floors(&self, building_id: Uuid) -> Result<Vec<Floor>, AppError> {
        let repo = self.space_repo.clone();
        self.cache
            .get_or_load(CacheKey::new(CacheEntity::Floors, building_id.to_string()), || async move {
                repo.list_floors(repo.pool(), building_id).await
            })
            .await
    }

    pub async fn create_floor<'e, E>(
        &self,
        executor: E,
        building_id: Uuid,
        payload: &CreateFloorPayload,
    ) -> Result<Floor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let floor = self.space_repo.create_floor(executor, building_id, payload).await?;
        Ok(floor)
    }

    pub async fn delete_floor<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.space_repo.soft_delete_floor(executor, id).await? {
            return Err(AppError::ResourceNotFound(format!("floor {id}")));
        }
        Ok(())
    }

    // --- Salas ---

    pub async fn list_rooms(&self, floor_id: Uuid) -> Result<Vec<Room>, AppError> {
        let repo = self.space_repo.clone();
        self.cache
            .get_or_load(CacheKey::new(CacheEntity::Rooms, floor_id.to_string()), || async move {
                repo.list_rooms(repo.pool(), floor_id).await
            })
            .await
    }

    pub async fn get_room<'e, E>(&self, executor: E, id: Uuid) -> Result<Room, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.space_repo
            .find_room(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("room {id}")))
    }

    pub async fn create_room<'e, E>(&self, executor: E, payload: &CreateRoomPayload) -> Result<Room, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = self.space_repo.create_room(executor, payload).await?;
        tracing::info!(room_id = %room.id, floor_id = %room.floor_id, "sala criada");
        Ok(room)
    }

    /// Falha com conflito se a sala mudou desde `expected_updated_at`.
    pub async fn update_room<'e, E>(&self, executor: E, id: Uuid, payload: &UpdateRoomPayload) -> Result<Room, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let Some(room) = self.space_repo.update_room(&mut *conn, id, payload).await? else {
            // Nenhuma linha: ou a sala não existe, ou alguém salvou antes
            return match self.space_repo.find_room(&mut *conn, id).await? {
                None => Err(AppError::ResourceNotFound(format!("room {id}"))),
                Some(current) => {
                    tracing::debug!(room_id = %id, current = %current.updated_at, "atualização com versão desatualizada");
                    Err(AppError::Conflict(format!("room {id}")))
                }
            };
        };
        Ok(room)
    }

    pub async fn delete_room<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.space_repo.soft_delete_room(executor, id).await? {
            return Err(AppError::ResourceNotFound(format!("room {id}")));
        }
        Ok(())
    }

    // --- Conexões ---

    pub async fn list_connections(&self, space_id: Uuid) -> Result<Vec<SpaceConnection>, AppError> {
        let repo = self.space_repo.clone();
        self.cache
            .get_or_load(CacheKey::new(CacheEntity::SpaceConnections, space_id.to_string()), || async move {
                repo.list_connections(repo.pool(), space_id).await
            })
            .await
    }

    // (a, b) e (b, a) são gravados como o mesmo par; o índice único barra duplicatas
    pub async fn create_connection<'e, E>(
        &self,
        executor: E,
        payload: &CreateConnectionPayload,
    ) -> Result<SpaceConnection, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (from, to) = canonical_pair(payload.from, payload.to);
        let connection = self
            .space_repo
            .create_connection(executor, from, to, payload.connection_type, payload.direction.as_deref())
            .await?;
        Ok(connection)
    }

    pub async fn delete_connection<'e, E>(&self, executor: E, id: Uuid) -> Result<SpaceConnection, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let connection = self
            .space_repo
            .deactivate_connection(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("space connection {id}")))?;
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::db_utils::begin_rls,
        db::test_fixtures::insert_user,
        models::spaces::{ConnectionType, SpaceKind, SpaceRef},
    };
    use sqlx::PgPool;
    use std::time::Duration;

    fn service(pool: &PgPool) -> SpaceService {
        SpaceService::new(SpaceRepository::new(pool.clone()), QueryCache::new(100, Duration::from_secs(60)))
    }

    fn building(name: &str) -> CreateBuildingPayload {
        CreateBuildingPayload { name: name.into(), address: None }
    }

    fn floor(number: i32) -> CreateFloorPayload {
        CreateFloorPayload { name: format!("{number}º andar"), floor_number: number }
    }

    fn room(floor_id: Uuid, number: &str) -> CreateRoomPayload {
        CreateRoomPayload {
            floor_id,
            room_number: number.into(),
            name: format!("Sala {number}"),
            room_type: "courtroom".into(),
            capacity: Some(40),
        }
    }

    fn rename(expected: &Room, name: &str) -> UpdateRoomPayload {
        UpdateRoomPayload {
            expected_updated_at: expected.updated_at,
            name: Some(name.into()),
            room_type: None,
            status: None,
            capacity: None,
        }
    }

    #[sqlx::test]
    async fn write_is_visible_after_commit_even_if_read_while_open(pool: PgPool) {
        let svc = service(&pool);
        let user = insert_user(&pool).await;
        assert!(svc.list_buildings().await.unwrap().is_empty());

        let mut tx = begin_rls(&pool, user).await.unwrap();
        let created = svc.create_building(&mut *tx, &building("Fórum Central")).await.unwrap();

        // outra conexão lê antes do commit e guarda o estado antigo no cache
        assert!(svc.list_buildings().await.unwrap().is_empty());

        tx.commit().await.unwrap();
        svc.invalidate(SpaceChange::BuildingCreated).await;

        let ids: Vec<_> = svc.list_buildings().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![created.id]);
    }

    #[sqlx::test]
    async fn removing_a_building_hides_its_cached_floors_and_rooms(pool: PgPool) {
        let svc = service(&pool);
        let b = svc.create_building(&pool, &building("Anexo")).await.unwrap();
        let f = svc.create_floor(&pool, b.id, &floor(1)).await.unwrap();
        svc.create_room(&pool, &room(f.id, "101")).await.unwrap();

        assert_eq!(svc.list_floors(b.id).await.unwrap().len(), 1);
        assert_eq!(svc.list_rooms(f.id).await.unwrap().len(), 1);

        svc.delete_building(&pool, b.id).await.unwrap();
        svc.invalidate(SpaceChange::BuildingRemoved).await;

        assert!(svc.list_buildings().await.unwrap().is_empty());
        assert!(svc.list_floors(b.id).await.unwrap().is_empty());
        assert!(svc.list_rooms(f.id).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn removing_a_floor_hides_its_cached_rooms(pool: PgPool) {
        let svc = service(&pool);
        let b = svc.create_building(&pool, &building("Anexo")).await.unwrap();
        let f = svc.create_floor(&pool, b.id, &floor(2)).await.unwrap();
        svc.create_room(&pool, &room(f.id, "201")).await.unwrap();
        assert_eq!(svc.list_rooms(f.id).await.unwrap().len(), 1);

        svc.delete_floor(&pool, f.id).await.unwrap();
        svc.invalidate(SpaceChange::FloorRemoved).await;

        assert!(svc.list_floors(b.id).await.unwrap().is_empty());
        assert!(svc.list_rooms(f.id).await.unwrap().is_empty());

        let err = svc.delete_floor(&pool, f.id).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }

    #[sqlx::test]
    async fn stale_room_update_is_a_conflict(pool: PgPool) {
        let svc = service(&pool);
        let b = svc.create_building(&pool, &building("Fórum Central")).await.unwrap();
        let f = svc.create_floor(&pool, b.id, &floor(3)).await.unwrap();
        let original = svc.create_room(&pool, &room(f.id, "301")).await.unwrap();

        let first = svc.update_room(&pool, original.id, &rename(&original, "Plenário")).await.unwrap();
        assert_eq!(first.name, "Plenário");

        // segundo cliente ainda tem a versão lida antes da primeira gravação
        let err = svc.update_room(&pool, original.id, &rename(&original, "Sala do Júri")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(svc.get_room(&pool, original.id).await.unwrap().name, "Plenário");

        let err = svc.update_room(&pool, Uuid::new_v4(), &rename(&original, "x")).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }

    #[sqlx::test]
    async fn duplicate_room_number_on_a_floor_is_rejected(pool: PgPool) {
        let svc = service(&pool);
        let b = svc.create_building(&pool, &building("Fórum Central")).await.unwrap();
        let f = svc.create_floor(&pool, b.id, &floor(1)).await.unwrap();
        svc.create_room(&pool, &room(f.id, "101")).await.unwrap();

        let err = svc.create_room(&pool, &room(f.id, "101")).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }

    #[sqlx::test]
    async fn reversed_connection_is_the_same_edge(pool: PgPool) {
        let svc = service(&pool);
        let room_ref = SpaceRef { id: Uuid::new_v4(), kind: SpaceKind::Room };
        let hallway = SpaceRef { id: Uuid::new_v4(), kind: SpaceKind::Hallway };
        let connect = |from, to| CreateConnectionPayload {
            from,
            to,
            connection_type: ConnectionType::Door,
            direction: None,
        };

        let edge = svc.create_connection(&pool, &connect(room_ref, hallway)).await.unwrap();

        let err = svc.create_connection(&pool, &connect(hallway, room_ref)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(svc.list_connections(hallway.id).await.unwrap().len(), 1);

        // desativada, a aresta pode ser criada de novo
        svc.delete_connection(&pool, edge.id).await.unwrap();
        svc.invalidate(SpaceChange::Connection).await;
        assert!(svc.list_connections(room_ref.id).await.unwrap().is_empty());
        svc.create_connection(&pool, &connect(hallway, room_ref)).await.unwrap();
    }
}
