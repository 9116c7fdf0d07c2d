// src/services/supply_service.rs

use chrono::Utc;
use serde_json::json;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        cache::{CacheEntity, CacheKey, QueryCache},
        error::AppError,
    },
    db::{supply_repo::TransitionFields, InventoryRepository, NotificationRepository, SupplyRepository},
    models::{
        notifications::NEW_SUPPLY_REQUEST,
        supply::{
            CreateSupplyRequestPayload, FulfillmentBoard, InventoryItem, SupplyRequest, SupplyRequestDetail,
            SupplyRequestStatus,
        },
    },
};

/// Passos do fluxo de atendimento do almoxarifado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyAction {
    Receive,
    StartFulfillment,
    MarkReady,
    Complete,
    Reject,
}

impl SupplyAction {
    /// Status a partir dos quais a ação é permitida.
    pub fn sources(self) -> &'static [SupplyRequestStatus] {
        use SupplyRequestStatus::*;
        match self {
            SupplyAction::Receive => &[Submitted],
            SupplyAction::StartFulfillment => &[Submitted, Received],
            SupplyAction::MarkReady => &[Picking],
            SupplyAction::Complete => &[Ready],
            SupplyAction::Reject => &[Submitted, Received, Picking],
        }
    }

    pub fn target(self) -> SupplyRequestStatus {
        match self {
            SupplyAction::Receive => SupplyRequestStatus::Received,
            SupplyAction::StartFulfillment => SupplyRequestStatus::Picking,
            SupplyAction::MarkReady => SupplyRequestStatus::Ready,
            SupplyAction::Complete => SupplyRequestStatus::Completed,
            SupplyAction::Reject => SupplyRequestStatus::Rejected,
        }
    }

    pub fn allows(self, from: SupplyRequestStatus) -> bool {
        self.sources().contains(&from)
    }
}

/// Distribui os pedidos nas colunas do quadro. Cada pedido cai em exatamente uma.
pub fn partition_requests(requests: Vec<SupplyRequest>) -> FulfillmentBoard {
    let mut board = FulfillmentBoard::default();
    for request in requests {
        match request.status {
            SupplyRequestStatus::Submitted | SupplyRequestStatus::Received => board.new_orders.push(request),
            SupplyRequestStatus::Picking => board.in_progress.push(request),
            SupplyRequestStatus::Ready => board.ready_for_pickup.push(request),
            SupplyRequestStatus::Completed | SupplyRequestStatus::Rejected => board.closed.push(request),
        }
    }
    board
}

#[derive(Clone)]
pub struct SupplyService {
    supply_repo: SupplyRepository,
    inventory_repo: InventoryRepository,
    notification_repo: NotificationRepository,
    cache: QueryCache,
}

impl SupplyService {
    pub fn new(
        supply_repo: SupplyRepository,
        inventory_repo: InventoryRepository,
        notification_repo: NotificationRepository,
        cache: QueryCache,
    ) -> Self {
        Self { supply_repo, inventory_repo, notification_repo, cache }
    }

    // --- CREATE ---
    pub async fn create<'e, E>(
        &self,
        executor: E,
        requester_id: Uuid,
        payload: &CreateSupplyRequestPayload,
    ) -> Result<SupplyRequestDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Cabeçalho do pedido (status inicial: submitted)
        let request = self
            .supply_repo
            .create_request(
                &mut *tx,
                requester_id,
                &payload.title,
                payload.description.as_deref(),
                payload.priority,
            )
            .await?;

        // 2. Itens
        let mut items = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            items.push(self.supply_repo.add_item(&mut *tx, request.id, item).await?);
        }

        // 3. Notifica o almoxarifado
        self.notification_repo
            .emit(
                &mut *tx,
                NEW_SUPPLY_REQUEST,
                &format!("Novo pedido de suprimento: {}", request.title),
                Some(request.id),
                json!({ "priority": request.priority, "itemCount": items.len() }),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(request_id = %request.id, %requester_id, "pedido de suprimento criado");
        Ok(SupplyRequestDetail { request, items })
    }

    // --- LEITURAS ---
    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<SupplyRequestDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let request = self
            .supply_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("supply request {id}")))?;
        let items = self.supply_repo.list_items(&mut *conn, id).await?;
        Ok(SupplyRequestDetail { request, items })
    }

    pub async fn list_mine<'e, E>(&self, executor: E, requester_id: Uuid) -> Result<Vec<SupplyRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.supply_repo.list_by_requester(executor, requester_id).await
    }

    pub async fn board<'e, E>(&self, executor: E) -> Result<FulfillmentBoard, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let requests = self.supply_repo.list_for_board(executor).await?;
        Ok(partition_requests(requests))
    }

    pub async fn list_inventory(&self) -> Result<Vec<InventoryItem>, AppError> {
        let repo = self.inventory_repo.clone();
        self.cache
            .get_or_load(CacheKey::new(CacheEntity::InventoryItems, "all"), || async move {
                repo.list_items().await
            })
            .await
    }

    /// Chamar depois do commit de uma baixa de estoque.
    pub async fn invalidate_inventory(&self) {
        self.cache.invalidate_entity(CacheEntity::InventoryItems).await;
    }

    // --- TRANSIÇÕES ---

    pub async fn receive<'e, E>(&self, executor: E, id: Uuid) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let fields = TransitionFields { received_at: Some(Utc::now()), ..Default::default() };
        self.apply(executor, id, SupplyAction::Receive, fields).await
    }

    /// Dois atendentes iniciando ao mesmo tempo: só um vence, o outro recebe conflito.
    pub async fn start_fulfillment<'e, E>(&self, executor: E, id: Uuid, fulfiller_id: Uuid) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let fields = TransitionFields {
            fulfiller_id: Some(fulfiller_id),
            fulfillment_started_at: Some(Utc::now()),
            ..Default::default()
        };
        self.apply(executor, id, SupplyAction::StartFulfillment, fields).await
    }

    // picking -> ready, baixando o estoque na mesma transação
    pub async fn mark_ready<'e, E>(&self, executor: E, id: Uuid) -> Result<SupplyRequestDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let action = SupplyAction::MarkReady;

        // 1. Transição condicional
        let fields = TransitionFields { fulfilled_at: Some(Utc::now()), ..Default::default() };
        let Some(request) = self
            .supply_repo
            .transition(&mut *tx, id, action.sources(), action.target(), &fields)
            .await?
        else {
            return Err(self.explain_failure(&mut *tx, id, action).await);
        };

        // 2. Baixa de estoque item a item; qualquer falta desfaz tudo (drop do tx)
        let items = self.supply_repo.list_items(&mut *tx, id).await?;
        for item in &items {
            let deducted = self
                .inventory_repo
                .deduct_stock(&mut *tx, item.inventory_item_id, item.quantity_requested)
                .await?;
            if deducted.is_none() {
                tracing::warn!(request_id = %id, item_id = %item.inventory_item_id, "estoque insuficiente");
                return Err(AppError::InsufficientStock(item.inventory_item_id.to_string()));
            }
        }

        // 3. Quantidade atendida = solicitada
        self.supply_repo.mark_items_fulfilled(&mut *tx, id).await?;
        let items = self.supply_repo.list_items(&mut *tx, id).await?;

        tx.commit().await?;

        tracing::info!(request_id = %id, "pedido pronto para retirada");
        Ok(SupplyRequestDetail { request, items })
    }

    pub async fn complete<'e, E>(&self, executor: E, id: Uuid) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let fields = TransitionFields { completed_at: Some(Utc::now()), ..Default::default() };
        self.apply(executor, id, SupplyAction::Complete, fields).await
    }

    pub async fn reject<'e, E>(&self, executor: E, id: Uuid, reason: &str) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let fields = TransitionFields { rejection_reason: Some(reason.to_string()), ..Default::default() };
        self.apply(executor, id, SupplyAction::Reject, fields).await
    }

    async fn apply<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        action: SupplyAction,
        fields: TransitionFields,
    ) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        match self
            .supply_repo
            .transition(&mut *conn, id, action.sources(), action.target(), &fields)
            .await?
        {
            Some(request) => {
                tracing::info!(request_id = %id, status = request.status.as_str(), "pedido atualizado");
                Ok(request)
            }
            None => Err(self.explain_failure(&mut *conn, id, action).await),
        }
    }

    // A atualização condicional não achou linha: descobre o motivo.
    async fn explain_failure<'e, E>(&self, executor: E, id: Uuid, action: SupplyAction) -> AppError
    where
        E: Executor<'e, Database = Postgres>,
    {
        match self.supply_repo.find_by_id(executor, id).await {
            Ok(None) => AppError::ResourceNotFound(format!("supply request {id}")),
            Ok(Some(current)) if action.allows(current.status) => {
                // O status era válido na leitura: outro cliente chegou antes
                AppError::Conflict(format!("supply request {id}"))
            }
            Ok(Some(current)) => AppError::InvalidTransition {
                from: current.status.as_str().to_string(),
                to: action.target().as_str().to_string(),
            },
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::db_utils::begin_rls,
        db::test_fixtures::{insert_inventory_item, insert_user, stock_of},
        models::{supply::SupplyItemInput, Priority},
    };

    fn request(status: SupplyRequestStatus) -> SupplyRequest {
        let now = Utc::now();
        SupplyRequest {
            id: Uuid::new_v4(),
            requester_id: Uuid::new_v4(),
            title: "Toner".into(),
            description: None,
            status,
            priority: Priority::Medium,
            fulfiller_id: None,
            notes: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
            received_at: None,
            fulfillment_started_at: None,
            fulfilled_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn partition_puts_every_request_in_exactly_one_column() {
        use SupplyRequestStatus::*;
        let statuses = [Submitted, Received, Picking, Ready, Completed, Rejected, Picking, Submitted];
        let requests: Vec<_> = statuses.iter().map(|s| request(*s)).collect();
        let mut ids: Vec<Uuid> = requests.iter().map(|r| r.id).collect();

        let board = partition_requests(requests);

        assert_eq!(board.len(), statuses.len());
        assert_eq!(board.new_orders.len(), 3);
        assert_eq!(board.in_progress.len(), 2);
        assert_eq!(board.ready_for_pickup.len(), 1);
        assert_eq!(board.closed.len(), 2);

        let mut seen: Vec<Uuid> = board
            .new_orders
            .iter()
            .chain(&board.in_progress)
            .chain(&board.ready_for_pickup)
            .chain(&board.closed)
            .map(|r| r.id)
            .collect();
        ids.sort();
        seen.sort();
        assert_eq!(ids, seen);
    }

    #[test]
    fn empty_list_gives_empty_board() {
        assert!(partition_requests(Vec::new()).is_empty());
    }

    #[test]
    fn start_is_allowed_from_submitted_or_received_only() {
        use SupplyRequestStatus::*;
        let start = SupplyAction::StartFulfillment;
        assert!(start.allows(Submitted));
        assert!(start.allows(Received));
        for status in [Picking, Ready, Completed, Rejected] {
            assert!(!start.allows(status), "{status:?}");
        }
        assert_eq!(start.target(), Picking);
    }

    #[test]
    fn terminal_states_accept_no_action() {
        use SupplyRequestStatus::*;
        let actions = [
            SupplyAction::Receive,
            SupplyAction::StartFulfillment,
            SupplyAction::MarkReady,
            SupplyAction::Complete,
            SupplyAction::Reject,
        ];
        for status in [Completed, Rejected] {
            assert!(status.is_terminal());
            assert!(actions.iter().all(|a| !a.allows(status)));
        }
    }

    #[test]
    fn ready_requires_picking_and_reject_stops_before_ready() {
        use SupplyRequestStatus::*;
        assert_eq!(SupplyAction::MarkReady.sources(), &[Picking]);
        assert!(!SupplyAction::Reject.allows(Ready));
        assert_eq!(SupplyAction::Complete.target(), Completed);
    }

    // --- Postgres ---

    fn pg_service(pool: &sqlx::PgPool) -> SupplyService {
        SupplyService::new(
            SupplyRepository::new(),
            InventoryRepository::new(pool.clone()),
            NotificationRepository::new(pool.clone()),
            QueryCache::new(100, std::time::Duration::from_secs(60)),
        )
    }

    fn order(items: &[(Uuid, i32)]) -> CreateSupplyRequestPayload {
        CreateSupplyRequestPayload {
            title: "Material do cartório".into(),
            description: None,
            priority: Priority::High,
            items: items
                .iter()
                .map(|(id, quantity)| SupplyItemInput { inventory_item_id: *id, quantity: *quantity, notes: None })
                .collect(),
        }
    }

    #[sqlx::test]
    async fn mark_ready_deducts_every_item(pool: sqlx::PgPool) {
        let svc = pg_service(&pool);
        let requester = insert_user(&pool).await;
        let paper = insert_inventory_item(&pool, "Papel A4", 10).await;
        let toner = insert_inventory_item(&pool, "Toner", 3).await;

        let before = svc.list_inventory().await.unwrap();
        assert_eq!(before.iter().find(|i| i.id == paper).unwrap().quantity, 10);

        let created = svc.create(&pool, requester, &order(&[(paper, 4), (toner, 2)])).await.unwrap();
        svc.start_fulfillment(&pool, created.request.id, requester).await.unwrap();
        let ready = svc.mark_ready(&pool, created.request.id).await.unwrap();

        assert_eq!(ready.request.status, SupplyRequestStatus::Ready);
        assert!(ready.items.iter().all(|i| i.quantity_fulfilled == Some(i.quantity_requested)));
        assert_eq!(stock_of(&pool, paper).await, 6);
        assert_eq!(stock_of(&pool, toner).await, 1);

        svc.invalidate_inventory().await;
        let after = svc.list_inventory().await.unwrap();
        assert_eq!(after.iter().find(|i| i.id == paper).unwrap().quantity, 6);
    }

    #[sqlx::test]
    async fn shortfall_on_any_item_rolls_back_the_whole_request(pool: sqlx::PgPool) {
        let svc = pg_service(&pool);
        let requester = insert_user(&pool).await;
        let paper = insert_inventory_item(&pool, "Papel A4", 10).await;
        let toner = insert_inventory_item(&pool, "Toner", 1).await;

        let created = svc.create(&pool, requester, &order(&[(paper, 4), (toner, 2)])).await.unwrap();
        svc.start_fulfillment(&pool, created.request.id, requester).await.unwrap();

        let err = svc.mark_ready(&pool, created.request.id).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(id) if id == toner.to_string()));

        // nem o papel foi baixado, e o pedido continua em separação
        assert_eq!(stock_of(&pool, paper).await, 10);
        assert_eq!(stock_of(&pool, toner).await, 1);
        let current = svc.get(&pool, created.request.id).await.unwrap();
        assert_eq!(current.request.status, SupplyRequestStatus::Picking);
        assert!(current.items.iter().all(|i| i.quantity_fulfilled.is_none()));
    }

    #[sqlx::test]
    async fn shortfall_inside_an_outer_transaction_keeps_it_usable(pool: sqlx::PgPool) {
        let svc = pg_service(&pool);
        let requester = insert_user(&pool).await;
        let paper = insert_inventory_item(&pool, "Papel A4", 1).await;

        let created = svc.create(&pool, requester, &order(&[(paper, 5)])).await.unwrap();
        svc.start_fulfillment(&pool, created.request.id, requester).await.unwrap();

        let mut tx = begin_rls(&pool, requester).await.unwrap();
        let err = svc.mark_ready(&mut *tx, created.request.id).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        // só o savepoint foi desfeito
        let rejected = svc.reject(&mut *tx, created.request.id, "Sem estoque").await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(rejected.status, SupplyRequestStatus::Rejected);
        assert_eq!(stock_of(&pool, paper).await, 1);
    }

    #[sqlx::test]
    async fn completing_twice_is_an_invalid_transition(pool: sqlx::PgPool) {
        let svc = pg_service(&pool);
        let requester = insert_user(&pool).await;
        let paper = insert_inventory_item(&pool, "Papel A4", 10).await;

        let created = svc.create(&pool, requester, &order(&[(paper, 1)])).await.unwrap();
        let id = created.request.id;
        svc.start_fulfillment(&pool, id, requester).await.unwrap();
        svc.mark_ready(&pool, id).await.unwrap();
        svc.complete(&pool, id).await.unwrap();

        let err = svc.complete(&pool, id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
        let err = svc.receive(&pool, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }
}
