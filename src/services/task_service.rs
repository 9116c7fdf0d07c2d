// src/services/task_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TaskStore,
    models::{
        access::{AccessLevel, Feature, FeaturePermissions},
        tasks::{NewTask, StaffTask, TaskFilter, TaskStatus},
    },
};

const OPEN_STATUSES: [TaskStatus; 3] = [TaskStatus::Approved, TaskStatus::Claimed, TaskStatus::InProgress];

/// Quem está agindo sobre a tarefa.
///
/// `tasks_admin` vem do mapa de permissões (`tasks: admin`), o mesmo que a
/// rota consulta; o papel sozinho não decide.
#[derive(Debug, Clone, Copy)]
pub struct TaskActor {
    pub id: Uuid,
    pub tasks_admin: bool,
}

impl TaskActor {
    pub fn new(id: Uuid, permissions: &FeaturePermissions) -> Self {
        Self { id, tasks_admin: permissions.allows(Feature::Tasks, AccessLevel::Admin) }
    }
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: TaskActor, task: NewTask) -> Result<StaffTask, AppError> {
        let created = self.store.insert(actor.id, task).await?;
        tracing::info!(task_id = %created.id, created_by = %actor.id, "tarefa criada");
        Ok(created)
    }

    pub async fn get(&self, actor: TaskActor, id: Uuid) -> Result<StaffTask, AppError> {
        self.store
            .get(actor.id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("task {id}")))
    }

    pub async fn list(&self, actor: TaskActor, filter: &TaskFilter) -> Result<Vec<StaffTask>, AppError> {
        self.store.list(actor.id, filter).await
    }

    pub async fn available(&self, actor: TaskActor) -> Result<Vec<StaffTask>, AppError> {
        self.store.list_available(actor.id).await
    }

    // approved -> claimed. Só um de vários concorrentes vence.
    pub async fn claim(&self, actor: TaskActor, id: Uuid) -> Result<StaffTask, AppError> {
        match self.store.try_claim(actor.id, id, actor.id, false).await? {
            Some(task) => {
                tracing::info!(task_id = %id, user_id = %actor.id, "tarefa reivindicada");
                Ok(task)
            }
            None => Err(self.claim_failure(actor, id).await),
        }
    }

    pub async fn assign(&self, actor: TaskActor, id: Uuid, user_id: Uuid) -> Result<StaffTask, AppError> {
        if !actor.tasks_admin {
            return Err(AppError::Forbidden("tasks:admin".into()));
        }
        match self.store.try_claim(actor.id, id, user_id, true).await? {
            Some(task) => {
                tracing::info!(task_id = %id, assigned_to = %user_id, "tarefa atribuída");
                Ok(task)
            }
            None => Err(self.claim_failure(actor, id).await),
        }
    }

    pub async fn unclaim(&self, actor: TaskActor, id: Uuid) -> Result<StaffTask, AppError> {
        if let Some(task) = self.store.try_release(actor.id, id).await? {
            return Ok(task);
        }

        let current = self.get(actor, id).await?;
        if current.status != TaskStatus::Claimed {
            return Err(invalid(current.status, TaskStatus::Approved));
        }
        Err(AppError::Forbidden(format!("task {id}")))
    }

    pub async fn start(&self, actor: TaskActor, id: Uuid) -> Result<StaffTask, AppError> {
        self.advance(actor, id, &[TaskStatus::Claimed], TaskStatus::InProgress).await
    }

    pub async fn complete(&self, actor: TaskActor, id: Uuid) -> Result<StaffTask, AppError> {
        self.advance(actor, id, &[TaskStatus::InProgress], TaskStatus::Completed).await
    }

    // Quem administra tarefas ou quem criou; qualquer status não terminal
    pub async fn cancel(&self, actor: TaskActor, id: Uuid) -> Result<StaffTask, AppError> {
        let current = self.get(actor, id).await?;
        if !actor.tasks_admin && current.created_by != actor.id {
            return Err(AppError::Forbidden(format!("task {id}")));
        }

        match self
            .store
            .try_transition(actor.id, id, &OPEN_STATUSES, TaskStatus::Cancelled, None)
            .await?
        {
            Some(task) => {
                tracing::info!(task_id = %id, user_id = %actor.id, "tarefa cancelada");
                Ok(task)
            }
            None => {
                let current = self.get(actor, id).await?;
                Err(invalid(current.status, TaskStatus::Cancelled))
            }
        }
    }

    // Só quem reivindicou ou recebeu a tarefa pode movê-la adiante
    async fn advance(&self, actor: TaskActor, id: Uuid, from: &[TaskStatus], to: TaskStatus) -> Result<StaffTask, AppError> {
        if let Some(task) = self.store.try_transition(actor.id, id, from, to, Some(actor.id)).await? {
            tracing::info!(task_id = %id, status = to.as_str(), "tarefa atualizada");
            return Ok(task);
        }

        let current = self.get(actor, id).await?;
        if !from.contains(&current.status) {
            return Err(invalid(current.status, to));
        }
        if !current.is_worked_by(actor.id) {
            return Err(AppError::Forbidden(format!("task {id}")));
        }
        Err(AppError::Conflict(format!("task {id}")))
    }

    async fn claim_failure(&self, actor: TaskActor, id: Uuid) -> AppError {
        match self.store.get(actor.id, id).await {
            Ok(None) => AppError::ResourceNotFound(format!("task {id}")),
            Ok(Some(current)) if current.status.is_terminal() => invalid(current.status, TaskStatus::Claimed),
            // Já reivindicada ou atribuída por outra pessoa
            Ok(Some(_)) => AppError::Conflict(format!("task {id}")),
            Err(e) => e,
        }
    }
}

fn invalid(from: TaskStatus, to: TaskStatus) -> AppError {
    AppError::InvalidTransition { from: from.as_str().to_string(), to: to.as_str().to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{test_fixtures::insert_user, TaskRepository},
        models::{access::Role, tasks::TaskType, Priority},
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::{collections::HashMap, sync::Mutex};

    /// Implementação em memória com as mesmas pré-condições da versão Postgres.
    /// O mutex faz o papel do lock de linha.
    #[derive(Default)]
    struct InMemoryTaskStore {
        tasks: Mutex<HashMap<Uuid, StaffTask>>,
    }

    #[async_trait]
    impl TaskStore for InMemoryTaskStore {
        async fn insert(&self, actor: Uuid, task: NewTask) -> Result<StaffTask, AppError> {
            let now = Utc::now();
            let created = StaffTask {
                id: Uuid::new_v4(),
                title: task.title,
                description: task.description,
                task_type: task.task_type,
                status: TaskStatus::Approved,
                priority: task.priority,
                room_id: task.room_id,
                created_by: actor,
                claimed_by: None,
                assigned_to: None,
                due_at: task.due_at,
                claimed_at: None,
                started_at: None,
                completed_at: None,
                cancelled_at: None,
                created_at: now,
                updated_at: now,
            };
            self.tasks.lock().unwrap().insert(created.id, created.clone());
            Ok(created)
        }

        async fn get(&self, _actor: Uuid, id: Uuid) -> Result<Option<StaffTask>, AppError> {
            Ok(self.tasks.lock().unwrap().get(&id).cloned())
        }

        async fn list(&self, _actor: Uuid, filter: &TaskFilter) -> Result<Vec<StaffTask>, AppError> {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .values()
                .filter(|t| filter.status.is_none_or(|s| t.status == s))
                .filter(|t| filter.worker_id.is_none_or(|w| t.is_worked_by(w)))
                .cloned()
                .collect())
        }

        async fn list_available(&self, _actor: Uuid) -> Result<Vec<StaffTask>, AppError> {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.status == TaskStatus::Approved && t.claimed_by.is_none() && t.assigned_to.is_none())
                .cloned()
                .collect())
        }

        async fn try_claim(
            &self,
            _actor: Uuid,
            id: Uuid,
            claimant: Uuid,
            assign: bool,
        ) -> Result<Option<StaffTask>, AppError> {
            let mut tasks = self.tasks.lock().unwrap();
            let Some(task) = tasks.get_mut(&id) else { return Ok(None) };
            if task.status != TaskStatus::Approved || task.claimed_by.is_some() || task.assigned_to.is_some() {
                return Ok(None);
            }
            task.status = TaskStatus::Claimed;
            task.claimed_by = Some(claimant);
            if assign {
                task.assigned_to = Some(claimant);
            }
            task.claimed_at = Some(Utc::now());
            Ok(Some(task.clone()))
        }

        async fn try_release(&self, actor: Uuid, id: Uuid) -> Result<Option<StaffTask>, AppError> {
            let mut tasks = self.tasks.lock().unwrap();
            let Some(task) = tasks.get_mut(&id) else { return Ok(None) };
            if task.status != TaskStatus::Claimed || task.claimed_by != Some(actor) {
                return Ok(None);
            }
            task.status = TaskStatus::Approved;
            task.claimed_by = None;
            task.assigned_to = None;
            task.claimed_at = None;
            Ok(Some(task.clone()))
        }

        async fn try_transition(
            &self,
            _actor: Uuid,
            id: Uuid,
            from: &[TaskStatus],
            to: TaskStatus,
            worker: Option<Uuid>,
        ) -> Result<Option<StaffTask>, AppError> {
            let mut tasks = self.tasks.lock().unwrap();
            let Some(task) = tasks.get_mut(&id) else { return Ok(None) };
            if !from.contains(&task.status) || worker.is_some_and(|w| !task.is_worked_by(w)) {
                return Ok(None);
            }
            task.status = to;
            match to {
                TaskStatus::InProgress => task.started_at = Some(Utc::now()),
                TaskStatus::Completed => task.completed_at = Some(Utc::now()),
                TaskStatus::Cancelled => task.cancelled_at = Some(Utc::now()),
                _ => {}
            }
            Ok(Some(task.clone()))
        }
    }

    fn admin() -> TaskActor {
        TaskActor { id: Uuid::new_v4(), tasks_admin: true }
    }

    fn staff() -> TaskActor {
        TaskActor { id: Uuid::new_v4(), tasks_admin: false }
    }

    fn new_task() -> NewTask {
        NewTask {
            title: "Trocar lâmpadas do corredor B".into(),
            description: None,
            task_type: TaskType::Maintenance,
            priority: Priority::High,
            room_id: None,
            due_at: None,
        }
    }

    fn service() -> TaskService {
        TaskService::new(Arc::new(InMemoryTaskStore::default()))
    }

    #[tokio::test]
    async fn new_tasks_start_approved_and_available() {
        let svc = service();
        let task = svc.create(admin(), new_task()).await.unwrap();

        assert_eq!(task.status, TaskStatus::Approved);
        let available = svc.available(staff()).await.unwrap();
        assert_eq!(available.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let svc = Arc::new(service());
        let task = svc.create(admin(), new_task()).await.unwrap();
        let (a, b) = (staff(), staff());

        let svc_a = svc.clone();
        let svc_b = svc.clone();
        let first = tokio::spawn(async move { svc_a.claim(a, task.id).await });
        let second = tokio::spawn(async move { svc_b.claim(b, task.id).await });
        let results = [first.await.unwrap(), second.await.unwrap()];

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results.iter().any(|r| matches!(r, Err(AppError::Conflict(_)))));

        let stored = svc.get(a, task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Claimed);
        assert_eq!(stored.claimed_by, winners[0].claimed_by);
        assert!(svc.available(a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_lifecycle_by_claimant() {
        let svc = service();
        let worker = staff();
        let task = svc.create(admin(), new_task()).await.unwrap();

        svc.claim(worker, task.id).await.unwrap();
        let started = svc.start(worker, task.id).await.unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);
        assert!(started.started_at.is_some());

        let done = svc.complete(worker, task.id).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn only_the_claimant_can_start() {
        let svc = service();
        let (worker, intruder) = (staff(), staff());
        let task = svc.create(admin(), new_task()).await.unwrap();
        svc.claim(worker, task.id).await.unwrap();

        let err = svc.start(intruder, task.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn completing_before_starting_is_an_invalid_transition() {
        let svc = service();
        let worker = staff();
        let task = svc.create(admin(), new_task()).await.unwrap();
        svc.claim(worker, task.id).await.unwrap();

        let err = svc.complete(worker, task.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn unclaim_returns_task_to_the_pool() {
        let svc = service();
        let worker = staff();
        let task = svc.create(admin(), new_task()).await.unwrap();
        svc.claim(worker, task.id).await.unwrap();

        let released = svc.unclaim(worker, task.id).await.unwrap();
        assert_eq!(released.status, TaskStatus::Approved);
        assert_eq!(released.claimed_by, None);
        assert_eq!(svc.available(worker).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn assigned_task_can_be_worked_by_assignee() {
        let svc = service();
        let boss = admin();
        let worker = staff();
        let task = svc.create(boss, new_task()).await.unwrap();

        let assigned = svc.assign(boss, task.id, worker.id).await.unwrap();
        assert_eq!(assigned.assigned_to, Some(worker.id));
        assert_eq!(assigned.status, TaskStatus::Claimed);

        // outro funcionário não consegue mais reivindicar
        let err = svc.claim(staff(), task.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        svc.start(worker, task.id).await.unwrap();
    }

    #[tokio::test]
    async fn tasks_admin_grant_lets_a_standard_user_assign() {
        let svc = service();
        let task = svc.create(admin(), new_task()).await.unwrap();
        let worker = staff();

        let mut granted = FeaturePermissions::for_role(Role::Standard);
        granted.set(Feature::Tasks, Some(AccessLevel::Admin));
        let supervisor = TaskActor::new(Uuid::new_v4(), &granted);
        assert!(supervisor.tasks_admin);

        let assigned = svc.assign(supervisor, task.id, worker.id).await.unwrap();
        assert_eq!(assigned.assigned_to, Some(worker.id));
    }

    #[tokio::test]
    async fn admin_role_without_tasks_admin_cannot_assign() {
        let svc = service();
        let task = svc.create(admin(), new_task()).await.unwrap();

        let mut revoked = FeaturePermissions::for_role(Role::Admin);
        revoked.set(Feature::Tasks, Some(AccessLevel::Write));
        let actor = TaskActor::new(Uuid::new_v4(), &revoked);

        let err = svc.assign(actor, task.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn plain_standard_user_cannot_assign() {
        let svc = service();
        let task = svc.create(admin(), new_task()).await.unwrap();
        let actor = TaskActor::new(Uuid::new_v4(), &FeaturePermissions::for_role(Role::Standard));

        let err = svc.assign(actor, task.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn cancel_requires_admin_or_creator() {
        let svc = service();
        let boss = admin();
        let task = svc.create(boss, new_task()).await.unwrap();

        let err = svc.cancel(staff(), task.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let cancelled = svc.cancel(boss, task.id).await.unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);

        // terminal: não dá para cancelar de novo
        let err = svc.cancel(boss, task.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn missing_task_is_not_found() {
        let svc = service();
        let err = svc.claim(staff(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_by_worker() {
        let svc = service();
        let worker = staff();
        let mine = svc.create(admin(), new_task()).await.unwrap();
        svc.create(admin(), new_task()).await.unwrap();
        svc.claim(worker, mine.id).await.unwrap();

        let filter = TaskFilter { status: None, worker_id: Some(worker.id) };
        let listed = svc.list(worker, &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
    }

    #[sqlx::test]
    async fn losing_a_postgres_claim_is_a_conflict(pool: sqlx::PgPool) {
        let svc = TaskService::new(Arc::new(TaskRepository::new(pool.clone())));
        let creator = TaskActor { id: insert_user(&pool).await, tasks_admin: false };
        let first = TaskActor { id: insert_user(&pool).await, tasks_admin: false };
        let second = TaskActor { id: insert_user(&pool).await, tasks_admin: false };
        let task = svc.create(creator, new_task()).await.unwrap();

        svc.claim(first, task.id).await.unwrap();
        let err = svc.claim(second, task.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = svc.unclaim(second, task.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
