// src/db/task_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_rls, error::AppError},
    models::tasks::{NewTask, StaffTask, TaskFilter, TaskStatus},
};

const TASK_COLUMNS: &str = "id, title, description, task_type, status, priority, room_id, created_by, \
     claimed_by, assigned_to, due_at, claimed_at, started_at, completed_at, cancelled_at, \
     created_at, updated_at";

/// Persistência das tarefas da equipe.
///
/// Todas as mudanças de status são condicionais: a implementação só altera a
/// linha se a pré-condição ainda valer e devolve `None` caso contrário.
/// `actor` é quem faz a chamada (contexto RLS), não necessariamente quem
/// fica com a tarefa.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, actor: Uuid, task: NewTask) -> Result<StaffTask, AppError>;

    async fn get(&self, actor: Uuid, id: Uuid) -> Result<Option<StaffTask>, AppError>;

    async fn list(&self, actor: Uuid, filter: &TaskFilter) -> Result<Vec<StaffTask>, AppError>;

    /// approved, sem ninguém reivindicando e sem atribuição
    async fn list_available(&self, actor: Uuid) -> Result<Vec<StaffTask>, AppError>;

    /// approved + claimed_by NULL + assigned_to NULL -> claimed.
    /// Com `assign`, `assigned_to` também recebe `claimant`.
    async fn try_claim(
        &self,
        actor: Uuid,
        id: Uuid,
        claimant: Uuid,
        assign: bool,
    ) -> Result<Option<StaffTask>, AppError>;

    /// claimed -> approved, somente por quem reivindicou.
    async fn try_release(&self, actor: Uuid, id: Uuid) -> Result<Option<StaffTask>, AppError>;

    /// status ∈ `from` -> `to`. Com `worker`, exige que seja quem reivindicou ou recebeu a tarefa.
    async fn try_transition(
        &self,
        actor: Uuid,
        id: Uuid,
        from: &[TaskStatus],
        to: TaskStatus,
        worker: Option<Uuid>,
    ) -> Result<Option<StaffTask>, AppError>;
}

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for TaskRepository {
    async fn insert(&self, actor: Uuid, task: NewTask) -> Result<StaffTask, AppError> {
        let mut tx = begin_rls(&self.pool, actor).await?;

        let created = sqlx::query_as::<_, StaffTask>(&format!(
            r#"
            INSERT INTO staff_tasks (title, description, task_type, priority, room_id, due_at, created_by, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'approved')
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.task_type)
        .bind(task.priority)
        .bind(task.room_id)
        .bind(task.due_at)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get(&self, actor: Uuid, id: Uuid) -> Result<Option<StaffTask>, AppError> {
        let mut tx = begin_rls(&self.pool, actor).await?;
        let task = sqlx::query_as::<_, StaffTask>(&format!(
            "SELECT {TASK_COLUMNS} FROM staff_tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn list(&self, actor: Uuid, filter: &TaskFilter) -> Result<Vec<StaffTask>, AppError> {
        let mut tx = begin_rls(&self.pool, actor).await?;
        let tasks = sqlx::query_as::<_, StaffTask>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM staff_tasks
            WHERE ($1::task_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR claimed_by = $2 OR assigned_to = $2)
            ORDER BY priority DESC, due_at ASC NULLS LAST, created_at ASC
            "#
        ))
        .bind(filter.status)
        .bind(filter.worker_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(tasks)
    }

    async fn list_available(&self, actor: Uuid) -> Result<Vec<StaffTask>, AppError> {
        let mut tx = begin_rls(&self.pool, actor).await?;
        let tasks = sqlx::query_as::<_, StaffTask>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM staff_tasks
            WHERE status = 'approved' AND claimed_by IS NULL AND assigned_to IS NULL
            ORDER BY priority DESC, due_at ASC NULLS LAST, created_at ASC
            "#
        ))
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(tasks)
    }

    async fn try_claim(
        &self,
        actor: Uuid,
        id: Uuid,
        claimant: Uuid,
        assign: bool,
    ) -> Result<Option<StaffTask>, AppError> {
        let mut tx = begin_rls(&self.pool, actor).await?;

        // Compare-and-swap: o lock de linha do Postgres serializa os concorrentes
        // e só um deles ainda encontra claimed_by NULL.
        let task = sqlx::query_as::<_, StaffTask>(&format!(
            r#"
            UPDATE staff_tasks
            SET status = 'claimed',
                claimed_by = $2,
                assigned_to = CASE WHEN $3 THEN $2 ELSE assigned_to END,
                claimed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
              AND status = 'approved'
              AND claimed_by IS NULL
              AND assigned_to IS NULL
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(claimant)
        .bind(assign)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn try_release(&self, actor: Uuid, id: Uuid) -> Result<Option<StaffTask>, AppError> {
        let mut tx = begin_rls(&self.pool, actor).await?;
        let task = sqlx::query_as::<_, StaffTask>(&format!(
            r#"
            UPDATE staff_tasks
            SET status = 'approved',
                claimed_by = NULL,
                assigned_to = NULL,
                claimed_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = 'claimed' AND claimed_by = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(actor)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn try_transition(
        &self,
        actor: Uuid,
        id: Uuid,
        from: &[TaskStatus],
        to: TaskStatus,
        worker: Option<Uuid>,
    ) -> Result<Option<StaffTask>, AppError> {
        let mut tx = begin_rls(&self.pool, actor).await?;
        let task = sqlx::query_as::<_, StaffTask>(&format!(
            r#"
            UPDATE staff_tasks
            SET status = $3,
                started_at = CASE WHEN $3 = 'in_progress'::task_status THEN NOW() ELSE started_at END,
                completed_at = CASE WHEN $3 = 'completed'::task_status THEN NOW() ELSE completed_at END,
                cancelled_at = CASE WHEN $3 = 'cancelled'::task_status THEN NOW() ELSE cancelled_at END,
                updated_at = NOW()
            WHERE id = $1
              AND status = ANY($2)
              AND ($4::uuid IS NULL OR claimed_by = $4 OR assigned_to = $4)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(worker)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_fixtures::insert_user,
        models::{tasks::TaskType, Priority},
    };

    fn new_task() -> NewTask {
        NewTask {
            title: "Montar plenário para sessão do júri".into(),
            description: None,
            task_type: TaskType::Setup,
            priority: Priority::Urgent,
            room_id: None,
            due_at: None,
        }
    }

    #[sqlx::test]
    async fn concurrent_claims_in_postgres_have_one_winner(pool: PgPool) {
        let repo = TaskRepository::new(pool.clone());
        let creator = insert_user(&pool).await;
        let (a, b) = (insert_user(&pool).await, insert_user(&pool).await);
        let task = repo.insert(creator, new_task()).await.unwrap();

        let (first, second) = tokio::join!(
            repo.try_claim(a, task.id, a, false),
            repo.try_claim(b, task.id, b, false),
        );
        let winners: Vec<_> = [first.unwrap(), second.unwrap()].into_iter().flatten().collect();
        assert_eq!(winners.len(), 1);

        let stored = repo.get(creator, task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Claimed);
        assert_eq!(stored.claimed_by, winners[0].claimed_by);
        assert!(repo.list_available(creator).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn assigned_task_cannot_be_claimed(pool: PgPool) {
        let repo = TaskRepository::new(pool.clone());
        let (boss, worker, other) = (insert_user(&pool).await, insert_user(&pool).await, insert_user(&pool).await);
        let task = repo.insert(boss, new_task()).await.unwrap();

        let assigned = repo.try_claim(boss, task.id, worker, true).await.unwrap().unwrap();
        assert_eq!(assigned.assigned_to, Some(worker));
        assert_eq!(assigned.claimed_by, Some(worker));

        assert!(repo.try_claim(other, task.id, other, false).await.unwrap().is_none());
        // só quem reivindicou devolve
        assert!(repo.try_release(other, task.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn transition_checks_status_and_worker(pool: PgPool) {
        let repo = TaskRepository::new(pool.clone());
        let (creator, worker, intruder) = (insert_user(&pool).await, insert_user(&pool).await, insert_user(&pool).await);
        let task = repo.insert(creator, new_task()).await.unwrap();
        repo.try_claim(worker, task.id, worker, false).await.unwrap().unwrap();

        let blocked = repo
            .try_transition(intruder, task.id, &[TaskStatus::Claimed], TaskStatus::InProgress, Some(intruder))
            .await
            .unwrap();
        assert!(blocked.is_none());

        let started = repo
            .try_transition(worker, task.id, &[TaskStatus::Claimed], TaskStatus::InProgress, Some(worker))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);
        assert!(started.started_at.is_some());

        // já saiu de `claimed`
        let again = repo
            .try_transition(worker, task.id, &[TaskStatus::Claimed], TaskStatus::InProgress, Some(worker))
            .await
            .unwrap();
        assert!(again.is_none());

        let filter = TaskFilter { status: Some(TaskStatus::InProgress), worker_id: Some(worker) };
        assert_eq!(repo.list(worker, &filter).await.unwrap().len(), 1);
    }
}
