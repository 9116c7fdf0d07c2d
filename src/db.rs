pub mod user_repo;
pub use user_repo::UserRepository;
pub mod access_repo;
pub use access_repo::AccessRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod supply_repo;
pub use supply_repo::SupplyRepository;
pub mod task_repo;
pub use task_repo::{TaskRepository, TaskStore};
pub mod space_repo;
pub use space_repo::SpaceRepository;
pub mod personnel_repo;
pub use personnel_repo::PersonnelRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod preferences_repo;
pub use preferences_repo::PreferencesRepository;

#[cfg(test)]
pub mod test_fixtures;
