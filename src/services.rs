pub mod access_service;
pub mod auth;
pub mod navigation;
pub mod notification_service;
pub mod personnel_service;
pub mod preference_service;
pub mod session;
pub mod space_service;
pub mod supply_service;
pub mod task_service;
pub mod tours;
