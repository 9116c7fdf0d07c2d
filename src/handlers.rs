// src/handlers.rs

pub mod access;
pub mod auth;
pub mod navigation;
pub mod notifications;
pub mod personnel;
pub mod preferences;
pub mod session;
pub mod spaces;
pub mod supply;
pub mod tasks;
