/// Admin user IDs from environment variables
pub mod admins;

/// Database configuration and connection management
pub mod database;

/// Application settings from config.toml
pub mod settings;

pub use settings::{AppConfig, COIN};
