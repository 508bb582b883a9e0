/// Database configuration and connection management
pub mod database;

/// Planner settings loading from config.toml
pub mod settings;
