//! Database configuration module for the payoff planner.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema (including the unique constraint on report fingerprints) always matches the
//! Rust structs without hand-written SQL.

use crate::entities::{ActivePlan, ActualPayment, CalculationReport, Debt};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/payoff_planner.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let debt_table = schema
        .create_table_from_entity(Debt)
        .if_not_exists()
        .to_owned();
    let report_table = schema
        .create_table_from_entity(CalculationReport)
        .if_not_exists()
        .to_owned();
    let payment_table = schema
        .create_table_from_entity(ActualPayment)
        .if_not_exists()
        .to_owned();
    let plan_table = schema
        .create_table_from_entity(ActivePlan)
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&debt_table)).await?;
    db.execute(builder.build(&report_table)).await?;
    db.execute(builder.build(&payment_table)).await?;
    db.execute(builder.build(&plan_table)).await?;

    Ok(())
}
