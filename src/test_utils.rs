//! Shared test utilities for the payoff planner.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::settings::PlannerSettings,
    core::{
        context::PlannerContext,
        debt,
        events::{ChannelEventSink, ReportCreated},
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// User id most tests act as.
pub const TEST_USER: &str = "test_user";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a planner context over a fresh in-memory database.
///
/// Returns the receiver for "report created" events so tests can assert on notifications.
pub async fn setup_context() -> Result<(PlannerContext, UnboundedReceiver<ReportCreated>)> {
    let db = setup_test_db().await?;
    let (sink, receiver) = ChannelEventSink::new();
    let ctx = PlannerContext::new(db, Arc::new(sink), PlannerSettings::default());
    Ok((ctx, receiver))
}

/// Creates a debt for [`TEST_USER`].
///
/// # Arguments
/// * `db` - Database connection
/// * `name` - Debt name
/// * `balance` - Starting balance
/// * `interest_rate` - Annual rate in percent
/// * `minimum_payment` - Monthly minimum
pub async fn create_test_debt(
    db: &DatabaseConnection,
    name: &str,
    balance: f64,
    interest_rate: f64,
    minimum_payment: f64,
) -> Result<entities::debt::Model> {
    debt::create_debt(
        db,
        TEST_USER.to_string(),
        name.to_string(),
        balance,
        interest_rate,
        minimum_payment,
    )
    .await
}
