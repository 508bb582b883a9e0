//! Calculation report entity - The stored Snowball vs Avalanche comparison.
//!
//! Both schedules and the debt snapshot are kept as JSON so a report stays readable after the
//! underlying debts change. `fingerprint` already includes the user id, so the unique constraint
//! on it gives one report per (user, scenario).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Calculation report database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "calculation_reports")]
pub struct Model {
    /// Unique identifier for the report
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the report
    pub user_id: String,
    /// Scenario cache key
    #[sea_orm(unique)]
    pub fingerprint: String,
    /// Total debt when the report was calculated
    pub beginning_debt: f64,
    /// Extra monthly budget used for both simulations
    pub extra_monthly_payment: f64,
    /// `"Snowball"` or `"Avalanche"`
    pub recommended_strategy: String,
    /// Serialized Snowball `StrategyResult`
    pub snowball: Json,
    /// Serialized Avalanche `StrategyResult`
    pub avalanche: Json,
    /// Serialized debt snapshot the simulations ran against
    pub debts: Json,
    /// Live total debt as of the last reconciliation
    pub current_total_debt: f64,
    /// Serialized per-debt status as of the last reconciliation
    pub debt_statuses: Json,
    /// When the report was calculated
    pub created_at: DateTimeUtc,
    /// When the plan tracker last refreshed the live fields
    pub reconciled_at: Option<DateTimeUtc>,
}

/// Calculation reports are linked to plans and payments by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
