//! Debt entity - A single balance the user is paying down.
//!
//! `original_balance` is captured at creation and never changes; `balance` is decremented as
//! real payments are recorded.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Debt database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    /// Unique identifier for the debt
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the debt
    pub user_id: String,
    /// Human-readable name (e.g., "Visa", "Car loan")
    pub name: String,
    /// Current outstanding balance in dollars
    pub balance: f64,
    /// Balance when the debt was first recorded
    pub original_balance: f64,
    /// Annual interest rate as a percentage (0-100)
    pub interest_rate: f64,
    /// Required monthly minimum payment
    pub minimum_payment: f64,
    /// When the debt was recorded
    pub created_at: DateTimeUtc,
    /// Soft delete flag - if true, the debt is hidden but history is preserved
    pub is_deleted: bool,
}

/// Defines relationships between Debt and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One debt has many recorded payments
    #[sea_orm(has_many = "super::actual_payment::Entity")]
    ActualPayments,
}

impl Related<super::actual_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActualPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
