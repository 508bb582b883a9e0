//! Actual payment entity - A real payment made against one debt.
//!
//! Rows are append-only. `report_id` links the payment to the plan that was active when it was
//! recorded so the plan tracker can reconcile it against the simulated schedule.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Actual payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actual_payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who made the payment
    pub user_id: String,
    /// Debt the payment was applied to
    pub debt_id: i64,
    /// Report the payment counts against, if a plan was active
    pub report_id: Option<i64>,
    /// Amount paid in dollars
    pub amount: f64,
    /// Calendar date of the payment
    pub payment_date: Date,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `ActualPayment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one debt
    #[sea_orm(
        belongs_to = "super::debt::Entity",
        from = "Column::DebtId",
        to = "super::debt::Column::Id"
    )]
    Debt,
}

impl Related<super::debt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Debt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
