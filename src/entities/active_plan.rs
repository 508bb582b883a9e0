//! Active plan entity - The report and strategy a user is tracking.
//!
//! Activating a new plan flips `is_active` off on earlier rows instead of deleting them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Active plan database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "active_plans")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the plan
    pub user_id: String,
    /// Report the plan follows
    pub report_id: i64,
    /// Chosen strategy label, `"Snowball"` or `"Avalanche"`
    pub strategy: String,
    /// When the plan was activated or last repointed
    pub activated_at: DateTimeUtc,
    /// Only one row per user has this set
    pub is_active: bool,
}

/// `ActivePlan` references reports by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
