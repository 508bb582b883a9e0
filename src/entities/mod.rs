//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod active_plan;
pub mod actual_payment;
pub mod calculation_report;
pub mod debt;

// Re-export specific types to avoid conflicts
pub use active_plan::{Column as ActivePlanColumn, Entity as ActivePlan, Model as ActivePlanModel};
pub use actual_payment::{
    Column as ActualPaymentColumn, Entity as ActualPayment, Model as ActualPaymentModel,
};
pub use calculation_report::{
    Column as CalculationReportColumn, Entity as CalculationReport,
    Model as CalculationReportModel,
};
pub use debt::{Column as DebtColumn, Entity as Debt, Model as DebtModel};
