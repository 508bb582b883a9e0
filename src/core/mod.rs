//! Core business logic - framework-agnostic simulation, distribution, and plan tracking.
//!
//! The pure algorithms (`simulation`, `distribution`, `fingerprint`, `strategy`) never touch
//! storage. The store modules (`debt`, `payment`, `report`) are thin `SeaORM` wrappers, and the
//! orchestration modules (`calculation`, `plan`) tie the two together.

/// Snowball vs Avalanche report orchestration
pub mod calculation;
/// Shared collaborator handles and bounded store calls
pub mod context;
/// Debt source
pub mod debt;
/// Lump-sum payment splitting
pub mod distribution;
/// "Report created" notifications
pub mod events;
/// Scenario cache keys
pub mod fingerprint;
/// Currency rounding helpers
pub mod money;
/// Payment store and atomic payment application
pub mod payment;
/// Calendar-month helpers
pub mod period;
/// Active plan tracking and reconciliation
pub mod plan;
/// Report store
pub mod report;
/// Amortization simulator
pub mod simulation;
/// Payoff ordering strategies
pub mod strategy;
