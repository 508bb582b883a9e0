//! Payment store - Records real payments and applies lump sums across debts.
//!
//! Every write path runs inside one database transaction: the balance decrements and the
//! payment rows are committed together or not at all.

use crate::{
    core::{
        context::PlannerContext,
        debt,
        distribution::{self, Allocation, RecordedPayment},
        money::round2,
        period::month_bounds,
        plan,
        strategy::{DebtPosition, Strategy},
    },
    entities::{ActualPayment, actual_payment, debt as debt_entity},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// A payment about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    /// Debt the payment goes to
    pub debt_id: i64,
    /// Amount paid
    pub amount: f64,
    /// Date of the payment
    pub date: NaiveDate,
    /// Report the payment counts against
    pub report_id: Option<i64>,
}

impl From<&actual_payment::Model> for RecordedPayment {
    fn from(model: &actual_payment::Model) -> Self {
        Self {
            debt_id: model.debt_id,
            amount: model.amount,
            date: model.payment_date,
        }
    }
}

/// Inserts a batch of payments for one user.
///
/// Callers that need all-or-nothing semantics pass a transaction as `db`.
pub async fn insert_batch<C>(
    db: &C,
    user_id: &str,
    payments: &[NewPayment],
) -> Result<Vec<actual_payment::Model>>
where
    C: ConnectionTrait,
{
    let created_at = Utc::now();
    let mut saved = Vec::with_capacity(payments.len());
    for payment in payments {
        let model = actual_payment::ActiveModel {
            user_id: Set(user_id.to_string()),
            debt_id: Set(payment.debt_id),
            report_id: Set(payment.report_id),
            amount: Set(payment.amount),
            payment_date: Set(payment.date),
            created_at: Set(created_at),
            ..Default::default()
        };
        saved.push(model.insert(db).await?);
    }
    Ok(saved)
}

/// Total paid toward one debt during the calendar month containing `period`.
pub async fn sum_by_debt_and_period<C>(db: &C, debt_id: i64, period: NaiveDate) -> Result<f64>
where
    C: ConnectionTrait,
{
    let (first, last) = month_bounds(period);
    let payments = ActualPayment::find()
        .filter(actual_payment::Column::DebtId.eq(debt_id))
        .filter(actual_payment::Column::PaymentDate.between(first, last))
        .all(db)
        .await?;
    Ok(round2(payments.iter().map(|p| p.amount).sum()))
}

/// Every payment counted against a report, oldest first.
pub async fn list_by_report_id<C>(db: &C, report_id: i64) -> Result<Vec<actual_payment::Model>>
where
    C: ConnectionTrait,
{
    ActualPayment::find()
        .filter(actual_payment::Column::ReportId.eq(report_id))
        .order_by_asc(actual_payment::Column::PaymentDate)
        .order_by_asc(actual_payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A user's payments during the calendar month containing `period`.
pub async fn list_for_user_in_period<C>(
    db: &C,
    user_id: &str,
    period: NaiveDate,
) -> Result<Vec<actual_payment::Model>>
where
    C: ConnectionTrait,
{
    let (first, last) = month_bounds(period);
    ActualPayment::find()
        .filter(actual_payment::Column::UserId.eq(user_id))
        .filter(actual_payment::Column::PaymentDate.between(first, last))
        .order_by_asc(actual_payment::Column::PaymentDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Splits one lump-sum payment across the user's open debts and records the result.
///
/// This month's outstanding minimums are covered first, then the rest follows `strategy`.
/// Payments are tagged with the active plan's report, if there is one. Nothing is written
/// unless every payment row and balance update succeeds.
///
/// # Arguments
/// * `ctx` - Planner context holding the database and timeout settings
/// * `user_id` - Owner of the debts being paid
/// * `lump_amount` - Total amount paid, above zero
/// * `strategy` - Ordering for whatever remains after this month's minimums
/// * `date` - Payment date; its calendar month decides which minimums are still owed
#[instrument(skip(ctx))]
pub async fn distribute_and_pay(
    ctx: &PlannerContext,
    user_id: &str,
    lump_amount: f64,
    strategy: Strategy,
    date: NaiveDate,
) -> Result<Vec<actual_payment::Model>> {
    if !lump_amount.is_finite() || lump_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: lump_amount,
        });
    }

    ctx.bounded("distribute payment", async {
        let txn = ctx.db.begin().await?;

        let debts = debt::list_active_debts(&txn, user_id).await?;
        if debts.is_empty() {
            return Err(Error::NoDebts {
                user_id: user_id.to_string(),
            });
        }
        let positions: Vec<DebtPosition> = debts.iter().map(DebtPosition::from).collect();
        let recorded: Vec<RecordedPayment> = list_for_user_in_period(&txn, user_id, date)
            .await?
            .iter()
            .map(RecordedPayment::from)
            .collect();
        let report_id = plan::active_report_id(&txn, user_id).await?;

        let allocations =
            distribution::distribute(&positions, &recorded, lump_amount, strategy.priority(), date)?;

        let saved = apply_allocations(txn, user_id, &debts, &allocations, report_id, date).await?;
        info!(
            payments = saved.len(),
            amount = lump_amount,
            "Distributed lump-sum payment"
        );
        Ok(saved)
    })
    .await
}

/// Records a single payment against one of the user's debts.
///
/// The debt balance is lowered by the same amount (never below zero) in the same transaction.
///
/// # Arguments
/// * `ctx` - Planner context holding the database and timeout settings
/// * `user_id` - Owner of the debt
/// * `debt_id` - Debt receiving the payment; must belong to `user_id` and not be deleted
/// * `amount` - Amount paid, above zero
/// * `date` - Payment date
#[instrument(skip(ctx))]
pub async fn record_payment(
    ctx: &PlannerContext,
    user_id: &str,
    debt_id: i64,
    amount: f64,
    date: NaiveDate,
) -> Result<actual_payment::Model> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    ctx.bounded("record payment", async {
        let txn = ctx.db.begin().await?;

        let debt = debt::get_debt_for_user(&txn, user_id, debt_id)
            .await?
            .ok_or(Error::DebtNotFound { debt_id })?;
        let report_id = plan::active_report_id(&txn, user_id).await?;
        let allocation = Allocation {
            debt_id,
            debt_name: debt.name.clone(),
            amount: round2(amount),
        };

        let mut saved = apply_allocations(
            txn,
            user_id,
            std::slice::from_ref(&debt),
            std::slice::from_ref(&allocation),
            report_id,
            date,
        )
        .await?;
        saved.pop().ok_or_else(|| Error::DistributionFailed {
            message: "payment row missing after commit".to_string(),
        })
    })
    .await
}

/// Writes allocations as balance decrements plus payment rows, then commits.
///
/// Any failure rolls back everything written so far and surfaces as `DistributionFailed`.
async fn apply_allocations(
    txn: DatabaseTransaction,
    user_id: &str,
    debts: &[debt_entity::Model],
    allocations: &[Allocation],
    report_id: Option<i64>,
    date: NaiveDate,
) -> Result<Vec<actual_payment::Model>> {
    let by_id: HashMap<i64, &debt_entity::Model> = debts.iter().map(|d| (d.id, d)).collect();

    let write = async {
        for allocation in allocations {
            let debt = by_id
                .get(&allocation.debt_id)
                .ok_or(Error::DebtNotFound {
                    debt_id: allocation.debt_id,
                })?;
            debt::decrement_balance(&txn, debt, allocation.amount).await?;
        }

        let batch: Vec<NewPayment> = allocations
            .iter()
            .map(|a| NewPayment {
                debt_id: a.debt_id,
                amount: a.amount,
                date,
                report_id,
            })
            .collect();
        insert_batch(&txn, user_id, &batch).await
    };

    let outcome = write.await;
    let saved = match outcome {
        Ok(saved) => saved,
        Err(e) => {
            warn!(error = %e, "Payment batch failed, rolling back");
            if let Err(rollback) = txn.rollback().await {
                warn!(error = %rollback, "Rollback failed");
                return Err(Error::DistributionFailed {
                    message: format!("{e}; rollback failed: {rollback}"),
                });
            }
            return Err(Error::DistributionFailed {
                message: e.to_string(),
            });
        }
    };

    txn.commit().await.map_err(|e| Error::DistributionFailed {
        message: e.to_string(),
    })?;
    Ok(saved)
}
