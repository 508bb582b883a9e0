//! Splitting one real lump-sum payment across several debts.
//!
//! The split happens in two passes. First every debt's outstanding minimum for the payment's
//! month is covered, in input order. Whatever is left goes to the highest-priority open debt,
//! then the next, re-ranking after each step because balances change. Amounts are handled in
//! whole cents so the allocations always add up to exactly what was spent.

use crate::{
    core::{
        money::{from_cents, to_cents},
        period::same_month,
        strategy::{DebtPosition, PriorityOrder},
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A payment already recorded against a debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPayment {
    /// Debt the payment went to
    pub debt_id: i64,
    /// Amount paid
    pub amount: f64,
    /// Date of the payment
    pub date: NaiveDate,
}

/// How much of the lump sum one debt receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Debt receiving the money
    pub debt_id: i64,
    /// Debt display name
    pub debt_name: String,
    /// Amount allocated
    pub amount: f64,
}

/// Splits `lump_amount`, paid on `date`, across `debts`.
///
/// `recorded` may contain payments from any period; only those in `date`'s month count toward
/// this month's minimums. Returns at most one allocation per debt, in input order. If the lump
/// exceeds every balance combined, the excess is left unallocated.
pub fn distribute(
    debts: &[DebtPosition],
    recorded: &[RecordedPayment],
    lump_amount: f64,
    order: PriorityOrder,
    date: NaiveDate,
) -> Result<Vec<Allocation>> {
    if !lump_amount.is_finite() || lump_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: lump_amount,
        });
    }

    let mut remaining = to_cents(lump_amount);
    let mut working: Vec<DebtPosition> = debts.to_vec();
    let mut balances: Vec<i64> = debts.iter().map(|d| to_cents(d.balance).max(0)).collect();
    let mut allocated = vec![0_i64; debts.len()];

    // Pass 1: this month's outstanding minimums.
    for (i, debt) in debts.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        let paid_this_month: i64 = recorded
            .iter()
            .filter(|p| p.debt_id == debt.id && same_month(p.date, date))
            .map(|p| to_cents(p.amount))
            .sum();
        let obligation = (to_cents(debt.minimum_payment) - paid_this_month).max(0);
        let share = obligation.min(balances[i]).min(remaining);
        balances[i] -= share;
        allocated[i] += share;
        remaining -= share;
    }

    // Pass 2: highest-priority open debt first, re-ranked every step.
    while remaining > 0 {
        for (position, &balance) in working.iter_mut().zip(&balances) {
            position.balance = from_cents(balance);
        }
        let Some(target) = highest_priority(&working, &balances, order) else {
            break;
        };
        let share = remaining.min(balances[target]);
        balances[target] -= share;
        allocated[target] += share;
        remaining -= share;
    }

    if remaining > 0 {
        debug!(
            unallocated = from_cents(remaining),
            "Lump sum exceeds remaining balances"
        );
    }

    Ok(debts
        .iter()
        .zip(allocated)
        .filter(|(_, cents)| *cents > 0)
        .map(|(debt, cents)| Allocation {
            debt_id: debt.id,
            debt_name: debt.name.clone(),
            amount: from_cents(cents),
        })
        .collect())
}

/// Index of the first debt in priority order that still has a balance.
fn highest_priority(debts: &[DebtPosition], balances: &[i64], order: PriorityOrder) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, debt) in debts.iter().enumerate() {
        if balances[i] <= 0 {
            continue;
        }
        best = match best {
            Some(current) if order(debt, &debts[current]).is_lt() => Some(i),
            None => Some(i),
            keep => keep,
        };
    }
    best
}
