//! Month-by-month amortization simulator.
//!
//! Each month runs in two passes over the open debts: interest accrues and every minimum is
//! paid first, then the extra pool is spent in priority order. Money freed by a debt that
//! retires during the minimum pass joins the same month's extra pool, and from the following
//! month on the retired debt's whole minimum stays in the pool, so the total monthly budget
//! never shrinks.
//!
//! Everything here is pure: no I/O, no clock. The caller supplies the calendar month that
//! month 1 falls in.

use crate::{
    core::{
        money::{ceil_cents, round2},
        period,
        strategy::{DebtPosition, PriorityOrder, Strategy},
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Hard cap on simulated months (100 years).
pub const MAX_MONTHS: u32 = 1_200;

/// Balances at or below this are treated as paid off.
const PAID_EPSILON: f64 = 1e-9;

/// One month of a payoff schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPaymentDetail {
    /// 1-based month index
    pub month: u32,
    /// First day of the calendar month this entry covers
    pub period_start: NaiveDate,
    /// Short calendar label, e.g. `"Oct 2026"`
    pub label: String,
    /// Interest accrued this month
    pub interest: f64,
    /// Portion of the payment that reduced principal
    pub principal: f64,
    /// Everything paid this month
    pub total_payment: f64,
    /// Total remaining debt after this month's payments
    pub ending_balance: f64,
    /// Debts that reached zero this month
    pub paid_off: Vec<String>,
}

/// Full outcome of simulating one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    /// Strategy that produced this schedule
    pub strategy: Strategy,
    /// Total debt at the start of the schedule
    pub beginning_debt: f64,
    /// Sum of all monthly interest
    pub total_interest_paid: f64,
    /// Sum of all monthly payments
    pub total_paid: f64,
    /// Number of months until every debt is paid
    pub total_months: u32,
    /// Human-readable payoff label, e.g. `"18 months (March 2028)"`
    pub payoff_label: String,
    /// Debt names in the order they were paid off
    pub payoff_order: Vec<String>,
    /// The month-by-month schedule
    pub schedule: Vec<MonthlyPaymentDetail>,
}

/// Working state for one open debt.
struct OpenDebt {
    position: DebtPosition,
    monthly_rate: f64,
}

/// Simulates paying off `debts` with `strategy` and a fixed `extra_monthly` budget.
///
/// Month 1 is the calendar month containing `start`.
pub fn simulate(
    debts: &[DebtPosition],
    extra_monthly: f64,
    strategy: Strategy,
    start: NaiveDate,
) -> Result<StrategyResult> {
    let schedule = run_schedule(debts, extra_monthly, strategy.priority(), start)?;
    let beginning_debt = round2(debts.iter().map(|d| d.balance.max(0.0)).sum());

    let interest: f64 = schedule.months.iter().map(|m| m.raw_interest).sum();
    let paid: f64 = schedule.months.iter().map(|m| m.raw_payment).sum();
    let total_months = schedule.details.len();
    let payoff_label = schedule.details.last().map_or_else(
        || "Already paid off".to_string(),
        |last| {
            format!(
                "{} months ({})",
                last.month,
                last.period_start.format("%B %Y")
            )
        },
    );

    debug!(
        strategy = strategy.label(),
        months = total_months,
        interest = round2(interest),
        "Simulation finished"
    );

    Ok(StrategyResult {
        strategy,
        beginning_debt,
        total_interest_paid: round2(interest),
        total_paid: round2(paid),
        total_months: u32::try_from(total_months).unwrap_or(MAX_MONTHS),
        payoff_label,
        payoff_order: schedule.payoff_order,
        schedule: schedule.details,
    })
}

/// Unrounded totals kept next to each reported month.
struct RawMonth {
    raw_interest: f64,
    raw_payment: f64,
}

/// Output of [`run_schedule`] before report-level totals are derived.
struct Schedule {
    details: Vec<MonthlyPaymentDetail>,
    months: Vec<RawMonth>,
    payoff_order: Vec<String>,
}

/// Fails fast when the first month's payments cannot outpace its interest.
///
/// Such a plan never terminates, so it is rejected analytically instead of being simulated.
pub fn check_funding(debts: &[DebtPosition], extra_monthly: f64) -> Result<()> {
    let open = debts.iter().filter(|d| d.balance > PAID_EPSILON);
    let (interest_due, minimums) = open.fold((0.0, 0.0), |(interest, minimums), d| {
        (
            interest + d.balance * d.monthly_rate(),
            minimums + d.minimum_payment,
        )
    });
    let available = minimums + extra_monthly;

    if available <= interest_due {
        let deficit = ceil_cents(interest_due - available).max(0.01);
        debug!(interest_due, available, deficit, "Plan is under-funded");
        return Err(Error::InsufficientPayment { deficit });
    }
    Ok(())
}

fn validate_inputs(debts: &[DebtPosition], extra_monthly: f64) -> Result<()> {
    if !extra_monthly.is_finite() || extra_monthly < 0.0 {
        return Err(Error::InvalidAmount {
            amount: extra_monthly,
        });
    }
    if debts.is_empty() {
        return Err(Error::Validation {
            message: "At least one debt is required to simulate a payoff".to_string(),
        });
    }
    for debt in debts {
        if !debt.balance.is_finite() || debt.balance < 0.0 {
            return Err(Error::Validation {
                message: format!("Debt '{}' has an invalid balance", debt.name),
            });
        }
        if !(0.0..=100.0).contains(&debt.annual_rate) {
            return Err(Error::Validation {
                message: format!("Debt '{}' has an interest rate outside 0-100%", debt.name),
            });
        }
        if !debt.minimum_payment.is_finite() || debt.minimum_payment <= 0.0 {
            return Err(Error::Validation {
                message: format!("Debt '{}' needs a positive minimum payment", debt.name),
            });
        }
    }
    Ok(())
}

/// Runs the month loop with an arbitrary priority comparator.
fn run_schedule(
    debts: &[DebtPosition],
    extra_monthly: f64,
    order: PriorityOrder,
    start: NaiveDate,
) -> Result<Schedule> {
    validate_inputs(debts, extra_monthly)?;
    check_funding(debts, extra_monthly)?;

    let mut open: Vec<OpenDebt> = debts
        .iter()
        .filter(|d| d.balance > PAID_EPSILON)
        .map(|d| OpenDebt {
            position: d.clone(),
            monthly_rate: d.monthly_rate(),
        })
        .collect();

    let mut schedule = Schedule {
        details: Vec::new(),
        months: Vec::new(),
        payoff_order: Vec::new(),
    };
    // Minimums of debts retired in earlier months.
    let mut rolled_minimums = 0.0;

    for month in 1..=MAX_MONTHS {
        if open.is_empty() {
            break;
        }

        let mut interest = 0.0;
        for debt in &mut open {
            let accrued = debt.position.balance * debt.monthly_rate;
            debt.position.balance += accrued;
            interest += accrued;
        }

        // Pass 1: minimums. Unused minimum from a debt retiring now feeds this month's pool.
        let mut paid = 0.0;
        let mut pool = extra_monthly + rolled_minimums;
        for debt in &mut open {
            let payment = debt.position.minimum_payment.min(debt.position.balance);
            debt.position.balance -= payment;
            paid += payment;
            if debt.position.balance <= PAID_EPSILON {
                debt.position.balance = 0.0;
                pool += debt.position.minimum_payment - payment;
            }
        }

        // Pass 2: extra pool in priority order, carrying the remainder forward.
        let mut targets: Vec<usize> = (0..open.len())
            .filter(|&i| open[i].position.balance > 0.0)
            .collect();
        targets.sort_by(|&a, &b| order(&open[a].position, &open[b].position));
        for i in targets {
            if pool <= PAID_EPSILON {
                break;
            }
            let debt = &mut open[i].position;
            let payment = pool.min(debt.balance);
            debt.balance -= payment;
            pool -= payment;
            paid += payment;
            if debt.balance <= PAID_EPSILON {
                debt.balance = 0.0;
            }
        }

        let mut paid_off = Vec::new();
        open.retain(|debt| {
            if debt.position.balance > 0.0 {
                return true;
            }
            rolled_minimums += debt.position.minimum_payment;
            paid_off.push(debt.position.name.clone());
            false
        });

        let ending_balance: f64 = open.iter().map(|d| d.position.balance).sum();
        let period_start =
            period::month_start(start, month - 1).ok_or_else(|| Error::Validation {
                message: format!("Schedule month {month} is outside the supported calendar"),
            })?;
        trace!(month, interest, paid, ending_balance, "Simulated month");

        schedule.payoff_order.extend(paid_off.iter().cloned());
        schedule.details.push(MonthlyPaymentDetail {
            month,
            period_start,
            label: period_start.format("%b %Y").to_string(),
            interest: round2(interest),
            principal: round2(paid - interest),
            total_payment: round2(paid),
            ending_balance: round2(ending_balance),
            paid_off,
        });
        schedule.months.push(RawMonth {
            raw_interest: interest,
            raw_payment: paid,
        });
    }

    if open.is_empty() {
        Ok(schedule)
    } else {
        Err(Error::RunawaySimulation { months: MAX_MONTHS })
    }
}
