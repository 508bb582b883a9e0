//! Calculation orchestrator - Turns a user's debts into a stored comparison report.
//!
//! Identical requests (same debts, same amounts, same extra payment) resolve to the report
//! that already exists for them, so a repeat call neither re-simulates nor re-notifies.

use crate::{
    core::{
        context::PlannerContext,
        debt,
        events::ReportCreated,
        fingerprint::scenario_fingerprint,
        money::round2,
        report::{self, CalculationReport, DebtSnapshot, InsertOutcome, NewReport},
        simulation::simulate,
        strategy::{DebtPosition, Strategy},
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

/// Calculates (or reuses) the Snowball vs Avalanche report for a user's current debts.
///
/// The schedule starts in the current calendar month. Returns the report id.
pub async fn calculate(
    ctx: &PlannerContext,
    user_id: &str,
    extra_monthly_payment: f64,
) -> Result<i64> {
    calculate_as_of(ctx, user_id, extra_monthly_payment, Utc::now().date_naive()).await
}

/// Same as [`calculate`] with an explicit calculation date.
///
/// # Errors
/// * `NoDebts` if the user has no open debts
/// * `InsufficientPayment` / `RunawaySimulation` straight from the simulator
/// * `UpstreamUnavailable` if the debt source or report store fails or times out
#[instrument(skip(ctx))]
pub async fn calculate_as_of(
    ctx: &PlannerContext,
    user_id: &str,
    extra_monthly_payment: f64,
    today: NaiveDate,
) -> Result<i64> {
    if !extra_monthly_payment.is_finite() || extra_monthly_payment < 0.0 {
        return Err(Error::InvalidAmount {
            amount: extra_monthly_payment,
        });
    }
    let extra_monthly_payment = round2(extra_monthly_payment);

    let debts = ctx
        .bounded("list active debts", debt::list_active_debts(&ctx.db, user_id))
        .await?;
    if debts.is_empty() {
        return Err(Error::NoDebts {
            user_id: user_id.to_string(),
        });
    }

    let positions: Vec<DebtPosition> = debts.iter().map(DebtPosition::from).collect();
    let fingerprint = scenario_fingerprint(user_id, &positions, extra_monthly_payment);

    let cached = ctx
        .bounded(
            "find report by fingerprint",
            report::get_by_fingerprint(&ctx.db, user_id, &fingerprint),
        )
        .await?;
    if let Some(existing) = cached {
        info!(report_id = existing.id, %fingerprint, "Reusing existing calculation report");
        return Ok(existing.id);
    }

    let snowball = simulate(&positions, extra_monthly_payment, Strategy::Snowball, today)?;
    let avalanche = simulate(&positions, extra_monthly_payment, Strategy::Avalanche, today)?;
    debug!(
        snowball_interest = snowball.total_interest_paid,
        avalanche_interest = avalanche.total_interest_paid,
        "Both strategies simulated"
    );

    let beginning_debt = snowball.beginning_debt;
    let new_report = NewReport {
        user_id: user_id.to_string(),
        fingerprint,
        beginning_debt,
        extra_monthly_payment,
        snowball,
        avalanche,
        debts: debts.iter().map(DebtSnapshot::from).collect(),
    };

    let outcome = ctx
        .bounded("insert report", report::insert(&ctx.db, new_report))
        .await?;
    match outcome {
        InsertOutcome::Created(report_id) => {
            ctx.events.report_created(ReportCreated {
                user_id: user_id.to_string(),
                report_id,
                total_debt: beginning_debt,
            });
            Ok(report_id)
        }
        InsertOutcome::Existing(report_id) => {
            warn!(report_id, "Concurrent calculation stored this scenario first");
            Ok(report_id)
        }
    }
}

/// The user's report history, newest first, capped at `recent_report_limit`.
pub async fn recent_reports(ctx: &PlannerContext, user_id: &str) -> Result<Vec<CalculationReport>> {
    ctx.bounded(
        "list recent reports",
        report::list_recent_by_user(&ctx.db, user_id, ctx.settings.recent_report_limit),
    )
    .await
}
