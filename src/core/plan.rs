//! Plan tracker - Follows a chosen report against the payments actually made.
//!
//! A user has at most one active plan. Reconciling it walks the chosen strategy's schedule
//! month by month, matching recorded payments by calendar month, then compares the live debt
//! total with what the schedule expected at that point.

use crate::{
    core::{
        calculation,
        context::PlannerContext,
        debt,
        distribution::RecordedPayment,
        money::{from_cents, round2, to_cents},
        payment,
        period::{first_of_month, same_month},
        report::{self, CalculationReport, DebtStatus},
        simulation::MonthlyPaymentDetail,
        strategy::Strategy,
    },
    entities::{ActivePlan, active_plan},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Where a tracked plan stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// Payments are keeping up with the schedule
    OnTrack,
    /// Real balances or payment timing have drifted from the schedule
    Outdated,
    /// Every debt is paid off or every scheduled month is covered
    Complete,
}

/// One scheduled month with the real payments that landed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthProgress {
    /// The simulated month
    pub detail: MonthlyPaymentDetail,
    /// Real payments recorded in this calendar month
    pub actual_paid: f64,
    /// Most recent payment date in this month
    pub last_payment_date: Option<NaiveDate>,
    /// Whether the real payments met the paid threshold
    pub is_paid: bool,
}

/// A reconciled view of the user's active plan.
#[derive(Debug, Clone)]
pub struct TrackedPlan {
    /// The active plan row
    pub plan: active_plan::Model,
    /// Strategy the user chose
    pub strategy: Strategy,
    /// The report being followed, with refreshed live fields
    pub report: CalculationReport,
    /// Schedule months with their real payments
    pub months: Vec<MonthProgress>,
    /// First month not yet paid, if any
    pub current_month: Option<u32>,
    /// Live total debt from the debt source
    pub current_total_debt: f64,
    /// Live per-debt balances for the report's debts
    pub debt_statuses: Vec<DebtStatus>,
    /// Overall standing
    pub status: PlanStatus,
}

/// Matches recorded payments to schedule months by calendar month.
///
/// A month counts as paid when its payments reach `paid_threshold_percent` of the planned
/// total (compared in whole cents).
#[must_use]
pub fn reconcile_months(
    schedule: &[MonthlyPaymentDetail],
    payments: &[RecordedPayment],
    paid_threshold_percent: u32,
) -> Vec<MonthProgress> {
    schedule
        .iter()
        .map(|detail| {
            let in_month = payments
                .iter()
                .filter(|p| same_month(p.date, detail.period_start));
            let (paid_cents, last_payment_date) =
                in_month.fold((0_i64, None::<NaiveDate>), |(sum, last), p| {
                    (sum + to_cents(p.amount), last.max(Some(p.date)))
                });
            let planned_cents = to_cents(detail.total_payment);
            MonthProgress {
                detail: detail.clone(),
                actual_paid: from_cents(paid_cents),
                last_payment_date,
                is_paid: paid_cents * 100 >= planned_cents * i64::from(paid_threshold_percent),
            }
        })
        .collect()
}

/// Decides the plan status from the reconciled months and the live debt total.
///
/// The plan is outdated when live debt exceeds the schedule's expected balance at the current
/// position by more than `tolerance_percent` of the beginning debt, or when the first unpaid
/// month is already in the past relative to `today`.
#[must_use]
pub fn assess_status(
    months: &[MonthProgress],
    beginning_debt: f64,
    live_total_debt: f64,
    tolerance_percent: f64,
    today: NaiveDate,
) -> PlanStatus {
    if to_cents(live_total_debt) <= 0 {
        return PlanStatus::Complete;
    }
    let Some(position) = months.iter().position(|m| !m.is_paid) else {
        return PlanStatus::Complete;
    };

    let expected = if position == 0 {
        beginning_debt
    } else {
        months[position - 1].detail.ending_balance
    };
    let tolerance = beginning_debt * tolerance_percent / 100.0;
    let drifted = live_total_debt > expected + tolerance;
    let behind = months[position].detail.period_start < first_of_month(today);

    if drifted || behind {
        PlanStatus::Outdated
    } else {
        PlanStatus::OnTrack
    }
}

/// The user's active plan row, if any.
pub async fn get_active_plan_model<C>(db: &C, user_id: &str) -> Result<Option<active_plan::Model>>
where
    C: ConnectionTrait,
{
    ActivePlan::find()
        .filter(active_plan::Column::UserId.eq(user_id))
        .filter(active_plan::Column::IsActive.eq(true))
        .order_by_desc(active_plan::Column::ActivatedAt)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Report id of the user's active plan, if any.
pub(crate) async fn active_report_id<C>(db: &C, user_id: &str) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    Ok(get_active_plan_model(db, user_id)
        .await?
        .map(|plan| plan.report_id))
}

/// Makes `report_id` with `strategy` the user's only active plan.
///
/// Earlier plans are deactivated, not deleted.
#[instrument(skip(ctx))]
pub async fn activate_plan(
    ctx: &PlannerContext,
    user_id: &str,
    report_id: i64,
    strategy: Strategy,
) -> Result<active_plan::Model> {
    ctx.bounded("activate plan", async {
        let txn = ctx.db.begin().await?;
        report::get_by_id(&txn, user_id, report_id).await?;

        let deactivated = ActivePlan::update_many()
            .col_expr(active_plan::Column::IsActive, Expr::value(false))
            .filter(active_plan::Column::UserId.eq(user_id))
            .filter(active_plan::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let plan = active_plan::ActiveModel {
            user_id: Set(user_id.to_string()),
            report_id: Set(report_id),
            strategy: Set(strategy.label().to_string()),
            activated_at: Set(Utc::now()),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(
            plan_id = plan.id,
            replaced = deactivated.rows_affected,
            "Activated payoff plan"
        );
        Ok::<_, Error>(plan)
    })
    .await
}

/// Reconciles the user's active plan against real payments and live balances.
///
/// Returns `None` when the user has not activated a plan. The report's live total and per-debt
/// status are refreshed as part of the call.
#[instrument(skip(ctx))]
pub async fn get_active_plan(
    ctx: &PlannerContext,
    user_id: &str,
    today: NaiveDate,
) -> Result<Option<TrackedPlan>> {
    let Some(plan) = ctx
        .bounded("load active plan", get_active_plan_model(&ctx.db, user_id))
        .await?
    else {
        return Ok(None);
    };
    let strategy: Strategy = plan.strategy.parse()?;

    let mut report = ctx
        .bounded("load report", report::get_by_id(&ctx.db, user_id, plan.report_id))
        .await?;
    let payments: Vec<RecordedPayment> = ctx
        .bounded(
            "list plan payments",
            payment::list_by_report_id(&ctx.db, report.id),
        )
        .await?
        .iter()
        .map(RecordedPayment::from)
        .collect();

    let months = reconcile_months(
        &report.result_for(strategy).schedule,
        &payments,
        ctx.settings.paid_threshold_percent,
    );
    let current_month = months.iter().find(|m| !m.is_paid).map(|m| m.detail.month);

    let current_total_debt = ctx
        .bounded("current balance", debt::current_balance(&ctx.db, user_id))
        .await?;
    let debt_ids: Vec<i64> = report.debts.iter().map(|d| d.id).collect();
    let live: HashMap<i64, f64> = ctx
        .bounded("load report debts", debt::get_debts_by_ids(&ctx.db, &debt_ids))
        .await?
        .into_iter()
        .map(|d| (d.id, if d.is_deleted { 0.0 } else { d.balance }))
        .collect();
    let debt_statuses: Vec<DebtStatus> = report
        .debts
        .iter()
        .map(|d| DebtStatus {
            debt_id: d.id,
            name: d.name.clone(),
            starting_balance: d.original_balance,
            current_balance: round2(live.get(&d.id).copied().unwrap_or(0.0)),
        })
        .collect();

    let status = assess_status(
        &months,
        report.beginning_debt,
        current_total_debt,
        ctx.settings.outdated_tolerance_percent,
        today,
    );
    debug!(?status, ?current_month, current_total_debt, "Plan reconciled");

    let reconciled_at = ctx
        .bounded(
            "update report status",
            report::update_live_status(&ctx.db, report.id, current_total_debt, &debt_statuses),
        )
        .await?;
    report.current_total_debt = current_total_debt;
    report.debt_statuses.clone_from(&debt_statuses);
    report.reconciled_at = Some(reconciled_at);

    Ok(Some(TrackedPlan {
        plan,
        strategy,
        report,
        months,
        current_month,
        current_total_debt,
        debt_statuses,
        status,
    }))
}

/// Re-runs the active plan's calculation against today's debts and repoints the plan.
///
/// The extra payment is taken from the current report. If nothing changed, the fingerprint
/// cache hands back the same report. Returns the report id the plan now follows.
pub async fn recalculate(ctx: &PlannerContext, user_id: &str) -> Result<i64> {
    recalculate_as_of(ctx, user_id, Utc::now().date_naive()).await
}

/// Same as [`recalculate`] with an explicit calculation date.
#[instrument(skip(ctx))]
pub async fn recalculate_as_of(
    ctx: &PlannerContext,
    user_id: &str,
    today: NaiveDate,
) -> Result<i64> {
    let plan = ctx
        .bounded("load active plan", get_active_plan_model(&ctx.db, user_id))
        .await?
        .ok_or_else(|| Error::NoActivePlan {
            user_id: user_id.to_string(),
        })?;
    let current = ctx
        .bounded("load report", report::get_by_id(&ctx.db, user_id, plan.report_id))
        .await?;

    let report_id =
        calculation::calculate_as_of(ctx, user_id, current.extra_monthly_payment, today).await?;

    let previous_report = plan.report_id;
    let mut active: active_plan::ActiveModel = plan.into();
    active.report_id = Set(report_id);
    active.activated_at = Set(Utc::now());
    ctx.bounded("repoint plan", async move {
        active.update(&ctx.db).await.map_err(Error::from)
    })
    .await?;

    info!(previous_report, report_id, "Plan recalculated");
    Ok(report_id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(index: u32, period_start: NaiveDate, total: f64, ending: f64) -> MonthlyPaymentDetail {
        MonthlyPaymentDetail {
            month: index,
            period_start,
            label: period_start.format("%b %Y").to_string(),
            interest: 0.0,
            principal: total,
            total_payment: total,
            ending_balance: ending,
            paid_off: Vec::new(),
        }
    }

    fn paid(amount: f64, on: NaiveDate) -> RecordedPayment {
        RecordedPayment {
            debt_id: 1,
            amount,
            date: on,
        }
    }

    #[test]
    fn test_paid_threshold_boundary() {
        let schedule = vec![
            month(1, date(2026, 10, 1), 100.0, 900.0),
            month(2, date(2026, 11, 1), 100.0, 800.0),
        ];
        let payments = vec![
            paid(60.0, date(2026, 10, 3)),
            paid(39.0, date(2026, 10, 17)),
            paid(98.9, date(2026, 11, 2)),
        ];

        let months = reconcile_months(&schedule, &payments, 99);
        assert!(months[0].is_paid);
        assert_eq!(months[0].actual_paid, 99.0);
        assert_eq!(months[0].last_payment_date, Some(date(2026, 10, 17)));
        assert!(!months[1].is_paid);
        assert_eq!(months[1].actual_paid, 98.9);
    }

    #[test]
    fn test_unmatched_month_has_no_payment_date() {
        let schedule = vec![month(1, date(2026, 10, 1), 100.0, 900.0)];
        let months = reconcile_months(&schedule, &[paid(100.0, date(2027, 10, 1))], 99);
        assert!(!months[0].is_paid);
        assert_eq!(months[0].actual_paid, 0.0);
        assert!(months[0].last_payment_date.is_none());
    }

    #[test]
    fn test_assess_status() {
        let schedule = vec![
            month(1, date(2026, 10, 1), 100.0, 900.0),
            month(2, date(2026, 11, 1), 100.0, 800.0),
        ];
        let first_paid = reconcile_months(&schedule, &[paid(100.0, date(2026, 10, 5))], 99);
        let none_paid = reconcile_months(&schedule, &[], 99);

        // Month 2 is current, live balance matches month 1's ending balance.
        assert_eq!(
            assess_status(&first_paid, 1000.0, 900.0, 1.0, date(2026, 11, 3)),
            PlanStatus::OnTrack
        );
        // Live debt grew past expected plus 1% of 1000.
        assert_eq!(
            assess_status(&first_paid, 1000.0, 911.0, 1.0, date(2026, 11, 3)),
            PlanStatus::Outdated
        );
        // October is over and still unpaid.
        assert_eq!(
            assess_status(&none_paid, 1000.0, 1000.0, 1.0, date(2026, 11, 3)),
            PlanStatus::Outdated
        );
        assert_eq!(
            assess_status(&none_paid, 1000.0, 1000.0, 1.0, date(2026, 10, 20)),
            PlanStatus::OnTrack
        );
        assert_eq!(
            assess_status(&none_paid, 1000.0, 0.0, 1.0, date(2027, 3, 1)),
            PlanStatus::Complete
        );
    }

    #[tokio::test]
    async fn test_no_active_plan_is_empty_state() -> Result<()> {
        let (ctx, _events) = setup_context().await?;
        assert!(get_active_plan(&ctx, TEST_USER, date(2026, 10, 19)).await?.is_none());
        assert!(matches!(
            recalculate(&ctx, TEST_USER).await,
            Err(Error::NoActivePlan { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_activate_plan_keeps_single_active_row() -> Result<()> {
        let (ctx, _events) = setup_context().await?;
        create_test_debt(&ctx.db, "Card", 1000.0, 24.0, 50.0).await?;
        let first = calculation::calculate_as_of(&ctx, TEST_USER, 50.0, date(2026, 10, 1)).await?;
        let second =
            calculation::calculate_as_of(&ctx, TEST_USER, 75.0, date(2026, 10, 1)).await?;

        activate_plan(&ctx, TEST_USER, first, Strategy::Snowball).await?;
        let plan = activate_plan(&ctx, TEST_USER, second, Strategy::Avalanche).await?;

        let rows = ActivePlan::find().all(&ctx.db).await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().filter(|p| p.is_active).count(), 1);
        let active = get_active_plan_model(&ctx.db, TEST_USER).await?.unwrap();
        assert_eq!(active.id, plan.id);
        assert_eq!(active.report_id, second);
        assert_eq!(active.strategy, "Avalanche");
        Ok(())
    }

    #[tokio::test]
    async fn test_activate_plan_rejects_foreign_report() -> Result<()> {
        let (ctx, _events) = setup_context().await?;
        create_test_debt(&ctx.db, "Card", 1000.0, 24.0, 50.0).await?;
        let report_id = calculation::calculate_as_of(&ctx, TEST_USER, 50.0, date(2026, 10, 1)).await?;

        let result = activate_plan(&ctx, "someone-else", report_id, Strategy::Snowball).await;
        assert!(matches!(result, Err(Error::ReportNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_tracked_plan_follows_real_payments() -> Result<()> {
        let (ctx, _events) = setup_context().await?;
        let card = create_test_debt(&ctx.db, "Card", 1000.0, 24.0, 50.0).await?;
        let report_id =
            calculation::calculate_as_of(&ctx, TEST_USER, 0.0, date(2026, 10, 1)).await?;
        activate_plan(&ctx, TEST_USER, report_id, Strategy::Snowball).await?;

        // Month 1 plans a 50.00 payment; pay it in October.
        payment::record_payment(&ctx, TEST_USER, card.id, 50.0, date(2026, 10, 12)).await?;

        let tracked = get_active_plan(&ctx, TEST_USER, date(2026, 10, 20))
            .await?
            .unwrap();
        assert_eq!(tracked.strategy, Strategy::Snowball);
        assert!(tracked.months[0].is_paid);
        assert_eq!(tracked.months[0].last_payment_date, Some(date(2026, 10, 12)));
        assert_eq!(tracked.current_month, Some(2));
        assert_eq!(tracked.current_total_debt, 950.0);
        assert_eq!(tracked.debt_statuses[0].starting_balance, 1000.0);
        assert_eq!(tracked.debt_statuses[0].current_balance, 950.0);
        // Live 950 is below the schedule's expected 970 after month 1.
        assert_eq!(tracked.status, PlanStatus::OnTrack);

        let stored = report::get_by_id(&ctx.db, TEST_USER, report_id).await?;
        assert_eq!(stored.current_total_debt, 950.0);
        assert!(stored.reconciled_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_missed_month_marks_plan_outdated() -> Result<()> {
        let (ctx, _events) = setup_context().await?;
        create_test_debt(&ctx.db, "Card", 1000.0, 24.0, 50.0).await?;
        let report_id =
            calculation::calculate_as_of(&ctx, TEST_USER, 0.0, date(2026, 10, 1)).await?;
        activate_plan(&ctx, TEST_USER, report_id, Strategy::Avalanche).await?;

        let tracked = get_active_plan(&ctx, TEST_USER, date(2026, 12, 2))
            .await?
            .unwrap();
        assert_eq!(tracked.current_month, Some(1));
        assert_eq!(tracked.status, PlanStatus::Outdated);
        Ok(())
    }

    #[tokio::test]
    async fn test_recalculate_repoints_plan() -> Result<()> {
        let (ctx, _events) = setup_context().await?;
        let card = create_test_debt(&ctx.db, "Card", 1000.0, 24.0, 50.0).await?;
        let original =
            calculation::calculate_as_of(&ctx, TEST_USER, 25.0, date(2026, 10, 1)).await?;
        activate_plan(&ctx, TEST_USER, original, Strategy::Snowball).await?;

        // Nothing changed: the fingerprint cache hands back the same report.
        let same = recalculate_as_of(&ctx, TEST_USER, date(2026, 10, 2)).await?;
        assert_eq!(same, original);

        payment::record_payment(&ctx, TEST_USER, card.id, 300.0, date(2026, 10, 5)).await?;
        let refreshed = recalculate_as_of(&ctx, TEST_USER, date(2026, 10, 6)).await?;
        assert_ne!(refreshed, original);

        let plan = get_active_plan_model(&ctx.db, TEST_USER).await?.unwrap();
        assert_eq!(plan.report_id, refreshed);
        let report = report::get_by_id(&ctx.db, TEST_USER, refreshed).await?;
        assert_eq!(report.beginning_debt, 700.0);
        assert_eq!(report.extra_monthly_payment, 25.0);
        Ok(())
    }
}
