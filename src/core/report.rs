//! Report store - Persists and decodes Snowball vs Avalanche comparison reports.
//!
//! A report is written once per unique scenario fingerprint. After that only the plan
//! tracker touches it, to refresh the live total and per-debt status.

use crate::{
    core::{
        money::to_cents,
        simulation::StrategyResult,
        strategy::{DebtPosition, Strategy},
    },
    entities::{CalculationReport as ReportEntity, calculation_report, debt},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, SqlErr, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A debt as it was when the report was calculated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSnapshot {
    /// Debt id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Balance the simulations started from
    pub balance: f64,
    /// Balance when the debt was first recorded
    pub original_balance: f64,
    /// Annual interest rate as a percentage
    pub annual_rate: f64,
    /// Monthly minimum payment
    pub minimum_payment: f64,
}

impl From<&debt::Model> for DebtSnapshot {
    fn from(model: &debt::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            balance: model.balance,
            original_balance: model.original_balance,
            annual_rate: model.interest_rate,
            minimum_payment: model.minimum_payment,
        }
    }
}

impl From<&DebtSnapshot> for DebtPosition {
    fn from(snapshot: &DebtSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name.clone(),
            balance: snapshot.balance,
            annual_rate: snapshot.annual_rate,
            minimum_payment: snapshot.minimum_payment,
        }
    }
}

/// Live progress of one debt in a tracked plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtStatus {
    /// Debt id
    pub debt_id: i64,
    /// Display name
    pub name: String,
    /// Balance when the debt was first recorded
    pub starting_balance: f64,
    /// Balance right now
    pub current_balance: f64,
}

/// A decoded calculation report.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationReport {
    /// Report id
    pub id: i64,
    /// Owner
    pub user_id: String,
    /// Scenario cache key
    pub fingerprint: String,
    /// Total debt at calculation time
    pub beginning_debt: f64,
    /// Extra monthly budget both simulations used
    pub extra_monthly_payment: f64,
    /// Strategy with the lower total interest (Snowball on a tie)
    pub recommended: Strategy,
    /// Snowball outcome
    pub snowball: StrategyResult,
    /// Avalanche outcome
    pub avalanche: StrategyResult,
    /// Debts the simulations ran against
    pub debts: Vec<DebtSnapshot>,
    /// Live total debt as of the last reconciliation
    pub current_total_debt: f64,
    /// Per-debt status as of the last reconciliation
    pub debt_statuses: Vec<DebtStatus>,
    /// When the report was calculated
    pub created_at: DateTime<Utc>,
    /// When the live fields were last refreshed
    pub reconciled_at: Option<DateTime<Utc>>,
}

impl CalculationReport {
    /// The schedule for one strategy.
    #[must_use]
    pub const fn result_for(&self, strategy: Strategy) -> &StrategyResult {
        match strategy {
            Strategy::Snowball => &self.snowball,
            Strategy::Avalanche => &self.avalanche,
        }
    }

    /// Interest the recommended strategy saves over the other one.
    #[must_use]
    pub fn interest_saved(&self) -> f64 {
        (self.snowball.total_interest_paid - self.avalanche.total_interest_paid).abs()
    }

    /// Months the recommended strategy saves over the other one (zero if it is not faster).
    #[must_use]
    pub fn months_saved(&self) -> u32 {
        let other = match self.recommended {
            Strategy::Snowball => &self.avalanche,
            Strategy::Avalanche => &self.snowball,
        };
        other
            .total_months
            .saturating_sub(self.result_for(self.recommended).total_months)
    }

    fn from_model(model: calculation_report::Model) -> Result<Self> {
        Ok(Self {
            id: model.id,
            recommended: model.recommended_strategy.parse()?,
            snowball: serde_json::from_value(model.snowball)?,
            avalanche: serde_json::from_value(model.avalanche)?,
            debts: serde_json::from_value(model.debts)?,
            debt_statuses: serde_json::from_value(model.debt_statuses)?,
            user_id: model.user_id,
            fingerprint: model.fingerprint,
            beginning_debt: model.beginning_debt,
            extra_monthly_payment: model.extra_monthly_payment,
            current_total_debt: model.current_total_debt,
            created_at: model.created_at,
            reconciled_at: model.reconciled_at,
        })
    }
}

/// Picks the strategy with less total interest; a tie (to the cent) goes to Snowball.
#[must_use]
pub fn recommend(snowball: &StrategyResult, avalanche: &StrategyResult) -> Strategy {
    if to_cents(avalanche.total_interest_paid) < to_cents(snowball.total_interest_paid) {
        Strategy::Avalanche
    } else {
        Strategy::Snowball
    }
}

/// Everything needed to store a freshly calculated report.
#[derive(Debug, Clone)]
pub struct NewReport {
    /// Owner
    pub user_id: String,
    /// Scenario cache key
    pub fingerprint: String,
    /// Total debt at calculation time
    pub beginning_debt: f64,
    /// Extra monthly budget
    pub extra_monthly_payment: f64,
    /// Snowball outcome
    pub snowball: StrategyResult,
    /// Avalanche outcome
    pub avalanche: StrategyResult,
    /// Debts the simulations ran against
    pub debts: Vec<DebtSnapshot>,
}

/// Result of [`insert`]: whether this call created the row or another writer got there first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This call stored the report
    Created(i64),
    /// A report with the same fingerprint already existed
    Existing(i64),
}

impl InsertOutcome {
    /// The report id either way.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Created(id) | Self::Existing(id) => id,
        }
    }
}

/// Finds the user's report for a fingerprint, if one was stored.
pub async fn get_by_fingerprint<C>(
    db: &C,
    user_id: &str,
    fingerprint: &str,
) -> Result<Option<calculation_report::Model>>
where
    C: ConnectionTrait,
{
    ReportEntity::find()
        .filter(calculation_report::Column::UserId.eq(user_id))
        .filter(calculation_report::Column::Fingerprint.eq(fingerprint))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Stores a report. If a concurrent writer already stored the same fingerprint, returns that
/// report's id instead of failing.
pub async fn insert<C>(db: &C, report: NewReport) -> Result<InsertOutcome>
where
    C: ConnectionTrait,
{
    let recommended = recommend(&report.snowball, &report.avalanche);
    let model = calculation_report::ActiveModel {
        user_id: Set(report.user_id.clone()),
        fingerprint: Set(report.fingerprint.clone()),
        beginning_debt: Set(report.beginning_debt),
        extra_monthly_payment: Set(report.extra_monthly_payment),
        recommended_strategy: Set(recommended.label().to_string()),
        snowball: Set(serde_json::to_value(&report.snowball)?),
        avalanche: Set(serde_json::to_value(&report.avalanche)?),
        debts: Set(serde_json::to_value(&report.debts)?),
        current_total_debt: Set(report.beginning_debt),
        debt_statuses: Set(serde_json::to_value(initial_statuses(&report.debts))?),
        created_at: Set(Utc::now()),
        reconciled_at: Set(None),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(saved) => {
            info!(report_id = saved.id, recommended = %recommended, "Stored calculation report");
            Ok(InsertOutcome::Created(saved.id))
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!(fingerprint = %report.fingerprint, "Report already stored by another request");
            get_by_fingerprint(db, &report.user_id, &report.fingerprint)
                .await?
                .map(|existing| InsertOutcome::Existing(existing.id))
                .ok_or_else(|| err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn initial_statuses(debts: &[DebtSnapshot]) -> Vec<DebtStatus> {
    debts
        .iter()
        .map(|d| DebtStatus {
            debt_id: d.id,
            name: d.name.clone(),
            starting_balance: d.original_balance,
            current_balance: d.balance,
        })
        .collect()
}

/// Loads and decodes one of the user's reports.
pub async fn get_by_id<C>(db: &C, user_id: &str, report_id: i64) -> Result<CalculationReport>
where
    C: ConnectionTrait,
{
    let model = ReportEntity::find_by_id(report_id)
        .filter(calculation_report::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(Error::ReportNotFound { report_id })?;
    CalculationReport::from_model(model)
}

/// The user's most recent reports, newest first, at most `limit` of them.
pub async fn list_recent_by_user<C>(
    db: &C,
    user_id: &str,
    limit: u64,
) -> Result<Vec<CalculationReport>>
where
    C: ConnectionTrait,
{
    ReportEntity::find()
        .filter(calculation_report::Column::UserId.eq(user_id))
        .order_by_desc(calculation_report::Column::CreatedAt)
        .order_by_desc(calculation_report::Column::Id)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(CalculationReport::from_model)
        .collect()
}

/// Refreshes the live fields the plan tracker maintains.
pub(crate) async fn update_live_status<C>(
    db: &C,
    report_id: i64,
    current_total_debt: f64,
    statuses: &[DebtStatus],
) -> Result<DateTime<Utc>>
where
    C: ConnectionTrait,
{
    let reconciled_at = Utc::now();
    let report = calculation_report::ActiveModel {
        id: Set(report_id),
        current_total_debt: Set(current_total_debt),
        debt_statuses: Set(serde_json::to_value(statuses)?),
        reconciled_at: Set(Some(reconciled_at)),
        ..Default::default()
    };
    report.update(db).await?;
    Ok(reconciled_at)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::simulation::simulate;
    use crate::test_utils::*;
    use chrono::NaiveDate;

    fn sample_report(user_id: &str, fingerprint: &str) -> NewReport {
        let debts = vec![
            DebtSnapshot {
                id: 1,
                name: "Store card".to_string(),
                balance: 500.0,
                original_balance: 650.0,
                annual_rate: 10.0,
                minimum_payment: 25.0,
            },
            DebtSnapshot {
                id: 2,
                name: "Credit card".to_string(),
                balance: 3000.0,
                original_balance: 3000.0,
                annual_rate: 25.0,
                minimum_payment: 75.0,
            },
        ];
        let positions: Vec<DebtPosition> = debts.iter().map(DebtPosition::from).collect();
        let start = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        NewReport {
            user_id: user_id.to_string(),
            fingerprint: fingerprint.to_string(),
            beginning_debt: 3500.0,
            extra_monthly_payment: 200.0,
            snowball: simulate(&positions, 200.0, Strategy::Snowball, start).unwrap(),
            avalanche: simulate(&positions, 200.0, Strategy::Avalanche, start).unwrap(),
            debts,
        }
    }

    #[tokio::test]
    async fn test_insert_and_decode_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let new_report = sample_report(TEST_USER, "abc");
        let outcome = insert(&db, new_report.clone()).await?;
        assert!(matches!(outcome, InsertOutcome::Created(_)));

        let report = get_by_id(&db, TEST_USER, outcome.id()).await?;
        assert_eq!(report.snowball, new_report.snowball);
        assert_eq!(report.avalanche, new_report.avalanche);
        assert_eq!(report.recommended, Strategy::Avalanche);
        assert_eq!(report.current_total_debt, 3500.0);
        assert_eq!(report.debt_statuses[0].starting_balance, 650.0);
        assert_eq!(report.debt_statuses[0].current_balance, 500.0);
        assert!(report.interest_saved() > 0.0);
        assert!(report.reconciled_at.is_none());
        assert_eq!(
            report.months_saved(),
            new_report
                .snowball
                .total_months
                .saturating_sub(new_report.avalanche.total_months)
        );

        let mut faster_avalanche = report.clone();
        faster_avalanche.snowball.total_months = 20;
        faster_avalanche.avalanche.total_months = 18;
        assert_eq!(faster_avalanche.months_saved(), 2);

        // A recommended strategy that is slower saves no months.
        let mut slower_pick = faster_avalanche;
        slower_pick.recommended = Strategy::Snowball;
        assert_eq!(slower_pick.months_saved(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_fingerprint_returns_existing_id() -> Result<()> {
        let db = setup_test_db().await?;
        let first = insert(&db, sample_report(TEST_USER, "same")).await?;
        let second = insert(&db, sample_report(TEST_USER, "same")).await?;

        assert!(matches!(second, InsertOutcome::Existing(_)));
        assert_eq!(first.id(), second.id());
        assert_eq!(list_recent_by_user(&db, TEST_USER, 10).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_by_id_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let outcome = insert(&db, sample_report(TEST_USER, "mine")).await?;

        let result = get_by_id(&db, "someone-else", outcome.id()).await;
        assert!(matches!(result, Err(Error::ReportNotFound { .. })));
        assert!(get_by_fingerprint(&db, "someone-else", "mine").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_recent_is_bounded_and_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(insert(&db, sample_report(TEST_USER, &format!("fp-{i}"))).await?.id());
        }

        let recent = list_recent_by_user(&db, TEST_USER, 2).await?;
        let recent_ids: Vec<i64> = recent.iter().map(|r| r.id).collect();
        assert_eq!(recent_ids, vec![ids[3], ids[2]]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_live_status() -> Result<()> {
        let db = setup_test_db().await?;
        let outcome = insert(&db, sample_report(TEST_USER, "live")).await?;
        let statuses = vec![DebtStatus {
            debt_id: 1,
            name: "Store card".to_string(),
            starting_balance: 650.0,
            current_balance: 120.0,
        }];

        update_live_status(&db, outcome.id(), 2900.0, &statuses).await?;

        let report = get_by_id(&db, TEST_USER, outcome.id()).await?;
        assert_eq!(report.current_total_debt, 2900.0);
        assert_eq!(report.debt_statuses, statuses);
        assert!(report.reconciled_at.is_some());
        // Static fields are untouched.
        assert_eq!(report.beginning_debt, 3500.0);
        Ok(())
    }

    #[test]
    fn test_recommend_prefers_snowball_on_tie() {
        let report = sample_report(TEST_USER, "tie");
        let mut avalanche = report.snowball.clone();
        avalanche.strategy = Strategy::Avalanche;
        assert_eq!(recommend(&report.snowball, &avalanche), Strategy::Snowball);
        assert_eq!(
            recommend(&report.snowball, &report.avalanche),
            Strategy::Avalanche
        );
    }
}
