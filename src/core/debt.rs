//! Debt source - Reads and maintains the debts the engine simulates.
//!
//! Simulation treats the returned rows as an immutable snapshot. Balances only change through
//! the payment module, which decrements them inside its own transaction.

use crate::{
    core::money::round2,
    entities::{Debt, debt},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, instrument};

/// Records a new debt for a user after validating its terms.
///
/// The starting balance is also stored as `original_balance`, which never changes afterwards.
///
/// # Arguments
/// * `user_id` - Owner of the debt
/// * `name` - Display name, must not be blank
/// * `balance` - Current balance, zero or more
/// * `interest_rate` - Annual rate as a percentage (0-100)
/// * `minimum_payment` - Required monthly payment, above zero
#[instrument(skip(db))]
pub async fn create_debt(
    db: &DatabaseConnection,
    user_id: String,
    name: String,
    balance: f64,
    interest_rate: f64,
    minimum_payment: f64,
) -> Result<debt::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Debt name cannot be empty".to_string(),
        });
    }
    if !balance.is_finite() || balance < 0.0 {
        return Err(Error::InvalidAmount { amount: balance });
    }
    if !interest_rate.is_finite() || !(0.0..=100.0).contains(&interest_rate) {
        return Err(Error::Validation {
            message: format!("Interest rate must be between 0 and 100, got {interest_rate}"),
        });
    }
    if !minimum_payment.is_finite() || minimum_payment <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: minimum_payment,
        });
    }

    let balance = round2(balance);
    let debt = debt::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.trim().to_string()),
        balance: Set(balance),
        original_balance: Set(balance),
        interest_rate: Set(interest_rate),
        minimum_payment: Set(round2(minimum_payment)),
        created_at: Set(chrono::Utc::now()),
        is_deleted: Set(false),
        ..Default::default()
    };

    let result = debt.insert(db).await?;
    debug!(debt_id = result.id, "Debt recorded");
    Ok(result)
}

/// Lists a user's open debts (not deleted, balance above zero) in the order they were added.
pub async fn list_active_debts<C>(db: &C, user_id: &str) -> Result<Vec<debt::Model>>
where
    C: ConnectionTrait,
{
    Debt::find()
        .filter(debt::Column::UserId.eq(user_id))
        .filter(debt::Column::IsDeleted.eq(false))
        .filter(debt::Column::Balance.gt(0.0))
        .order_by_asc(debt::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of a user's open debt balances, rounded to cents.
pub async fn current_balance<C>(db: &C, user_id: &str) -> Result<f64>
where
    C: ConnectionTrait,
{
    let debts = list_active_debts(db, user_id).await?;
    Ok(round2(debts.iter().map(|d| d.balance).sum()))
}

/// Loads debts by id, including paid-off and deleted ones.
pub async fn get_debts_by_ids<C>(db: &C, debt_ids: &[i64]) -> Result<Vec<debt::Model>>
where
    C: ConnectionTrait,
{
    if debt_ids.is_empty() {
        return Ok(Vec::new());
    }
    Debt::find()
        .filter(debt::Column::Id.is_in(debt_ids.iter().copied()))
        .order_by_asc(debt::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one of the user's debts by id, returning None if it is missing, deleted, or not theirs.
pub async fn get_debt_for_user<C>(db: &C, user_id: &str, debt_id: i64) -> Result<Option<debt::Model>>
where
    C: ConnectionTrait,
{
    Debt::find_by_id(debt_id)
        .filter(debt::Column::UserId.eq(user_id))
        .filter(debt::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a debt so it drops out of future simulations while its history is kept.
pub async fn delete_debt(db: &DatabaseConnection, user_id: &str, debt_id: i64) -> Result<()> {
    let debt = get_debt_for_user(db, user_id, debt_id)
        .await?
        .ok_or(Error::DebtNotFound { debt_id })?;

    let mut active: debt::ActiveModel = debt.into();
    active.is_deleted = Set(true);
    active.update(db).await?;
    Ok(())
}

/// Lowers a debt's balance by `amount`, never below zero.
pub(crate) async fn decrement_balance<C>(db: &C, debt: &debt::Model, amount: f64) -> Result<debt::Model>
where
    C: ConnectionTrait,
{
    let new_balance = round2((debt.balance - amount).max(0.0));
    let mut active: debt::ActiveModel = debt.clone().into();
    active.balance = Set(new_balance);
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_debt_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_debt(&db, "u".into(), "  ".into(), 100.0, 5.0, 10.0).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_debt(&db, "u".into(), "Card".into(), -1.0, 5.0, 10.0).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount }) if amount == -1.0));

        let result = create_debt(&db, "u".into(), "Card".into(), 100.0, 101.0, 10.0).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_debt(&db, "u".into(), "Card".into(), 100.0, 5.0, 0.0).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_debt_sets_original_balance() -> Result<()> {
        let db = setup_test_db().await?;
        let debt = create_debt(&db, TEST_USER.into(), " Visa ".into(), 1234.567, 19.99, 35.0).await?;

        assert_eq!(debt.name, "Visa");
        assert_eq!(debt.balance, 1234.57);
        assert_eq!(debt.original_balance, 1234.57);
        assert!(!debt.is_deleted);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_active_debts_filters_and_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_debt(&db, "First", 500.0, 10.0, 25.0).await?;
        let paid = create_test_debt(&db, "Paid", 0.0, 10.0, 25.0).await?;
        let deleted = create_test_debt(&db, "Deleted", 800.0, 10.0, 25.0).await?;
        let last = create_test_debt(&db, "Last", 100.0, 10.0, 25.0).await?;
        create_debt(&db, "someone-else".into(), "Other".into(), 900.0, 5.0, 20.0).await?;
        delete_debt(&db, TEST_USER, deleted.id).await?;

        let debts = list_active_debts(&db, TEST_USER).await?;
        let ids: Vec<i64> = debts.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![first.id, last.id]);
        assert_eq!(current_balance(&db, TEST_USER).await?, 600.0);

        // Lookups by id still see paid-off and deleted debts.
        let all = get_debts_by_ids(&db, &[paid.id, deleted.id]).await?;
        assert_eq!(all.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_debt_checks_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let debt = create_test_debt(&db, "Card", 500.0, 10.0, 25.0).await?;

        let result = delete_debt(&db, "intruder", debt.id).await;
        assert!(matches!(result, Err(Error::DebtNotFound { .. })));
        assert_eq!(list_active_debts(&db, TEST_USER).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_balance_clamps_at_zero() -> Result<()> {
        let db = setup_test_db().await?;
        let debt = create_test_debt(&db, "Card", 50.0, 10.0, 25.0).await?;

        let updated = decrement_balance(&db, &debt, 20.25).await?;
        assert_eq!(updated.balance, 29.75);
        let updated = decrement_balance(&db, &updated, 100.0).await?;
        assert_eq!(updated.balance, 0.0);
        assert_eq!(updated.original_balance, 50.0);
        Ok(())
    }
}
