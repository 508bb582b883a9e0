//! Payoff ordering strategies.
//!
//! A strategy is reduced to a plain comparator over [`DebtPosition`]s. The simulator and the
//! payment distributor both take that comparator as a parameter, so "which debt comes first"
//! has exactly one definition. Sorting with it must be stable: ties keep input order.

use crate::{
    entities::debt,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

/// A debt as seen by the payoff algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPosition {
    /// Debt id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Outstanding balance in dollars
    pub balance: f64,
    /// Annual interest rate as a percentage (0-100)
    pub annual_rate: f64,
    /// Monthly minimum payment
    pub minimum_payment: f64,
}

impl DebtPosition {
    /// Interest rate for one month as a fraction (`rate / 100 / 12`).
    #[must_use]
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 100.0 / 12.0
    }
}

impl From<&debt::Model> for DebtPosition {
    fn from(model: &debt::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            balance: model.balance,
            annual_rate: model.interest_rate,
            minimum_payment: model.minimum_payment,
        }
    }
}

/// Comparator deciding which debt gets extra money first (`Less` = earlier).
pub type PriorityOrder = fn(&DebtPosition, &DebtPosition) -> Ordering;

/// Snowball ordering: smallest current balance first.
#[must_use]
pub fn smallest_balance_first(a: &DebtPosition, b: &DebtPosition) -> Ordering {
    a.balance.total_cmp(&b.balance)
}

/// Avalanche ordering: highest interest rate first.
#[must_use]
pub fn highest_rate_first(a: &DebtPosition, b: &DebtPosition) -> Ordering {
    b.annual_rate.total_cmp(&a.annual_rate)
}

/// The two supported payoff strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Pay the smallest balance first
    Snowball,
    /// Pay the highest interest rate first
    Avalanche,
}

impl Strategy {
    /// Both strategies, in tie-break preference order.
    pub const ALL: [Self; 2] = [Self::Snowball, Self::Avalanche];

    /// Label stored in reports and plans.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Snowball => "Snowball",
            Self::Avalanche => "Avalanche",
        }
    }

    /// The comparator implementing this strategy.
    #[must_use]
    pub fn priority(self) -> PriorityOrder {
        match self {
            Self::Snowball => smallest_balance_first,
            Self::Avalanche => highest_rate_first,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snowball" => Ok(Self::Snowball),
            "avalanche" => Ok(Self::Avalanche),
            other => Err(Error::Validation {
                message: format!("Unknown payoff strategy: {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn position(id: i64, balance: f64, annual_rate: f64) -> DebtPosition {
        DebtPosition {
            id,
            name: format!("debt-{id}"),
            balance,
            annual_rate,
            minimum_payment: 25.0,
        }
    }

    fn ordered_ids(strategy: Strategy, mut debts: Vec<DebtPosition>) -> Vec<i64> {
        debts.sort_by(strategy.priority());
        debts.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_snowball_orders_by_balance() {
        let debts = vec![
            position(1, 5000.0, 5.0),
            position(2, 300.0, 22.0),
            position(3, 1200.0, 18.0),
        ];
        assert_eq!(ordered_ids(Strategy::Snowball, debts), vec![2, 3, 1]);
    }

    #[test]
    fn test_avalanche_orders_by_rate_with_stable_ties() {
        let debts = vec![
            position(1, 5000.0, 18.0),
            position(2, 300.0, 22.0),
            position(3, 1200.0, 18.0),
        ];
        assert_eq!(ordered_ids(Strategy::Avalanche, debts), vec![2, 1, 3]);
    }

    #[test]
    fn test_parse_strategy_labels() {
        assert_eq!("Snowball".parse::<Strategy>().unwrap(), Strategy::Snowball);
        assert_eq!(" avalanche ".parse::<Strategy>().unwrap(), Strategy::Avalanche);
        assert!(matches!(
            "tortoise".parse::<Strategy>(),
            Err(Error::Validation { .. })
        ));
        assert_eq!(Strategy::Avalanche.to_string(), "Avalanche");
    }

    #[test]
    fn test_monthly_rate() {
        let debt = position(1, 1000.0, 24.0);
        assert!((debt.monthly_rate() - 0.02).abs() < 1e-12);
    }
}
