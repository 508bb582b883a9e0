//! Scenario fingerprints for deduplicating identical calculation requests.
//!
//! The key covers the user, every debt's id, balance, rate and minimum, and the extra budget.
//! Debts are sorted by id first and amounts are normalised to whole cents (rates to 1/10000 of
//! a percent), so the key does not depend on list order or float formatting. This is a cache
//! key, not a security boundary.

use crate::core::{money::to_cents, strategy::DebtPosition};
use std::hash::Hasher;
use twox_hash::XxHash64;

const FINGERPRINT_SEED: u64 = 0;

/// Computes the cache key for one (user, debts, extra payment) scenario.
#[must_use]
pub fn scenario_fingerprint(user_id: &str, debts: &[DebtPosition], extra_monthly: f64) -> String {
    let mut sorted: Vec<&DebtPosition> = debts.iter().collect();
    sorted.sort_by_key(|d| d.id);

    let mut hasher = XxHash64::with_seed(FINGERPRINT_SEED);
    hasher.write(user_id.as_bytes());
    hasher.write_u8(0xff);
    hasher.write_u64(sorted.len() as u64);
    for debt in sorted {
        hasher.write_i64(debt.id);
        hasher.write_i64(to_cents(debt.balance));
        hasher.write_i64(rate_units(debt.annual_rate));
        hasher.write_i64(to_cents(debt.minimum_payment));
    }
    hasher.write_i64(to_cents(extra_monthly));

    format!("{:016x}", hasher.finish())
}

fn rate_units(annual_rate: f64) -> i64 {
    // Cast safety: rates are validated to 0-100.
    #[allow(clippy::cast_possible_truncation)]
    let units = (annual_rate * 10_000.0).round() as i64;
    units
}
