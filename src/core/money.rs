//! Currency rounding helpers.
//!
//! Simulation keeps full `f64` precision internally and only rounds at reporting boundaries.
//! Payment distribution works in whole cents so allocations add up exactly.

/// Rounds a dollar amount to the nearest cent.
#[must_use]
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Rounds a dollar amount up to the next whole cent.
///
/// A tiny tolerance keeps values that are already whole cents (up to float noise) unchanged.
#[must_use]
pub fn ceil_cents(amount: f64) -> f64 {
    ((amount * 100.0) - 1e-6).ceil() / 100.0
}

/// Converts dollars to integer cents.
#[must_use]
pub fn to_cents(amount: f64) -> i64 {
    // Cast safety: debt amounts are far below i64::MAX cents; NaN is rejected before this point.
    #[allow(clippy::cast_possible_truncation)]
    let cents = (amount * 100.0).round() as i64;
    cents
}

/// Converts integer cents back to dollars.
#[must_use]
pub fn from_cents(cents: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let dollars = cents as f64 / 100.0;
    dollars
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(970.004), 970.0);
        assert_eq!(round2(166.666_666), 166.67);
        assert_eq!(round2(0.1 + 0.2), 0.3);
    }

    #[test]
    fn test_ceil_cents() {
        assert_eq!(ceil_cents(116.666_666), 116.67);
        assert_eq!(ceil_cents(20.0), 20.0);
        assert_eq!(ceil_cents(0.001), 0.01);
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(12.34), 1234);
        assert_eq!(to_cents(0.1 + 0.2), 30);
        assert_eq!(from_cents(1234), 12.34);
    }
}
