//! Unified error type for the payoff planner.
//!
//! Simulation failures (`InsufficientPayment`, `RunawaySimulation`) carry data the user can act on
//! and are never folded into a generic error. Storage failures are reported as
//! `UpstreamUnavailable` so callers can retry them.

use thiserror::Error;

/// Every failure the engine can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// The user has no open debts to simulate.
    #[error("No active debts found for user {user_id}")]
    NoDebts {
        /// User whose debt list was empty
        user_id: String,
    },

    /// Minimum payments plus the extra budget cannot cover the first month's interest.
    #[error("Monthly payments fall short of accrued interest by ${deficit:.2}")]
    InsufficientPayment {
        /// Shortfall, rounded up to the next cent
        deficit: f64,
    },

    /// The schedule did not finish inside the month cap.
    #[error("Payoff simulation did not finish within {months} months")]
    RunawaySimulation {
        /// Month cap that was reached
        months: u32,
    },

    /// A store or the debt source failed or timed out.
    #[error("Upstream store unavailable: {message}")]
    UpstreamUnavailable {
        /// Underlying failure description
        message: String,
    },

    /// Persisting a payment batch failed and was rolled back.
    #[error("Payment distribution failed and was rolled back: {message}")]
    DistributionFailed {
        /// Underlying failure description
        message: String,
    },

    /// A monetary amount was zero, negative, or not finite where that is not allowed.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Input data failed validation.
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong
        message: String,
    },

    /// No debt with this id belongs to the user.
    #[error("Debt not found: {debt_id}")]
    DebtNotFound {
        /// Requested debt id
        debt_id: i64,
    },

    /// No report with this id belongs to the user.
    #[error("Calculation report not found: {report_id}")]
    ReportNotFound {
        /// Requested report id
        report_id: i64,
    },

    /// The user has not activated a plan.
    #[error("No active plan for user {user_id}")]
    NoActivePlan {
        /// User without an active plan
        user_id: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A stored JSON column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may retry the same request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }

    /// Whether the plan cannot converge with the given payments.
    ///
    /// Runaway simulations share the insufficient-payment messaging since both stem from
    /// payments that barely outpace interest.
    #[must_use]
    pub const fn is_unfundable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPayment { .. } | Self::RunawaySimulation { .. }
        )
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::UpstreamUnavailable {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_are_retryable() {
        let err: Error = sea_orm::DbErr::Custom("connection reset".to_string()).into();
        assert!(err.is_retryable());
        assert!(!err.is_unfundable());
    }

    #[test]
    fn test_unfundable_classification() {
        assert!(Error::InsufficientPayment { deficit: 12.5 }.is_unfundable());
        assert!(Error::RunawaySimulation { months: 1200 }.is_unfundable());
        assert!(!Error::InsufficientPayment { deficit: 12.5 }.is_retryable());
    }

    #[test]
    fn test_insufficient_payment_message_shows_deficit() {
        let err = Error::InsufficientPayment { deficit: 116.67 };
        assert_eq!(
            err.to_string(),
            "Monthly payments fall short of accrued interest by $116.67"
        );
    }
}
