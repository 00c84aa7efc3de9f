//! Transaction outcome returned by every engine operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Money;

/// Unique identifier for an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The engine entry point that produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Money taken from the instrument
    Charge,
    /// Money returned to the instrument after a charge
    Refund,
    /// Instrument checked before being stored for later use
    ValidateForStorage,
    /// Money pushed to a bank account or PayPal wallet
    Transfer,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Charge => write!(f, "CHARGE"),
            Operation::Refund => write!(f, "REFUND"),
            Operation::ValidateForStorage => write!(f, "VALIDATE_FOR_STORAGE"),
            Operation::Transfer => write!(f, "TRANSFER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

/// Why a settlement did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementFailure {
    /// The settlement reported a failure that retrying cannot fix.
    #[error("settlement failed: {reason}")]
    Terminal { reason: String },

    /// Every allowed attempt ended in a retryable failure.
    #[error("settlement exhausted after {attempts} attempts: {last_reason}")]
    Exhausted { attempts: u32, last_reason: String },
}

/// Result of one engine operation.
///
/// Outcomes are immutable records; the engine never keeps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    /// Unique identifier
    pub id: TransactionId,
    /// Entry point that produced this outcome
    pub operation: Operation,
    pub status: OutcomeStatus,
    /// Fee taken by the settlement; `None` unless the settlement succeeded
    pub fee_charged: Option<Money>,
    /// Settlement attempts actually made (0 when no settlement was needed)
    pub attempt_count: u32,
    /// Set on `Failed` outcomes only
    pub terminal_error: Option<SettlementFailure>,
    pub completed_at: DateTime<Utc>,
}

impl TransactionOutcome {
    /// A settlement that went through after `attempt_count` attempts.
    pub fn succeeded(operation: Operation, fee_charged: Money, attempt_count: u32) -> Self {
        Self {
            id: TransactionId::new(),
            operation,
            status: OutcomeStatus::Succeeded,
            fee_charged: Some(fee_charged),
            attempt_count,
            terminal_error: None,
            completed_at: Utc::now(),
        }
    }

    /// A settlement that did not go through.
    pub fn failed(operation: Operation, attempt_count: u32, error: SettlementFailure) -> Self {
        Self {
            id: TransactionId::new(),
            operation,
            status: OutcomeStatus::Failed,
            fee_charged: None,
            attempt_count,
            terminal_error: Some(error),
            completed_at: Utc::now(),
        }
    }

    /// An operation that passed validation without settling anything.
    pub fn validated(operation: Operation) -> Self {
        Self {
            id: TransactionId::new(),
            operation,
            status: OutcomeStatus::Succeeded,
            fee_charged: None,
            attempt_count: 0,
            terminal_error: None,
            completed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    #[test]
    fn test_succeeded_outcome() {
        let fee = Money::new(320, Currency::USD);
        let outcome = TransactionOutcome::succeeded(Operation::Charge, fee, 2);

        assert!(outcome.is_success());
        assert_eq!(outcome.fee_charged, Some(fee));
        assert_eq!(outcome.attempt_count, 2);
        assert!(outcome.terminal_error.is_none());
    }

    #[test]
    fn test_failed_outcome_carries_no_fee() {
        let outcome = TransactionOutcome::failed(
            Operation::Transfer,
            3,
            SettlementFailure::Exhausted {
                attempts: 3,
                last_reason: "rail timeout".to_string(),
            },
        );

        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert!(outcome.fee_charged.is_none());
        assert_eq!(
            outcome.terminal_error.unwrap().to_string(),
            "settlement exhausted after 3 attempts: rail timeout"
        );
    }

    #[test]
    fn test_outcome_ids_are_unique() {
        let a = TransactionOutcome::validated(Operation::ValidateForStorage);
        let b = TransactionOutcome::validated(Operation::ValidateForStorage);
        assert_ne!(a.id, b.id);
        assert_eq!(a.attempt_count, 0);
    }
}
