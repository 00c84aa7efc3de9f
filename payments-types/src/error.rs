//! Error types for the payment engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::MethodKind;

/// The input field (or field group) a validation rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Amount,
    Method,
    CardNumber,
    CardExpiry,
    CardCvv,
    AccountNumber,
    RoutingNumber,
    Email,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Amount => "amount",
            Field::Method => "method",
            Field::CardNumber => "card_number",
            Field::CardExpiry => "card_expiry",
            Field::CardCvv => "card_cvv",
            Field::AccountNumber => "account_number",
            Field::RoutingNumber => "routing_number",
            Field::Email => "email",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every rule the engine can reject an input with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    // Amount policy
    MustBePositive,
    BelowMinimum,
    ExceedsMaximum,

    // Operation/instrument compatibility
    UnsupportedInstrument,

    // Card
    CardNumberLength,
    CardNumberNotNumeric,
    ExpiryFormat,
    ExpiryMonth,
    ExpiryInPast,
    CvvLength,
    CvvNotNumeric,

    // Bank account
    AccountNumberRequired,
    AccountNumberNotNumeric,
    RoutingNumberRequired,
    RoutingNumberNotNumeric,
    RoutingNumberLength,

    // PayPal
    EmailFormat,
}

impl RuleKind {
    /// Human readable description, suitable for end users.
    pub fn message(&self) -> &'static str {
        match self {
            RuleKind::MustBePositive => "amount must be positive",
            RuleKind::BelowMinimum => "amount is below the minimum",
            RuleKind::ExceedsMaximum => "amount exceeds maximum",
            RuleKind::UnsupportedInstrument => "instrument not supported for this operation",
            RuleKind::CardNumberLength => "invalid card number length",
            RuleKind::CardNumberNotNumeric => "card number must contain only digits",
            RuleKind::ExpiryFormat => "expiry must be MM/YY format",
            RuleKind::ExpiryMonth => "expiry month must be between 01 and 12",
            RuleKind::ExpiryInPast => "card has expired",
            RuleKind::CvvLength => "invalid CVV length",
            RuleKind::CvvNotNumeric => "CVV must contain only digits",
            RuleKind::AccountNumberRequired => "account number is required",
            RuleKind::AccountNumberNotNumeric => "account number must contain only digits",
            RuleKind::RoutingNumberRequired => "routing number is required",
            RuleKind::RoutingNumberNotNumeric => "routing number must contain only digits",
            RuleKind::RoutingNumberLength => "invalid routing number length",
            RuleKind::EmailFormat => "invalid email address",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A structural or amount violation. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {}", .rule.message())]
pub struct ValidationError {
    pub field: Field,
    pub rule: RuleKind,
}

impl ValidationError {
    pub fn new(field: Field, rule: RuleKind) -> Self {
        Self { field, rule }
    }
}

/// Fee lookup or arithmetic failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeComputationError {
    #[error("fee schedule {schedule} has no rule for {kind} and no default")]
    NoRuleForKind { kind: MethodKind, schedule: String },

    #[error("fee schedule {schedule} has no default and is missing rules for {missing:?}")]
    IncompleteSchedule {
        schedule: String,
        missing: Vec<MethodKind>,
    },

    #[error("fee rule {rule} overflowed for amount {amount}")]
    Overflow { rule: String, amount: i64 },
}

/// Failure reported by a settlement callable.
///
/// The callable classifies its own failures; the engine never inspects the
/// reason text to decide whether to retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum SettlementError {
    /// Transient failure (network blip, timeout, rate limit); another attempt may succeed.
    #[error("retryable settlement failure: {0}")]
    Retryable(String),

    /// Permanent failure (declined, closed account); retrying cannot help.
    #[error("terminal settlement failure: {0}")]
    Terminal(String),
}

impl SettlementError {
    pub fn retryable(reason: impl Into<String>) -> Self {
        SettlementError::Retryable(reason.into())
    }

    pub fn terminal(reason: impl Into<String>) -> Self {
        SettlementError::Terminal(reason.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SettlementError::Retryable(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            SettlementError::Retryable(reason) | SettlementError::Terminal(reason) => reason,
        }
    }
}

/// Errors that stop an engine operation before any settlement attempt.
///
/// Settlement failures are not errors at this level: they are reported
/// through a `Failed` transaction outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fee(#[from] FeeComputationError),
}

impl EngineError {
    /// The validation failure, if that is what stopped the operation.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            EngineError::Validation(err) => Some(err),
            EngineError::Fee(_) => None,
        }
    }
}
