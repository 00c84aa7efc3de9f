//! Amount policy: the one bounds check every operation goes through.

use serde::{Deserialize, Serialize};

use payments_types::{Field, Money, RuleKind, ValidationError};

/// Accepted range `min_amount < amount <= max_amount`, in minor units.
///
/// Bounds apply to the numeric minor-unit value regardless of currency; all
/// supported currencies use two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountPolicy {
    /// Exclusive lower bound (0 means "must be positive")
    pub min_amount: i64,
    /// Inclusive upper bound
    pub max_amount: i64,
}

impl Default for AmountPolicy {
    /// Positive amounts up to 10,000.00.
    fn default() -> Self {
        Self {
            min_amount: 0,
            max_amount: 1_000_000,
        }
    }
}

impl AmountPolicy {
    pub fn new(min_amount: i64, max_amount: i64) -> Self {
        Self {
            min_amount,
            max_amount,
        }
    }

    pub fn check(&self, amount: Money) -> Result<(), ValidationError> {
        let value = amount.amount();
        let rule = if value <= 0 {
            RuleKind::MustBePositive
        } else if value <= self.min_amount {
            RuleKind::BelowMinimum
        } else if value > self.max_amount {
            RuleKind::ExceedsMaximum
        } else {
            return Ok(());
        };
        Err(ValidationError::new(Field::Amount, rule))
    }
}
