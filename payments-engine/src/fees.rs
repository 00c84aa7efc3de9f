//! Fee schedule.
//!
//! Every fee is traceable to a named rule inside a named, dated schedule.
//! Changing a rate means publishing a new schedule, not editing a literal.
//!
//! Arithmetic is done in integer minor units. Variable rates are expressed in
//! basis points (1 bp = 0.01%) and the variable part is rounded half-up to the
//! nearest minor unit before the fixed part is added.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use payments_types::{FeeComputationError, MethodKind, Money};

const BPS_PER_UNIT: i128 = 10_000;

/// How a rule turns an amount into a fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "formula", rename_all = "snake_case")]
pub enum FeeFormula {
    /// `amount * rate_bps / 10_000 + fixed`
    Variable { rate_bps: u32, fixed: i64 },
    /// Same fee regardless of amount
    Flat { fee: i64 },
}

/// A named fee formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRule {
    /// Audit identifier, e.g. `card-credit-2024`
    pub name: String,
    #[serde(flatten)]
    pub formula: FeeFormula,
}

impl FeeRule {
    pub fn variable(name: impl Into<String>, rate_bps: u32, fixed: i64) -> Self {
        Self {
            name: name.into(),
            formula: FeeFormula::Variable { rate_bps, fixed },
        }
    }

    pub fn flat(name: impl Into<String>, fee: i64) -> Self {
        Self {
            name: name.into(),
            formula: FeeFormula::Flat { fee },
        }
    }

    /// Applies the formula to an amount, keeping the amount's currency.
    pub fn apply(&self, amount: Money) -> Result<Money, FeeComputationError> {
        let overflow = || FeeComputationError::Overflow {
            rule: self.name.clone(),
            amount: amount.amount(),
        };

        let fee = match self.formula {
            FeeFormula::Flat { fee } => fee,
            FeeFormula::Variable { rate_bps, fixed } => {
                let scaled = i128::from(amount.amount()) * i128::from(rate_bps);
                let variable = round_half_up(scaled, BPS_PER_UNIT);
                i64::try_from(variable)
                    .ok()
                    .and_then(|v| v.checked_add(fixed))
                    .ok_or_else(overflow)?
            }
        };

        Ok(Money::new(fee, amount.currency()))
    }
}

/// `numerator / denominator` rounded to the nearest integer, ties away from zero.
fn round_half_up(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

/// A computed fee together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub schedule: String,
    pub rule: String,
    pub fee: Money,
    /// The schedule had no rule for the kind and its default entry was used
    pub used_default: bool,
}

/// A versioned mapping from instrument kind to fee rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Version identifier, e.g. `standard-2024`
    pub version: String,
    pub effective_from: NaiveDate,
    pub rules: BTreeMap<MethodKind, FeeRule>,
    /// Rule for kinds without an entry. Must be stated explicitly; there is
    /// no implicit fallback.
    #[serde(default)]
    pub default: Option<FeeRule>,
}

impl FeeSchedule {
    pub fn new(version: impl Into<String>, effective_from: NaiveDate) -> Self {
        Self {
            version: version.into(),
            effective_from,
            rules: BTreeMap::new(),
            default: None,
        }
    }

    pub fn with_rule(mut self, kind: MethodKind, rule: FeeRule) -> Self {
        self.rules.insert(kind, rule);
        self
    }

    pub fn with_default(mut self, rule: FeeRule) -> Self {
        self.default = Some(rule);
        self
    }

    /// Published rates in effect since 2024-01-01.
    ///
    /// | kind         | rule                   | formula       |
    /// |--------------|------------------------|---------------|
    /// | credit card  | `card-credit-2024`     | 2.90% + 0.30  |
    /// | debit card   | `card-debit-2024`      | 1.50% + 0.25  |
    /// | bank account | `bank-flat-2024`       | flat 0.25     |
    /// | PayPal       | `paypal-standard-2024` | 3.40% + 0.49  |
    /// | default      | `default-2024`         | 5.00%         |
    pub fn standard() -> Self {
        let effective_from = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid calendar date");
        Self::new("standard-2024", effective_from)
            .with_rule(
                MethodKind::CreditCard,
                FeeRule::variable("card-credit-2024", 290, 30),
            )
            .with_rule(
                MethodKind::DebitCard,
                FeeRule::variable("card-debit-2024", 150, 25),
            )
            .with_rule(MethodKind::BankAccount, FeeRule::flat("bank-flat-2024", 25))
            .with_rule(
                MethodKind::PayPal,
                FeeRule::variable("paypal-standard-2024", 340, 49),
            )
            .with_default(FeeRule::variable("default-2024", 500, 0))
    }

    /// Loads a schedule from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Kinds with neither their own rule nor a default to fall back on.
    pub fn missing_kinds(&self) -> Vec<MethodKind> {
        if self.default.is_some() {
            return Vec::new();
        }
        MethodKind::ALL
            .into_iter()
            .filter(|kind| !self.rules.contains_key(kind))
            .collect()
    }

    /// Checks that every declared kind resolves to a rule.
    pub fn validate(&self) -> Result<(), FeeComputationError> {
        let missing = self.missing_kinds();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FeeComputationError::IncompleteSchedule {
                schedule: self.version.clone(),
                missing,
            })
        }
    }

    /// The rule for `kind`, and whether it came from the default entry.
    pub fn rule_for(&self, kind: MethodKind) -> Result<(&FeeRule, bool), FeeComputationError> {
        if let Some(rule) = self.rules.get(&kind) {
            return Ok((rule, false));
        }
        self.default
            .as_ref()
            .map(|rule| (rule, true))
            .ok_or_else(|| FeeComputationError::NoRuleForKind {
                kind,
                schedule: self.version.clone(),
            })
    }

    pub fn quote(&self, kind: MethodKind, amount: Money) -> Result<FeeQuote, FeeComputationError> {
        let (rule, used_default) = self.rule_for(kind)?;
        Ok(FeeQuote {
            schedule: self.version.clone(),
            rule: rule.name.clone(),
            fee: rule.apply(amount)?,
            used_default,
        })
    }

    pub fn compute_fee(
        &self,
        kind: MethodKind,
        amount: Money,
    ) -> Result<Money, FeeComputationError> {
        self.quote(kind, amount).map(|quote| quote.fee)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::standard()
    }
}
