//! Instrument validation.
//!
//! A [`Rule`] is a named predicate with a fixed [`RuleKind`]. Rules for one
//! field are chained in a [`FieldRules`] group (the first broken rule wins),
//! and groups are composed by reference into per-method [`RuleSet`]s. A group
//! is declared once as a `static`; every rule set that needs it points at
//! the same instance, so no rule exists in two places.
//!
//! Validators are pure: everything time dependent comes in through
//! [`ValidationContext`].

pub mod bank;
pub mod card;
pub mod paypal;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use payments_types::{Field, PaymentMethod, RuleKind, ValidationError};

/// Inputs a rule may depend on besides the instrument itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// Date expiry checks are evaluated against
    pub today: NaiveDate,
    /// Required routing number length for bank accounts
    pub routing_number_length: usize,
}

/// A named predicate over an instrument.
pub struct Rule<T: 'static> {
    kind: RuleKind,
    check: fn(&T, &ValidationContext) -> bool,
}

impl<T> Rule<T> {
    /// `check` returns `true` when the value satisfies the rule.
    pub const fn new(kind: RuleKind, check: fn(&T, &ValidationContext) -> bool) -> Self {
        Self { kind, check }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn holds(&self, value: &T, ctx: &ValidationContext) -> bool {
        (self.check)(value, ctx)
    }
}

/// Ordered rules for a single field. Later rules may assume earlier ones hold.
pub struct FieldRules<T: 'static> {
    field: Field,
    rules: &'static [Rule<T>],
}

impl<T> FieldRules<T> {
    pub const fn new(field: Field, rules: &'static [Rule<T>]) -> Self {
        Self { field, rules }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn rules(&self) -> &'static [Rule<T>] {
        self.rules
    }

    /// Reports the first rule in the chain that `value` breaks.
    pub fn check(&self, value: &T, ctx: &ValidationContext) -> Result<(), ValidationError> {
        match self.rules.iter().find(|rule| !rule.holds(value, ctx)) {
            Some(rule) => Err(ValidationError::new(self.field, rule.kind())),
            None => Ok(()),
        }
    }
}

/// The field groups one operation requires of one instrument type.
pub struct RuleSet<T: 'static> {
    name: &'static str,
    groups: &'static [&'static FieldRules<T>],
}

impl<T> RuleSet<T> {
    pub const fn new(name: &'static str, groups: &'static [&'static FieldRules<T>]) -> Self {
        Self { name, groups }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn groups(&self) -> &'static [&'static FieldRules<T>] {
        self.groups
    }

    /// Fail-fast validation: the first broken rule of the first failing group.
    pub fn validate(&self, value: &T, ctx: &ValidationContext) -> Result<(), ValidationError> {
        self.groups.iter().try_for_each(|group| group.check(value, ctx))
    }

    /// One error per failing group, in declaration order.
    pub fn validate_all(&self, value: &T, ctx: &ValidationContext) -> Vec<ValidationError> {
        self.groups
            .iter()
            .filter_map(|group| group.check(value, ctx).err())
            .collect()
    }
}

/// Validator parameters supplied through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Digits in a routing number (9 for US ABA numbers).
    pub routing_number_length: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            routing_number_length: 9,
        }
    }
}

/// Which card rule set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardContext {
    /// Card is being authorized or stored: CVV is present and required.
    Authorization,
    /// Card was already authorized (refunds): CVV is no longer available.
    PostAuthorization,
}

/// Dispatches a [`PaymentMethod`] to the single rule set for its type.
#[derive(Debug, Clone, Default)]
pub struct InstrumentValidator {
    config: ValidatorConfig,
}

impl InstrumentValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn context(&self, today: NaiveDate) -> ValidationContext {
        ValidationContext {
            today,
            routing_number_length: self.config.routing_number_length,
        }
    }

    pub fn validate(
        &self,
        method: &PaymentMethod,
        card_context: CardContext,
        today: NaiveDate,
    ) -> Result<(), ValidationError> {
        let ctx = self.context(today);
        match method {
            PaymentMethod::CreditCard(card) => card::rules_for(card_context).validate(card, &ctx),
            PaymentMethod::BankAccount(account) => bank::RULES.validate(account, &ctx),
            PaymentMethod::PayPal(account) => paypal::RULES.validate(account, &ctx),
        }
    }

    pub fn validate_all(
        &self,
        method: &PaymentMethod,
        card_context: CardContext,
        today: NaiveDate,
    ) -> Vec<ValidationError> {
        let ctx = self.context(today);
        match method {
            PaymentMethod::CreditCard(card) => {
                card::rules_for(card_context).validate_all(card, &ctx)
            }
            PaymentMethod::BankAccount(account) => bank::RULES.validate_all(account, &ctx),
            PaymentMethod::PayPal(account) => paypal::RULES.validate_all(account, &ctx),
        }
    }
}

/// Non-empty and ASCII digits only.
pub(crate) fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use payments_types::{BankAccount, CreditCard, PayPalAccount};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_validator_dispatches_per_method() {
        let validator = InstrumentValidator::default();

        let card = PaymentMethod::from(CreditCard::new("4111111111111111", "12/29", "123", "A"));
        let bank: PaymentMethod = BankAccount::new("000123456789", "021000021", "Ada").into();
        let paypal: PaymentMethod = PayPalAccount::new("ada@example.com").into();

        for method in [&card, &bank, &paypal] {
            assert_eq!(
                validator.validate(method, CardContext::Authorization, today()),
                Ok(())
            );
        }
    }

    #[test]
    fn test_validate_all_reports_every_failing_group() {
        let validator = InstrumentValidator::default();
        let card: PaymentMethod = CreditCard::new("41x", "1229", "1", "A").into();

        let errors = validator.validate_all(&card, CardContext::Authorization, today());
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();

        assert_eq!(
            fields,
            vec![Field::CardNumber, Field::CardExpiry, Field::CardCvv]
        );
        assert_eq!(errors[0].rule, RuleKind::CardNumberLength);
    }

    #[test]
    fn test_fail_fast_matches_first_of_validate_all() {
        let validator = InstrumentValidator::default();
        let bank: PaymentMethod = BankAccount::new("12ab", "", "Ada").into();

        let all = validator.validate_all(&bank, CardContext::Authorization, today());
        let first = validator.validate(&bank, CardContext::Authorization, today());

        assert_eq!(all.len(), 2);
        assert_eq!(first, Err(all[0]));
    }

    #[test]
    fn test_routing_length_comes_from_config() {
        let validator = InstrumentValidator::new(ValidatorConfig {
            routing_number_length: 6,
        });
        let bank: PaymentMethod = BankAccount::new("12345678", "123456", "Ada").into();

        assert_eq!(
            validator.validate(&bank, CardContext::Authorization, today()),
            Ok(())
        );
    }

    #[test]
    fn test_is_digits() {
        assert!(is_digits("0123"));
        assert!(!is_digits(""));
        assert!(!is_digits("12 3"));
        assert!(!is_digits("١٢٣"));
    }
}
