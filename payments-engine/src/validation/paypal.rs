//! PayPal account rules.

use std::sync::LazyLock;

use regex::Regex;

use payments_types::{Field, PayPalAccount, RuleKind};

use super::{FieldRules, Rule, RuleSet, ValidationContext};

// WHATWG "valid e-mail address" grammar, with at least one dot in the domain.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is a valid regex")
});

pub static EMAIL: FieldRules<PayPalAccount> =
    FieldRules::new(Field::Email, &[Rule::new(RuleKind::EmailFormat, email_format)]);

pub static RULES: RuleSet<PayPalAccount> = RuleSet::new("paypal-account", &[&EMAIL]);

fn email_format(account: &PayPalAccount, _: &ValidationContext) -> bool {
    EMAIL_PATTERN.is_match(account.email())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid(email: &str) -> bool {
        let ctx = ValidationContext {
            today: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            routing_number_length: 9,
        };
        RULES.validate(&PayPalAccount::new(email), &ctx).is_ok()
    }

    #[test]
    fn test_accepts_standard_addresses() {
        assert!(valid("buyer@example.com"));
        assert!(valid("first.last+shop@mail.example.co.uk"));
        assert!(valid("o'brien@example.ie"));
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        for email in [
            "",
            "buyer",
            "buyer@",
            "@example.com",
            "buyer@example",
            "buyer@@example.com",
            "buyer@-example.com",
            "buyer @example.com",
        ] {
            assert!(!valid(email), "{email} should be rejected");
        }
    }
}
