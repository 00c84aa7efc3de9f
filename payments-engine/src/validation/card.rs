//! Card rules.

use chrono::Datelike;

use payments_types::{CreditCard, Field, RuleKind};

use super::{CardContext, FieldRules, Rule, RuleSet, ValidationContext, is_digits};

/// Digits allowed in a card number once spaces and hyphens are removed.
const NUMBER_LENGTH: std::ops::RangeInclusive<usize> = 13..=19;
const CVV_LENGTH: std::ops::RangeInclusive<usize> = 3..=4;

pub static NUMBER: FieldRules<CreditCard> = FieldRules::new(
    Field::CardNumber,
    &[
        Rule::new(RuleKind::CardNumberLength, number_length),
        Rule::new(RuleKind::CardNumberNotNumeric, number_numeric),
    ],
);

pub static EXPIRY: FieldRules<CreditCard> = FieldRules::new(
    Field::CardExpiry,
    &[
        Rule::new(RuleKind::ExpiryFormat, expiry_format),
        Rule::new(RuleKind::ExpiryMonth, expiry_month),
        Rule::new(RuleKind::ExpiryInPast, expiry_current),
    ],
);

pub static CVV: FieldRules<CreditCard> = FieldRules::new(
    Field::CardCvv,
    &[
        Rule::new(RuleKind::CvvLength, cvv_length),
        Rule::new(RuleKind::CvvNotNumeric, cvv_numeric),
    ],
);

/// Charges and stored cards.
pub static AUTHORIZATION: RuleSet<CreditCard> =
    RuleSet::new("card-authorization", &[&NUMBER, &EXPIRY, &CVV]);

/// Refunds. The CVV is not retained after authorization, so it cannot be checked.
pub static POST_AUTHORIZATION: RuleSet<CreditCard> =
    RuleSet::new("card-post-authorization", &[&NUMBER, &EXPIRY]);

pub fn rules_for(context: CardContext) -> &'static RuleSet<CreditCard> {
    match context {
        CardContext::Authorization => &AUTHORIZATION,
        CardContext::PostAuthorization => &POST_AUTHORIZATION,
    }
}

fn number_length(card: &CreditCard, _: &ValidationContext) -> bool {
    NUMBER_LENGTH.contains(&card.normalized_number().chars().count())
}

fn number_numeric(card: &CreditCard, _: &ValidationContext) -> bool {
    is_digits(&card.normalized_number())
}

/// Splits `MM/YY` into month and two-digit year.
fn parse_expiry(expiry: &str) -> Option<(u32, u32)> {
    let (month, year) = expiry.split_once('/')?;
    if month.len() != 2 || year.len() != 2 || !is_digits(month) || !is_digits(year) {
        return None;
    }
    Some((month.parse().ok()?, year.parse().ok()?))
}

fn expiry_format(card: &CreditCard, _: &ValidationContext) -> bool {
    parse_expiry(card.expiry()).is_some()
}

fn expiry_month(card: &CreditCard, _: &ValidationContext) -> bool {
    parse_expiry(card.expiry()).is_some_and(|(month, _)| (1..=12).contains(&month))
}

// A card is valid through the last day of its expiry month.
fn expiry_current(card: &CreditCard, ctx: &ValidationContext) -> bool {
    parse_expiry(card.expiry()).is_some_and(|(month, year)| {
        let year = 2000 + year as i32;
        (year, month) >= (ctx.today.year(), ctx.today.month())
    })
}

fn cvv_length(card: &CreditCard, _: &ValidationContext) -> bool {
    CVV_LENGTH.contains(&card.cvv().chars().count())
}

fn cvv_numeric(card: &CreditCard, _: &ValidationContext) -> bool {
    is_digits(card.cvv())
}
