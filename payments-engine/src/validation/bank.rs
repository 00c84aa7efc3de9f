//! Bank account rules.

use payments_types::{BankAccount, Field, RuleKind};

use super::{FieldRules, Rule, RuleSet, ValidationContext, is_digits};

pub static ACCOUNT_NUMBER: FieldRules<BankAccount> = FieldRules::new(
    Field::AccountNumber,
    &[
        Rule::new(RuleKind::AccountNumberRequired, account_present),
        Rule::new(RuleKind::AccountNumberNotNumeric, account_numeric),
    ],
);

pub static ROUTING_NUMBER: FieldRules<BankAccount> = FieldRules::new(
    Field::RoutingNumber,
    &[
        Rule::new(RuleKind::RoutingNumberRequired, routing_present),
        Rule::new(RuleKind::RoutingNumberNotNumeric, routing_numeric),
        Rule::new(RuleKind::RoutingNumberLength, routing_length),
    ],
);

pub static RULES: RuleSet<BankAccount> =
    RuleSet::new("bank-account", &[&ACCOUNT_NUMBER, &ROUTING_NUMBER]);

fn account_present(account: &BankAccount, _: &ValidationContext) -> bool {
    !account.account_number().is_empty()
}

fn account_numeric(account: &BankAccount, _: &ValidationContext) -> bool {
    is_digits(account.account_number())
}

fn routing_present(account: &BankAccount, _: &ValidationContext) -> bool {
    !account.routing_number().is_empty()
}

fn routing_numeric(account: &BankAccount, _: &ValidationContext) -> bool {
    is_digits(account.routing_number())
}

// Length varies by issuing country, so it is configuration.
fn routing_length(account: &BankAccount, ctx: &ValidationContext) -> bool {
    account.routing_number().len() == ctx.routing_number_length
}
