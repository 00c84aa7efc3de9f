//! Domain models for the payment engine.

pub mod method;
pub mod money;
pub mod outcome;

pub use method::{BankAccount, CardFunding, CreditCard, MethodKind, PayPalAccount, PaymentMethod};
pub use money::{Currency, Money};
pub use outcome::{
    Operation, OutcomeStatus, SettlementFailure, TransactionId, TransactionOutcome,
};
