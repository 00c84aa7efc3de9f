//! # Payments Types
//!
//! Domain types and port traits for the payment engine.
//! This crate has ZERO IO dependencies - only value objects,
//! the error taxonomy, and trait definitions.
//!
//! ## Layout
//!
//! - `domain/` - Instruments (`PaymentMethod`), `Money`, `TransactionOutcome`
//! - `ports/` - The `Settlement` port implemented by card/bank/PayPal adapters
//! - `error/` - Validation, fee and settlement errors

pub mod domain;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    BankAccount, CardFunding, CreditCard, Currency, MethodKind, Money, Operation, OutcomeStatus,
    PayPalAccount, PaymentMethod, SettlementFailure, TransactionId, TransactionOutcome,
};
pub use error::{
    EngineError, FeeComputationError, Field, RuleKind, SettlementError, ValidationError,
};
pub use ports::{Settlement, SettlementResult};
