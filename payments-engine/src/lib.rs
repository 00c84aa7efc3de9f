//! # Payments Engine
//!
//! Validates payment instruments, applies the amount policy, computes fees
//! from a versioned schedule and drives settlement through a bounded retry
//! executor.
//!
//! ```text
//! PaymentEngine ─┬─ AmountPolicy
//!                ├─ InstrumentValidator (card / bank / paypal rule sets)
//!                ├─ FeeSchedule
//!                └─ RetryExecutor ── Settlement port (payments-types)
//! ```

pub mod amount;
pub mod config;
pub mod fees;
pub mod retry;
pub mod service;
pub mod validation;


pub use amount::AmountPolicy;
pub use config::{ConfigError, EngineConfig};
pub use fees::{FeeFormula, FeeQuote, FeeRule, FeeSchedule};
pub use retry::{AttemptRecord, Backoff, RetryExecutor, RetryPolicy, RetryReport, RetryResult};
pub use service::PaymentEngine;
pub use validation::{CardContext, InstrumentValidator, ValidatorConfig};
