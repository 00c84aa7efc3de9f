//! Payment Engine Service
//!
//! Orchestrates the amount policy, instrument validators, fee schedule and
//! retry executor into the public payment operations. Settlement itself is
//! delegated to the [`Settlement`] port supplied with each call.
//!
//! The engine holds configuration only. Nothing from a request outlives the
//! call, so one engine can serve concurrent calls through `&self`.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use payments_types::{
    EngineError, Field, Money, Operation, PaymentMethod, RuleKind, Settlement, TransactionOutcome,
    ValidationError,
};

use crate::amount::AmountPolicy;
use crate::config::{ConfigError, EngineConfig};
use crate::fees::{FeeQuote, FeeSchedule};
use crate::retry::RetryExecutor;
use crate::validation::{CardContext, InstrumentValidator};

/// Application service for payment operations.
///
/// Every operation runs the same pipeline:
/// amount policy, then instrument rules, then (where money moves) fee
/// computation and settlement under the retry policy. The first failing
/// step decides the result; no settlement attempt is made for a request
/// that fails validation or fee computation.
pub struct PaymentEngine {
    amount_policy: AmountPolicy,
    fee_schedule: FeeSchedule,
    validator: InstrumentValidator,
    executor: RetryExecutor,
    today: fn() -> NaiveDate,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Instrument summary safe to log: the kind, plus the last four digits for cards.
fn redacted(method: &PaymentMethod) -> String {
    match method {
        PaymentMethod::CreditCard(card) => format!("{} ****{}", method.kind(), card.last_four()),
        PaymentMethod::BankAccount(_) | PaymentMethod::PayPal(_) => method.kind().to_string(),
    }
}

/// Card rules that apply to an operation. Refunds act on an already
/// authorized card whose CVV is no longer held.
fn card_context(operation: Operation) -> CardContext {
    match operation {
        Operation::Refund => CardContext::PostAuthorization,
        Operation::Charge | Operation::ValidateForStorage | Operation::Transfer => {
            CardContext::Authorization
        }
    }
}

impl PaymentEngine {
    /// Creates an engine after checking the configuration is usable.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            amount_policy: config.amount_policy,
            fee_schedule: config.fee_schedule,
            validator: InstrumentValidator::new(config.validator),
            executor: RetryExecutor::new(config.retry_policy),
            today: utc_today,
        })
    }

    /// Replaces the clock card expiry is evaluated against.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn amount_policy(&self) -> &AmountPolicy {
        &self.amount_policy
    }

    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fee_schedule
    }

    pub fn validator(&self) -> &InstrumentValidator {
        &self.validator
    }

    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Money-moving Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Charges `amount` to `method`.
    ///
    /// The fee comes from the schedule rule for the instrument's kind and is
    /// reported on the outcome only if the settlement succeeds.
    #[tracing::instrument(
        skip_all,
        fields(operation = "charge", instrument = %redacted(method), amount = %amount)
    )]
    pub async fn charge<S: Settlement + ?Sized>(
        &self,
        method: &PaymentMethod,
        amount: Money,
        settlement: &S,
    ) -> Result<TransactionOutcome, EngineError> {
        self.check_request(Operation::Charge, method, amount)?;
        let quote = self.quote(method, amount)?;
        Ok(self.settle(Operation::Charge, quote.fee, settlement).await)
    }

    /// Refunds `amount` to `method`.
    ///
    /// Card refunds skip the CVV rule. No fee is taken on a refund.
    #[tracing::instrument(
        skip_all,
        fields(operation = "refund", instrument = %redacted(method), amount = %amount)
    )]
    pub async fn refund<S: Settlement + ?Sized>(
        &self,
        method: &PaymentMethod,
        amount: Money,
        settlement: &S,
    ) -> Result<TransactionOutcome, EngineError> {
        self.check_request(Operation::Refund, method, amount)?;
        let fee = Money::zero(amount.currency());
        Ok(self.settle(Operation::Refund, fee, settlement).await)
    }

    /// Moves `amount` out through a bank account or PayPal account.
    ///
    /// Cards cannot receive transfers and are rejected on the method field.
    #[tracing::instrument(
        skip_all,
        fields(operation = "transfer", instrument = %redacted(method), amount = %amount)
    )]
    pub async fn transfer<S: Settlement + ?Sized>(
        &self,
        method: &PaymentMethod,
        amount: Money,
        settlement: &S,
    ) -> Result<TransactionOutcome, EngineError> {
        self.amount_policy.check(amount).inspect_err(log_rejection)?;
        if matches!(method, PaymentMethod::CreditCard(_)) {
            let err = ValidationError::new(Field::Method, RuleKind::UnsupportedInstrument);
            log_rejection(&err);
            return Err(err.into());
        }
        self.check_instrument(Operation::Transfer, method)?;

        let quote = self.quote(method, amount)?;
        Ok(self.settle(Operation::Transfer, quote.fee, settlement).await)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Validation-only Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Checks that `method` is fit to be stored for later charges.
    ///
    /// Runs the same instrument rules as a charge; no amount, fee or
    /// settlement is involved.
    #[tracing::instrument(
        skip_all,
        fields(operation = "validate_for_storage", instrument = %redacted(method))
    )]
    pub fn validate_for_storage(
        &self,
        method: &PaymentMethod,
    ) -> Result<TransactionOutcome, EngineError> {
        self.check_instrument(Operation::ValidateForStorage, method)?;
        info!("instrument accepted for storage");
        Ok(TransactionOutcome::validated(Operation::ValidateForStorage))
    }

    /// Every failing field of a request, one error per field.
    ///
    /// Checks run in the same order and with the same rules as the operation
    /// itself, so the first entry is always the error the operation would
    /// return. Pass `None` for `amount` when the operation takes none.
    pub fn validation_report(
        &self,
        operation: Operation,
        method: &PaymentMethod,
        amount: Option<Money>,
    ) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = amount
            .and_then(|amount| self.amount_policy.check(amount).err())
            .into_iter()
            .collect();

        if operation == Operation::Transfer && matches!(method, PaymentMethod::CreditCard(_)) {
            errors.push(ValidationError::new(Field::Method, RuleKind::UnsupportedInstrument));
            return errors;
        }

        let today = (self.today)();
        errors.extend(self.validator.validate_all(method, card_context(operation), today));
        errors
    }

    /// The fee a charge or transfer of `amount` through `method` would incur.
    pub fn quote(&self, method: &PaymentMethod, amount: Money) -> Result<FeeQuote, EngineError> {
        let quote = self.fee_schedule.quote(method.kind(), amount)?;
        debug!(
            schedule = %quote.schedule,
            rule = %quote.rule,
            fee = %quote.fee,
            used_default = quote.used_default,
            "fee computed"
        );
        Ok(quote)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Pipeline Steps
    // ─────────────────────────────────────────────────────────────────────────────

    fn check_request(
        &self,
        operation: Operation,
        method: &PaymentMethod,
        amount: Money,
    ) -> Result<(), EngineError> {
        self.amount_policy.check(amount).inspect_err(log_rejection)?;
        self.check_instrument(operation, method)
    }

    fn check_instrument(
        &self,
        operation: Operation,
        method: &PaymentMethod,
    ) -> Result<(), EngineError> {
        self.validator
            .validate(method, card_context(operation), (self.today)())
            .inspect_err(log_rejection)?;
        Ok(())
    }

    async fn settle<S: Settlement + ?Sized>(
        &self,
        operation: Operation,
        fee: Money,
        settlement: &S,
    ) -> TransactionOutcome {
        let report = self.executor.run(settlement).await;

        match report.failure() {
            None => {
                info!(attempts = report.attempts, fee = %fee, "settlement succeeded");
                TransactionOutcome::succeeded(operation, fee, report.attempts)
            }
            Some(failure) => {
                warn!(attempts = report.attempts, error = %failure, "settlement failed");
                TransactionOutcome::failed(operation, report.attempts, failure)
            }
        }
    }
}

fn log_rejection(err: &ValidationError) {
    info!(field = %err.field, rule = %err.rule, "request rejected");
}
