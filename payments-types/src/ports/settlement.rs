//! Settlement port.
//!
//! A settlement is the side effect that actually moves money: a card network
//! authorization, a bank rail transfer, a PayPal API call. It is supplied per
//! operation by the caller and run by the engine's retry executor.

use std::future::Future;

use crate::error::SettlementError;

/// What one settlement attempt reports.
pub type SettlementResult = Result<(), SettlementError>;

/// Port trait for settlement adapters.
///
/// Implementations must classify their own failures as retryable or
/// terminal. Callers that need idempotency across retries (not charging
/// twice) must carry an idempotency key inside the implementation; the
/// engine does not deduplicate.
#[async_trait::async_trait]
pub trait Settlement: Send + Sync {
    /// Performs one settlement attempt.
    async fn execute(&self) -> SettlementResult;
}

/// Any closure returning an owned future is a settlement.
#[async_trait::async_trait]
impl<F, Fut> Settlement for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = SettlementResult> + Send + 'static,
{
    async fn execute(&self) -> SettlementResult {
        (self)().await
    }
}
