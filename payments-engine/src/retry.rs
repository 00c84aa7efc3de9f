//! Retry executor.
//!
//! Runs a [`Settlement`] under a [`RetryPolicy`]:
//!
//! ```text
//! Idle -> Attempting -> Succeeded
//!                    -> Failed      (terminal error, remaining attempts skipped)
//!                    -> Retrying -> (backoff) -> Attempting
//!                    -> Exhausted   (max_attempts retryable failures)
//! ```
//!
//! Only the settlement's own classification decides whether to retry. An
//! attempt that outlives `per_attempt_timeout` is dropped and counts as a
//! retryable failure.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use payments_types::{Settlement, SettlementError, SettlementFailure};

/// Delay between a retryable failure and the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry immediately
    None,
    Fixed {
        #[serde(rename = "delay_ms", with = "duration_ms")]
        delay: Duration,
    },
    /// `base * 2^(retry-1)` capped at `max`, then spread by +/- `jitter_pct`%.
    Exponential {
        #[serde(rename = "base_ms", with = "duration_ms")]
        base: Duration,
        #[serde(rename = "max_ms", with = "duration_ms")]
        max: Duration,
        jitter_pct: u8,
    },
}

impl Backoff {
    /// Delay before retry number `retry` (1 for the first retry), without jitter.
    pub fn base_delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay } => delay,
            Backoff::Exponential { base, max, .. } => {
                let exp = retry.saturating_sub(1).min(30);
                base.saturating_mul(1u32 << exp).min(max)
            }
        }
    }

    /// Delay before retry number `retry`, jitter included.
    pub fn delay(&self, retry: u32) -> Duration {
        let delay = self.base_delay(retry);
        match *self {
            Backoff::Exponential { jitter_pct, .. } if jitter_pct > 0 && !delay.is_zero() => {
                let spread = delay.as_secs_f64() * f64::from(jitter_pct.min(100)) / 100.0;
                let offset = rand::rng().random_range(-spread..=spread);
                Duration::from_secs_f64((delay.as_secs_f64() + offset).max(0.0))
            }
            _ => delay,
        }
    }

    /// Longest delay this strategy can produce.
    pub fn max_delay(&self) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay } => delay,
            Backoff::Exponential {
                max, jitter_pct, ..
            } => max.saturating_add(max.saturating_mul(u32::from(jitter_pct.min(100))) / 100),
        }
    }
}

/// How many times, how long, and how far apart settlement attempts run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first. Must be at least 1.
    pub max_attempts: u32,
    #[serde(rename = "per_attempt_timeout_ms", with = "duration_ms")]
    pub per_attempt_timeout: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            per_attempt_timeout: Duration::from_secs(30),
            backoff: Backoff::Exponential {
                base: Duration::from_millis(200),
                max: Duration::from_secs(5),
                jitter_pct: 20,
            },
        }
    }
}

impl RetryPolicy {
    /// Upper bound on the wall time one execution may take.
    pub fn worst_case_duration(&self) -> Duration {
        let per_attempt = self.per_attempt_timeout + self.backoff.max_delay();
        per_attempt.saturating_mul(self.max_attempts)
    }
}

/// One settlement attempt as observed by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based
    pub attempt: u32,
    /// `None` when the attempt succeeded
    pub error: Option<SettlementError>,
}

/// Final state of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RetryResult {
    Succeeded,
    Failed { reason: String },
    Exhausted { last_reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryReport {
    /// Attempts actually made; never zero
    pub attempts: u32,
    pub result: RetryResult,
    pub history: Vec<AttemptRecord>,
}

impl RetryReport {
    pub fn succeeded(&self) -> bool {
        self.result == RetryResult::Succeeded
    }

    /// The settlement failure to surface, if the execution did not succeed.
    pub fn failure(&self) -> Option<SettlementFailure> {
        match &self.result {
            RetryResult::Succeeded => None,
            RetryResult::Failed { reason } => Some(SettlementFailure::Terminal {
                reason: reason.clone(),
            }),
            RetryResult::Exhausted { last_reason } => Some(SettlementFailure::Exhausted {
                attempts: self.attempts,
                last_reason: last_reason.clone(),
            }),
        }
    }
}

/// Runs settlements with bounded retries. Stateless between runs.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run<S: Settlement + ?Sized>(&self, settlement: &S) -> RetryReport {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut history = Vec::with_capacity(max_attempts as usize);
        let mut last_reason = String::new();

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, "settlement attempt");

            let outcome =
                tokio::time::timeout(self.policy.per_attempt_timeout, settlement.execute()).await;
            let error = match outcome {
                Ok(Ok(())) => {
                    history.push(AttemptRecord {
                        attempt,
                        error: None,
                    });
                    return RetryReport {
                        attempts: attempt,
                        result: RetryResult::Succeeded,
                        history,
                    };
                }
                Ok(Err(err)) => err,
                Err(_) => SettlementError::Retryable(format!(
                    "attempt timed out after {}ms",
                    self.policy.per_attempt_timeout.as_millis()
                )),
            };

            history.push(AttemptRecord {
                attempt,
                error: Some(error.clone()),
            });

            match error {
                SettlementError::Terminal(reason) => {
                    warn!(attempt, %reason, "terminal settlement failure");
                    return RetryReport {
                        attempts: attempt,
                        result: RetryResult::Failed { reason },
                        history,
                    };
                }
                SettlementError::Retryable(reason) => {
                    if attempt < max_attempts {
                        let delay = self.policy.backoff.delay(attempt);
                        warn!(
                            attempt,
                            max_attempts,
                            %reason,
                            delay_ms = delay.as_millis() as u64,
                            "retryable settlement failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        warn!(attempt, %reason, "settlement attempts exhausted");
                    }
                    last_reason = reason;
                }
            }
        }

        RetryReport {
            attempts: max_attempts,
            result: RetryResult::Exhausted { last_reason },
            history,
        }
    }
}

/// `Duration` as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
