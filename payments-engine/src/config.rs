//! Engine configuration.
//!
//! Everything the engine decides with (bounds, fees, retry behaviour,
//! validator parameters) is supplied here at construction time.

use std::{env, fs, str::FromStr, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use payments_types::FeeComputationError;

use crate::amount::AmountPolicy;
use crate::fees::FeeSchedule;
use crate::retry::{Backoff, RetryPolicy};
use crate::validation::ValidatorConfig;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub amount_policy: AmountPolicy,
    pub fee_schedule: FeeSchedule,
    pub retry_policy: RetryPolicy,
    pub validator: ValidatorConfig,
}

/// Configuration the engine refuses to run with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("amount bounds must satisfy 0 <= min < max, got min {min} and max {max}")]
    InvalidAmountBounds { min: i64, max: i64 },

    #[error("retry policy needs at least one attempt")]
    ZeroAttempts,

    #[error("per-attempt timeout must be greater than zero")]
    ZeroTimeout,

    #[error("backoff jitter must be at most 100%, got {0}%")]
    JitterOutOfRange(u8),

    #[error("routing number length must be greater than zero")]
    ZeroRoutingLength,

    #[error(transparent)]
    FeeSchedule(#[from] FeeComputationError),
}

impl EngineConfig {
    /// Loads configuration from the environment (and a `.env` file if present).
    ///
    /// | variable                         | default                 |
    /// |----------------------------------|-------------------------|
    /// | `PAYMENTS_MIN_AMOUNT`            | 0                       |
    /// | `PAYMENTS_MAX_AMOUNT`            | 1000000                 |
    /// | `PAYMENTS_RETRY_MAX_ATTEMPTS`    | 3                       |
    /// | `PAYMENTS_RETRY_TIMEOUT_MS`      | 30000                   |
    /// | `PAYMENTS_RETRY_BASE_DELAY_MS`   | 200 (0 disables backoff)|
    /// | `PAYMENTS_RETRY_MAX_DELAY_MS`    | 5000                    |
    /// | `PAYMENTS_RETRY_JITTER_PCT`      | 20                      |
    /// | `PAYMENTS_ROUTING_NUMBER_LENGTH` | 9                       |
    /// | `PAYMENTS_FEE_SCHEDULE_PATH`     | built-in `standard-2024`|
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let amount_policy = AmountPolicy::new(
            parse_or(&lookup, "PAYMENTS_MIN_AMOUNT", defaults.amount_policy.min_amount)?,
            parse_or(&lookup, "PAYMENTS_MAX_AMOUNT", defaults.amount_policy.max_amount)?,
        );

        let (default_base, default_max, default_jitter) = match defaults.retry_policy.backoff {
            Backoff::Exponential {
                base,
                max,
                jitter_pct,
            } => (base.as_millis() as u64, max.as_millis() as u64, jitter_pct),
            _ => (0, 0, 0),
        };
        let base_ms = parse_or(&lookup, "PAYMENTS_RETRY_BASE_DELAY_MS", default_base)?;
        let max_ms = parse_or(&lookup, "PAYMENTS_RETRY_MAX_DELAY_MS", default_max)?;
        let jitter_pct = parse_or(&lookup, "PAYMENTS_RETRY_JITTER_PCT", default_jitter)?;
        let backoff = if base_ms == 0 {
            Backoff::None
        } else {
            Backoff::Exponential {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
                jitter_pct,
            }
        };
        let retry_policy = RetryPolicy {
            max_attempts: parse_or(
                &lookup,
                "PAYMENTS_RETRY_MAX_ATTEMPTS",
                defaults.retry_policy.max_attempts,
            )?,
            per_attempt_timeout: Duration::from_millis(parse_or(
                &lookup,
                "PAYMENTS_RETRY_TIMEOUT_MS",
                defaults.retry_policy.per_attempt_timeout.as_millis() as u64,
            )?),
            backoff,
        };

        let fee_schedule = match lookup("PAYMENTS_FEE_SCHEDULE_PATH") {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read fee schedule {path}"))?;
                FeeSchedule::from_json(&json)
                    .with_context(|| format!("failed to parse fee schedule {path}"))?
            }
            None => defaults.fee_schedule,
        };

        let validator = ValidatorConfig {
            routing_number_length: parse_or(
                &lookup,
                "PAYMENTS_ROUTING_NUMBER_LENGTH",
                defaults.validator.routing_number_length,
            )?,
        };

        let config = Self {
            amount_policy,
            fee_schedule,
            retry_policy,
            validator,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let AmountPolicy {
            min_amount,
            max_amount,
        } = self.amount_policy;
        if min_amount < 0 || min_amount >= max_amount {
            return Err(ConfigError::InvalidAmountBounds {
                min: min_amount,
                max: max_amount,
            });
        }

        if self.retry_policy.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.retry_policy.per_attempt_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Backoff::Exponential { jitter_pct, .. } = self.retry_policy.backoff
            && jitter_pct > 100
        {
            return Err(ConfigError::JitterOutOfRange(jitter_pct));
        }

        if self.validator.routing_number_length == 0 {
            return Err(ConfigError::ZeroRoutingLength);
        }

        self.fee_schedule.validate()?;
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use payments_types::MethodKind;

    use crate::fees::FeeRule;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<EngineConfig> {
        EngineConfig::from_lookup(lookup_from(vars))
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = load(&[]).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_from_variables() {
        let config = load(&[
            ("PAYMENTS_MAX_AMOUNT", "500000"),
            ("PAYMENTS_RETRY_MAX_ATTEMPTS", "5"),
            ("PAYMENTS_RETRY_TIMEOUT_MS", "2500"),
            ("PAYMENTS_RETRY_BASE_DELAY_MS", "50"),
            ("PAYMENTS_RETRY_MAX_DELAY_MS", "400"),
            ("PAYMENTS_RETRY_JITTER_PCT", "0"),
            ("PAYMENTS_ROUTING_NUMBER_LENGTH", " 6 "),
        ])
        .unwrap();

        let retry = config.retry_policy;
        assert_eq!(config.amount_policy.max_amount, 500_000);
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.per_attempt_timeout, Duration::from_millis(2_500));
        assert_eq!(
            retry.backoff,
            Backoff::Exponential {
                base: Duration::from_millis(50),
                max: Duration::from_millis(400),
                jitter_pct: 0,
            }
        );
        assert_eq!(config.validator.routing_number_length, 6);
    }

    #[test]
    fn test_zero_base_delay_disables_backoff() {
        let config = load(&[("PAYMENTS_RETRY_BASE_DELAY_MS", "0")]).unwrap();
        assert_eq!(config.retry_policy.backoff, Backoff::None);
    }

    #[test]
    fn test_unparsable_variable_is_reported() {
        let err = load(&[("PAYMENTS_MAX_AMOUNT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("PAYMENTS_MAX_AMOUNT"));
    }

    #[test]
    fn test_inconsistent_bounds_are_rejected() {
        let err = load(&[
            ("PAYMENTS_MIN_AMOUNT", "1000"),
            ("PAYMENTS_MAX_AMOUNT", "1000"),
        ])
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidAmountBounds {
                min: 1000,
                max: 1000,
            })
        );
    }

    #[test]
    fn test_validate_rejects_bad_retry_policy() {
        let mut config = EngineConfig::default();
        config.retry_policy.max_attempts = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroAttempts));

        let mut config = EngineConfig::default();
        config.retry_policy.per_attempt_timeout = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));

        let mut config = EngineConfig::default();
        config.retry_policy.backoff = Backoff::Exponential {
            base: Duration::from_millis(10),
            max: Duration::from_millis(20),
            jitter_pct: 150,
        };
        assert_eq!(config.validate(), Err(ConfigError::JitterOutOfRange(150)));
    }

    #[test]
    fn test_validate_rejects_partial_fee_schedule() {
        let card = FeeRule::variable("card", 290, 30);
        let config = EngineConfig {
            fee_schedule: FeeSchedule::new("cards-only", date(2025, 1, 1))
                .with_rule(MethodKind::CreditCard, card),
            ..EngineConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::FeeSchedule(FeeComputationError::IncompleteSchedule { .. }))
        ));
    }

    #[test]
    fn test_fee_schedule_loaded_from_file() {
        let file_name = format!("fee-schedule-{}.json", std::process::id());
        let path = env::temp_dir().join(file_name);
        let schedule = FeeSchedule::new("file-2025", date(2025, 3, 1))
            .with_default(FeeRule::flat("file-default", 99));
        let json = serde_json::to_string(&schedule).unwrap();
        fs::write(&path, json).unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = load(&[("PAYMENTS_FEE_SCHEDULE_PATH", &path_str)]).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.fee_schedule, schedule);
    }

    #[test]
    fn test_missing_fee_schedule_file() {
        let err = load(&[("PAYMENTS_FEE_SCHEDULE_PATH", "/nonexistent/fees.json")]).unwrap_err();
        assert!(err.to_string().contains("failed to read fee schedule"));
    }
}
