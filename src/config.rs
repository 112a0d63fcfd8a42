//! Limit product configuration.
//!
//! Loaded from JSON, validated once, then used to run every configured
//! limit check over a batch.
//!
//! ```json
//! {
//!   "denomination": "GBP",
//!   "utc_offset_minutes": 60,
//!   "max_daily_withdrawal": "500",
//!   "max_daily_deposit": "10000",
//!   "net_batch": true,
//!   "payment_type_limits": [
//!     { "payment_type": "ATM", "max_amount": "250", "window": "daily" }
//!   ]
//! }
//! ```

use crate::core::calendar::LimitWindow;
use crate::core::chain::ChainBook;
use crate::core::denomination::Denomination;
use crate::core::posting::Posting;
use crate::limits::daily::{validate_daily_deposit, validate_daily_withdrawal};
use crate::limits::payment_type::{
    validate_payment_type_limits, PaymentType, PaymentTypeLimit, PaymentTypeLimits,
    DEFAULT_PAYMENT_TYPE_KEY,
};
use crate::limits::rejection::Rejection;
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors arising while loading or validating a [`LimitConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),
    #[error("{name} must not be negative, got {value}")]
    NegativeLimit { name: String, value: Decimal },
    #[error("payment type {payment_type} has more than one {window} limit")]
    DuplicatePaymentTypeLimit {
        payment_type: PaymentType,
        window: LimitWindow,
    },
}

/// Limits configured for one account product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitConfig {
    pub denomination: Denomination,
    /// Offset of the account's local calendar from UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub max_daily_deposit: Option<Decimal>,
    #[serde(default)]
    pub max_daily_withdrawal: Option<Decimal>,
    /// Offset deposits and withdrawals within one batch before checking.
    #[serde(default = "default_net_batch")]
    pub net_batch: bool,
    #[serde(default = "default_payment_type_key")]
    pub payment_type_detail_key: String,
    #[serde(default)]
    pub payment_type_limits: Vec<PaymentTypeLimit>,
}

fn default_net_batch() -> bool {
    true
}

fn default_payment_type_key() -> String {
    DEFAULT_PAYMENT_TYPE_KEY.to_string()
}

impl LimitConfig {
    /// A config with no limits in `denomination`.
    pub fn new(denomination: Denomination) -> Self {
        Self {
            denomination,
            utc_offset_minutes: 0,
            max_daily_deposit: None,
            max_daily_withdrawal: None,
            net_batch: default_net_batch(),
            payment_type_detail_key: default_payment_type_key(),
            payment_type_limits: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: LimitConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check ranges and uniqueness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.offset()?;

        let named = [
            ("max_daily_deposit", self.max_daily_deposit),
            ("max_daily_withdrawal", self.max_daily_withdrawal),
        ];
        for (name, value) in named {
            if let Some(value) = value.filter(|v| *v < Decimal::ZERO) {
                return Err(ConfigError::NegativeLimit {
                    name: name.to_string(),
                    value,
                });
            }
        }

        let mut seen = HashSet::new();
        for limit in &self.payment_type_limits {
            if limit.max_amount < Decimal::ZERO {
                return Err(ConfigError::NegativeLimit {
                    name: format!("{} {} limit", limit.window, limit.payment_type),
                    value: limit.max_amount,
                });
            }
            if !seen.insert((limit.payment_type.clone(), limit.window)) {
                return Err(ConfigError::DuplicatePaymentTypeLimit {
                    payment_type: limit.payment_type.clone(),
                    window: limit.window,
                });
            }
        }
        Ok(())
    }

    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_minutes))
    }

    /// Start of the account's current local day.
    pub fn daily_cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ConfigError> {
        Ok(LimitWindow::Daily.cutoff(now, self.offset()?))
    }

    /// Run every configured check: daily withdrawal, daily deposit, then
    /// payment types. The first breach wins.
    ///
    /// Returns a [`ConfigError`] only if the config was never validated and
    /// its offset is out of range.
    pub fn validate_batch(
        &self,
        now: DateTime<Utc>,
        history: &ChainBook,
        batch: &[Posting],
    ) -> Result<Result<(), Rejection>, ConfigError> {
        let offset = self.offset()?;
        let cutoff = LimitWindow::Daily.cutoff(now, offset);
        Ok(self.run_checks(now, offset, cutoff, history, batch))
    }

    fn run_checks(
        &self,
        now: DateTime<Utc>,
        offset: FixedOffset,
        cutoff: DateTime<Utc>,
        history: &ChainBook,
        batch: &[Posting],
    ) -> Result<(), Rejection> {
        if let Some(limit) = self.max_daily_withdrawal {
            validate_daily_withdrawal(&self.denomination, cutoff, history, batch, limit, self.net_batch)?;
        }
        if let Some(limit) = self.max_daily_deposit {
            validate_daily_deposit(&self.denomination, cutoff, history, batch, limit, self.net_batch)?;
        }
        let payment_types = PaymentTypeLimits::new(self.payment_type_limits.clone());
        validate_payment_type_limits(
            &self.denomination,
            now,
            offset,
            history,
            batch,
            &payment_types,
            &self.payment_type_detail_key,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{ChainId, PartyId};
    use crate::core::posting::{Direction, PostingKind};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"{
        "denomination": "GBP",
        "utc_offset_minutes": 60,
        "max_daily_withdrawal": "500",
        "payment_type_limits": [
            { "payment_type": "ATM", "max_amount": "250" },
            { "payment_type": "ATM", "max_amount": "2000", "window": "monthly" }
        ]
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = LimitConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.denomination, Denomination::new("GBP"));
        assert_eq!(config.max_daily_withdrawal, Some(dec!(500)));
        assert_eq!(config.max_daily_deposit, None);
        assert!(config.net_batch);
        assert_eq!(config.payment_type_detail_key, DEFAULT_PAYMENT_TYPE_KEY);
        assert_eq!(config.payment_type_limits[0].window, LimitWindow::Daily);
        assert_eq!(config.payment_type_limits[1].window, LimitWindow::Monthly);
        assert_eq!(config.offset().unwrap().local_minus_utc(), 3600);
    }

    #[test]
    fn test_negative_limit_rejected() {
        let json = r#"{ "denomination": "GBP", "max_daily_deposit": "-1" }"#;
        assert!(matches!(
            LimitConfig::from_json_str(json),
            Err(ConfigError::NegativeLimit { .. })
        ));
    }

    #[test]
    fn test_duplicate_payment_type_rejected() {
        let json = r#"{
            "denomination": "GBP",
            "payment_type_limits": [
                { "payment_type": "POS", "max_amount": "1" },
                { "payment_type": "POS", "max_amount": "2", "window": "daily" }
            ]
        }"#;
        assert!(matches!(
            LimitConfig::from_json_str(json),
            Err(ConfigError::DuplicatePaymentTypeLimit { .. })
        ));
    }

    #[test]
    fn test_offset_out_of_range() {
        let json = r#"{ "denomination": "GBP", "utc_offset_minutes": 2000 }"#;
        assert!(matches!(
            LimitConfig::from_json_str(json),
            Err(ConfigError::InvalidOffset(2000))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            LimitConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_daily_cutoff_uses_local_calendar() {
        let config = LimitConfig::from_json_str(SAMPLE).unwrap();
        // 23:30 UTC is 00:30 the next day at UTC+1.
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap();
        assert_eq!(
            config.daily_cutoff(now).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 23, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_validate_batch_first_breach_wins() {
        let config = LimitConfig::from_json_str(SAMPLE).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        let withdrawal = Posting::new(
            PartyId::new("ATM-NET"),
            ChainId::new("w1"),
            PostingKind::HardSettlement,
            dec!(600),
            Direction::Debit,
            Denomination::new("GBP"),
            now,
        )
        .with_detail("PAYMENT_TYPE", "ATM");

        let rejection = config
            .validate_batch(now, &ChainBook::new(), &[withdrawal])
            .unwrap()
            .unwrap_err();
        assert!(rejection.message.contains("withdrawal"));
    }

    #[test]
    fn test_validate_batch_without_limits_passes() {
        let config = LimitConfig::new(Denomination::new("GBP"));
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        let big = Posting::new(
            PartyId::new("P"),
            ChainId::new("1"),
            PostingKind::Transfer,
            dec!(1_000_000),
            Direction::Debit,
            Denomination::new("GBP"),
            now,
        );
        assert_eq!(config.validate_batch(now, &ChainBook::new(), &[big]).unwrap(), Ok(()));
    }
}
