use crate::aggregation::category::CategorySummer;
use crate::core::calendar::LimitWindow;
use crate::core::chain::ChainBook;
use crate::core::denomination::{display_amount, Denomination};
use crate::core::posting::Posting;
use crate::limits::rejection::Rejection;
use chrono::{DateTime, FixedOffset, Utc};
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Instruction-detail key payment types are read from by default.
pub const DEFAULT_PAYMENT_TYPE_KEY: &str = "PAYMENT_TYPE";

/// A payment type such as `ATM` or `POS`, as tagged on a posting's
/// instruction details.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentType(String);

impl PaymentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum amount of one payment type per window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTypeLimit {
    pub payment_type: PaymentType,
    pub max_amount: Decimal,
    #[serde(default)]
    pub window: LimitWindow,
}

/// The configured limits, and with them the closed set of payment types
/// the product knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentTypeLimits {
    limits: Vec<PaymentTypeLimit>,
    known: BTreeSet<PaymentType>,
}

impl PaymentTypeLimits {
    pub fn new(limits: Vec<PaymentTypeLimit>) -> Self {
        let known = limits.iter().map(|l| l.payment_type.clone()).collect();
        Self { limits, known }
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    pub fn limits(&self) -> &[PaymentTypeLimit] {
        &self.limits
    }

    /// The posting's payment type under `detail_key`, if it is one of the
    /// known types. Untagged postings and unknown tags yield `None`.
    pub fn payment_type_of(&self, posting: &Posting, detail_key: &str) -> Option<&PaymentType> {
        let tag = posting.detail(detail_key)?;
        self.known.iter().find(|t| t.as_str() == tag)
    }

    fn for_type<'a>(&'a self, payment_type: &'a PaymentType) -> impl Iterator<Item = &'a PaymentTypeLimit> {
        self.limits.iter().filter(move |l| &l.payment_type == payment_type)
    }
}

/// Reject `batch` if any of its tagged debits would take its payment type
/// over a configured limit.
///
/// Each debit posting in `denomination` with a known payment type is checked
/// against every limit for that type: tagged debits since the limit's window
/// cutoff, across history and the rest of the batch but excluding the
/// posting's own chain, plus the posting's amount, must not exceed the
/// maximum.
pub fn validate_payment_type_limits(
    denomination: &Denomination,
    now: DateTime<Utc>,
    offset: FixedOffset,
    history: &ChainBook,
    batch: &[Posting],
    limits: &PaymentTypeLimits,
    detail_key: &str,
) -> Result<(), Rejection> {
    if limits.is_empty() {
        return Ok(());
    }
    let combined = history.with_proposed(batch);

    for posting in batch {
        if !posting.is_debit() || posting.denomination() != denomination {
            continue;
        }
        let Some(payment_type) = limits.payment_type_of(posting, detail_key) else {
            continue;
        };

        for limit in limits.for_type(payment_type) {
            let cutoff = limit.window.cutoff(now, offset);
            let previous = -CategorySummer::sum_tagged_debits(
                denomination,
                cutoff,
                &combined,
                Some(posting.chain_id()),
                detail_key,
                payment_type.as_str(),
            );
            let total = previous + posting.amount();

            if total > limit.max_amount {
                info!(
                    "rejecting batch: {} {} total {} {} over limit {}",
                    limit.window, payment_type, total, denomination, limit.max_amount
                );
                return Err(Rejection::against_terms(format!(
                    "Transaction would cause the {} {} limit of {} {} to be exceeded ({} total {} {}).",
                    limit.window,
                    payment_type,
                    display_amount(limit.max_amount),
                    denomination,
                    limit.window,
                    display_amount(total),
                    denomination
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{ChainId, PartyId};
    use crate::core::posting::{Direction, PostingKind};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn gbp() -> Denomination {
        Denomination::new("GBP")
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 15, 12, 0, 0).unwrap()
    }

    fn atm(chain: &str, amount: Decimal, at: DateTime<Utc>) -> Posting {
        Posting::new(
            PartyId::new("P"),
            ChainId::new(chain),
            PostingKind::HardSettlement,
            amount,
            Direction::Debit,
            gbp(),
            at,
        )
        .with_detail(DEFAULT_PAYMENT_TYPE_KEY, "ATM")
    }

    fn limits() -> PaymentTypeLimits {
        PaymentTypeLimits::new(vec![
            PaymentTypeLimit {
                payment_type: PaymentType::new("ATM"),
                max_amount: dec!(250),
                window: LimitWindow::Daily,
            },
            PaymentTypeLimit {
                payment_type: PaymentType::new("ATM"),
                max_amount: dec!(1000),
                window: LimitWindow::Monthly,
            },
        ])
    }

    fn validate(history: &ChainBook, batch: &[Posting]) -> Result<(), Rejection> {
        validate_payment_type_limits(&gbp(), now(), utc(), history, batch, &limits(), DEFAULT_PAYMENT_TYPE_KEY)
    }

    #[test]
    fn test_daily_limit() {
        let history: ChainBook = vec![atm("h1", dec!(200), now() - Duration::hours(2))]
            .into_iter()
            .collect();
        assert!(validate(&history, &[atm("b", dec!(50), now())]).is_ok());

        let err = validate(&history, &[atm("b", dec!(51), now())]).unwrap_err();
        assert!(err.message.contains("daily ATM limit of 250 GBP"));
    }

    #[test]
    fn test_monthly_limit_counts_earlier_days() {
        let history: ChainBook = vec![
            atm("h1", dec!(240), now() - Duration::days(3)),
            atm("h2", dec!(240), now() - Duration::days(5)),
            atm("h3", dec!(240), now() - Duration::days(7)),
            atm("h4", dec!(240), now() - Duration::days(9)),
            atm("last-month", dec!(900), now() - Duration::days(20)),
        ]
        .into_iter()
        .collect();
        let err = validate(&history, &[atm("b", dec!(50), now())]).unwrap_err();
        assert!(err.message.contains("monthly ATM limit of 1000 GBP"));
        assert!(validate(&history, &[atm("b", dec!(40), now())]).is_ok());
    }

    #[test]
    fn test_rest_of_batch_counts() {
        let batch = vec![atm("b1", dec!(130), now()), atm("b2", dec!(130), now())];
        assert!(validate(&ChainBook::new(), &batch).is_err());
        assert!(validate(&ChainBook::new(), &batch[..1]).is_ok());
    }

    #[test]
    fn test_unknown_and_untagged_types_unlimited() {
        let unknown = atm("b1", dec!(10_000), now()).with_detail(DEFAULT_PAYMENT_TYPE_KEY, "CRYPTO");
        let untagged = Posting::new(
            PartyId::new("P"),
            ChainId::new("b2"),
            PostingKind::HardSettlement,
            dec!(10_000),
            Direction::Debit,
            gbp(),
            now(),
        );
        assert!(validate(&ChainBook::new(), &[unknown, untagged]).is_ok());
    }

    #[test]
    fn test_credits_not_limited() {
        let refund = Posting::new(
            PartyId::new("P"),
            ChainId::new("b"),
            PostingKind::HardSettlement,
            dec!(5000),
            Direction::Credit,
            gbp(),
            now(),
        )
        .with_detail(DEFAULT_PAYMENT_TYPE_KEY, "ATM");
        assert!(validate(&ChainBook::new(), &[refund]).is_ok());
    }

    #[test]
    fn test_payment_type_of_uses_closed_set() {
        let l = limits();
        let p = atm("x", dec!(1), now());
        assert_eq!(l.payment_type_of(&p, DEFAULT_PAYMENT_TYPE_KEY), Some(&PaymentType::new("ATM")));
        assert_eq!(l.payment_type_of(&p, "OTHER_KEY"), None);
    }
}
