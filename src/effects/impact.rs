use crate::core::chain::TransactionChain;
use crate::core::denomination::Denomination;
use crate::effects::snapshot::{effects, BalanceKey};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Net signed impact of `chain` in `denomination` as of `at`, measured on the
/// default address and asset.
///
/// Impact is `settled + unsettled`: what has moved plus what is still
/// committed to move. Released amounts are gone from both, so a released
/// authorisation has no impact, and settling an authorisation moves value
/// from `unsettled` to `settled` without changing the total.
///
/// ```
/// use posting_limits::core::chain::TransactionChain;
/// use posting_limits::core::denomination::Denomination;
/// use posting_limits::core::ids::{ChainId, ChainKey, PartyId};
/// use posting_limits::core::posting::{Direction, Posting, PostingKind};
/// use posting_limits::effects::impact::impact;
/// use chrono::Utc;
/// use rust_decimal_macros::dec;
///
/// let gbp = Denomination::new("GBP");
/// let auth = Posting::new(
///     PartyId::new("P"),
///     ChainId::new("1"),
///     PostingKind::Authorisation,
///     dec!(10),
///     Direction::Debit,
///     gbp.clone(),
///     Utc::now(),
/// );
/// let chain = TransactionChain::from_postings(ChainKey::new(PartyId::new("P"), ChainId::new("1")), [auth]);
/// assert_eq!(impact(&chain, &gbp, None), dec!(-10));
/// ```
pub fn impact(chain: &TransactionChain, denomination: &Denomination, at: Option<DateTime<Utc>>) -> Decimal {
    impact_for(chain, &BalanceKey::default_for(denomination), at)
}

/// [`impact`] on an explicit balance key.
pub fn impact_for(chain: &TransactionChain, key: &BalanceKey, at: Option<DateTime<Utc>>) -> Decimal {
    effects(chain, key, at).impact()
}
