use crate::core::chain::TransactionChain;
use crate::core::denomination::Denomination;
use crate::core::posting::{Posting, PostingKind, DEFAULT_ADDRESS, DEFAULT_ASSET};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Balance dimension a snapshot is taken for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    pub address: String,
    pub asset: String,
    pub denomination: Denomination,
}

impl BalanceKey {
    pub fn new(
        address: impl Into<String>,
        asset: impl Into<String>,
        denomination: Denomination,
    ) -> Self {
        Self {
            address: address.into(),
            asset: asset.into(),
            denomination,
        }
    }

    /// Default address and asset in `denomination`.
    pub fn default_for(denomination: &Denomination) -> Self {
        Self::new(DEFAULT_ADDRESS, DEFAULT_ASSET, denomination.clone())
    }

    pub fn matches(&self, posting: &Posting) -> bool {
        posting.denomination() == &self.denomination
            && posting.address() == self.address
            && posting.asset() == self.asset
    }
}

impl fmt::Display for BalanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.address, self.asset, self.denomination)
    }
}

/// Cumulative state of one chain for one balance key as of an instant.
///
/// All four values are signed in the account's convention (credit +,
/// debit -).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effects {
    /// Intended movement, net of adjustments, excluding released amounts.
    pub authorised: Decimal,
    /// Finalised movement.
    pub settled: Decimal,
    /// Authorised movement not yet settled or released.
    pub unsettled: Decimal,
    /// Movement explicitly given up by a release or a final settlement.
    pub released: Decimal,
}

impl Effects {
    /// Net financial effect: settled plus still-outstanding.
    pub fn impact(&self) -> Decimal {
        self.settled + self.unsettled
    }

    fn apply(&mut self, posting: &Posting) {
        let amount = posting.signed_amount();
        match posting.kind() {
            PostingKind::Authorisation => {
                self.authorised += amount;
                self.unsettled += amount;
            }
            PostingKind::AuthorisationAdjustment => {
                self.authorised += amount;
                self.unsettled = without_sign_flip(self.unsettled, self.unsettled + amount);
            }
            PostingKind::Settlement { is_final } => {
                self.settled += amount;
                if !self.unsettled.is_zero() {
                    self.unsettled = without_sign_flip(self.unsettled, self.unsettled - amount);
                }
                if is_final {
                    self.release_outstanding();
                }
            }
            PostingKind::Release => self.release_outstanding(),
            PostingKind::HardSettlement | PostingKind::Transfer => {
                self.settled += amount;
            }
        }
    }

    fn release_outstanding(&mut self) {
        self.released += self.unsettled;
        self.authorised -= self.unsettled;
        self.unsettled = Decimal::ZERO;
    }
}

/// An outstanding amount may shrink to zero but never changes direction.
fn without_sign_flip(before: Decimal, after: Decimal) -> Decimal {
    if before.is_zero() || after.is_zero() || before.is_sign_negative() == after.is_sign_negative() {
        after
    } else {
        Decimal::ZERO
    }
}

/// Effects of `chain` on `key`, counting postings with value instant at or
/// before `at`. `None` counts every posting.
///
/// Postings for other balance keys are skipped. An empty chain yields
/// all-zero effects.
pub fn effects(chain: &TransactionChain, key: &BalanceKey, at: Option<DateTime<Utc>>) -> Effects {
    let mut effects = Effects::default();
    for posting in chain.postings() {
        if at.is_some_and(|at| posting.value_at() > at) {
            // Chains are ordered by value instant.
            break;
        }
        if key.matches(posting) {
            effects.apply(posting);
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{ChainId, ChainKey, PartyId};
    use crate::core::posting::Direction;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn gbp() -> BalanceKey {
        BalanceKey::default_for(&Denomination::new("GBP"))
    }

    fn debit(kind: PostingKind, amount: Decimal, hours: i64) -> Posting {
        Posting::new(
            PartyId::new("P"),
            ChainId::new("1"),
            kind,
            amount,
            Direction::Debit,
            Denomination::new("GBP"),
            t(hours),
        )
    }

    fn chain(postings: Vec<Posting>) -> TransactionChain {
        TransactionChain::from_postings(ChainKey::new(PartyId::new("P"), ChainId::new("1")), postings)
    }

    fn expect(e: Effects, authorised: Decimal, settled: Decimal, unsettled: Decimal, released: Decimal) {
        assert_eq!(
            (e.authorised, e.settled, e.unsettled, e.released),
            (authorised, settled, unsettled, released)
        );
    }

    #[test]
    fn test_empty_chain_is_zero() {
        let e = effects(&chain(vec![]), &gbp(), None);
        assert_eq!(e, Effects::default());
        assert_eq!(e.impact(), Decimal::ZERO);
    }

    #[test]
    fn test_hard_settlement() {
        let c = chain(vec![debit(PostingKind::HardSettlement, dec!(10), 0)]);
        expect(effects(&c, &gbp(), None), dec!(0), dec!(-10), dec!(0), dec!(0));
    }

    #[test]
    fn test_authorisation() {
        let c = chain(vec![debit(PostingKind::Authorisation, dec!(10), 0)]);
        expect(effects(&c, &gbp(), None), dec!(-10), dec!(0), dec!(-10), dec!(0));
    }

    #[test]
    fn test_authorisation_with_adjustment() {
        let c = chain(vec![
            debit(PostingKind::Authorisation, dec!(10), 0),
            debit(PostingKind::AuthorisationAdjustment, dec!(5), 1),
        ]);
        expect(effects(&c, &gbp(), None), dec!(-15), dec!(0), dec!(-15), dec!(0));
    }

    #[test]
    fn test_full_settlement() {
        let c = chain(vec![
            debit(PostingKind::Authorisation, dec!(10), 0),
            debit(PostingKind::Settlement { is_final: true }, dec!(10), 1),
        ]);
        expect(effects(&c, &gbp(), None), dec!(-10), dec!(-10), dec!(0), dec!(0));
    }

    #[test]
    fn test_non_final_partial_settlement() {
        let c = chain(vec![
            debit(PostingKind::Authorisation, dec!(10), 0),
            debit(PostingKind::Settlement { is_final: false }, dec!(5), 1),
        ]);
        expect(effects(&c, &gbp(), None), dec!(-10), dec!(-5), dec!(-5), dec!(0));
    }

    #[test]
    fn test_final_partial_settlement_releases_rest() {
        let c = chain(vec![
            debit(PostingKind::Authorisation, dec!(10), 0),
            debit(PostingKind::Settlement { is_final: true }, dec!(5), 1),
        ]);
        expect(effects(&c, &gbp(), None), dec!(-5), dec!(-5), dec!(0), dec!(-5));
    }

    #[test]
    fn test_oversettlement() {
        let c = chain(vec![
            debit(PostingKind::Authorisation, dec!(10), 0),
            debit(PostingKind::Settlement { is_final: false }, dec!(15), 1),
        ]);
        let e = effects(&c, &gbp(), None);
        assert_eq!(e.settled, dec!(-15));
        assert_eq!(e.unsettled, Decimal::ZERO);
    }

    #[test]
    fn test_release() {
        let c = chain(vec![
            debit(PostingKind::Authorisation, dec!(10), 0),
            debit(PostingKind::Release, dec!(10), 1),
        ]);
        expect(effects(&c, &gbp(), None), dec!(0), dec!(0), dec!(0), dec!(-10));
    }

    #[test]
    fn test_release_ignores_stated_amount() {
        let c = chain(vec![
            debit(PostingKind::Authorisation, dec!(10), 0),
            debit(PostingKind::Settlement { is_final: false }, dec!(4), 1),
            debit(PostingKind::Release, dec!(1), 2),
        ]);
        expect(effects(&c, &gbp(), None), dec!(-4), dec!(-4), dec!(0), dec!(-6));
    }

    #[test]
    fn test_settlement_without_authorisation() {
        let c = chain(vec![debit(PostingKind::Settlement { is_final: false }, dec!(7), 0)]);
        expect(effects(&c, &gbp(), None), dec!(0), dec!(-7), dec!(0), dec!(0));
    }

    #[test]
    fn test_adjustment_cannot_flip_outstanding_direction() {
        let credit_adjustment = Posting::new(
            PartyId::new("P"),
            ChainId::new("1"),
            PostingKind::AuthorisationAdjustment,
            dec!(15),
            Direction::Credit,
            Denomination::new("GBP"),
            t(1),
        );
        let c = chain(vec![debit(PostingKind::Authorisation, dec!(10), 0), credit_adjustment]);
        let e = effects(&c, &gbp(), None);
        assert_eq!(e.authorised, dec!(5));
        assert_eq!(e.unsettled, Decimal::ZERO);
    }

    #[test]
    fn test_snapshot_is_inclusive_at_instant() {
        let c = chain(vec![
            debit(PostingKind::Authorisation, dec!(10), 0),
            debit(PostingKind::Settlement { is_final: true }, dec!(10), 5),
        ]);
        expect(effects(&c, &gbp(), Some(t(4))), dec!(-10), dec!(0), dec!(-10), dec!(0));
        expect(effects(&c, &gbp(), Some(t(5))), dec!(-10), dec!(-10), dec!(0), dec!(0));
        assert_eq!(effects(&c, &gbp(), Some(t(-1))), Effects::default());
    }

    #[test]
    fn test_other_balance_keys_are_skipped() {
        let c = chain(vec![
            debit(PostingKind::HardSettlement, dec!(10), 0),
            debit(PostingKind::HardSettlement, dec!(3), 1).with_address("INTERNAL"),
        ]);
        assert_eq!(effects(&c, &gbp(), None).settled, dec!(-10));

        let internal = BalanceKey::new("INTERNAL", DEFAULT_ASSET, Denomination::new("GBP"));
        assert_eq!(effects(&c, &internal, None).settled, dec!(-3));

        let usd = BalanceKey::default_for(&Denomination::new("USD"));
        assert_eq!(effects(&c, &usd, None), Effects::default());
    }
}
