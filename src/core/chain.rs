use crate::core::ids::ChainKey;
use crate::core::posting::{Posting, PostingKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every posting sharing one (party id, chain id): an authorisation, its
/// adjustments, settlements and at most one release. A one-shot instruction
/// (hard settlement, transfer) is a chain of exactly one posting.
///
/// Postings are kept ordered by value instant. Postings with equal instants
/// keep the order they were added in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionChain {
    key: ChainKey,
    postings: Vec<Posting>,
}

impl TransactionChain {
    pub fn new(key: ChainKey) -> Self {
        Self {
            key,
            postings: Vec::new(),
        }
    }

    /// Build a chain from postings that all carry `key`.
    pub fn from_postings(key: ChainKey, postings: impl IntoIterator<Item = Posting>) -> Self {
        let mut chain = Self::new(key);
        for posting in postings {
            chain.push(posting);
        }
        chain
    }

    /// Insert a posting at its causal position.
    pub fn push(&mut self, posting: Posting) {
        debug_assert_eq!(posting.chain_key(), self.key, "posting belongs to another chain");
        let at = posting.value_at();
        let idx = self.postings.partition_point(|p| p.value_at() <= at);
        self.postings.insert(idx, posting);
    }

    pub fn key(&self) -> &ChainKey {
        &self.key
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// True iff the chain's terminal posting is a release.
    pub fn cancelled(&self) -> bool {
        matches!(
            self.postings.last().map(Posting::kind),
            Some(PostingKind::Release)
        )
    }

    /// True for a chain made of a single hard settlement or transfer.
    pub fn is_one_shot(&self) -> bool {
        self.postings.len() == 1 && !self.postings[0].kind().is_chain_typed()
    }
}

/// Transaction chains of one account, keyed by (party id, chain id).
///
/// This is the read-only grouping view the aggregators consume. It is
/// rebuilt from raw postings on every evaluation and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainBook {
    #[serde(with = "chains_serde")]
    chains: BTreeMap<ChainKey, TransactionChain>,
}

mod chains_serde {
    use super::*;

    pub fn serialize<S: serde::Serializer>(
        chains: &BTreeMap<ChainKey, TransactionChain>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(chains.values())
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ChainKey, TransactionChain>, D::Error> {
        let chains: Vec<TransactionChain> = Deserialize::deserialize(deserializer)?;
        Ok(chains.into_iter().map(|c| (c.key().clone(), c)).collect())
    }
}

impl ChainBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a posting to the chain it belongs to, creating the chain if needed.
    pub fn insert(&mut self, posting: Posting) {
        let key = posting.chain_key();
        self.chains
            .entry(key.clone())
            .or_insert_with(|| TransactionChain::new(key))
            .push(posting);
    }

    /// A copy of this book with the not-yet-committed `batch` applied on top.
    pub fn with_proposed<'a>(&self, batch: impl IntoIterator<Item = &'a Posting>) -> Self {
        let mut book = self.clone();
        for posting in batch {
            book.insert(posting.clone());
        }
        book
    }

    pub fn get(&self, key: &ChainKey) -> Option<&TransactionChain> {
        self.chains.get(key)
    }

    pub fn chains(&self) -> impl Iterator<Item = &TransactionChain> {
        self.chains.values()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Number of postings across all chains.
    pub fn posting_count(&self) -> usize {
        self.chains.values().map(TransactionChain::len).sum()
    }
}

impl FromIterator<Posting> for ChainBook {
    fn from_iter<T: IntoIterator<Item = Posting>>(iter: T) -> Self {
        let mut book = ChainBook::new();
        for posting in iter {
            book.insert(posting);
        }
        book
    }
}

impl<'a> IntoIterator for &'a ChainBook {
    type Item = &'a TransactionChain;
    type IntoIter = std::collections::btree_map::Values<'a, ChainKey, TransactionChain>;

    fn into_iter(self) -> Self::IntoIter {
        self.chains.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::denomination::Denomination;
    use crate::core::ids::{ChainId, PartyId};
    use crate::core::posting::Direction;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn posting(chain: &str, kind: PostingKind, at: DateTime<Utc>) -> Posting {
        Posting::new(
            PartyId::new("P"),
            ChainId::new(chain),
            kind,
            dec!(10),
            Direction::Debit,
            Denomination::new("GBP"),
            at,
        )
    }

    #[test]
    fn test_book_groups_by_chain_key() {
        let book: ChainBook = vec![
            posting("1", PostingKind::Authorisation, t0()),
            posting("2", PostingKind::HardSettlement, t0()),
            posting("1", PostingKind::Settlement { is_final: true }, t0() + Duration::hours(1)),
        ]
        .into_iter()
        .collect();

        assert_eq!(book.len(), 2);
        assert_eq!(book.posting_count(), 3);
        let key = ChainKey::new(PartyId::new("P"), ChainId::new("1"));
        assert_eq!(book.get(&key).unwrap().len(), 2);
    }

    #[test]
    fn test_chain_orders_by_value_instant() {
        let key = ChainKey::new(PartyId::new("P"), ChainId::new("1"));
        let chain = TransactionChain::from_postings(
            key,
            vec![
                posting("1", PostingKind::Release, t0() + Duration::hours(2)),
                posting("1", PostingKind::Authorisation, t0()),
            ],
        );
        assert_eq!(chain.postings()[0].kind(), PostingKind::Authorisation);
        assert!(chain.cancelled());
    }

    #[test]
    fn test_equal_instants_keep_insertion_order() {
        let key = ChainKey::new(PartyId::new("P"), ChainId::new("1"));
        let chain = TransactionChain::from_postings(
            key,
            vec![
                posting("1", PostingKind::Authorisation, t0()),
                posting("1", PostingKind::Release, t0()),
            ],
        );
        assert_eq!(chain.postings()[1].kind(), PostingKind::Release);
        assert!(chain.cancelled());
    }

    #[test]
    fn test_not_cancelled_without_terminal_release() {
        let key = ChainKey::new(PartyId::new("P"), ChainId::new("1"));
        let chain = TransactionChain::from_postings(
            key.clone(),
            vec![posting("1", PostingKind::Authorisation, t0())],
        );
        assert!(!chain.cancelled());
        assert!(!TransactionChain::new(key).cancelled());
    }

    #[test]
    fn test_one_shot_chain() {
        let book: ChainBook = vec![posting("9", PostingKind::Transfer, t0())]
            .into_iter()
            .collect();
        assert!(book.chains().all(TransactionChain::is_one_shot));
    }

    #[test]
    fn test_with_proposed_leaves_history_untouched() {
        let history: ChainBook = vec![posting("1", PostingKind::Authorisation, t0())]
            .into_iter()
            .collect();
        let batch = vec![posting("1", PostingKind::Release, t0() + Duration::hours(1))];
        let combined = history.with_proposed(&batch);

        assert_eq!(history.posting_count(), 1);
        assert_eq!(combined.posting_count(), 2);
        assert!(combined.chains().next().unwrap().cancelled());
    }

    #[test]
    fn test_book_serializes_as_chain_list() {
        let book: ChainBook = vec![posting("1", PostingKind::Authorisation, t0())]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["chains"].as_array().unwrap().len(), 1);
        let back: ChainBook = serde_json::from_value(json).unwrap();
        assert_eq!(back, book);
    }
}
