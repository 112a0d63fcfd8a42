//! Random chain books for benchmarks and manual testing.
//!
//! Generates a mix of the lifecycles seen on a current account: one-shot
//! card/transfer movements, authorisations left open, adjusted, settled in
//! full or in part, and released.

use crate::core::chain::ChainBook;
use crate::core::denomination::Denomination;
use crate::core::ids::{ChainId, PartyId};
use crate::core::posting::{Direction, Posting, PostingKind};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

/// Configuration for generating a random chain book.
#[derive(Debug, Clone)]
pub struct ChainBookConfig {
    /// Number of chains to generate.
    pub chain_count: usize,
    pub denomination: Denomination,
    /// Parties chains are spread across.
    pub parties: Vec<PartyId>,
    /// Earliest instant a chain may start.
    pub start: DateTime<Utc>,
    /// Postings fall within `[start, start + span)`.
    pub span: Duration,
    /// Smallest amount, in minor units.
    pub min_minor_units: i64,
    /// Largest amount, in minor units.
    pub max_minor_units: i64,
    /// Seed for reproducible output. `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for ChainBookConfig {
    fn default() -> Self {
        Self {
            chain_count: 100,
            denomination: Denomination::new("GBP"),
            parties: vec![PartyId::new("CARD-NETWORK"), PartyId::new("FPS")],
            start: Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_default(),
            span: Duration::days(2),
            min_minor_units: 100,
            max_minor_units: 100_000,
            seed: None,
        }
    }
}

/// Generate a random chain book.
pub fn generate_chain_book(config: &ChainBookConfig) -> ChainBook {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut book = ChainBook::new();
    if config.parties.is_empty() {
        return book;
    }

    let span_secs = config.span.num_seconds().max(1);
    let min = config.min_minor_units.max(0);
    let max = config.max_minor_units.max(min + 1);

    for i in 0..config.chain_count {
        let party = config.parties[rng.gen_range(0..config.parties.len())].clone();
        let chain_id = ChainId::new(format!("CHAIN-{:06}", i));
        let direction = if rng.gen_bool(0.5) {
            Direction::Credit
        } else {
            Direction::Debit
        };
        let mut at = config.start + Duration::seconds(rng.gen_range(0..span_secs));
        let amount = Decimal::new(rng.gen_range(min..max), 2);

        let mut push = |kind: PostingKind, amount: Decimal, at: DateTime<Utc>| {
            book.insert(Posting::new(
                party.clone(),
                chain_id.clone(),
                kind,
                amount,
                direction,
                config.denomination.clone(),
                at,
            ));
        };

        match rng.gen_range(0..6) {
            0 => push(PostingKind::HardSettlement, amount, at),
            1 => push(PostingKind::Authorisation, amount, at),
            2 => {
                push(PostingKind::Authorisation, amount, at);
                at += Duration::minutes(rng.gen_range(1..600));
                let extra = Decimal::new(rng.gen_range(min..max), 2);
                push(PostingKind::AuthorisationAdjustment, extra, at);
            }
            3 => {
                push(PostingKind::Authorisation, amount, at);
                at += Duration::minutes(rng.gen_range(1..2880));
                let is_final = rng.gen_bool(0.7);
                let settled = if rng.gen_bool(0.5) {
                    amount
                } else {
                    (amount / Decimal::from(2)).round_dp(2)
                };
                push(PostingKind::Settlement { is_final }, settled, at);
            }
            4 => {
                push(PostingKind::Authorisation, amount, at);
                at += Duration::minutes(rng.gen_range(1..2880));
                push(PostingKind::Release, amount, at);
            }
            _ => push(PostingKind::Transfer, amount, at),
        }
    }

    book
}
