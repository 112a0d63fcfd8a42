use crate::core::chain::ChainBook;
use crate::core::denomination::Denomination;
use crate::core::ids::ChainId;
use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;

/// Sums individual debit postings carrying a given instruction detail.
///
/// Unlike [`WindowAggregator`](crate::aggregation::window::WindowAggregator)
/// this works on leaf postings, not chain impacts: an authorisation and its
/// later settlement are both counted if both match. It backs limits keyed
/// by a free-form tag such as payment type.
pub struct CategorySummer;

impl CategorySummer {
    /// Negated sum of matching debit amounts since `cutoff` (inclusive).
    ///
    /// A posting matches when its chain is not cancelled and its chain id is
    /// not `excluded_chain_id`, it is a debit in `denomination` with value
    /// instant at or after `cutoff`, and `details[detail_key] == detail_value`.
    /// The result is zero or negative: an amount paid out.
    pub fn sum_tagged_debits(
        denomination: &Denomination,
        cutoff: DateTime<Utc>,
        chains: &ChainBook,
        excluded_chain_id: Option<&ChainId>,
        detail_key: &str,
        detail_value: &str,
    ) -> Decimal {
        let total: Decimal = chains
            .chains()
            .filter(|chain| !chain.cancelled())
            .filter(|chain| excluded_chain_id != Some(&chain.key().chain_id))
            .flat_map(|chain| chain.postings())
            .filter(|p| {
                p.is_debit()
                    && p.denomination() == denomination
                    && p.value_at() >= cutoff
                    && p.detail(detail_key) == Some(detail_value)
            })
            .map(|p| p.amount())
            .sum();

        debug!(
            "tagged debits {}={} since {} in {}: {}",
            detail_key, detail_value, cutoff, denomination, total
        );
        -total
    }
}
