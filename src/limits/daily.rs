use crate::aggregation::window::WindowAggregator;
use crate::core::chain::ChainBook;
use crate::core::denomination::{display_amount, Denomination};
use crate::core::posting::{Direction, Posting};
use crate::limits::rejection::Rejection;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rust_decimal::Decimal;

/// Reject `batch` if it would take the amount deposited since `cutoff` above
/// `limit`.
///
/// `history` holds committed chains only; the batch is overlaid on it. With
/// `net_batch`, withdrawals in the same batch offset its deposits, and a
/// batch that nets to a withdrawal (or to nothing) always passes.
pub fn validate_daily_deposit(
    denomination: &Denomination,
    cutoff: DateTime<Utc>,
    history: &ChainBook,
    batch: &[Posting],
    limit: Decimal,
    net_batch: bool,
) -> Result<(), Rejection> {
    validate_daily_movement(Direction::Credit, denomination, cutoff, history, batch, limit, net_batch)
}

/// Reject `batch` if it would take the amount withdrawn since `cutoff` above
/// `limit`. See [`validate_daily_deposit`] for `history` and `net_batch`.
pub fn validate_daily_withdrawal(
    denomination: &Denomination,
    cutoff: DateTime<Utc>,
    history: &ChainBook,
    batch: &[Posting],
    limit: Decimal,
    net_batch: bool,
) -> Result<(), Rejection> {
    validate_daily_movement(Direction::Debit, denomination, cutoff, history, batch, limit, net_batch)
}

fn validate_daily_movement(
    direction: Direction,
    denomination: &Denomination,
    cutoff: DateTime<Utc>,
    history: &ChainBook,
    batch: &[Posting],
    limit: Decimal,
    net_batch: bool,
) -> Result<(), Rejection> {
    let before = WindowAggregator::sum_over_window(denomination, cutoff, history);
    let after = WindowAggregator::sum_over_window(denomination, cutoff, &history.with_proposed(batch));

    // Net movement of the batch, positive in the limited direction.
    let batch_net = match direction {
        Direction::Credit => after.net() - before.net(),
        Direction::Debit => before.net() - after.net(),
    };
    let (prior, gross_total) = match direction {
        Direction::Credit => (before.deposited, after.deposited),
        Direction::Debit => (before.withdrawn, after.withdrawn),
    };

    let total = if net_batch {
        if batch_net <= Decimal::ZERO {
            debug!("batch nets to {} against the {} limit, not checked", batch_net, label(direction));
            return Ok(());
        }
        prior + batch_net
    } else {
        if gross_total <= prior {
            return Ok(());
        }
        gross_total
    };

    if total > limit {
        info!(
            "rejecting batch: daily {} {} {} over limit {}",
            label(direction),
            total,
            denomination,
            limit
        );
        return Err(Rejection::against_terms(format!(
            "Transaction would cause the maximum daily {} limit of {} {} to be exceeded (daily total {} {}).",
            label(direction),
            display_amount(limit),
            denomination,
            display_amount(total),
            denomination
        )));
    }
    Ok(())
}

fn label(direction: Direction) -> &'static str {
    match direction {
        Direction::Credit => "deposit",
        Direction::Debit => "withdrawal",
    }
}
