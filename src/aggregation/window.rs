use crate::core::calendar::just_before;
use crate::core::chain::ChainBook;
use crate::core::denomination::Denomination;
use crate::effects::impact::impact_for;
use crate::effects::snapshot::{effects, BalanceKey};
use chrono::{DateTime, Utc};
use log::{debug, trace};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net amounts moved into and out of an account inside a limit window.
///
/// Both totals are magnitudes and never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowTotals {
    pub deposited: Decimal,
    pub withdrawn: Decimal,
}

impl WindowTotals {
    /// Deposited minus withdrawn.
    pub fn net(&self) -> Decimal {
        self.deposited - self.withdrawn
    }
}

/// Sums chain impacts over a limit window.
///
/// Each chain is measured twice: its impact now, and its impact just before
/// the cutoff. Only the difference counts toward the window, so an
/// authorisation taken before the cutoff and settled after it is counted
/// once, on the day it was authorised.
pub struct WindowAggregator;

impl WindowAggregator {
    /// Total deposited and withdrawn in `denomination` within `[cutoff, now)`.
    ///
    /// # Algorithm
    ///
    /// 1. `before = cutoff - 1 quantum`, fixed for the whole call.
    /// 2. Per chain: `delta = impact(now) - impact(before)`.
    /// 3. Positive deltas are deposits, the magnitude of the rest withdrawals.
    ///
    /// For chains ending in a release only the settled bucket is compared.
    /// The released hold is neither a deposit nor a withdrawal, but anything
    /// settled before the release still moved.
    pub fn sum_over_window(
        denomination: &Denomination,
        cutoff: DateTime<Utc>,
        chains: &ChainBook,
    ) -> WindowTotals {
        let before = just_before(cutoff);
        let key = BalanceKey::default_for(denomination);
        let mut totals = WindowTotals::default();

        for chain in chains {
            let (full, before_cutoff) = if chain.cancelled() {
                (
                    effects(chain, &key, None).settled,
                    effects(chain, &key, Some(before)).settled,
                )
            } else {
                (impact_for(chain, &key, None), impact_for(chain, &key, Some(before)))
            };
            let delta = full - before_cutoff;
            trace!(
                "chain {}{}: {} now, {} before {}, delta {}",
                chain.key(),
                if chain.cancelled() { " (released)" } else { "" },
                full,
                before_cutoff,
                cutoff,
                delta
            );

            if delta > Decimal::ZERO {
                totals.deposited += delta;
            } else {
                totals.withdrawn += delta.abs();
            }
        }

        debug!(
            "window from {} over {} chains in {}: deposited {}, withdrawn {}",
            cutoff,
            chains.len(),
            denomination,
            totals.deposited,
            totals.withdrawn
        );
        totals
    }
}

impl std::fmt::Display for WindowTotals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Window Totals ===")?;
        writeln!(f, "Deposited:  {}", self.deposited)?;
        writeln!(f, "Withdrawn:  {}", self.withdrawn)?;
        writeln!(f, "Net:        {}", self.net())?;
        Ok(())
    }
}
