//! Card lifecycles across a daily cutoff.
//!
//! Shows how authorisations, adjustments, settlements and releases that
//! straddle midnight count toward today's deposit and withdrawal totals,
//! then runs a daily withdrawal limit against a proposed card payment.

use chrono::{Duration, TimeZone, Utc};
use posting_limits::aggregation::window::WindowAggregator;
use posting_limits::config::LimitConfig;
use posting_limits::core::chain::ChainBook;
use posting_limits::core::denomination::Denomination;
use posting_limits::core::ids::{ChainId, PartyId};
use posting_limits::core::posting::{Direction, Posting, PostingKind};
use posting_limits::effects::impact::impact;
use posting_limits::effects::snapshot::{effects, BalanceKey};
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  posting-limits: Card Lifecycle Example  ║");
    println!("╚══════════════════════════════════════════╝\n");

    let gbp = Denomination::new("GBP");
    let network = PartyId::new("CARD-NETWORK");
    let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let yesterday = midnight - Duration::hours(3);
    let today = midnight + Duration::hours(9);

    let card = |chain: &str, kind: PostingKind, amount, direction, at| {
        Posting::new(network.clone(), ChainId::new(chain), kind, amount, direction, gbp.clone(), at)
    };

    let history: ChainBook = vec![
        // Hotel deposit held yesterday, topped up this morning.
        card("hotel", PostingKind::Authorisation, dec!(90), Direction::Debit, yesterday),
        card("hotel", PostingKind::AuthorisationAdjustment, dec!(40), Direction::Debit, today),
        // Taxi authorised yesterday, settled today for the same amount.
        card("taxi", PostingKind::Authorisation, dec!(18.50), Direction::Debit, yesterday),
        card("taxi", PostingKind::Settlement { is_final: true }, dec!(18.50), Direction::Debit, today),
        // Fuel pre-authorisation released this morning.
        card("fuel", PostingKind::Authorisation, dec!(100), Direction::Debit, yesterday),
        card("fuel", PostingKind::Release, dec!(100), Direction::Debit, today),
        // Refund received today.
        card("refund", PostingKind::HardSettlement, dec!(25), Direction::Credit, today),
    ]
    .into_iter()
    .collect();

    // --- Scenario 1: chain impacts either side of midnight ---
    println!("━━━ Scenario 1: Impact Before and After Midnight ━━━\n");
    let before = midnight - Duration::nanoseconds(1);
    for chain in &history {
        let now = impact(chain, &gbp, None);
        let then = impact(chain, &gbp, Some(before));
        if chain.cancelled() {
            // Only what settled before the release counts.
            let key = BalanceKey::default_for(&gbp);
            let settled = effects(chain, &key, None).settled - effects(chain, &key, Some(before)).settled;
            println!(
                "  {:<22} before {:>8}  now {:>8}  counted {:>8}  [released]",
                chain.key().to_string(),
                then,
                now,
                settled
            );
        } else {
            println!(
                "  {:<22} before {:>8}  now {:>8}  counted {:>8}",
                chain.key().to_string(),
                then,
                now,
                now - then
            );
        }
    }
    println!();

    // --- Scenario 2: today's totals ---
    println!("━━━ Scenario 2: Today's Totals ━━━\n");
    let totals = WindowAggregator::sum_over_window(&gbp, midnight, &history);
    println!("{}", totals);

    // --- Scenario 3: daily withdrawal limit ---
    println!("━━━ Scenario 3: Daily Withdrawal Limit of 100 GBP ━━━\n");
    let mut config = LimitConfig::new(gbp.clone());
    config.max_daily_withdrawal = Some(dec!(100));

    for amount in [dec!(45), dec!(75)] {
        let batch = vec![card(
            "shop",
            PostingKind::HardSettlement,
            amount,
            Direction::Debit,
            today + Duration::hours(1),
        )];
        match config.validate_batch(today + Duration::hours(1), &history, &batch) {
            Ok(Ok(())) => println!("  {:>6} GBP card payment: ACCEPTED", amount),
            Ok(Err(rejection)) => println!("  {:>6} GBP card payment: REJECTED\n    {}", amount, rejection),
            Err(e) => println!("  config error: {}", e),
        }
    }
}
