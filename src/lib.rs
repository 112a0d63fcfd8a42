//! # posting-limits
//!
//! Chain-aware deposit/withdrawal aggregation for transaction limits.
//!
//! Given the posting-instruction chains of an account, this crate answers:
//! how much has the account net-deposited and net-withdrawn in a
//! denomination since a cutoff, without double counting any
//! authorisation / adjustment / settlement / release chain?
//!
//! ## Architecture
//!
//! - **core**: postings, transaction chains, denominations, calendar cutoffs
//! - **effects**: effect snapshots and the chain impact rule
//! - **aggregation**: window aggregator and tagged-debit summer
//! - **limits**: daily deposit/withdrawal and payment-type validators
//! - **config**: limit product configuration
//! - **simulation**: random chain books for benchmarks

pub mod aggregation;
pub mod config;
pub mod core;
pub mod effects;
pub mod limits;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::aggregation::category::CategorySummer;
    pub use crate::aggregation::window::{WindowAggregator, WindowTotals};
    pub use crate::config::LimitConfig;
    pub use crate::core::calendar::LimitWindow;
    pub use crate::core::chain::{ChainBook, TransactionChain};
    pub use crate::core::denomination::Denomination;
    pub use crate::core::ids::{ChainId, ChainKey, PartyId};
    pub use crate::core::posting::{Direction, Posting, PostingKind};
    pub use crate::effects::impact::impact;
    pub use crate::effects::snapshot::{effects, BalanceKey, Effects};
    pub use crate::limits::rejection::Rejection;
}
