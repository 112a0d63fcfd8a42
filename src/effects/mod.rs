//! Effect snapshots and the chain impact rule.
//!
//! A snapshot buckets a chain's postings into authorised, settled,
//! unsettled and released amounts as of an instant. The impact of a chain is
//! `settled + unsettled` taken from that snapshot.

pub mod impact;
pub mod snapshot;
