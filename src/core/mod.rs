//! Data model: denominations, identifiers, postings, chains and calendar
//! helpers shared by the effect and aggregation layers.

pub mod calendar;
pub mod chain;
pub mod denomination;
pub mod ids;
pub mod posting;
