//! Limit-window aggregation.
//!
//! Two deliberately separate lenses over the same chains:
//! [`window::WindowAggregator`] nets each chain's impact across the window,
//! while [`category::CategorySummer`] adds up raw tagged debit postings.

pub mod category;
pub mod window;
