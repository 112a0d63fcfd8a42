//! Transaction limit validators built on the aggregators.
//!
//! Every validator is a pure predicate over committed history and the batch
//! under evaluation. A breach is reported as a [`rejection::Rejection`].

pub mod daily;
pub mod payment_type;
pub mod rejection;
