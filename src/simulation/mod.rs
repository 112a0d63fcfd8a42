//! Synthetic data for benchmarks and manual runs.

pub mod generator;
