//! Test helpers for exercising the exchange
//!
//! Scripted randomness, an observer that records everything, and a miner
//! that answers chain queries with a fixed list.

pub mod test_utils;

pub use test_utils::*;
