//! Utility functions and helpers
//!
//! This module contains hashing and clock helpers, the canonical encoding
//! used for hash preimages, and the random draws behind the generator.

pub mod crypto;
pub mod random;
pub mod serialization;

pub use crypto::{current_timestamp, sha256_digest, sha256_hex};
pub use random::{random_amount, random_index, RandomSource, RngSource};
pub use serialization::serialize;
