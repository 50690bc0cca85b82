//! Core ledger functionality
//!
//! This module contains the ledger building blocks: investors, value-transfer
//! records, blocks and the append-only chain, plus the shared genesis constants.

pub mod block;
pub mod chain;
pub mod investor;
pub mod monetary;
pub mod transaction;

pub use block::Block;
pub use chain::Chain;
pub use investor::Investor;
pub use monetary::{
    BASE_ISSUANCE, DEFAULT_TICK_INTERVAL_MS, EXCHANGE_ID, GENESIS_INVESTOR, GENESIS_ISSUANCE,
    GENESIS_MINER, GENESIS_PREV_HASH,
};
pub use transaction::Transaction;
