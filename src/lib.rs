//! # Exchange Chain - A Simulated Ledger Exchange
//!
//! An exchange that keeps investor balances on top of a simple append-only
//! chain of blocks fed to it by miners. When I come back to this code, here's
//! what I need to remember:
//!
//! ## What It Does
//! - **Investors and Balances**: accounts whose balances are rebuilt from the chain on every block
//! - **Transaction Pool**: pending transfers, applied tentatively until a block confirms them
//! - **Generator**: a timer that moves random amounts between random investors
//! - **Block Acceptance**: two-phase recompute (chain replay, then pending transfers on top)
//! - **Fork Resync**: a rejected block pauses generation and adopts a miner's whole chain
//! - **Simulation**: peer miners that occasionally miss blocks, to exercise all of the above
//!
//! ## How the Code Is Organized
//! - `core/`: investors, transactions, blocks and the chain
//! - `exchange/`: the exchange engine, its generator, notifications and async handle
//! - `network/`: simulated peer miners and the simulation driver
//! - `storage/`: the in-memory pool of pending transactions
//! - `config/`: TOML settings with environment overrides
//! - `utils/`: hashing, clock, canonical encoding and random draws
//! - `cli/`: command-line parsing
//!
//! ## Design Decisions
//! - One task owns the exchange; timers and miner replies come back as messages
//! - Balances are never trusted across blocks: each block triggers a full replay
//! - Block hashes cover index, previous hash, transactions, miner and timestamp

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod exchange;
pub mod network;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt, ReportFormat};
pub use config::{ExchangeSettings, Settings, SimulationSettings, GLOBAL_SETTINGS};
pub use core::{Block, Chain, Investor, Transaction};
pub use error::{ConflictCause, ExchangeError, Result};
pub use exchange::{
    ChannelObserver, Exchange, ExchangeHandle, ExchangeSnapshot, LogObserver, Miner,
    Notification, Observer, Participant, Signal,
};
pub use network::{PeerMiner, Simulation, SimulationReport};
pub use storage::MemoryPool;
pub use utils::{current_timestamp, sha256_digest, sha256_hex, RandomSource, RngSource};
