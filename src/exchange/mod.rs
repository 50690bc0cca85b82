//! # The Exchange
//!
//! Here's how I split the exchange up:
//! - `engine.rs`: the [`Exchange`] itself, owner of investors, the pending pool and the chain
//! - `generator.rs`: the timer that asks for a new random transaction every period
//! - `events.rs`: the [`Notification`]s display layers receive and the [`Observer`] seam
//! - `participant.rs`: investors and the [`Miner`] trait block producers implement
//! - `service.rs`: the async front door that serializes every call onto one task
//!
//! The exchange never blocks: ticks and miner replies come back as [`Signal`]s
//! through its mailbox and are handled one at a time.

pub mod engine;
pub mod events;
pub mod generator;
pub mod participant;
pub mod service;

pub use engine::{Exchange, ExchangeSnapshot, Signal};
pub use events::{ChannelObserver, LogObserver, Notification, Observer};
pub use generator::Generator;
pub use participant::{BlocksCallback, Miner, Participant};
pub use service::{Command, ExchangeHandle};
