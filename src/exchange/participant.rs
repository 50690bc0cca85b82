//! Participants the exchange deals with
//!
//! There is no abstract participant to construct: the set is closed to
//! investors (plain accounts) and miners (anything implementing [`Miner`]).

use crate::core::{Block, Investor};
use std::fmt;
use std::sync::Arc;

/// Receives a miner's chain. Called exactly once.
pub type BlocksCallback = Box<dyn FnOnce(Vec<Block>) + Send + 'static>;

/// What the exchange needs from a block producer
pub trait Miner: Send + Sync {
    fn id(&self) -> &str;

    /// Hand the miner's current chain to `respond`, possibly later and from another task
    fn query_blocks(&self, requester: &str, respond: BlocksCallback);
}

pub enum Participant {
    Investor(Investor),
    Miner(Arc<dyn Miner>),
}

impl Participant {
    pub fn id(&self) -> &str {
        match self {
            Participant::Investor(investor) => investor.get_id(),
            Participant::Miner(miner) => miner.id(),
        }
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::Investor(investor) => f.debug_tuple("Investor").field(investor).finish(),
            Participant::Miner(miner) => f.debug_tuple("Miner").field(&miner.id()).finish(),
        }
    }
}
