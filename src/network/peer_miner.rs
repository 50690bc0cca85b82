// This is a stand-in block producer for the simulation
// Each miner keeps its own copy of the chain, so a missed broadcast leaves it on a stale tip

use crate::core::{Block, Transaction};
use crate::error::{ExchangeError, Result};
use crate::exchange::{BlocksCallback, Miner};
use log::{debug, info, warn};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;

pub struct PeerMiner {
    id: String,
    beneficiary: String, // Investor credited with the block reward
    reward: u64,
    reply_delay: Duration,
    chain: Arc<RwLock<Vec<Block>>>,
}

impl PeerMiner {
    pub fn new(
        id: impl Into<String>,
        beneficiary: impl Into<String>,
        reward: u64,
        reply_delay: Duration,
        chain: Vec<Block>,
    ) -> PeerMiner {
        PeerMiner {
            id: id.into(),
            beneficiary: beneficiary.into(),
            reward,
            reply_delay,
            chain: Arc::new(RwLock::new(chain)),
        }
    }

    pub fn get_beneficiary(&self) -> &str {
        &self.beneficiary
    }

    /// Build a block on this miner's tip: the reward issuance first, then `transacs`.
    /// The block is not adopted locally until [`adopt_block`](PeerMiner::adopt_block).
    pub fn assemble_block(&self, transacs: Vec<Transaction>) -> Result<Block> {
        let mut contents = Vec::with_capacity(transacs.len() + 1);
        if self.reward > 0 {
            contents.push(Transaction::new_issuance(&self.beneficiary, self.reward)?);
        }
        contents.extend(transacs);

        let chain = self
            .chain
            .read()
            .map_err(|e| ExchangeError::Network(format!("Failed to acquire chain lock: {e}")))?;
        let (index, prev_hash) = match chain.last() {
            Some(tip) => (tip.get_index() + 1, tip.get_hash().to_string()),
            None => {
                return Err(ExchangeError::Network(format!(
                    "Miner {} has no chain to build on",
                    self.id
                )))
            }
        };
        Block::new_block(index, prev_hash, contents, &self.id)
    }

    /// Append `block` when it extends the local tip. Returns false otherwise.
    pub fn adopt_block(&self, block: Block) -> Result<bool> {
        let mut chain = self
            .chain
            .write()
            .map_err(|e| ExchangeError::Network(format!("Failed to acquire chain lock: {e}")))?;
        let extends_tip = chain.last().is_some_and(|tip| {
            block.get_index() == tip.get_index() + 1 && block.get_prev_hash() == tip.get_hash()
        });
        if !extends_tip {
            debug!(
                "Miner {} cannot adopt block {}, not on its tip",
                self.id,
                block.get_index()
            );
            return Ok(false);
        }
        chain.push(block);
        Ok(true)
    }

    pub fn replace_chain(&self, blocks: Vec<Block>) -> Result<()> {
        let mut chain = self
            .chain
            .write()
            .map_err(|e| ExchangeError::Network(format!("Failed to acquire chain lock: {e}")))?;
        info!(
            "Miner {} caught up from height {} to {}",
            self.id,
            chain.len().saturating_sub(1),
            blocks.len().saturating_sub(1)
        );
        *chain = blocks;
        Ok(())
    }

    pub fn get_blocks(&self) -> Result<Vec<Block>> {
        let chain = self
            .chain
            .read()
            .map_err(|e| ExchangeError::Network(format!("Failed to acquire chain lock: {e}")))?;
        Ok(chain.clone())
    }

    pub fn height(&self) -> Result<u64> {
        let chain = self
            .chain
            .read()
            .map_err(|e| ExchangeError::Network(format!("Failed to acquire chain lock: {e}")))?;
        Ok(chain.last().map_or(0, Block::get_index))
    }
}

// The chain is read when the answer goes out, not when the query arrives
fn read_chain(chain: &RwLock<Vec<Block>>) -> Vec<Block> {
    match chain.read() {
        Ok(blocks) => blocks.clone(),
        Err(poisoned) => {
            warn!("Chain lock poisoned, answering with last known chain");
            poisoned.into_inner().clone()
        }
    }
}

impl Miner for PeerMiner {
    fn id(&self) -> &str {
        &self.id
    }

    fn query_blocks(&self, requester: &str, respond: BlocksCallback) {
        debug!("{requester} asked miner {} for its chain", self.id);
        let chain = Arc::clone(&self.chain);
        match Handle::try_current() {
            Ok(runtime) => {
                let delay = self.reply_delay;
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    respond(read_chain(&chain));
                });
            }
            Err(_) => respond(read_chain(&chain)),
        }
    }
}
