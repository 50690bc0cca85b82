use crate::core::{Transaction, GENESIS_MINER, GENESIS_PREV_HASH};
use crate::error::Result;
use crate::utils::{current_timestamp, serialize, sha256_hex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    prev_hash: String,
    transacs: Vec<Transaction>,
    miner: String,
    timestamp: i64,
    hash: String,
}

impl Block {
    pub fn new_block(
        index: u64,
        prev_hash: String,
        transacs: Vec<Transaction>,
        miner: &str,
    ) -> Result<Block> {
        Self::with_timestamp(index, prev_hash, transacs, miner, current_timestamp()?)
    }

    /// The first block of every chain. It must come out identical on every
    /// participant, so nothing in it depends on the clock.
    pub fn generate_genesis_block(genesis_investor: &str, issuance: u64) -> Result<Block> {
        let transaction = Transaction::genesis_issuance(genesis_investor, issuance)?;
        Self::with_timestamp(
            0,
            GENESIS_PREV_HASH.to_string(),
            vec![transaction],
            GENESIS_MINER,
            0,
        )
    }

    fn with_timestamp(
        index: u64,
        prev_hash: String,
        transacs: Vec<Transaction>,
        miner: &str,
        timestamp: i64,
    ) -> Result<Block> {
        let mut block = Block {
            index,
            prev_hash,
            transacs,
            miner: miner.to_string(),
            timestamp,
            hash: String::new(),
        };
        block.hash = block.compute_hash()?;
        Ok(block)
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_prev_hash(&self) -> &str {
        self.prev_hash.as_str()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transacs.as_slice()
    }

    pub fn get_miner(&self) -> &str {
        self.miner.as_str()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn hash_transactions(&self) -> String {
        let mut tx_hashes = String::new();
        for transaction in &self.transacs {
            tx_hashes.push_str(transaction.get_hash());
        }
        tx_hashes
    }

    pub fn compute_hash(&self) -> Result<String> {
        let preimage = (
            self.index,
            self.prev_hash.clone(),
            self.hash_transactions(),
            self.miner.clone(),
            self.timestamp,
        );
        Ok(sha256_hex(&serialize(&preimage)?))
    }

    /// Check the stored hash against the block contents, records included
    pub fn verify_hash(&self) -> bool {
        let records_intact = self
            .transacs
            .iter()
            .all(|tx| matches!(tx.compute_hash(), Ok(hash) if hash == tx.get_hash()));
        records_intact && matches!(self.compute_hash(), Ok(hash) if hash == self.hash)
    }
}
