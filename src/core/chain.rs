// This is the ledger - an append-only list of blocks starting at a genesis block
// It never branches: a competing branch is resolved by replacing the whole list

use crate::core::{Block, Transaction};
use crate::error::{ConflictCause, Result};
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    pub fn new(genesis_investor: &str, issuance: u64) -> Result<Chain> {
        let genesis = Block::generate_genesis_block(genesis_investor, issuance)?;
        Ok(Chain {
            blocks: vec![genesis],
        })
    }

    // A block is accepted only if it sits exactly on top of the current last block
    pub fn append(&mut self, block: Block) -> std::result::Result<(), ConflictCause> {
        let last = self.last_block();

        let expected = last.get_index() + 1;
        if block.get_index() != expected {
            return Err(ConflictCause::IndexMismatch {
                expected,
                actual: block.get_index(),
            });
        }

        if block.get_prev_hash() != last.get_hash() {
            return Err(ConflictCause::PrevHashMismatch {
                expected: last.get_hash().to_string(),
                actual: block.get_prev_hash().to_string(),
            });
        }

        if !block.verify_hash() {
            return Err(ConflictCause::HashMismatch {
                index: block.get_index(),
            });
        }

        info!(
            "Appended block {} from {} with {} transactions",
            block.get_index(),
            block.get_miner(),
            block.get_transactions().len()
        );
        self.blocks.push(block);
        Ok(())
    }

    pub fn last_block(&self) -> &Block {
        // The list is never empty: it starts at genesis and replace() refuses empty input
        &self.blocks[self.blocks.len() - 1]
    }

    /// Every transaction in block order, then in-block order. Each call starts again at genesis.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.get_transactions().iter())
    }

    pub fn for_each_transaction<F: FnMut(&Transaction)>(&self, visitor: F) {
        self.transactions().for_each(visitor);
    }

    /// Swap in a peer's chain wholesale. The caller must have paused anything
    /// that mutates the exchange. Returns false when `blocks` is empty.
    pub fn replace(&mut self, blocks: Vec<Block>) -> bool {
        if blocks.is_empty() {
            warn!("Refusing to replace the chain with an empty block list");
            return false;
        }
        info!(
            "Replacing chain of height {} with chain of height {}",
            self.height(),
            blocks.len() - 1
        );
        self.blocks = blocks;
        true
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn height(&self) -> u64 {
        self.last_block().get_index()
    }

    /// Check index and previous-hash linkage across the whole chain
    pub fn verify_linkage(&self) -> bool {
        self.blocks.windows(2).all(|pair| {
            pair[1].get_index() == pair[0].get_index() + 1
                && pair[1].get_prev_hash() == pair[0].get_hash()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_block(chain: &Chain, transacs: Vec<Transaction>) -> Block {
        let last = chain.last_block();
        Block::new_block(
            last.get_index() + 1,
            last.get_hash().to_string(),
            transacs,
            "miner-1",
        )
        .unwrap()
    }

    #[test]
    fn test_new_chain_holds_genesis() {
        let chain = Chain::new("genesis", 50).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.transactions().count(), 1);
    }

    #[test]
    fn test_append_valid_block() {
        let mut chain = Chain::new("genesis", 50).unwrap();
        let block = next_block(&chain, vec![]);
        let hash = block.get_hash().to_string();

        chain.append(block).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.last_block().get_hash(), hash);
        assert!(chain.verify_linkage());
    }

    #[test]
    fn test_append_rejects_wrong_index() {
        let mut chain = Chain::new("genesis", 50).unwrap();
        let genesis_hash = chain.last_block().get_hash().to_string();
        let block = Block::new_block(2, genesis_hash, vec![], "miner-1").unwrap();

        let err = chain.append(block).unwrap_err();
        assert_eq!(
            err,
            ConflictCause::IndexMismatch {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_append_rejects_wrong_prev_hash() {
        let mut chain = Chain::new("genesis", 50).unwrap();
        let block = Block::new_block(1, "wrong".to_string(), vec![], "miner-1").unwrap();

        let err = chain.append(block).unwrap_err();
        assert!(matches!(err, ConflictCause::PrevHashMismatch { .. }));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_transactions_in_block_order() {
        let mut chain = Chain::new("genesis", 50).unwrap();
        let first = Transaction::new_issuance("alice", 1).unwrap();
        let second = Transaction::new_issuance("bob", 2).unwrap();
        let third = Transaction::new_issuance("carol", 3).unwrap();

        let block = next_block(&chain, vec![first.clone(), second.clone()]);
        chain.append(block).unwrap();
        let block = next_block(&chain, vec![third.clone()]);
        chain.append(block).unwrap();

        let values: Vec<u64> = chain.transactions().map(|tx| tx.get_value()).collect();
        assert_eq!(values, vec![50, 1, 2, 3]);

        // Restartable
        let mut visited = 0;
        chain.for_each_transaction(|_| visited += 1);
        assert_eq!(visited, 4);
    }

    #[test]
    fn test_replace_swaps_blocks() {
        let mut ours = Chain::new("genesis", 50).unwrap();
        let mut theirs = ours.clone();
        let block = next_block(&theirs, vec![]);
        theirs.append(block).unwrap();

        assert!(ours.replace(theirs.blocks().to_vec()));
        assert_eq!(ours.len(), 2);
        assert!(!ours.replace(vec![]));
        assert_eq!(ours.len(), 2);
    }
}
