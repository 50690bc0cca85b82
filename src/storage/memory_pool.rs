use crate::core::Transaction;
use indexmap::IndexMap;

/// Unconfirmed transactions waiting for a block.
///
/// ( K -> transaction hash, V => Transaction ), kept in insertion order so
/// miners take the oldest transactions first.
#[derive(Debug, Default)]
pub struct MemoryPool {
    inner: IndexMap<String, Transaction>,
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool {
            inner: IndexMap::new(),
        }
    }

    pub fn get(&self, hash: &str) -> Option<&Transaction> {
        self.inner.get(hash)
    }

    pub fn add(&mut self, tx: Transaction) {
        self.inner.insert(tx.get_hash().to_string(), tx);
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.inner.contains_key(hash)
    }

    pub fn remove(&mut self, hash: &str) -> Option<Transaction> {
        // shift_remove keeps the remaining entries in insertion order
        self.inner.shift_remove(hash)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.inner.values()
    }

    /// Copies of up to `limit` transactions in pool order; all of them when
    /// `limit` is `None` or zero
    pub fn snapshot(&self, limit: Option<usize>) -> Vec<Transaction> {
        let take = match limit {
            Some(n) if n > 0 => n,
            _ => self.inner.len(),
        };
        self.inner.values().take(take).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(count: u64) -> (MemoryPool, Vec<Transaction>) {
        let mut pool = MemoryPool::new();
        let txs: Vec<Transaction> = (1..=count)
            .map(|value| Transaction::new_transfer("alice", "bob", value).unwrap())
            .collect();
        for tx in &txs {
            pool.add(tx.clone());
        }
        (pool, txs)
    }

    #[test]
    fn test_add_and_remove() {
        let (mut pool, txs) = pool_with(2);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(txs[0].get_hash()));
        assert_eq!(pool.get(txs[1].get_hash()), Some(&txs[1]));

        let removed = pool.remove(txs[0].get_hash());
        assert_eq!(removed.as_ref(), Some(&txs[0]));
        assert!(!pool.contains(txs[0].get_hash()));
        assert!(pool.remove(txs[0].get_hash()).is_none());
        assert!(pool.get(txs[0].get_hash()).is_none());
    }

    #[test]
    fn test_snapshot_limits_and_order() {
        let (pool, txs) = pool_with(5);

        let all = pool.snapshot(None);
        assert_eq!(all, txs);
        assert_eq!(pool.snapshot(Some(0)).len(), 5);

        let first_two = pool.snapshot(Some(2));
        assert_eq!(first_two, txs[..2].to_vec());
        assert_eq!(pool.snapshot(Some(50)).len(), 5);
    }

    #[test]
    fn test_remove_keeps_order() {
        let (mut pool, txs) = pool_with(4);
        pool.remove(txs[1].get_hash());
        let values: Vec<u64> = pool.iter().map(|tx| tx.get_value()).collect();
        assert_eq!(values, vec![1, 3, 4]);
    }

    #[test]
    fn test_clear() {
        let (mut pool, _) = pool_with(3);
        pool.clear();
        assert!(pool.is_empty());
    }
}
