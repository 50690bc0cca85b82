// This file implements the value-transfer record, the unit of value movement in the exchange
// A record moves `value` from one investor to another, or issues new value when `from` is absent
// Records are immutable once built and are identified only by their content hash

use crate::error::{ExchangeError, Result};
use crate::utils::{current_timestamp, serialize, sha256_hex};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    from: Option<String>, // Absent for issuance and miner rewards
    to: String,
    value: u64,
    timestamp: i64,
    salt: Vec<u8>, // Random bytes so two identical transfers never share a hash
    hash: String,
}

impl Transaction {
    // When an investor pays another investor
    pub fn new_transfer(from: &str, to: &str, value: u64) -> Result<Transaction> {
        if from.is_empty() {
            return Err(ExchangeError::InvalidTransaction(
                "Sender id must not be empty".to_string(),
            ));
        }
        Self::build(Some(from.to_string()), to, value)
    }

    // When new value enters the system (genesis or a miner reward)
    pub fn new_issuance(to: &str, value: u64) -> Result<Transaction> {
        Self::build(None, to, value)
    }

    // The genesis issuance has to hash identically on every participant,
    // so it carries a fixed timestamp and an all-zero salt
    pub fn genesis_issuance(to: &str, value: u64) -> Result<Transaction> {
        Self::validate(to, value)?;
        Self::with_parts(None, to.to_string(), value, 0, vec![0u8; 16])
    }

    fn build(from: Option<String>, to: &str, value: u64) -> Result<Transaction> {
        Self::validate(to, value)?;
        let salt = Uuid::new_v4().as_bytes().to_vec();
        Self::with_parts(from, to.to_string(), value, current_timestamp()?, salt)
    }

    fn validate(to: &str, value: u64) -> Result<()> {
        if value == 0 {
            return Err(ExchangeError::InvalidTransaction(
                "Transaction value must be positive".to_string(),
            ));
        }
        if to.is_empty() {
            return Err(ExchangeError::InvalidTransaction(
                "Recipient id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn with_parts(
        from: Option<String>,
        to: String,
        value: u64,
        timestamp: i64,
        salt: Vec<u8>,
    ) -> Result<Transaction> {
        let mut tx = Transaction {
            from,
            to,
            value,
            timestamp,
            salt,
            hash: String::new(),
        };
        tx.hash = tx.compute_hash()?;
        Ok(tx)
    }

    pub fn get_from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn get_to(&self) -> &str {
        self.to.as_str()
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn is_issuance(&self) -> bool {
        self.from.is_none()
    }

    /// Recompute the content hash, used when checking a block received from a peer
    pub fn compute_hash(&self) -> Result<String> {
        let preimage = (
            self.from.clone(),
            self.to.clone(),
            self.value,
            self.timestamp,
            self.salt.clone(),
        );
        Ok(sha256_hex(&serialize(&preimage)?))
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Transaction {}

impl Hash for Transaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_transfer_fields() {
        let tx = Transaction::new_transfer("alice", "bob", 30).unwrap();
        assert_eq!(tx.get_from(), Some("alice"));
        assert_eq!(tx.get_to(), "bob");
        assert_eq!(tx.get_value(), 30);
        assert!(!tx.is_issuance());
        assert!(tx.get_timestamp() > 0);
        assert_eq!(tx.get_hash().len(), 64);
    }

    #[test]
    fn test_zero_value_rejected() {
        let result = Transaction::new_transfer("alice", "bob", 0);
        assert!(matches!(result, Err(ExchangeError::InvalidTransaction(_))));
        assert!(Transaction::new_issuance("bob", 0).is_err());
    }

    #[test]
    fn test_missing_recipient_rejected() {
        assert!(Transaction::new_issuance("", 10).is_err());
        assert!(Transaction::new_transfer("", "bob", 10).is_err());
    }

    #[test]
    fn test_identical_transfers_get_distinct_hashes() {
        let hashes: HashSet<String> = (0..200)
            .map(|_| {
                Transaction::new_transfer("alice", "bob", 5)
                    .unwrap()
                    .get_hash()
                    .to_string()
            })
            .collect();
        assert_eq!(hashes.len(), 200);
    }

    #[test]
    fn test_genesis_issuance_is_deterministic() {
        let a = Transaction::genesis_issuance("genesis", 50).unwrap();
        let b = Transaction::genesis_issuance("genesis", 50).unwrap();
        assert_eq!(a, b);
        assert!(a.is_issuance());
        assert_eq!(a.get_timestamp(), 0);
    }

    #[test]
    fn test_hash_is_stable() {
        let tx = Transaction::new_issuance("bob", 12).unwrap();
        assert_eq!(tx.compute_hash().unwrap(), tx.get_hash());
    }
}
