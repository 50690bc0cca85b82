// Canonical byte encoding used as the preimage for every ledger hash
use crate::error::{ExchangeError, Result};

/// Serialize data using bincode 2.0 with standard configuration
pub fn serialize<T: bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| ExchangeError::Serialization(format!("Serialization failed: {e}")))
}
