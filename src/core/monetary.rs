/// Monetary and genesis constants shared by the exchange and its peers
///
/// Amounts are whole units; there is no smaller denomination.

/// Investor seeded with the genesis issuance
pub const GENESIS_INVESTOR: &str = "genesis";

/// Amount issued to the genesis investor by the genesis block
pub const GENESIS_ISSUANCE: u64 = 50;

/// Issuance that exists outside any investor balance. Added on top of the
/// summed balances when the exchange recomputes its total.
pub const BASE_ISSUANCE: u64 = 50;

/// Miner id recorded on the genesis block
pub const GENESIS_MINER: &str = "genesis";

/// Previous-hash placeholder of the genesis block
pub const GENESIS_PREV_HASH: &str = "0";

/// Id the exchange presents to miners when asking for their chain
pub const EXCHANGE_ID: &str = "exchange";

/// Default generator period in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;
