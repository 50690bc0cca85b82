//! Simulated miner network
//!
//! Peer miners keep their own chain copies and feed blocks to one exchange.
//! Missed broadcasts make them fork, which exercises the exchange's resync path.

pub mod peer_miner;
pub mod simulation;

pub use peer_miner::PeerMiner;
pub use simulation::{Simulation, SimulationReport};
