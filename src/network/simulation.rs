// This is the simulation driver - it plays the part of the miner network around one exchange
// Miners take turns producing blocks; accepted blocks are broadcast to the others,
// and now and then a peer misses one so the next block it builds forks

use crate::config::Settings;
use crate::core::{Block, Investor, Transaction};
use crate::error::{ExchangeError, Result};
use crate::exchange::{ExchangeHandle, Miner, Observer};
use crate::network::PeerMiner;
use crate::utils::RngSource;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

/// What happened during one simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub elapsed: Duration,
    pub blocks_submitted: usize,
    pub blocks_accepted: usize,
    pub conflicts: usize,
    pub missed_broadcasts: usize,
    pub chain_height: u64,
    pub pending_transactions: usize,
    pub total_issued: u64,
    pub balance_sum: u64,
    pub investors: Vec<Investor>,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation finished after {:.1}s", self.elapsed.as_secs_f64())?;
        writeln!(
            f,
            "  Blocks: {} submitted, {} accepted, {} conflicts",
            self.blocks_submitted, self.blocks_accepted, self.conflicts
        )?;
        writeln!(f, "  Missed broadcasts: {}", self.missed_broadcasts)?;
        writeln!(f, "  Chain height: {}", self.chain_height)?;
        writeln!(f, "  Pending transactions: {}", self.pending_transactions)?;
        writeln!(
            f,
            "  Total issued: {} (balances sum to {})",
            self.total_issued, self.balance_sum
        )?;
        writeln!(f, "  Investors:")?;
        for investor in &self.investors {
            writeln!(f, "    {}: {}", investor.get_id(), investor.get_balance())?;
        }
        Ok(())
    }
}

pub struct Simulation {
    settings: Settings,
    observer: Arc<dyn Observer>,
}

#[derive(Default)]
struct Tally {
    submitted: usize,
    accepted: usize,
    conflicts: usize,
    missed: usize,
}

impl Simulation {
    pub fn new(settings: Settings, observer: Arc<dyn Observer>) -> Simulation {
        Simulation { settings, observer }
    }

    /// Run for the configured duration and report. Must be awaited inside a tokio runtime.
    pub async fn run(&self) -> Result<SimulationReport> {
        self.settings.validate()?;
        let sim = &self.settings.simulation;
        let started = Instant::now();

        let (handle, task) = ExchangeHandle::spawn(
            self.settings.exchange.clone(),
            Arc::clone(&self.observer),
            Box::new(RngSource::from_seed_option(sim.seed)),
        )?;
        // Separate stream so broadcast draws do not shift the generator's draws
        let mut rng = match sim.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        // Starting balances go on chain when there is a miner to carry them,
        // otherwise the first replay would wipe them
        let fund_on_chain = sim.miners > 0 && sim.initial_balance > 0;
        let registered_balance = if fund_on_chain { 0 } else { sim.initial_balance };
        for i in 0..sim.investors {
            handle.register_investor(Investor::new(investor_id(i), registered_balance))?;
        }

        let genesis_chain = handle.blocks().await?;
        let miners: Vec<Arc<PeerMiner>> = (0..sim.miners)
            .map(|i| {
                let beneficiary = if sim.investors == 0 {
                    self.settings.exchange.genesis_investor.clone()
                } else {
                    investor_id(i % sim.investors)
                };
                Arc::new(PeerMiner::new(
                    format!("miner-{i}"),
                    beneficiary,
                    sim.block_reward,
                    sim.resync_delay(),
                    genesis_chain.clone(),
                ))
            })
            .collect();
        for miner in &miners {
            debug!("Miner {} pays rewards to {}", miner.id(), miner.get_beneficiary());
            handle.register_miner(miner.clone())?;
        }

        if fund_on_chain {
            fund_investors(&handle, &miners, sim.investors, sim.initial_balance).await?;
        }

        info!(
            "Simulating {} investors and {} miners for {}s",
            sim.investors, sim.miners, sim.duration_secs
        );
        handle.start_generating()?;

        let mut tally = Tally::default();
        let mut ticker = interval_at(Instant::now() + sim.block_interval(), sim.block_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = sleep(sim.duration());
        tokio::pin!(deadline);

        let mut round = 0usize;
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = ticker.tick() => {
                    if miners.is_empty() {
                        continue;
                    }
                    let producer = &miners[round % miners.len()];
                    round += 1;
                    self.mine_round(&handle, producer, &miners, &mut rng, &mut tally)
                        .await?;
                }
            }
        }

        handle.stop_generating()?;
        let snapshot = handle.snapshot().await?;
        handle.shutdown()?;
        if let Err(e) = task.await {
            warn!("Exchange task ended abnormally: {e}");
        }

        let balance_sum = snapshot
            .investors
            .iter()
            .map(Investor::get_balance)
            .sum();
        Ok(SimulationReport {
            elapsed: started.elapsed(),
            blocks_submitted: tally.submitted,
            blocks_accepted: tally.accepted,
            conflicts: tally.conflicts,
            missed_broadcasts: tally.missed,
            chain_height: snapshot.chain_height,
            pending_transactions: snapshot.pool_size,
            total_issued: snapshot.total_issued,
            balance_sum,
            investors: snapshot.investors,
        })
    }

    async fn mine_round(
        &self,
        handle: &ExchangeHandle,
        producer: &PeerMiner,
        miners: &[Arc<PeerMiner>],
        rng: &mut StdRng,
        tally: &mut Tally,
    ) -> Result<()> {
        let sim = &self.settings.simulation;
        let pending = handle.pool_snapshot(Some(sim.block_size)).await?;
        let block = producer.assemble_block(pending)?;
        tally.submitted += 1;

        match handle.submit_block(block.clone()).await {
            Ok(()) => {
                tally.accepted += 1;
                tally.missed += broadcast(&block, miners, sim.lag_probability, rng)?;
                Ok(())
            }
            Err(ExchangeError::ChainConflict { miner, cause }) => {
                tally.conflicts += 1;
                warn!("Block from {miner} rejected ({cause}), catching it up");
                catch_up(producer, miners)
            }
            Err(e) => Err(e),
        }
    }
}

// One block issuing `amount` to every investor, adopted by every miner
async fn fund_investors(
    handle: &ExchangeHandle,
    miners: &[Arc<PeerMiner>],
    investors: usize,
    amount: u64,
) -> Result<()> {
    let Some(funder) = miners.first() else {
        return Ok(());
    };
    let issuances = (0..investors)
        .map(|i| Transaction::new_issuance(&investor_id(i), amount))
        .collect::<Result<Vec<_>>>()?;
    let block = funder.assemble_block(issuances)?;
    handle.submit_block(block.clone()).await?;
    for miner in miners {
        miner.adopt_block(block.clone())?;
    }
    info!("Funded {investors} investors with {amount} each in block {}", block.get_index());
    Ok(())
}

fn investor_id(i: usize) -> String {
    format!("investor-{i}")
}

// Returns how many peers missed the block
fn broadcast(
    block: &Block,
    miners: &[Arc<PeerMiner>],
    lag_probability: f64,
    rng: &mut StdRng,
) -> Result<usize> {
    let mut missed = 0;
    for miner in miners {
        if block.get_miner() != miner.id() && rng.gen_bool(lag_probability) {
            debug!("Miner {} missed block {}", miner.id(), block.get_index());
            missed += 1;
            continue;
        }
        miner.adopt_block(block.clone())?;
    }
    Ok(missed)
}

// Longest chain among the peers wins
fn catch_up(producer: &PeerMiner, miners: &[Arc<PeerMiner>]) -> Result<()> {
    let mut longest = producer.get_blocks()?;
    for miner in miners {
        let blocks = miner.get_blocks()?;
        if blocks.len() > longest.len() {
            longest = blocks;
        }
    }
    producer.replace_chain(longest)
}
