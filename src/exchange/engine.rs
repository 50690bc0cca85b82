// This is the exchange - the single owner of investors, pending transactions and the chain
// Everything that touches balances goes through here, one call at a time

use crate::config::ExchangeSettings;
use crate::core::{Block, Chain, Investor, Transaction};
use crate::error::{ExchangeError, Result};
use crate::exchange::{Generator, Miner, Notification, Observer, Participant};
use crate::storage::MemoryPool;
use crate::utils::{RandomSource, RngSource};
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Work the exchange posts to itself: timer ticks and resync responses
#[derive(Debug)]
pub enum Signal {
    Tick,
    ChainReceived { peer: String, blocks: Vec<Block> },
}

/// Point-in-time summary of the exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeSnapshot {
    pub investors: Vec<Investor>,
    pub investor_count: usize,
    pub miner_count: usize,
    pub pool_size: usize,
    pub chain_height: u64,
    pub last_block_hash: String,
    pub total_issued: u64,
    pub generating: bool,
}

pub struct Exchange {
    settings: ExchangeSettings,
    investors: IndexMap<String, Investor>, // Registration order is kept for display
    investor_count: usize,
    miners: IndexMap<String, Arc<dyn Miner>>,
    transactions: MemoryPool,
    chain: Chain,
    total_issued: u64,
    generator: Generator,
    random: Box<dyn RandomSource>,
    observer: Arc<dyn Observer>,
    mailbox: UnboundedSender<Signal>,
}

impl Exchange {
    /// Build an exchange holding only the genesis block and the genesis investor.
    /// Ticks and resync responses are posted to `mailbox`; whoever drives the
    /// exchange feeds them back through [`handle_signal`](Exchange::handle_signal).
    pub fn new(
        settings: ExchangeSettings,
        observer: Arc<dyn Observer>,
        mailbox: UnboundedSender<Signal>,
    ) -> Result<Exchange> {
        let chain = Chain::new(&settings.genesis_investor, settings.genesis_balance)?;
        let generator = Generator::new(settings.tick_interval());
        let genesis = Investor::new(settings.genesis_investor.clone(), settings.genesis_balance);

        let mut exchange = Exchange {
            total_issued: settings.base_issuance,
            settings,
            investors: IndexMap::new(),
            investor_count: 0,
            miners: IndexMap::new(),
            transactions: MemoryPool::new(),
            chain,
            generator,
            random: Box::new(RngSource::from_entropy()),
            observer,
            mailbox,
        };

        exchange
            .observer
            .notify(Notification::BlockAdded(exchange.chain.last_block().clone()));
        exchange.register_investor(genesis);
        exchange.recompute_total_issued();
        Ok(exchange)
    }

    /// Replace the random source, e.g. with a seeded or scripted one
    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    // Ids must be unique; registering the same id again replaces the investor
    pub fn register_investor(&mut self, investor: Investor) {
        self.investor_count += 1;
        let copy = investor.clone();
        if self
            .investors
            .insert(investor.get_id().to_string(), investor)
            .is_some()
        {
            warn!("Investor {} registered twice, keeping the latest", copy.get_id());
        }
        info!(
            "Registered investor {} with balance {}",
            copy.get_id(),
            copy.get_balance()
        );
        self.observer.notify(Notification::InvestorAdded(copy));
    }

    pub fn register_miner(&mut self, miner: Arc<dyn Miner>) {
        let id = miner.id().to_string();
        info!("Registered miner {id}");
        self.observer.notify(Notification::MinerAdded(id.clone()));
        self.miners.insert(id, miner);
    }

    pub fn register(&mut self, participant: Participant) {
        debug!("Registering participant {}", participant.id());
        match participant {
            Participant::Investor(investor) => self.register_investor(investor),
            Participant::Miner(miner) => self.register_miner(miner),
        }
    }

    /// Start the periodic generator. A no-op when it is already running.
    pub fn start_generating(&mut self) -> bool {
        let started = self.generator.start(self.mailbox.clone());
        if started {
            info!(
                "Transaction generator started ({} ms period)",
                self.generator.period().as_millis()
            );
        }
        started
    }

    /// Stop the periodic generator. A no-op when it is not running.
    pub fn stop_generating(&mut self) -> bool {
        let stopped = self.generator.stop();
        if stopped {
            info!("Transaction generator stopped");
        }
        stopped
    }

    pub fn is_generating(&self) -> bool {
        self.generator.is_running()
    }

    /// Continue work posted to the mailbox
    pub fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Tick => {
                // A tick can still be queued after stop_generating()
                if self.generator.is_running() {
                    self.generate_transaction();
                } else {
                    debug!("Ignoring tick while the generator is stopped");
                }
            }
            Signal::ChainReceived { peer, blocks } => {
                if self.chain.replace(blocks) {
                    info!(
                        "Chain resynced from {peer}, height is now {}",
                        self.chain.height()
                    );
                }
                self.start_generating();
            }
        }
    }

    /// One generator step: move a random amount between two random investors
    /// and pool the record. Returns `None` when the step is skipped.
    pub fn generate_transaction(&mut self) -> Option<Transaction> {
        let count = self.investors.len();
        if count == 0 {
            return None;
        }

        let from_idx = self.random.index(count);
        let to_idx = self.random.index(count);
        if from_idx == to_idx {
            return None;
        }

        let balance = self.investors[from_idx].get_balance();
        if balance == 0 {
            return None;
        }
        let value = self.random.amount(balance);

        let transaction = match Transaction::new_transfer(
            self.investors[from_idx].get_id(),
            self.investors[to_idx].get_id(),
            value,
        ) {
            Ok(tx) => tx,
            Err(e) => {
                error!("Failed to build generated transaction: {e}");
                return None;
            }
        };

        // Applied before confirmation so the same funds are not proposed twice
        self.investors[from_idx].debit(value);
        self.investors[to_idx].credit(value);

        debug!(
            "Generated transaction {}: {} -> {} ({value})",
            transaction.get_hash(),
            self.investors[from_idx].get_id(),
            self.investors[to_idx].get_id()
        );
        self.transactions.add(transaction.clone());
        self.observer
            .notify(Notification::TransactionAdded(transaction.clone()));
        Some(transaction)
    }

    /// Absorb a block produced by a miner.
    ///
    /// On success every balance is rebuilt from the chain, the block's
    /// transactions leave the pool, and the remaining pooled transactions are
    /// layered back on top. On a linkage failure the generator stops, a miner
    /// is asked for its chain, and `ChainConflict` is returned. Balances stay
    /// zeroed until the next accepted block.
    pub fn submit_block(&mut self, block: Block) -> Result<()> {
        for investor in self.investors.values_mut() {
            investor.reset_to_zero();
        }

        let miner = block.get_miner().to_string();
        match self.chain.append(block) {
            Ok(()) => {
                self.absorb_last_block();
                Ok(())
            }
            Err(cause) => {
                warn!("Rejected block from {miner}: {cause}");
                self.request_resync(&miner);
                Err(ExchangeError::ChainConflict { miner, cause })
            }
        }
    }

    fn absorb_last_block(&mut self) {
        // Phase one: balances as the chain alone has them
        let chain_changes = net_changes(&self.investors, self.chain.transactions());
        apply_net_changes(&mut self.investors, &chain_changes);
        self.recompute_total_issued();
        self.observer
            .notify(Notification::InvestorsReset(self.investors()));

        let block = self.chain.last_block().clone();
        let confirmed: Vec<String> = block
            .get_transactions()
            .iter()
            .filter_map(|tx| self.transactions.remove(tx.get_hash()))
            .map(|tx| tx.get_hash().to_string())
            .collect();
        if !confirmed.is_empty() {
            self.observer
                .notify(Notification::TransactionsRemoved(confirmed));
        }

        // Phase two: still-pending transactions on top of the chain balances
        let pending_changes = net_changes(&self.investors, self.transactions.iter());
        apply_net_changes(&mut self.investors, &pending_changes);

        info!(
            "Accepted block {} from {}, total issued {}, {} transactions pending",
            block.get_index(),
            block.get_miner(),
            self.total_issued,
            self.transactions.len()
        );
        self.observer.notify(Notification::BlockAdded(block));
    }

    fn recompute_total_issued(&mut self) {
        self.total_issued = self
            .investors
            .values()
            .fold(self.settings.base_issuance, |total, investor| {
                total.saturating_add(investor.get_balance())
            });
    }

    // Ask the submitting miner for its chain, or any miner if it is unknown
    fn request_resync(&mut self, miner_id: &str) {
        self.stop_generating();

        let peer = match self.miners.get(miner_id) {
            Some(miner) => Some(Arc::clone(miner)),
            None if self.miners.is_empty() => None,
            None => {
                let idx = self.random.index(self.miners.len());
                self.miners.get_index(idx).map(|(_, miner)| Arc::clone(miner))
            }
        };
        let Some(peer) = peer else {
            error!("No miner registered to resync from, transaction generation stays stopped");
            return;
        };

        let peer_id = peer.id().to_string();
        info!("Requesting chain from {peer_id}");
        let mailbox = self.mailbox.clone();
        peer.query_blocks(
            &self.settings.id,
            Box::new(move |blocks| {
                if mailbox
                    .send(Signal::ChainReceived {
                        peer: peer_id,
                        blocks,
                    })
                    .is_err()
                {
                    warn!("Exchange went away before the resync completed");
                }
            }),
        );
    }

    /// Copies of up to `limit` pending transactions, oldest first; all of them
    /// when `limit` is `None` or zero
    pub fn pool_snapshot(&self, limit: Option<usize>) -> Vec<Transaction> {
        self.transactions.snapshot(limit)
    }

    pub fn pool_len(&self) -> usize {
        self.transactions.len()
    }

    pub fn pool_contains(&self, hash: &str) -> bool {
        self.transactions.contains(hash)
    }

    pub fn investors(&self) -> Vec<Investor> {
        self.investors.values().cloned().collect()
    }

    pub fn investor(&self, id: &str) -> Option<Investor> {
        self.investors.get(id).cloned()
    }

    /// Registrations performed, duplicates included
    pub fn investor_count(&self) -> usize {
        self.investor_count
    }

    pub fn miner_count(&self) -> usize {
        self.miners.len()
    }

    pub fn total_issued(&self) -> u64 {
        self.total_issued
    }

    pub fn chain_height(&self) -> u64 {
        self.chain.height()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.chain.blocks().to_vec()
    }

    pub fn last_block(&self) -> Block {
        self.chain.last_block().clone()
    }

    pub fn chain_is_linked(&self) -> bool {
        self.chain.verify_linkage()
    }

    pub fn snapshot(&self) -> ExchangeSnapshot {
        ExchangeSnapshot {
            investors: self.investors(),
            investor_count: self.investor_count,
            miner_count: self.miners.len(),
            pool_size: self.transactions.len(),
            chain_height: self.chain.height(),
            last_block_hash: self.chain.last_block().get_hash().to_string(),
            total_issued: self.total_issued,
            generating: self.generator.is_running(),
        }
    }
}

// Net effect of `transactions` per registered investor, indexed like `investors`.
// Issuance credits the recipient; a transfer counts only when both sides are registered here.
// Summing first makes the result independent of record order within the pass.
fn net_changes<'a>(
    investors: &IndexMap<String, Investor>,
    transactions: impl Iterator<Item = &'a Transaction>,
) -> Vec<i128> {
    let mut changes = vec![0i128; investors.len()];
    for transaction in transactions {
        let value = i128::from(transaction.get_value());
        let Some(to_idx) = investors.get_index_of(transaction.get_to()) else {
            continue;
        };
        match transaction.get_from() {
            None => changes[to_idx] += value,
            Some(from) => {
                let Some(from_idx) = investors.get_index_of(from) else {
                    continue;
                };
                changes[from_idx] -= value;
                changes[to_idx] += value;
            }
        }
    }
    changes
}

// A net change that would take a balance below zero is a defect, and debit() says so
fn apply_net_changes(investors: &mut IndexMap<String, Investor>, changes: &[i128]) {
    for (investor, &change) in investors.values_mut().zip(changes) {
        let amount = match u64::try_from(change.unsigned_abs()) {
            Ok(amount) => amount,
            Err(_) => panic!(
                "invariant violation: net change {change} for {} is out of range",
                investor.get_id()
            ),
        };
        if change > 0 {
            investor.credit(amount);
        } else if change < 0 {
            investor.debit(amount);
        }
    }
}
