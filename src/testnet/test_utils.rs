use crate::config::ExchangeSettings;
use crate::core::{Block, Transaction};
use crate::exchange::{BlocksCallback, Exchange, Miner, Notification, Observer, Signal};
use crate::utils::RandomSource;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Plays back fixed draws. Once a script runs out, indices fall back to 0
/// and amounts to 1.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    indices: VecDeque<usize>,
    amounts: VecDeque<u64>,
}

impl ScriptedRandom {
    pub fn new(indices: Vec<usize>, amounts: Vec<u64>) -> Self {
        Self {
            indices: indices.into(),
            amounts: amounts.into(),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn index(&mut self, upper: usize) -> usize {
        self.indices.pop_front().unwrap_or(0) % upper
    }

    fn amount(&mut self, balance: u64) -> u64 {
        self.amounts.pop_front().unwrap_or(1).min(balance)
    }
}

/// Keeps every notification it receives
#[derive(Debug, Default)]
pub struct RecordingObserver {
    received: Mutex<Vec<Notification>>,
}

impl RecordingObserver {
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(Notification::kind)
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, notification: Notification) {
        self.received.lock().unwrap().push(notification);
    }
}

/// Answers every chain query immediately with the same blocks
#[derive(Debug)]
pub struct StaticMiner {
    id: String,
    blocks: Vec<Block>,
    queries: Mutex<Vec<String>>,
}

impl StaticMiner {
    pub fn new(id: &str, blocks: Vec<Block>) -> Arc<StaticMiner> {
        Arc::new(StaticMiner {
            id: id.to_string(),
            blocks,
            queries: Mutex::new(Vec::new()),
        })
    }

    /// Requester ids, one per query received
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Miner for StaticMiner {
    fn id(&self) -> &str {
        &self.id
    }

    fn query_blocks(&self, requester: &str, respond: BlocksCallback) {
        self.queries.lock().unwrap().push(requester.to_string());
        respond(self.blocks.clone());
    }
}

/// Exchange with default settings, its mailbox receiver and a recording observer
pub fn new_test_exchange(
    random: ScriptedRandom,
) -> (Exchange, UnboundedReceiver<Signal>, Arc<RecordingObserver>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let observer = Arc::new(RecordingObserver::default());
    let exchange = Exchange::new(ExchangeSettings::default(), observer.clone(), tx)
        .unwrap()
        .with_random(Box::new(random));
    (exchange, rx, observer)
}

/// Valid successor of `prev`
pub fn block_on_top(prev: &Block, transacs: Vec<Transaction>, miner: &str) -> Block {
    Block::new_block(prev.get_index() + 1, prev.get_hash().to_string(), transacs, miner).unwrap()
}
