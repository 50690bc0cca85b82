// This is the async front door to the exchange
// The exchange lives on one task; callers hold a cheap handle and send it commands,
// so every mutation happens one at a time and nobody needs a lock

use crate::config::ExchangeSettings;
use crate::core::{Block, Investor, Transaction};
use crate::error::{ExchangeError, Result};
use crate::exchange::{Exchange, ExchangeSnapshot, Miner, Observer, Participant, Signal};
use crate::utils::RandomSource;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

pub enum Command {
    Register(Participant),
    StartGenerating,
    StopGenerating,
    SubmitBlock {
        block: Block,
        reply: oneshot::Sender<Result<()>>,
    },
    PoolSnapshot {
        limit: Option<usize>,
        reply: oneshot::Sender<Vec<Transaction>>,
    },
    Blocks {
        reply: oneshot::Sender<Vec<Block>>,
    },
    Snapshot {
        reply: oneshot::Sender<ExchangeSnapshot>,
    },
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct ExchangeHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ExchangeHandle {
    /// Build the exchange and move it onto its own task.
    /// Must be called from inside a tokio runtime.
    pub fn spawn(
        settings: ExchangeSettings,
        observer: Arc<dyn Observer>,
        random: Box<dyn RandomSource>,
    ) -> Result<(ExchangeHandle, JoinHandle<()>)> {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let exchange = Exchange::new(settings, observer, signal_tx)?.with_random(random);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(exchange, command_rx, signal_rx));
        Ok((
            ExchangeHandle {
                commands: command_tx,
            },
            task,
        ))
    }

    pub fn register_investor(&self, investor: Investor) -> Result<()> {
        self.send(Command::Register(Participant::Investor(investor)))
    }

    pub fn register_miner(&self, miner: Arc<dyn Miner>) -> Result<()> {
        self.send(Command::Register(Participant::Miner(miner)))
    }

    pub fn start_generating(&self) -> Result<()> {
        self.send(Command::StartGenerating)
    }

    pub fn stop_generating(&self) -> Result<()> {
        self.send(Command::StopGenerating)
    }

    pub async fn submit_block(&self, block: Block) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Command::SubmitBlock { block, reply })?;
        response.await.map_err(|_| ExchangeError::ServiceStopped)?
    }

    pub async fn pool_snapshot(&self, limit: Option<usize>) -> Result<Vec<Transaction>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::PoolSnapshot { limit, reply })?;
        response.await.map_err(|_| ExchangeError::ServiceStopped)
    }

    pub async fn blocks(&self) -> Result<Vec<Block>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Blocks { reply })?;
        response.await.map_err(|_| ExchangeError::ServiceStopped)
    }

    pub async fn snapshot(&self) -> Result<ExchangeSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        response.await.map_err(|_| ExchangeError::ServiceStopped)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| ExchangeError::ServiceStopped)
    }
}

async fn run(
    mut exchange: Exchange,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut signals: mpsc::UnboundedReceiver<Signal>,
) {
    info!("Exchange service started");
    loop {
        tokio::select! {
            // Continuations the exchange posted to itself go before new commands
            biased;

            Some(signal) = signals.recv() => exchange.handle_signal(signal),
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => dispatch(&mut exchange, command),
            },
        }
    }
    exchange.stop_generating();
    info!("Exchange service stopped");
}

fn dispatch(exchange: &mut Exchange, command: Command) {
    // A dropped reply receiver only means the caller stopped waiting
    match command {
        Command::Register(participant) => exchange.register(participant),
        Command::StartGenerating => {
            exchange.start_generating();
        }
        Command::StopGenerating => {
            exchange.stop_generating();
        }
        Command::SubmitBlock { block, reply } => {
            let result = exchange.submit_block(block);
            if let Err(e) = &result {
                error!("Block submission failed: {e}");
            }
            let _ = reply.send(result);
        }
        Command::PoolSnapshot { limit, reply } => {
            let _ = reply.send(exchange.pool_snapshot(limit));
        }
        Command::Blocks { reply } => {
            let _ = reply.send(exchange.blocks());
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(exchange.snapshot());
        }
        Command::Shutdown => {}
    }
}
