//! Notifications the exchange emits for display layers
//!
//! Every payload is an owned copy; observers never see live exchange state.

use crate::core::{Block, Investor, Transaction};
use log::{debug, warn};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum Notification {
    InvestorAdded(Investor),
    MinerAdded(String),
    BlockAdded(Block),
    TransactionAdded(Transaction),
    /// Hashes of pooled transactions confirmed by one block
    TransactionsRemoved(Vec<String>),
    /// Every investor after a full balance recompute
    InvestorsReset(Vec<Investor>),
}

impl Notification {
    /// Stable tag for the kind of change, in `entity/action` form
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::InvestorAdded(_) => "investor/add",
            Notification::MinerAdded(_) => "miner/add",
            Notification::BlockAdded(_) => "block/add",
            Notification::TransactionAdded(_) => "transaction/add",
            Notification::TransactionsRemoved(_) => "transaction/batch/del",
            Notification::InvestorsReset(_) => "investor/reset",
        }
    }
}

pub trait Observer: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes every notification to the log at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&self, notification: Notification) {
        match serde_json::to_string(&notification) {
            Ok(json) => debug!("{}: {json}", notification.kind()),
            Err(e) => warn!("Failed to encode {} notification: {e}", notification.kind()),
        }
    }
}

/// Forwards notifications into a channel, e.g. for a UI task
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: UnboundedSender<Notification>,
}

impl ChannelObserver {
    pub fn new(sender: UnboundedSender<Notification>) -> Self {
        Self { sender }
    }
}

impl Observer for ChannelObserver {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_kinds() {
        let investor = Investor::new("alice", 1);
        assert_eq!(
            Notification::InvestorAdded(investor.clone()).kind(),
            "investor/add"
        );
        assert_eq!(
            Notification::InvestorsReset(vec![investor]).kind(),
            "investor/reset"
        );
        assert_eq!(
            Notification::TransactionsRemoved(vec![]).kind(),
            "transaction/batch/del"
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(Notification::MinerAdded("m1".to_string())).unwrap();
        assert_eq!(json["type"], "MinerAdded");
        assert_eq!(json["payload"], "m1");
    }

    #[test]
    fn test_channel_observer_forwards() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let observer = ChannelObserver::new(tx);
        observer.notify(Notification::MinerAdded("m1".to_string()));

        let received = rx.try_recv().unwrap();
        assert_eq!(received, Notification::MinerAdded("m1".to_string()));
    }

    #[test]
    fn test_channel_observer_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ChannelObserver::new(tx).notify(Notification::MinerAdded("m1".to_string()));
    }
}
