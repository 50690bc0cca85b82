use crate::exchange::Signal;
use log::{debug, error};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// The repeating timer behind transaction generation.
///
/// It only posts [`Signal::Tick`] into the exchange mailbox; the exchange does
/// the work on its own task. At most one timer task is alive at a time.
#[derive(Debug)]
pub struct Generator {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl Generator {
    pub fn new(period: Duration) -> Self {
        Self { period, task: None }
    }

    /// Returns false when already running or when there is no tokio runtime
    pub fn start(&mut self, mailbox: UnboundedSender<Signal>) -> bool {
        if self.task.is_some() {
            return false;
        }
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot start transaction generator outside a tokio runtime: {e}");
                return false;
            }
        };

        let period = self.period;
        self.task = Some(runtime.spawn(async move {
            // First tick one full period after start
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if mailbox.send(Signal::Tick).is_err() {
                    debug!("Exchange mailbox closed, generator exiting");
                    break;
                }
            }
        }));
        true
    }

    /// Returns false when nothing was running
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_start_without_runtime_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut generator = Generator::new(Duration::from_millis(10));
        assert!(!generator.start(tx));
        assert!(!generator.is_running());
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut generator = Generator::new(Duration::from_millis(10));
        assert!(generator.start(tx.clone()));
        assert!(!generator.start(tx));
        assert!(generator.is_running());

        assert!(generator.stop());
        assert!(!generator.stop());
        assert!(!generator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_arrive_each_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut generator = Generator::new(Duration::from_millis(500));
        generator.start(tx);

        tokio::time::sleep(Duration::from_millis(1_250)).await;
        let mut ticks = 0;
        while let Ok(Signal::Tick) = rx.try_recv() {
            ticks += 1;
        }
        assert_eq!(ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut generator = Generator::new(Duration::from_millis(100));
        generator.start(tx);
        generator.stop();

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(rx.try_recv().is_err());
    }
}
