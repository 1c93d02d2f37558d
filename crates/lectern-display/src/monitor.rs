//! Pause monitor timer.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// Fixed-interval timer that exists only while playback is running.
///
/// While stopped, [`PauseMonitor::tick`] never resolves, so it can sit in a
/// `select!` unconditionally.
#[derive(Debug)]
pub struct PauseMonitor {
    period: Duration,
    ticker: Option<Interval>,
}

impl PauseMonitor {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ticker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Starts ticking one period from now. No-op if already running.
    pub fn start(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        trace!(period_ms = self.period.as_millis(), "pause monitor started");
    }

    pub fn stop(&mut self) {
        if self.ticker.take().is_some() {
            trace!("pause monitor stopped");
        }
    }

    /// Starts or stops to match `active`.
    pub fn sync(&mut self, active: bool) {
        if active {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Waits for the next tick. Cancel safe.
    pub async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_while_running() {
        let mut monitor = PauseMonitor::new(Duration::from_millis(250));
        monitor.start();

        let start = Instant::now();
        monitor.tick().await;
        monitor.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_monitor_never_ticks() {
        let mut monitor = PauseMonitor::new(Duration::from_millis(250));
        monitor.sync(true);
        monitor.sync(false);
        assert!(!monitor.is_running());

        let result = tokio::time::timeout(Duration::from_secs(5), monitor.tick()).await;
        assert!(result.is_err());
    }
}
