use std::fmt;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Elapsed recording time relative to the deadline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub elapsed_ms: u64,
    pub deadline_ms: u64,
    /// `min(100, elapsed / deadline * 100)`
    pub percent: f64,
}

impl Progress {
    pub fn new(elapsed_ms: u64, deadline_ms: u64) -> Self {
        Self {
            elapsed_ms,
            deadline_ms,
            percent: progress_percent(elapsed_ms, deadline_ms),
        }
    }

    pub fn deadline_reached(&self) -> bool {
        self.elapsed_ms >= self.deadline_ms
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Recording: {:.1}/{:.1} seconds",
            self.elapsed_ms as f64 / 1000.0,
            self.deadline_ms as f64 / 1000.0
        )
    }
}

pub fn progress_percent(elapsed_ms: u64, deadline_ms: u64) -> f64 {
    if deadline_ms == 0 {
        return 100.0;
    }
    (elapsed_ms as f64 / deadline_ms as f64 * 100.0).min(100.0)
}

/// Single periodic clock for progress reporting and the recording deadline
///
/// Runs on tokio's clock, so tests drive it with paused time. Dropping the
/// ticker cancels it.
#[derive(Debug)]
pub struct ProgressTicker {
    interval: Interval,
    started_at: Instant,
    deadline: Duration,
}

impl ProgressTicker {
    /// Start ticking every `period`; the first tick lands one period from now
    pub fn start(period: Duration, deadline: Duration) -> Self {
        let started_at = Instant::now();
        let mut interval = interval_at(started_at + period, period);
        // A stalled loop catches up with one tick instead of a burst
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            interval,
            started_at,
            deadline,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Progress as of now, without waiting for a tick
    pub fn current(&self) -> Progress {
        Progress::new(
            self.elapsed().as_millis() as u64,
            self.deadline.as_millis() as u64,
        )
    }

    /// Wait for the next tick. Cancel-safe.
    pub async fn tick(&mut self) -> Progress {
        self.interval.tick().await;
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent_is_clamped() {
        assert_eq!(progress_percent(0, 5000), 0.0);
        assert_eq!(progress_percent(2500, 5000), 50.0);
        assert_eq!(progress_percent(5000, 5000), 100.0);
        assert_eq!(progress_percent(7300, 5000), 100.0);
        assert_eq!(progress_percent(10, 0), 100.0);
    }

    #[test]
    fn test_progress_status_line() {
        let progress = Progress::new(1200, 5000);
        assert_eq!(progress.to_string(), "Recording: 1.2/5.0 seconds");
        assert!(!progress.deadline_reached());
        assert!(Progress::new(5000, 5000).deadline_reached());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_reaches_deadline_monotonically() {
        let mut ticker = ProgressTicker::start(Duration::from_millis(100), Duration::from_secs(5));
        let mut reports = Vec::new();

        loop {
            let progress = ticker.tick().await;
            reports.push(progress);
            if progress.deadline_reached() {
                break;
            }
        }

        assert_eq!(reports.first().map(|p| p.elapsed_ms), Some(100));
        assert!(reports.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(reports.last().map(|p| p.percent), Some(100.0));
        assert_eq!(reports.len(), 50);
    }
}
