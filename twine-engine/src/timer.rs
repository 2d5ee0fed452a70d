use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Periodic trigger for automatic timeline refreshes.
///
/// The first tick fires one full period after creation. Ticks missed while
/// the owner was busy are not replayed in a burst.
pub struct RefreshTimer {
    interval: Interval,
    period: Duration,
}

impl RefreshTimer {
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_secs(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
