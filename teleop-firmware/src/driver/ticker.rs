//! `embassy_time::Ticker` as a loop tick source.

use embassy_time::{Duration, Instant, Ticker};

use super::TickSource;

pub struct TickerSource {
    period: Duration,
    ticker: Ticker,
}

impl TickerSource {
    pub fn new(period: core::time::Duration) -> Self {
        let micros = u64::try_from(period.as_micros()).unwrap_or(u64::MAX);
        let period = Duration::from_micros(micros);
        Self {
            period,
            ticker: Ticker::every(period),
        }
    }

    pub const fn period(&self) -> Duration {
        self.period
    }
}

impl TickSource for TickerSource {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn next(&mut self) -> Instant {
        self.ticker.next().await;
        Instant::now()
    }

    fn restart(&mut self) {
        self.ticker.reset();
    }
}
