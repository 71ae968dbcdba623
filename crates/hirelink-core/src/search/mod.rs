pub mod accumulator;
pub mod coordinator;

pub use accumulator::OfferAccumulator;
pub use coordinator::{PollCancellationToken, SearchCoordinator};

use std::time::Duration;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SearchConfig {
    pub poll_interval: Duration,
    pub min_poll_interval: Duration,
    pub max_poll_interval: Duration,
    pub wait_budget: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
            min_poll_interval: Duration::from_millis(500),
            max_poll_interval: Duration::from_secs(10),
            wait_budget: Duration::from_secs(10),
        }
    }
}

impl SearchConfig {
    pub(crate) fn effective_interval(&self, recommended: Option<Duration>) -> Duration {
        match recommended {
            Some(value) => value.clamp(self.min_poll_interval, self.max_poll_interval),
            None => self.poll_interval,
        }
    }
}
