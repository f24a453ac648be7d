mod extract;
mod producer;
mod seen;

pub use extract::RecordExtractor;
pub use producer::{ProducerLoop, ProducerState, Shutdown};
pub use seen::SeenSet;

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::HarvestError;
use crate::models::Listing;
use crate::query::PageQuery;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;
pub const DEFAULT_IDLE_DELAY: Duration = Duration::from_millis(500);

/// Builder for a harvesting run over one page query.
pub struct Harvester<Q: PageQuery> {
    query: Q,
    capacity: usize,
    idle_delay: Duration,
}

impl<Q: PageQuery + 'static> Harvester<Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            idle_delay: DEFAULT_IDLE_DELAY,
        }
    }

    pub fn from_config(query: Q, config: &Config) -> Self {
        Self::new(query)
            .with_capacity(config.channel_capacity)
            .with_idle_delay(config.idle_delay())
    }

    /// Zero is treated as one: the channel always has room for a listing.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn with_idle_delay(mut self, idle_delay: Duration) -> Self {
        self.idle_delay = idle_delay;
        self
    }

    /// Spawn the producer and hand back the listing channel right away.
    ///
    /// The channel yields `None` once the producer stops, whether it was
    /// cancelled or failed; the join handle tells which.
    pub fn start(
        self,
        cancel: CancellationToken,
    ) -> (mpsc::Receiver<Listing>, JoinHandle<Result<Shutdown, HarvestError>>) {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let producer = ProducerLoop::new(self.query, sender, cancel, self.idle_delay);
        let task = tokio::spawn(producer.run());
        (receiver, task)
    }
}
