use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::HarvestError;
use crate::models::Listing;
use crate::pipeline::RecordExtractor;
use crate::query::PageQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    Running,
    Cancelling,
    Stopped,
}

/// Why a producer stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Cancelled,
    /// Every receiver was dropped, nobody is listening anymore.
    ConsumerClosed,
}

enum Step {
    Continue,
    Cancelled,
    ConsumerClosed,
}

/// Single-owner loop: fetch a batch, extract, drop already seen listings,
/// send the rest in order. Owns the only `Sender`, so the channel closes
/// exactly once, when the loop returns.
pub struct ProducerLoop<Q: PageQuery> {
    query: Q,
    extractor: RecordExtractor,
    sender: mpsc::Sender<Listing>,
    cancel: CancellationToken,
    idle_delay: Duration,
    state: ProducerState,
}

impl<Q: PageQuery> ProducerLoop<Q> {
    pub fn new(
        query: Q,
        sender: mpsc::Sender<Listing>,
        cancel: CancellationToken,
        idle_delay: Duration,
    ) -> Self {
        Self {
            query,
            extractor: RecordExtractor::new(),
            sender,
            cancel,
            idle_delay,
            state: ProducerState::Running,
        }
    }

    pub fn state(&self) -> ProducerState {
        self.state
    }

    pub async fn run(mut self) -> Result<Shutdown, HarvestError> {
        info!("Starting listing producer (channel capacity {})", self.sender.max_capacity());

        let mut outcome = Ok(Shutdown::Cancelled);
        while self.state != ProducerState::Stopped {
            self.state = match self.state {
                ProducerState::Running => match self.step().await {
                    Ok(Step::Continue) => ProducerState::Running,
                    Ok(Step::Cancelled) => ProducerState::Cancelling,
                    Ok(Step::ConsumerClosed) => {
                        warn!("Listing receiver dropped, stopping producer");
                        outcome = Ok(Shutdown::ConsumerClosed);
                        ProducerState::Stopped
                    }
                    Err(e) => {
                        error!("Listing producer failed: {}", e);
                        outcome = Err(e);
                        ProducerState::Stopped
                    }
                },
                ProducerState::Cancelling => {
                    info!("Cancellation requested, closing listing channel");
                    outcome = Ok(Shutdown::Cancelled);
                    ProducerState::Stopped
                }
                ProducerState::Stopped => ProducerState::Stopped,
            };
        }

        let ProducerLoop { sender, extractor, .. } = self;
        drop(sender);
        info!("Listing producer stopped after {} unique listings", extractor.seen().len());

        outcome
    }

    async fn step(&mut self) -> Result<Step, HarvestError> {
        if self.cancel.is_cancelled() {
            return Ok(Step::Cancelled);
        }

        // Only fetch while the consumer has room; otherwise wait for a slot.
        if self.sender.capacity() == 0 {
            debug!("Listing channel full, waiting for the consumer");
            tokio::select! {
                () = self.cancel.cancelled() => return Ok(Step::Cancelled),
                permit = self.sender.reserve() => match permit {
                    Ok(permit) => drop(permit),
                    Err(_) => return Ok(Step::ConsumerClosed),
                },
            }
        }

        let items = self.query.fetch_batch().await?;
        if items.is_empty() {
            info!("No more listings.");
            return Ok(idle(&self.cancel, self.idle_delay).await);
        }

        let listings = self.extractor.extract_batch(&items)?;
        debug!("{} of {} listing cards are new", listings.len(), items.len());
        if listings.is_empty() {
            return Ok(idle(&self.cancel, self.idle_delay).await);
        }

        let mut pending = listings.len();
        for listing in listings {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!("Dropping {} undelivered listings", pending);
                    return Ok(Step::Cancelled);
                }
                sent = self.sender.send(listing) => {
                    if sent.is_err() {
                        return Ok(Step::ConsumerClosed);
                    }
                }
            }
            pending -= 1;
        }

        Ok(Step::Continue)
    }
}

// Must not borrow the whole loop across the await: `Q` is only `Send`.
async fn idle(cancel: &CancellationToken, delay: Duration) -> Step {
    tokio::select! {
        () = cancel.cancelled() => Step::Cancelled,
        () = tokio::time::sleep(delay) => Step::Continue,
    }
}
