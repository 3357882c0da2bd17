//! Development randomness source.
//!
//! [LocalCoordinator] stands in for an external oracle on development networks:
//! it hands out sequential request ids and a background [Worker] answers each
//! one after a fixed delay with a value from a seeded ChaCha20 stream. The values
//! are reproducible for a given seed and carry no unpredictability guarantee.

use autoraffle_execution::{RandomnessError, RandomnessRequest, RandomnessSource};
use autoraffle_types::RequestId;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle, time};
use tracing::{debug, info, warn};

use crate::raffle::{Fulfiller, ServiceError};

pub struct LocalCoordinator {
    subscription_id: u64,
    next_id: RequestId,
    queue: mpsc::UnboundedSender<RequestId>,
}

impl LocalCoordinator {
    pub fn new(subscription_id: u64, delay: Duration, seed: u64) -> (Self, Worker) {
        let (queue, requests) = mpsc::unbounded_channel();
        (
            Self {
                subscription_id,
                next_id: 1,
                queue,
            },
            Worker {
                requests,
                delay,
                rng: ChaCha20Rng::seed_from_u64(seed),
            },
        )
    }
}

impl RandomnessSource for LocalCoordinator {
    fn request_random_value(
        &mut self,
        request: &RandomnessRequest,
    ) -> Result<RequestId, RandomnessError> {
        if request.subscription_id != self.subscription_id {
            return Err(RandomnessError::SubscriptionRejected(
                request.subscription_id,
            ));
        }
        let request_id = self.next_id;
        self.queue.send(request_id).map_err(|_| {
            RandomnessError::Unavailable("local coordinator worker stopped".to_string())
        })?;
        self.next_id += 1;
        debug!(
            request_id,
            confirmations = request.request_confirmations,
            callback_gas_limit = request.callback_gas_limit,
            "randomness requested"
        );
        Ok(request_id)
    }
}

/// Answers queued requests through a [Fulfiller].
pub struct Worker {
    requests: mpsc::UnboundedReceiver<RequestId>,
    delay: Duration,
    rng: ChaCha20Rng,
}

impl Worker {
    pub fn start(self, fulfiller: Fulfiller) -> JoinHandle<()> {
        tokio::spawn(self.run(fulfiller))
    }

    async fn run(mut self, mut fulfiller: Fulfiller) {
        while let Some(request_id) = self.requests.recv().await {
            time::sleep(self.delay).await;
            let random_value = self.rng.next_u64();
            match fulfiller.fulfill(request_id, random_value).await {
                Ok(event) => info!(request_id, kind = event.kind(), "randomness fulfilled"),
                Err(ServiceError::MailboxClosed) => {
                    warn!(request_id, "raffle stopped; coordinator exiting");
                    return;
                }
                Err(err) => warn!(request_id, %err, "fulfillment rejected"),
            }
        }
    }
}
