//! Automation agent that triggers draws.
//!
//! The keeper polls eligibility on a jittered period and calls
//! `perform_upkeep` when a draw is due. Eligibility is re-checked by the raffle
//! itself, so losing a race to another trigger only yields `UpkeepNotNeeded` or
//! `NotOpen`, which are expected and ignored. A failed call is never retried
//! immediately; the keeper waits for the next poll.

use autoraffle_execution::Error;
use autoraffle_types::Event;
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;
use tokio::{task::JoinHandle, time};
use tracing::{debug, info, warn};

use crate::{
    poll::next_poll_delay,
    raffle::{Mailbox, ServiceError},
};

pub struct Keeper {
    mailbox: Mailbox,
    poll: Duration,
    rng: StdRng,
}

impl Keeper {
    pub fn new(mailbox: Mailbox, poll: Duration) -> Self {
        Self {
            mailbox,
            poll,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            time::sleep(next_poll_delay(&mut self.rng, self.poll)).await;
            match self.poll_once().await {
                Ok(_) => {}
                Err(ServiceError::MailboxClosed) => {
                    info!("raffle stopped; keeper exiting");
                    return;
                }
                Err(err) => warn!(%err, "upkeep failed"),
            }
        }
    }

    /// Check eligibility once and initiate a draw if it is due.
    ///
    /// Returns the emitted event when a draw was initiated.
    pub async fn poll_once(&mut self) -> Result<Option<Event>, ServiceError> {
        let eligibility = self.mailbox.check_upkeep().await?;
        if !eligibility.is_due() {
            debug!(?eligibility, "draw not due");
            return Ok(None);
        }
        match self.mailbox.perform_upkeep().await {
            Ok(event) => Ok(Some(event)),
            Err(ServiceError::Raffle(
                err @ (Error::UpkeepNotNeeded { .. } | Error::NotOpen { .. }),
            )) => {
                debug!(%err, "lost upkeep race");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
