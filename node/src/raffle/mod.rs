use autoraffle_execution::Raffle;
use autoraffle_types::Event;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::metrics::Metrics;

mod actor;
pub use actor::Actor;
mod ingress;
pub use ingress::{Fulfiller, Mailbox, Message};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("raffle mailbox closed")]
    MailboxClosed,
    #[error(transparent)]
    Raffle(#[from] autoraffle_execution::Error),
}

/// Configuration for the raffle [Actor].
pub struct Config<C, S, T> {
    /// The aggregate the actor takes ownership of.
    pub raffle: Raffle,

    /// Supplies `now` for every operation.
    pub clock: C,

    /// Answers randomness requests issued by `perform_upkeep`.
    pub source: S,

    /// Pays out winners.
    pub bank: T,

    /// Number of messages to hold in the backlog before senders wait.
    pub mailbox_size: usize,

    /// Where emitted events are published.
    pub events: broadcast::Sender<Event>,

    pub metrics: Metrics,
}
