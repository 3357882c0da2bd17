use autoraffle_execution::{Eligibility, Error};
use autoraffle_types::{Amount, Event, Participant, RaffleSnapshot, RequestId};
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};
use tokio::sync::broadcast;
use tracing::warn;

use super::ServiceError;

/// Messages sent to the raffle actor.
pub enum Message {
    Enter {
        participant: Participant,
        amount: Amount,
        response: oneshot::Sender<Result<Event, Error>>,
    },
    CheckUpkeep {
        response: oneshot::Sender<Eligibility>,
    },
    PerformUpkeep {
        response: oneshot::Sender<Result<Event, Error>>,
    },
    Fulfill {
        request_id: RequestId,
        random_value: u64,
        response: oneshot::Sender<Result<Event, Error>>,
    },
    Snapshot {
        response: oneshot::Sender<RaffleSnapshot>,
    },
}

async fn request<T>(
    sender: &mut mpsc::Sender<Message>,
    operation: &'static str,
    build: impl FnOnce(oneshot::Sender<T>) -> Message,
) -> Result<T, ServiceError> {
    let (response, receiver) = oneshot::channel();
    if sender.send(build(response)).await.is_err() {
        warn!(operation, "raffle mailbox closed; request dropped");
        return Err(ServiceError::MailboxClosed);
    }
    receiver.await.map_err(|_| {
        warn!(operation, "raffle actor dropped response");
        ServiceError::MailboxClosed
    })
}

/// Public handle to the raffle. Every call is serialized through the actor.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
    events: broadcast::Sender<Event>,
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>, events: broadcast::Sender<Event>) -> Self {
        Self { sender, events }
    }

    pub async fn enter(
        &mut self,
        participant: Participant,
        amount: Amount,
    ) -> Result<Event, ServiceError> {
        Ok(request(&mut self.sender, "enter", |response| Message::Enter {
            participant,
            amount,
            response,
        })
        .await??)
    }

    pub async fn check_upkeep(&mut self) -> Result<Eligibility, ServiceError> {
        request(&mut self.sender, "check_upkeep", |response| {
            Message::CheckUpkeep { response }
        })
        .await
    }

    pub async fn perform_upkeep(&mut self) -> Result<Event, ServiceError> {
        Ok(request(&mut self.sender, "perform_upkeep", |response| {
            Message::PerformUpkeep { response }
        })
        .await??)
    }

    pub async fn snapshot(&mut self) -> Result<RaffleSnapshot, ServiceError> {
        request(&mut self.sender, "snapshot", |response| Message::Snapshot {
            response,
        })
        .await
    }

    /// Events emitted after this call. Slow subscribers may miss events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

/// Capability to deliver randomness fulfillments. Only handed to the source.
#[derive(Clone)]
pub struct Fulfiller {
    sender: mpsc::Sender<Message>,
}

impl Fulfiller {
    pub(super) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    pub async fn fulfill(
        &mut self,
        request_id: RequestId,
        random_value: u64,
    ) -> Result<Event, ServiceError> {
        Ok(request(&mut self.sender, "fulfill", |response| Message::Fulfill {
            request_id,
            random_value,
            response,
        })
        .await??)
    }
}
