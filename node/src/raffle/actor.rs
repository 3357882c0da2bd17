use super::{
    ingress::{Fulfiller, Mailbox, Message},
    Config,
};
use crate::{clock::Clock, metrics::Metrics};
use autoraffle_execution::{Error, ErrorKind, Raffle, RandomnessSource, ValueTransfer};
use autoraffle_types::Event;
use futures::{channel::mpsc, StreamExt};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

/// Owns the raffle aggregate and applies one message at a time.
pub struct Actor<C, S, T> {
    raffle: Raffle,
    clock: C,
    source: S,
    bank: T,
    mailbox: mpsc::Receiver<Message>,
    events: broadcast::Sender<Event>,
    metrics: Metrics,
}

impl<C, S, T> Actor<C, S, T>
where
    C: Clock,
    S: RandomnessSource + Send + 'static,
    T: ValueTransfer + Send + 'static,
{
    pub fn new(config: Config<C, S, T>) -> (Self, Mailbox, Fulfiller) {
        let (sender, mailbox) = mpsc::channel(config.mailbox_size);
        let inbound = Mailbox::new(sender.clone(), config.events.clone());
        let fulfiller = Fulfiller::new(sender);
        config.metrics.record_state(&config.raffle);

        (
            Self {
                raffle: config.raffle,
                clock: config.clock,
                source: config.source,
                bank: config.bank,
                mailbox,
                events: config.events,
                metrics: config.metrics,
            },
            inbound,
            fulfiller,
        )
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while let Some(message) = self.mailbox.next().await {
            match message {
                Message::Enter {
                    participant,
                    amount,
                    response,
                } => {
                    let result = self.raffle.enter(participant, amount);
                    let _ = response.send(self.publish("enter", result));
                }
                Message::CheckUpkeep { response } => {
                    let _ = response.send(self.raffle.check_upkeep(self.clock.now_ms()));
                }
                Message::PerformUpkeep { response } => {
                    let now = self.clock.now_ms();
                    let result = self.raffle.perform_upkeep(&mut self.source, now);
                    let _ = response.send(self.publish("perform_upkeep", result));
                }
                Message::Fulfill {
                    request_id,
                    random_value,
                    response,
                } => {
                    let now = self.clock.now_ms();
                    let result = self
                        .raffle
                        .fulfill(&mut self.bank, request_id, random_value, now);
                    let _ = response.send(self.publish("fulfill", result));
                }
                Message::Snapshot { response } => {
                    let _ = response.send(self.raffle.snapshot());
                }
            }
        }
        info!("raffle mailbox closed; actor stopped");
    }

    /// Record metrics and broadcast the outcome of a mutating operation.
    fn publish(
        &mut self,
        operation: &'static str,
        result: Result<Event, Error>,
    ) -> Result<Event, Error> {
        match &result {
            Ok(event) => {
                self.metrics.observe(event);
                self.metrics.record_state(&self.raffle);
                // Errs only when nobody is subscribed.
                let _ = self.events.send(event.clone());
            }
            Err(err) => {
                self.metrics.rejected.inc();
                match err.kind() {
                    ErrorKind::UserInput | ErrorKind::Precondition => {
                        debug!(operation, %err, "raffle operation rejected");
                    }
                    ErrorKind::ProtocolIntegrity => {
                        warn!(operation, %err, "rejected fulfillment");
                    }
                    ErrorKind::InternalConsistency | ErrorKind::ExternalDependency => {
                        error!(
                            operation,
                            ?err,
                            pending_request = ?self.raffle.pending_request(),
                            "raffle operation failed"
                        );
                    }
                }
            }
        }
        result
    }
}
