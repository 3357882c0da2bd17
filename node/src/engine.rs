use autoraffle_execution::{Error, Raffle};
use prometheus_client::registry::Registry;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::info;

use crate::{
    bank::Bank,
    clock::Clock,
    coordinator::{LocalCoordinator, Worker},
    keeper::Keeper,
    metrics::Metrics,
    raffle::{self, Actor, Fulfiller, Mailbox},
    ValidatedConfig,
};

/// Wires one raffle to the local coordinator, the keeper and the bank.
pub struct Engine<C: Clock> {
    actor: Actor<C, LocalCoordinator, Bank>,
    fulfiller: Fulfiller,
    worker: Worker,
    keeper: Keeper,
    mailbox: Mailbox,
    bank: Bank,
}

impl<C: Clock> Engine<C> {
    pub fn new(config: &ValidatedConfig, clock: C, registry: &mut Registry) -> Result<Self, Error> {
        let now = clock.now_ms();
        let raffle = Raffle::new(config.raffle.clone(), now)?;
        let (coordinator, worker) = LocalCoordinator::new(
            config.raffle.randomness.subscription_id,
            config.fulfillment_delay,
            config.coordinator_seed,
        );
        let bank = Bank::default();
        let (events, _) = broadcast::channel(config.event_buffer_size.get());
        let (actor, mailbox, fulfiller) = Actor::new(raffle::Config {
            raffle,
            clock,
            source: coordinator,
            bank: bank.clone(),
            mailbox_size: config.mailbox_size.get(),
            events,
            metrics: Metrics::register(registry),
        });
        let keeper = Keeper::new(mailbox.clone(), config.keeper_poll);
        info!(
            network = %config.network,
            entrance_fee = config.raffle.entrance_fee,
            interval_ms = config.raffle.interval_ms,
            started_at = now,
            "raffle created"
        );

        Ok(Self {
            actor,
            fulfiller,
            worker,
            keeper,
            mailbox,
            bank,
        })
    }

    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }

    pub fn bank(&self) -> Bank {
        self.bank.clone()
    }

    /// Spawn the actor, coordinator and keeper. The returned handle completes
    /// when the actor stops.
    pub fn start(self) -> JoinHandle<()> {
        self.worker.start(self.fulfiller);
        self.keeper.start();
        self.actor.start()
    }
}
