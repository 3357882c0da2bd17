//! The raffle aggregate.
//!
//! [Raffle] cycles between `Open` and `Calculating` for the lifetime of a
//! deployment:
//!
//! ```text
//! Open --enter--> Open
//! Open --perform_upkeep (draw due)--> Calculating
//! Calculating --fulfill (pending id, payout ok)--> Open
//! ```
//!
//! There is no other transition. In particular there is no timeout out of
//! `Calculating`: a lost fulfillment leaves the raffle waiting.
//!
//! Every mutating method either applies its whole transition and returns the
//! emitted [Event], or returns an error and leaves the aggregate untouched.
//! Callers must serialize the mutating methods on one instance.

use autoraffle_types::{
    Amount, Event, Participant, RaffleSnapshot, RaffleState, RequestId, Timestamp,
};
use tracing::{debug, info};

use crate::{
    eligibility::{self, Eligibility},
    ledger::EntryLedger,
    payout::{self, ValueTransfer},
    randomness::{RandomnessRequest, RandomnessSource, RequestTracker},
    selector, Error,
};

/// Parameters fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    pub entrance_fee: Amount,
    /// Minimum time between draws.
    pub interval_ms: u64,
    pub randomness: RandomnessRequest,
}

impl RaffleConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.entrance_fee == 0 {
            return Err(Error::InvalidConfig {
                field: "entrance_fee",
            });
        }
        if self.interval_ms == 0 {
            return Err(Error::InvalidConfig {
                field: "interval_ms",
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Raffle {
    config: RaffleConfig,
    state: RaffleState,
    ledger: EntryLedger,
    tracker: RequestTracker,
    last_draw_ms: Timestamp,
    recent_winner: Option<Participant>,
    draws_completed: u64,
}

impl Raffle {
    /// Create an open raffle whose first interval starts at `now`.
    pub fn new(config: RaffleConfig, now: Timestamp) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            ledger: EntryLedger::default(),
            config,
            state: RaffleState::Open,
            tracker: RequestTracker::default(),
            last_draw_ms: now,
            recent_winner: None,
            draws_completed: 0,
        })
    }

    /// Record an entry paid by `payer`.
    pub fn enter(&mut self, payer: Participant, amount: Amount) -> Result<Event, Error> {
        if self.state != RaffleState::Open {
            return Err(Error::NotOpen { state: self.state });
        }
        self.ledger.record(payer.clone(), amount, self.config.entrance_fee)?;
        debug!(
            participants = self.ledger.len(),
            pool = self.ledger.pool(),
            amount,
            "entry recorded"
        );
        Ok(Event::RaffleEntered {
            participant: payer,
            amount,
        })
    }

    /// Breakdown of the draw conditions at `now`. Read-only.
    pub fn check_upkeep(&self, now: Timestamp) -> Eligibility {
        eligibility::evaluate(
            self.state,
            &self.ledger,
            self.last_draw_ms,
            self.config.interval_ms,
            now,
        )
    }

    pub fn is_draw_due(&self, now: Timestamp) -> bool {
        self.check_upkeep(now).is_due()
    }

    /// Close entry and request a random value, if a draw is due.
    ///
    /// Eligibility is re-checked here rather than trusted from the caller. A
    /// second call in the same cycle fails with [Error::NotOpen].
    pub fn perform_upkeep<S: RandomnessSource + ?Sized>(
        &mut self,
        source: &mut S,
        now: Timestamp,
    ) -> Result<Event, Error> {
        if self.state != RaffleState::Open {
            return Err(Error::NotOpen { state: self.state });
        }
        if !self.is_draw_due(now) {
            return Err(Error::UpkeepNotNeeded {
                balance: self.ledger.pool(),
                participants: self.ledger.len(),
                state: self.state,
            });
        }
        let request_id = self
            .tracker
            .issue(source, &self.config.randomness)
            .map_err(Error::RandomnessRequestFailed)?;
        self.state = RaffleState::Calculating;
        info!(
            request_id,
            participants = self.ledger.len(),
            pool = self.ledger.pool(),
            "winner requested"
        );
        Ok(Event::WinnerRequested { request_id })
    }

    /// Settle the pending draw with `random_value`.
    ///
    /// Only the id returned by the last successful [Raffle::perform_upkeep] is
    /// accepted, once. The winner is selected and paid before anything is
    /// mutated, so a failed payout leaves the raffle `Calculating` with its
    /// participants, pool and pending id intact.
    pub fn fulfill<T: ValueTransfer + ?Sized>(
        &mut self,
        bank: &mut T,
        request_id: RequestId,
        random_value: u64,
        now: Timestamp,
    ) -> Result<Event, Error> {
        if self.state != RaffleState::Calculating || !self.tracker.validate(request_id) {
            return Err(Error::UnknownRequest { request_id });
        }
        let (index, winner) = selector::select(random_value, self.ledger.participants())?;
        let winner = winner.clone();
        let amount = self.ledger.pool();
        payout::settle(bank, &winner, amount)?;

        self.ledger.drain();
        self.tracker.clear();
        self.state = RaffleState::Open;
        self.last_draw_ms = now;
        self.recent_winner = Some(winner.clone());
        self.draws_completed += 1;
        info!(request_id, index, amount, draw = self.draws_completed, "winner picked");
        Ok(Event::WinnerPicked {
            request_id,
            winner,
            amount,
        })
    }

    pub fn state(&self) -> RaffleState {
        self.state
    }

    pub fn entrance_fee(&self) -> Amount {
        self.config.entrance_fee
    }

    pub fn interval_ms(&self) -> u64 {
        self.config.interval_ms
    }

    pub fn participant_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn participant(&self, index: usize) -> Option<&Participant> {
        self.ledger.participant(index)
    }

    pub fn participants(&self) -> &[Participant] {
        self.ledger.participants()
    }

    pub fn pool(&self) -> Amount {
        self.ledger.pool()
    }

    pub fn last_draw_ms(&self) -> Timestamp {
        self.last_draw_ms
    }

    pub fn recent_winner(&self) -> Option<&Participant> {
        self.recent_winner.as_ref()
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.tracker.pending()
    }

    pub fn draws_completed(&self) -> u64 {
        self.draws_completed
    }

    pub fn randomness_request(&self) -> &RandomnessRequest {
        &self.config.randomness
    }

    pub fn snapshot(&self) -> RaffleSnapshot {
        RaffleSnapshot {
            state: self.state,
            entrance_fee: self.config.entrance_fee,
            interval_ms: self.config.interval_ms,
            participants: self.ledger.participants().to_vec(),
            pool: self.ledger.pool(),
            last_draw_ms: self.last_draw_ms,
            recent_winner: self.recent_winner.clone(),
            pending_request: self.tracker.pending(),
            draws_completed: self.draws_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{create_participant, raffle_config, MockBank, MockCoordinator};

    const FEE: Amount = 10;
    const INTERVAL: u64 = 30_000;

    fn open_raffle() -> Raffle {
        Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap()
    }

    #[test]
    fn test_new_starts_open() {
        let raffle = Raffle::new(raffle_config(FEE, INTERVAL), 1_234).unwrap();
        assert_eq!(raffle.state(), RaffleState::Open);
        assert_eq!(raffle.entrance_fee(), FEE);
        assert_eq!(raffle.interval_ms(), INTERVAL);
        assert_eq!(raffle.last_draw_ms(), 1_234);
        assert_eq!(raffle.participant_count(), 0);
        assert_eq!(raffle.pool(), 0);
        assert_eq!(raffle.recent_winner(), None);
        assert_eq!(raffle.pending_request(), None);
    }

    #[test]
    fn test_new_rejects_zero_parameters() {
        assert!(matches!(
            Raffle::new(raffle_config(0, INTERVAL), 0),
            Err(Error::InvalidConfig { field: "entrance_fee" })
        ));
        assert!(matches!(
            Raffle::new(raffle_config(FEE, 0), 0),
            Err(Error::InvalidConfig { field: "interval_ms" })
        ));
    }

    #[test]
    fn test_enter_emits_event() {
        let mut raffle = open_raffle();
        let alice = create_participant(1);
        let event = raffle.enter(alice.clone(), FEE).unwrap();
        assert_eq!(
            event,
            Event::RaffleEntered {
                participant: alice.clone(),
                amount: FEE
            }
        );
        assert_eq!(raffle.participant(0), Some(&alice));
    }

    #[test]
    fn test_enter_while_calculating_rejected() {
        let mut raffle = open_raffle();
        let mut coordinator = MockCoordinator::default();
        raffle.enter(create_participant(1), FEE).unwrap();
        raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap();

        let before = raffle.snapshot();
        let err = raffle.enter(create_participant(2), FEE).unwrap_err();
        assert!(matches!(
            err,
            Error::NotOpen {
                state: RaffleState::Calculating
            }
        ));
        assert_eq!(raffle.snapshot(), before);
    }

    #[test]
    fn test_second_upkeep_in_cycle_not_open() {
        let mut raffle = open_raffle();
        let mut coordinator = MockCoordinator::default();
        raffle.enter(create_participant(1), FEE).unwrap();
        raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap();

        let err = raffle
            .perform_upkeep(&mut coordinator, INTERVAL * 2)
            .unwrap_err();
        assert!(matches!(err, Error::NotOpen { .. }));
        assert_eq!(coordinator.requests().len(), 1);
        assert_eq!(raffle.pending_request(), Some(1));
    }

    #[test]
    fn test_upkeep_not_needed_reports_diagnostics() {
        let mut raffle = open_raffle();
        let mut coordinator = MockCoordinator::default();
        raffle.enter(create_participant(1), FEE).unwrap();

        let err = raffle
            .perform_upkeep(&mut coordinator, INTERVAL - 1)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UpkeepNotNeeded {
                balance: FEE,
                participants: 1,
                state: RaffleState::Open
            }
        ));
        assert!(coordinator.requests().is_empty());
    }

    #[test]
    fn test_fulfill_while_open_unknown() {
        let mut raffle = open_raffle();
        let mut bank = MockBank::default();
        raffle.enter(create_participant(1), FEE).unwrap();
        let err = raffle.fulfill(&mut bank, 1, 0, INTERVAL).unwrap_err();
        assert!(matches!(err, Error::UnknownRequest { request_id: 1 }));
        assert_eq!(raffle.pool(), FEE);
    }

    #[test]
    fn test_upkeep_uses_request_config() {
        let mut raffle = open_raffle();
        let mut coordinator = MockCoordinator::default();
        raffle.enter(create_participant(1), FEE).unwrap();
        raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap();
        assert_eq!(coordinator.requests(), &[raffle.randomness_request().clone()]);
    }

    #[test]
    fn test_fulfill_resets_cycle() {
        let mut raffle = open_raffle();
        let mut coordinator = MockCoordinator::default();
        let mut bank = MockBank::default();
        let players: Vec<_> = (1..=3).map(create_participant).collect();
        for player in &players {
            raffle.enter(player.clone(), FEE).unwrap();
        }
        let Event::WinnerRequested { request_id } =
            raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap()
        else {
            panic!("expected winner requested");
        };

        let event = raffle
            .fulfill(&mut bank, request_id, 5, INTERVAL + 500)
            .unwrap();
        let winner = players[5 % 3].clone();
        assert_eq!(
            event,
            Event::WinnerPicked {
                request_id,
                winner: winner.clone(),
                amount: FEE * 3
            }
        );
        assert_eq!(raffle.state(), RaffleState::Open);
        assert_eq!(raffle.participant_count(), 0);
        assert_eq!(raffle.pool(), 0);
        assert_eq!(raffle.recent_winner(), Some(&winner));
        assert_eq!(raffle.last_draw_ms(), INTERVAL + 500);
        assert_eq!(raffle.pending_request(), None);
        assert_eq!(raffle.draws_completed(), 1);
        assert_eq!(bank.balance(&winner), FEE * 3);
    }
}
