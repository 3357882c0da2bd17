//! End-to-end draw cycles against the mock collaborators.
//!
//! Times are milliseconds since construction; the fee mirrors 0.01 ETH in wei.

#[cfg(test)]
mod tests {
    use crate::mocks::{create_participant, raffle_config, MockBank, MockCoordinator};
    use crate::{Error, ErrorKind, Raffle};
    use autoraffle_types::{Amount, Event, RaffleState, RequestId};
    use proptest::prelude::*;

    const FEE: Amount = 10_000_000_000_000_000;
    const INTERVAL: u64 = 30_000;

    fn request_id(event: Event) -> RequestId {
        match event {
            Event::WinnerRequested { request_id } => request_id,
            other => panic!("expected winner requested, got {other:?}"),
        }
    }

    #[test]
    fn test_single_entry_cycle() {
        let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
        let mut coordinator = MockCoordinator::default();
        let mut bank = MockBank::default();
        let alice = create_participant(1);

        raffle.enter(alice.clone(), FEE).unwrap();
        assert!(!raffle.is_draw_due(29_000));
        assert!(raffle.is_draw_due(31_000));

        let id = request_id(raffle.perform_upkeep(&mut coordinator, 31_000).unwrap());
        assert_eq!(raffle.state(), RaffleState::Calculating);
        assert_eq!(raffle.pending_request(), Some(id));

        let event = raffle.fulfill(&mut bank, id, 987_654_321, 32_000).unwrap();
        assert_eq!(
            event,
            Event::WinnerPicked {
                request_id: id,
                winner: alice.clone(),
                amount: FEE
            }
        );
        assert_eq!(raffle.recent_winner(), Some(&alice));
        assert_eq!(raffle.pool(), 0);
        assert_eq!(raffle.state(), RaffleState::Open);
        assert_eq!(bank.balance(&alice), FEE);
    }

    #[test]
    fn test_no_entries_upkeep_not_needed() {
        let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
        let mut coordinator = MockCoordinator::default();

        assert!(!raffle.is_draw_due(31_000));
        let err = raffle.perform_upkeep(&mut coordinator, 31_000).unwrap_err();
        assert!(matches!(err, Error::UpkeepNotNeeded { participants: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(raffle.state(), RaffleState::Open);
        assert!(coordinator.requests().is_empty());
    }

    #[test]
    fn test_four_participants_seven_selects_index_three() {
        let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
        let mut coordinator = MockCoordinator::default();
        let mut bank = MockBank::default();
        let players: Vec<_> = (1..=4).map(create_participant).collect();
        for player in &players {
            raffle.enter(player.clone(), FEE).unwrap();
        }

        let id = request_id(raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap());
        raffle.fulfill(&mut bank, id, 7, INTERVAL).unwrap();
        assert_eq!(raffle.recent_winner(), Some(&players[3]));
        assert_eq!(bank.balance(&players[3]), FEE * 4);
    }

    #[test]
    fn test_replayed_fulfillment_rejected() {
        let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
        let mut coordinator = MockCoordinator::default();
        let mut bank = MockBank::default();
        raffle.enter(create_participant(1), FEE).unwrap();
        let id = request_id(raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap());

        raffle.fulfill(&mut bank, id, 1, INTERVAL).unwrap();
        let err = raffle.fulfill(&mut bank, id, 1, INTERVAL).unwrap_err();
        assert!(matches!(err, Error::UnknownRequest { request_id } if request_id == id));
        assert_eq!(err.kind(), ErrorKind::ProtocolIntegrity);
        assert_eq!(raffle.draws_completed(), 1);
    }

    #[test]
    fn test_prior_cycle_id_rejected() {
        let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
        let mut coordinator = MockCoordinator::default();
        let mut bank = MockBank::default();

        raffle.enter(create_participant(1), FEE).unwrap();
        let first = request_id(raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap());
        raffle.fulfill(&mut bank, first, 0, INTERVAL).unwrap();

        raffle.enter(create_participant(2), FEE).unwrap();
        let second = request_id(raffle.perform_upkeep(&mut coordinator, INTERVAL * 2).unwrap());
        assert_ne!(first, second);

        let before = raffle.snapshot();
        assert!(matches!(
            raffle.fulfill(&mut bank, first, 0, INTERVAL * 2),
            Err(Error::UnknownRequest { .. })
        ));
        assert!(matches!(
            raffle.fulfill(&mut bank, 999, 0, INTERVAL * 2),
            Err(Error::UnknownRequest { request_id: 999 })
        ));
        assert_eq!(raffle.snapshot(), before);
        raffle.fulfill(&mut bank, second, 0, INTERVAL * 2).unwrap();
    }

    #[test]
    fn test_randomness_failure_keeps_open() {
        let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
        let mut coordinator = MockCoordinator::default();
        coordinator.set_failing(true);
        raffle.enter(create_participant(1), FEE).unwrap();

        let err = raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap_err();
        assert!(matches!(err, Error::RandomnessRequestFailed(_)));
        assert_eq!(err.kind(), ErrorKind::ExternalDependency);
        assert_eq!(raffle.state(), RaffleState::Open);
        assert_eq!(raffle.pending_request(), None);

        coordinator.set_failing(false);
        raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap();
        assert_eq!(raffle.state(), RaffleState::Calculating);
    }

    #[test]
    fn test_payout_failure_leaves_cycle_intact() {
        let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
        let mut coordinator = MockCoordinator::default();
        let mut bank = MockBank::default();
        let alice = create_participant(1);
        raffle.enter(alice.clone(), FEE).unwrap();
        let id = request_id(raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap());

        bank.reject(alice.clone());
        let before = raffle.snapshot();
        let err = raffle.fulfill(&mut bank, id, 0, INTERVAL).unwrap_err();
        assert!(matches!(err, Error::PayoutFailed { amount: FEE, .. }));
        assert_eq!(err.kind(), ErrorKind::ExternalDependency);
        assert_eq!(raffle.snapshot(), before);
        assert_eq!(raffle.pending_request(), Some(id));

        bank.accept(&alice);
        raffle.fulfill(&mut bank, id, 0, INTERVAL + 1).unwrap();
        assert_eq!(raffle.state(), RaffleState::Open);
        assert_eq!(bank.balance(&alice), FEE);
    }

    #[test]
    fn test_many_cycles() {
        let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
        let mut coordinator = MockCoordinator::default();
        let mut bank = MockBank::default();
        let mut now = 0;
        for cycle in 1..=5u64 {
            for seed in 0..cycle {
                raffle.enter(create_participant(seed), FEE).unwrap();
            }
            now += INTERVAL;
            let id = request_id(raffle.perform_upkeep(&mut coordinator, now).unwrap());
            assert_eq!(id, cycle);
            raffle.fulfill(&mut bank, id, cycle * 31, now).unwrap();
            assert_eq!(raffle.last_draw_ms(), now);
        }
        assert_eq!(raffle.draws_completed(), 5);
        assert_eq!(coordinator.last_id(), Some(5));
    }

    proptest! {
        #[test]
        fn prop_fulfill_pays_a_participant(
            seeds in proptest::collection::vec(0u64..32, 1..12),
            extra in proptest::collection::vec(0u64..FEE, 1..12),
            random_value in any::<u64>(),
        ) {
            let mut raffle = Raffle::new(raffle_config(FEE, INTERVAL), 0).unwrap();
            let mut coordinator = MockCoordinator::default();
            let mut bank = MockBank::default();
            let mut expected_pool = 0;
            for (i, seed) in seeds.iter().enumerate() {
                let amount = FEE + extra[i % extra.len()];
                raffle.enter(create_participant(*seed), amount).unwrap();
                expected_pool += amount;
                prop_assert_eq!(raffle.participant_count(), i + 1);
                prop_assert_eq!(raffle.pool(), expected_pool);
            }
            let entrants = raffle.participants().to_vec();

            let id = request_id(raffle.perform_upkeep(&mut coordinator, INTERVAL).unwrap());
            raffle.fulfill(&mut bank, id, random_value, INTERVAL + 1).unwrap();

            let winner = raffle.recent_winner().cloned().unwrap();
            prop_assert!(entrants.contains(&winner));
            prop_assert_eq!(raffle.participant_count(), 0);
            prop_assert_eq!(raffle.pool(), 0);
            prop_assert_eq!(raffle.state(), RaffleState::Open);
            prop_assert!(raffle.last_draw_ms() >= INTERVAL + 1);
        }
    }
}
