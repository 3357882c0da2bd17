//! Test doubles for the raffle's collaborators.

use std::collections::{HashMap, HashSet};

use autoraffle_types::{Amount, Participant, RequestId};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_math::algebra::Random;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    payout::{TransferError, ValueTransfer},
    randomness::{RandomnessError, RandomnessRequest, RandomnessSource},
    raffle::RaffleConfig,
};

/// Creates an account keypair for Ed25519 signatures used by participants
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::random(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Creates a deterministic participant identity
pub fn create_participant(seed: u64) -> Participant {
    create_account_keypair(seed).1
}

/// Config with the given fee and interval and a fixed randomness request
pub fn raffle_config(entrance_fee: Amount, interval_ms: u64) -> RaffleConfig {
    RaffleConfig {
        entrance_fee,
        interval_ms,
        randomness: RandomnessRequest::new([0xab; 32], 1),
    }
}

/// Randomness source that hands out sequential ids starting at 1 and records
/// every request. Fulfillment is left to the test.
#[derive(Debug)]
pub struct MockCoordinator {
    next_id: RequestId,
    requests: Vec<RandomnessRequest>,
    failing: bool,
}

impl Default for MockCoordinator {
    fn default() -> Self {
        Self {
            next_id: 1,
            requests: Vec::new(),
            failing: false,
        }
    }
}

impl MockCoordinator {
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn requests(&self) -> &[RandomnessRequest] {
        &self.requests
    }

    /// The id most recently issued, if any.
    pub fn last_id(&self) -> Option<RequestId> {
        (self.next_id > 1).then(|| self.next_id - 1)
    }
}

impl RandomnessSource for MockCoordinator {
    fn request_random_value(
        &mut self,
        request: &RandomnessRequest,
    ) -> Result<RequestId, RandomnessError> {
        if self.failing {
            return Err(RandomnessError::Unavailable("mock coordinator offline".into()));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.requests.push(request.clone());
        Ok(id)
    }
}

/// In-memory balances with per-recipient rejection.
#[derive(Debug, Default)]
pub struct MockBank {
    balances: HashMap<Participant, Amount>,
    rejected: HashSet<Participant>,
}

impl MockBank {
    pub fn balance(&self, who: &Participant) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    /// Make every later transfer to `who` fail.
    pub fn reject(&mut self, who: Participant) {
        self.rejected.insert(who);
    }

    pub fn accept(&mut self, who: &Participant) {
        self.rejected.remove(who);
    }
}

impl ValueTransfer for MockBank {
    fn transfer(&mut self, to: &Participant, amount: Amount) -> Result<(), TransferError> {
        if self.rejected.contains(to) {
            return Err(TransferError::Rejected(to.to_string()));
        }
        let balance = self.balances.entry(to.clone()).or_default();
        *balance = balance.checked_add(amount).ok_or(TransferError::Overflow)?;
        Ok(())
    }
}
