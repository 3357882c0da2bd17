//! Participants and collected funds for the current draw cycle.

use autoraffle_types::{Amount, Participant};

use crate::Error;

/// Ordered list of entries plus the pool they paid into.
///
/// The pool always equals the sum of all accepted payments since the last
/// [EntryLedger::drain]. Only the state machine mutates a ledger: entries append
/// while the raffle is open and a successful payout drains it.
#[derive(Clone, Debug, Default)]
pub struct EntryLedger {
    participants: Vec<Participant>,
    pool: Amount,
}

impl EntryLedger {
    /// Record an entry of `amount` paid by `payer`, which must cover `entrance_fee`.
    ///
    /// Nothing changes on error.
    pub fn record(
        &mut self,
        payer: Participant,
        amount: Amount,
        entrance_fee: Amount,
    ) -> Result<(), Error> {
        if amount < entrance_fee {
            return Err(Error::InsufficientPayment {
                paid: amount,
                required: entrance_fee,
            });
        }
        let pool = self
            .pool
            .checked_add(amount)
            .ok_or(Error::PoolOverflow {
                pool: self.pool,
                amount,
            })?;
        self.participants.push(payer);
        self.pool = pool;
        Ok(())
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, index: usize) -> Option<&Participant> {
        self.participants.get(index)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn pool(&self) -> Amount {
        self.pool
    }

    /// Clear participants and zero the pool, returning what was held.
    pub fn drain(&mut self) -> (Vec<Participant>, Amount) {
        let pool = std::mem::take(&mut self.pool);
        (std::mem::take(&mut self.participants), pool)
    }
}
