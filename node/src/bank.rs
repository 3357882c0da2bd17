use autoraffle_execution::{TransferError, ValueTransfer};
use autoraffle_types::{Amount, Participant};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::info;

/// In-memory ledger of credited payouts. Clones share the same balances.
#[derive(Clone, Debug, Default)]
pub struct Bank {
    balances: Arc<Mutex<HashMap<Participant, Amount>>>,
}

impl Bank {
    fn balances(&self) -> MutexGuard<'_, HashMap<Participant, Amount>> {
        self.balances
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn balance(&self, who: &Participant) -> Amount {
        self.balances().get(who).copied().unwrap_or(0)
    }
}

impl ValueTransfer for Bank {
    fn transfer(&mut self, to: &Participant, amount: Amount) -> Result<(), TransferError> {
        let mut balances = self.balances();
        let balance = balances.entry(to.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        info!(%to, amount, balance = *balance, "payout credited");
        Ok(())
    }
}
