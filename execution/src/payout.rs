use autoraffle_types::{Amount, Participant};
use thiserror::Error;

use crate::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("recipient {0} rejected the transfer")]
    Rejected(String),
    #[error("transfer backend unavailable: {0}")]
    Unavailable(String),
    #[error("recipient balance would overflow")]
    Overflow,
}

/// Moves value to a participant. A transfer either fully succeeds or fully fails.
pub trait ValueTransfer {
    fn transfer(&mut self, to: &Participant, amount: Amount) -> Result<(), TransferError>;
}

/// Pay the whole pool to `winner`.
pub fn settle<T: ValueTransfer + ?Sized>(
    bank: &mut T,
    winner: &Participant,
    amount: Amount,
) -> Result<(), Error> {
    bank.transfer(winner, amount)
        .map_err(|source| Error::PayoutFailed {
            winner: winner.clone(),
            amount,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{create_participant, MockBank};

    #[test]
    fn test_settle_credits_winner() {
        let mut bank = MockBank::default();
        let winner = create_participant(1);
        settle(&mut bank, &winner, 40).unwrap();
        assert_eq!(bank.balance(&winner), 40);
    }

    #[test]
    fn test_settle_wraps_failure() {
        let mut bank = MockBank::default();
        let winner = create_participant(1);
        bank.reject(winner.clone());
        let err = settle(&mut bank, &winner, 40).unwrap_err();
        assert!(matches!(
            err,
            Error::PayoutFailed { amount: 40, source: TransferError::Rejected(_), .. }
        ));
        assert_eq!(bank.balance(&winner), 0);
    }
}
