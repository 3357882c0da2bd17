use autoraffle_types::{Amount, Participant, RaffleState, RequestId};
use thiserror::Error;

use crate::{payout::TransferError, randomness::RandomnessError};

/// Broad classes of failure, used by callers to decide how to react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable input (wrong amount, wrong moment).
    UserInput,
    /// The operation is not due yet; re-poll eligibility before retrying.
    Precondition,
    /// A collaborator delivered something it never should have (stale or forged id).
    ProtocolIntegrity,
    /// An invariant was violated elsewhere; the operation was aborted.
    InternalConsistency,
    /// An external collaborator failed after the raffle committed to a draw.
    ExternalDependency,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("insufficient payment: paid {paid}, entrance fee is {required}")]
    InsufficientPayment { paid: Amount, required: Amount },
    #[error("raffle is not open (state={state})")]
    NotOpen { state: RaffleState },
    #[error("upkeep not needed (balance={balance}, participants={participants}, state={state})")]
    UpkeepNotNeeded {
        balance: Amount,
        participants: usize,
        state: RaffleState,
    },
    #[error("unknown randomness request: {request_id}")]
    UnknownRequest { request_id: RequestId },
    #[error("cannot select a winner from an empty participant set")]
    EmptyParticipantSet,
    #[error("payout of {amount} to {winner} failed")]
    PayoutFailed {
        winner: Participant,
        amount: Amount,
        #[source]
        source: TransferError,
    },
    #[error("randomness request failed")]
    RandomnessRequestFailed(#[source] RandomnessError),
    #[error("pool overflow: {pool} + {amount}")]
    PoolOverflow { pool: Amount, amount: Amount },
    #[error("{field} must be > 0")]
    InvalidConfig { field: &'static str },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InsufficientPayment { .. }
            | Error::NotOpen { .. }
            | Error::PoolOverflow { .. }
            | Error::InvalidConfig { .. } => ErrorKind::UserInput,
            Error::UpkeepNotNeeded { .. } => ErrorKind::Precondition,
            Error::UnknownRequest { .. } => ErrorKind::ProtocolIntegrity,
            Error::EmptyParticipantSet => ErrorKind::InternalConsistency,
            Error::PayoutFailed { .. } | Error::RandomnessRequestFailed(_) => {
                ErrorKind::ExternalDependency
            }
        }
    }
}
