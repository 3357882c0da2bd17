//! Autoraffle execution layer.
//!
//! This crate contains the raffle state machine driven by the node: entry
//! bookkeeping, draw eligibility, the randomness request round trip, winner
//! selection and payout.
//!
//! ## Determinism requirements
//! - Do not read wall-clock time; every operation takes `now` explicitly.
//! - Do not generate randomness; winners are derived only from the value the
//!   randomness source delivers.
//! - External effects go through the [RandomnessSource] and [ValueTransfer]
//!   collaborators passed into each call.
//!
//! The primary entrypoint is [`Raffle`].

pub mod eligibility;
pub mod ledger;
pub mod payout;
pub mod raffle;
pub mod randomness;
pub mod selector;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod scenario_tests;

mod error;

pub use eligibility::Eligibility;
pub use error::{Error, ErrorKind};
pub use ledger::EntryLedger;
pub use payout::{TransferError, ValueTransfer};
pub use raffle::{Raffle, RaffleConfig};
pub use randomness::{RandomnessError, RandomnessRequest, RandomnessSource};
