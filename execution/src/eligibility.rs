//! Decides whether an automated draw may start.

use autoraffle_types::{RaffleState, Timestamp};

use crate::ledger::EntryLedger;

/// The four conditions that must all hold for a draw to be due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eligibility {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl Eligibility {
    pub fn is_due(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

/// Evaluate eligibility at `now_ms`.
///
/// A clock that reads earlier than `last_draw_ms` is treated as no time elapsed.
pub fn evaluate(
    state: RaffleState,
    ledger: &EntryLedger,
    last_draw_ms: Timestamp,
    interval_ms: u64,
    now_ms: Timestamp,
) -> Eligibility {
    Eligibility {
        is_open: state == RaffleState::Open,
        time_passed: now_ms.saturating_sub(last_draw_ms) >= interval_ms,
        has_players: !ledger.is_empty(),
        has_balance: ledger.pool() > 0,
    }
}
