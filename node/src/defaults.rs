//! Defaults for optional configuration fields.

/// Entrance fee on development networks: 0.01 ETH in wei.
pub const DEFAULT_ENTRANCE_FEE: u64 = 10_000_000_000_000_000;
pub const DEFAULT_INTERVAL_MS: u64 = 30_000;
pub use autoraffle_execution::randomness::{
    DEFAULT_CALLBACK_GAS_LIMIT, DEFAULT_REQUEST_CONFIRMATIONS,
};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_MAILBOX_SIZE: usize = 1_024;
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 1_024;

/// How often the keeper checks whether a draw is due.
pub const DEFAULT_KEEPER_POLL_MS: u64 = 1_000;

/// Delay before the local coordinator answers a randomness request.
pub const DEFAULT_FULFILLMENT_DELAY_MS: u64 = 2_000;
