//! Bookkeeping for the asynchronous randomness round trip.
//!
//! A draw is split into two independent entry points connected only by the
//! stored request id: [RequestTracker::issue] asks the [RandomnessSource] for a
//! fresh id and remembers it, and [RequestTracker::validate] later checks that a
//! fulfillment carries exactly that id. Nothing here blocks waiting for the
//! source to answer.

use autoraffle_types::RequestId;
use thiserror::Error;

/// Default number of confirmations the source waits before answering.
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;

/// Default gas budget for delivering the fulfillment callback.
pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;

/// Random values requested per draw.
pub const NUM_WORDS: u32 = 1;

/// Addressing the randomness source needs to route a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    /// Gas lane selecting the maximum price the source may charge.
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl RandomnessRequest {
    pub fn new(key_hash: [u8; 32], subscription_id: u64) -> Self {
        Self {
            key_hash,
            subscription_id,
            request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
            callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
            num_words: NUM_WORDS,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RandomnessError {
    #[error("randomness source unavailable: {0}")]
    Unavailable(String),
    #[error("subscription {0} rejected the request")]
    SubscriptionRejected(u64),
}

/// An external service that answers requests with an unpredictable value.
///
/// Implementations only register the request and return its id. The value is
/// delivered later, through whatever path ends in the raffle's `fulfill`.
pub trait RandomnessSource {
    fn request_random_value(
        &mut self,
        request: &RandomnessRequest,
    ) -> Result<RequestId, RandomnessError>;
}

/// Holds the single in-flight request id, if any.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    pending: Option<RequestId>,
}

impl RequestTracker {
    pub fn pending(&self) -> Option<RequestId> {
        self.pending
    }

    /// Obtain a fresh id from `source` and record it as pending.
    ///
    /// Callers must only issue while no request is pending. On error nothing is
    /// recorded.
    pub fn issue<S: RandomnessSource + ?Sized>(
        &mut self,
        source: &mut S,
        request: &RandomnessRequest,
    ) -> Result<RequestId, RandomnessError> {
        debug_assert!(self.pending.is_none(), "request already in flight");
        let request_id = source.request_random_value(request)?;
        self.pending = Some(request_id);
        Ok(request_id)
    }

    /// Returns true iff `request_id` is the one currently in flight.
    pub fn validate(&self, request_id: RequestId) -> bool {
        self.pending == Some(request_id)
    }

    /// Forget the pending request once its fulfillment has been settled.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}
