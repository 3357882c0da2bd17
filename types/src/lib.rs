//! Common types shared by the autoraffle execution core and the node.
//!
//! Everything here is plain data: identities, amounts, the raffle lifecycle state,
//! the events emitted on each transition, and a read-only snapshot of the
//! aggregate. Binary encodings use `commonware-codec`; JSON encodings render
//! participants as hex-encoded ed25519 public keys.

pub mod raffle;
mod serde_hex;

pub use raffle::{Event, RaffleSnapshot, RaffleState};

use commonware_cryptography::ed25519::PublicKey;

/// Identity of anyone who enters the raffle (and therefore of any winner).
pub type Participant = PublicKey;

/// Value in the smallest unit of the settlement currency.
pub type Amount = u64;

/// Identifier assigned by the randomness source to a single request.
pub type RequestId = u64;

/// Milliseconds since the UNIX epoch.
pub type Timestamp = u64;

/// Parse a participant from its hex-encoded public key (an optional `0x` prefix is accepted).
pub fn parse_participant(value: &str) -> Option<Participant> {
    serde_hex::decode_participant(value).ok()
}

/// Render a participant as a lowercase hex string.
pub fn participant_hex(participant: &Participant) -> String {
    serde_hex::encode_participant(participant)
}
