use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{serde_hex, Amount, Participant, RequestId, Timestamp};

/// Lifecycle state of a raffle.
///
/// Entry and draw initiation are only permitted while `Open`. The raffle is
/// `Calculating` from the moment a randomness request is issued until the
/// matching fulfillment settles the pool.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaffleState {
    #[default]
    Open = 0,
    Calculating = 1,
}

impl RaffleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaffleState::Open => "open",
            RaffleState::Calculating => "calculating",
        }
    }
}

impl fmt::Display for RaffleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for RaffleState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err(()),
        }
    }
}

impl Write for RaffleState {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for RaffleState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        RaffleState::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl EncodeSize for RaffleState {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

const RAFFLE_ENTERED_TAG: u8 = 0;
const WINNER_REQUESTED_TAG: u8 = 1;
const WINNER_PICKED_TAG: u8 = 2;

/// Events emitted synchronously with the transition that caused them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A participant paid at least the entrance fee and joined the pool.
    RaffleEntered {
        #[serde(with = "serde_hex::participant")]
        participant: Participant,
        amount: Amount,
    },
    /// Entry closed and a randomness request was issued.
    WinnerRequested { request_id: RequestId },
    /// The pending request was fulfilled and the whole pool paid out.
    WinnerPicked {
        request_id: RequestId,
        #[serde(with = "serde_hex::participant")]
        winner: Participant,
        amount: Amount,
    },
}

impl Event {
    /// Short stable name, used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::RaffleEntered { .. } => "raffle_entered",
            Event::WinnerRequested { .. } => "winner_requested",
            Event::WinnerPicked { .. } => "winner_picked",
        }
    }
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Event::RaffleEntered {
                participant,
                amount,
            } => {
                RAFFLE_ENTERED_TAG.write(writer);
                participant.write(writer);
                amount.write(writer);
            }
            Event::WinnerRequested { request_id } => {
                WINNER_REQUESTED_TAG.write(writer);
                request_id.write(writer);
            }
            Event::WinnerPicked {
                request_id,
                winner,
                amount,
            } => {
                WINNER_PICKED_TAG.write(writer);
                request_id.write(writer);
                winner.write(writer);
                amount.write(writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        match tag {
            RAFFLE_ENTERED_TAG => Ok(Event::RaffleEntered {
                participant: Participant::read(reader)?,
                amount: Amount::read(reader)?,
            }),
            WINNER_REQUESTED_TAG => Ok(Event::WinnerRequested {
                request_id: RequestId::read(reader)?,
            }),
            WINNER_PICKED_TAG => Ok(Event::WinnerPicked {
                request_id: RequestId::read(reader)?,
                winner: Participant::read(reader)?,
                amount: Amount::read(reader)?,
            }),
            _ => Err(Error::InvalidEnum(tag)),
        }
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Event::RaffleEntered {
                    participant,
                    amount,
                } => participant.encode_size() + amount.encode_size(),
                Event::WinnerRequested { request_id } => request_id.encode_size(),
                Event::WinnerPicked {
                    request_id,
                    winner,
                    amount,
                } => request_id.encode_size() + winner.encode_size() + amount.encode_size(),
            }
    }
}

/// Read-only copy of everything an operator can observe about a raffle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleSnapshot {
    pub state: RaffleState,
    pub entrance_fee: Amount,
    pub interval_ms: u64,
    #[serde(with = "serde_hex::participants")]
    pub participants: Vec<Participant>,
    pub pool: Amount,
    pub last_draw_ms: Timestamp,
    #[serde(with = "serde_hex::participant_option")]
    pub recent_winner: Option<Participant>,
    pub pending_request: Option<RequestId>,
    pub draws_completed: u64,
}

impl RaffleSnapshot {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Participant at `index` in entry order.
    pub fn participant(&self, index: usize) -> Option<&Participant> {
        self.participants.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::Encode;
    use commonware_cryptography::{ed25519::PrivateKey, Signer};
    use commonware_math::algebra::Random;
    use rand::{rngs::StdRng, SeedableRng};

    fn participant(seed: u64) -> Participant {
        let mut rng = StdRng::seed_from_u64(seed);
        PrivateKey::random(&mut rng).public_key()
    }

    #[test]
    fn test_state_byte_encoding() {
        assert_eq!(RaffleState::Open.encode().as_ref(), &[0u8]);
        assert_eq!(RaffleState::Calculating.encode().as_ref(), &[1u8]);

        let mut reader: &[u8] = &[7u8];
        assert!(matches!(
            RaffleState::read(&mut reader),
            Err(Error::InvalidEnum(7))
        ));
    }

    #[test]
    fn test_state_display_matches_json() {
        for state in [RaffleState::Open, RaffleState::Calculating] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
        assert_eq!(RaffleState::default(), RaffleState::Open);
    }

    #[test]
    fn test_event_codec() {
        let events = vec![
            Event::RaffleEntered {
                participant: participant(1),
                amount: 10_000_000_000_000_000,
            },
            Event::WinnerRequested { request_id: 1 },
            Event::WinnerPicked {
                request_id: 1,
                winner: participant(2),
                amount: 40_000_000_000_000_000,
            },
        ];
        for event in events {
            let encoded = event.encode();
            assert_eq!(encoded.len(), event.encode_size());
            let mut reader = encoded.as_ref();
            let decoded = Event::read(&mut reader).unwrap();
            assert_eq!(decoded, event);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_event_unknown_tag_rejected() {
        let mut reader: &[u8] = &[9u8, 0, 0];
        assert!(matches!(Event::read(&mut reader), Err(Error::InvalidEnum(9))));
    }

    #[test]
    fn test_event_json_uses_hex_participants() {
        let winner = participant(3);
        let event = Event::WinnerPicked {
            request_id: 4,
            winner: winner.clone(),
            amount: 100,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "winner_picked");
        assert_eq!(json["winner"], crate::participant_hex(&winner));
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(event.kind(), "winner_picked");
    }

    #[test]
    fn test_snapshot_json() {
        let snapshot = RaffleSnapshot {
            state: RaffleState::Open,
            entrance_fee: 10,
            interval_ms: 30_000,
            participants: vec![participant(1), participant(2)],
            pool: 20,
            last_draw_ms: 1_000,
            recent_winner: None,
            pending_request: None,
            draws_completed: 0,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: RaffleSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.participant_count(), 2);
        assert_eq!(back.participant(1), Some(&participant(2)));
        assert_eq!(back.participant(2), None);
    }

    #[test]
    fn test_parse_participant() {
        let key = participant(5);
        let hex = crate::participant_hex(&key);
        assert_eq!(crate::parse_participant(&hex), Some(key.clone()));
        assert_eq!(crate::parse_participant(&format!("0x{hex}")), Some(key));
        assert_eq!(crate::parse_participant("zz"), None);
        assert_eq!(crate::parse_participant("00"), None);
    }
}
