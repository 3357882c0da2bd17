//! Hex helpers for rendering participants in JSON.

use commonware_codec::ReadExt;
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::{from_hex_formatted, hex};

pub(crate) fn encode_participant(participant: &PublicKey) -> String {
    hex(participant.as_ref())
}

pub(crate) fn decode_participant(value: &str) -> Result<PublicKey, &'static str> {
    let bytes = from_hex_formatted(value).ok_or("invalid hex string")?;
    let mut reader = bytes.as_slice();
    let participant = PublicKey::read(&mut reader).map_err(|_| "invalid public key")?;
    if !reader.is_empty() {
        return Err("trailing bytes after public key");
    }
    Ok(participant)
}

pub(crate) mod participant {
    use commonware_cryptography::ed25519::PublicKey;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(participant: &PublicKey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode_participant(participant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PublicKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::decode_participant(&s).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod participant_option {
    use commonware_cryptography::ed25519::PublicKey;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(participant: &Option<PublicKey>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match participant {
            Some(participant) => {
                serializer.serialize_some(&super::encode_participant(participant))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PublicKey>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        super::decode_participant(&s)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

pub(crate) mod participants {
    use commonware_cryptography::ed25519::PublicKey;
    use serde::{Deserialize, Deserializer, Serialize as _, Serializer};

    pub fn serialize<S>(participants: &[PublicKey], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: Vec<String> = participants
            .iter()
            .map(super::encode_participant)
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<PublicKey>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| super::decode_participant(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
