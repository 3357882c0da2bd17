use autoraffle_execution::{RaffleConfig, RandomnessRequest};
use autoraffle_types::Amount;
use commonware_utils::{from_hex_formatted, hex};
use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroUsize, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;

pub mod api;
pub mod bank;
pub mod clock;
pub mod coordinator;
pub mod defaults;
pub mod engine;
pub mod keeper;
pub mod metrics;
mod poll;
pub mod raffle;

#[derive(Clone, PartialEq, Eq)]
pub struct HexBytes(Vec<u8>);

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex(&self.0))
    }
}

impl Serialize for HexBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex(self.as_ref()))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let bytes = from_hex_formatted(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a hex string"))?;
        Ok(Self(bytes))
    }
}

/// Deployment parameters for a known network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkPreset {
    pub name: &'static str,
    pub chain_id: u64,
    pub entrance_fee: Amount,
    pub interval_ms: u64,
    /// Gas lane key hash, hex.
    pub key_hash: &'static str,
    /// `None` on development networks, where the local coordinator owns subscription 1.
    pub subscription_id: Option<u64>,
    pub callback_gas_limit: u32,
    /// Development networks are served by the local coordinator.
    pub development: bool,
}

const GAS_LANE: &str = "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15";

pub const NETWORKS: &[NetworkPreset] = &[
    NetworkPreset {
        name: "goerli",
        chain_id: 5,
        entrance_fee: defaults::DEFAULT_ENTRANCE_FEE,
        interval_ms: defaults::DEFAULT_INTERVAL_MS,
        key_hash: GAS_LANE,
        subscription_id: Some(6220),
        callback_gas_limit: defaults::DEFAULT_CALLBACK_GAS_LIMIT,
        development: false,
    },
    NetworkPreset {
        name: "hardhat",
        chain_id: 31337,
        entrance_fee: defaults::DEFAULT_ENTRANCE_FEE,
        interval_ms: defaults::DEFAULT_INTERVAL_MS,
        key_hash: GAS_LANE,
        subscription_id: None,
        callback_gas_limit: defaults::DEFAULT_CALLBACK_GAS_LIMIT,
        development: true,
    },
    NetworkPreset {
        name: "localhost",
        chain_id: 31337,
        entrance_fee: defaults::DEFAULT_ENTRANCE_FEE,
        interval_ms: defaults::DEFAULT_INTERVAL_MS,
        key_hash: GAS_LANE,
        subscription_id: None,
        callback_gas_limit: defaults::DEFAULT_CALLBACK_GAS_LIMIT,
        development: true,
    },
];

/// Subscription the local coordinator serves.
pub const LOCAL_SUBSCRIPTION_ID: u64 = 1;

pub fn network_preset(name: &str) -> Option<&'static NetworkPreset> {
    NETWORKS.iter().find(|preset| preset.name == name)
}

/// Configuration for the [engine::Engine], loaded from YAML.
///
/// Raffle parameters left unset fall back to the preset of `network`; on a
/// network without a preset they are required.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub network: String,

    #[serde(default)]
    pub entrance_fee: Option<Amount>,
    #[serde(default)]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub key_hash: Option<HexBytes>,
    #[serde(default)]
    pub subscription_id: Option<u64>,
    #[serde(default = "default_request_confirmations")]
    pub request_confirmations: u16,
    #[serde(default)]
    pub callback_gas_limit: Option<u32>,

    pub port: u16,
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,

    #[serde(default = "default_mailbox_size")]
    pub mailbox_size: usize,
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
    #[serde(default = "default_keeper_poll_ms")]
    pub keeper_poll_ms: u64,
    #[serde(default = "default_fulfillment_delay_ms")]
    pub fulfillment_delay_ms: u64,
    #[serde(default)]
    pub coordinator_seed: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be hex: {value}")]
    InvalidHex { field: &'static str, value: String },
    #[error("{field} must be {expected} bytes (got {actual})")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("{field} is required on network {network}")]
    MissingField {
        field: &'static str,
        network: String,
    },
    #[error("port and metrics_port must be different (port={port}, metrics_port={metrics_port})")]
    PortConflict { port: u16, metrics_port: u16 },
}

#[derive(Debug)]
pub struct ValidatedConfig {
    pub network: String,
    pub development: bool,
    pub raffle: RaffleConfig,

    pub port: u16,
    pub metrics_port: u16,
    pub log_level: Level,
    pub json_logs: bool,

    pub mailbox_size: NonZeroUsize,
    pub event_buffer_size: NonZeroUsize,
    pub keeper_poll: Duration,
    pub fulfillment_delay: Duration,
    pub coordinator_seed: u64,
}

fn default_request_confirmations() -> u16 {
    defaults::DEFAULT_REQUEST_CONFIRMATIONS
}

fn default_log_level() -> String {
    defaults::DEFAULT_LOG_LEVEL.to_string()
}

fn default_mailbox_size() -> usize {
    defaults::DEFAULT_MAILBOX_SIZE
}

fn default_event_buffer_size() -> usize {
    defaults::DEFAULT_EVENT_BUFFER_SIZE
}

fn default_keeper_poll_ms() -> u64 {
    defaults::DEFAULT_KEEPER_POLL_MS
}

fn default_fulfillment_delay_ms() -> u64 {
    defaults::DEFAULT_FULFILLMENT_DELAY_MS
}

fn ensure_nonzero_u64(field: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(value)
}

fn nonzero_usize(field: &'static str, value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value).ok_or(ConfigError::InvalidNonZero { field, value: 0 })
}

fn parse_key_hash(value: &[u8]) -> Result<[u8; 32], ConfigError> {
    value.try_into().map_err(|_| ConfigError::InvalidLength {
        field: "key_hash",
        expected: 32,
        actual: value.len(),
    })
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let preset = network_preset(&self.network);
        let missing = |field: &'static str| ConfigError::MissingField {
            field,
            network: self.network.clone(),
        };

        let entrance_fee = self
            .entrance_fee
            .or(preset.map(|p| p.entrance_fee))
            .ok_or_else(|| missing("entrance_fee"))?;
        let entrance_fee = ensure_nonzero_u64("entrance_fee", entrance_fee)?;
        let interval_ms = self
            .interval_ms
            .or(preset.map(|p| p.interval_ms))
            .ok_or_else(|| missing("interval_ms"))?;
        let interval_ms = ensure_nonzero_u64("interval_ms", interval_ms)?;

        let key_hash = match (&self.key_hash, preset) {
            (Some(key_hash), _) => parse_key_hash(key_hash.as_ref())?,
            (None, Some(preset)) => {
                let bytes =
                    from_hex_formatted(preset.key_hash).ok_or_else(|| ConfigError::InvalidHex {
                        field: "key_hash",
                        value: preset.key_hash.to_string(),
                    })?;
                parse_key_hash(&bytes)?
            }
            (None, None) => return Err(missing("key_hash")),
        };
        let development = preset.map(|p| p.development).unwrap_or(false);
        let subscription_id = match (self.subscription_id, preset) {
            (Some(id), _) => id,
            (None, Some(preset)) if preset.development => LOCAL_SUBSCRIPTION_ID,
            (None, Some(preset)) => preset
                .subscription_id
                .ok_or_else(|| missing("subscription_id"))?,
            (None, None) => return Err(missing("subscription_id")),
        };
        let callback_gas_limit = self
            .callback_gas_limit
            .or(preset.map(|p| p.callback_gas_limit))
            .unwrap_or(defaults::DEFAULT_CALLBACK_GAS_LIMIT);
        ensure_nonzero_u64("callback_gas_limit", callback_gas_limit as u64)?;

        if self.port == self.metrics_port {
            return Err(ConfigError::PortConflict {
                port: self.port,
                metrics_port: self.metrics_port,
            });
        }
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;
        let mailbox_size = nonzero_usize("mailbox_size", self.mailbox_size)?;
        let event_buffer_size = nonzero_usize("event_buffer_size", self.event_buffer_size)?;
        let keeper_poll_ms = ensure_nonzero_u64("keeper_poll_ms", self.keeper_poll_ms)?;

        let mut randomness = RandomnessRequest::new(key_hash, subscription_id);
        randomness.request_confirmations = self.request_confirmations;
        randomness.callback_gas_limit = callback_gas_limit;

        Ok(ValidatedConfig {
            development,
            raffle: RaffleConfig {
                entrance_fee,
                interval_ms,
                randomness,
            },
            port: self.port,
            metrics_port: self.metrics_port,
            log_level,
            json_logs: self.json_logs,
            mailbox_size,
            event_buffer_size,
            keeper_poll: Duration::from_millis(keeper_poll_ms),
            fulfillment_delay: Duration::from_millis(self.fulfillment_delay_ms),
            coordinator_seed: self.coordinator_seed.unwrap_or(0),
            network: self.network,
        })
    }
}
