//! Directory configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use web3::types::U256;

/// Gas limit applied to resolver writes, in gas units.
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;
/// Gas price applied to resolver writes, in wei (1 gwei).
pub const DEFAULT_GAS_PRICE: u64 = 1_000_000_000;

/// Everything needed to open a [`Directory`](crate::Directory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
    /// Node endpoint (`http(s)://` or `ws(s)://`).
    pub endpoint: String,
    /// Registry contract address.
    pub registry: String,
    /// Resolver contract address.
    pub resolver: String,
    /// Economics of write transactions.
    #[serde(default)]
    pub policy: TxPolicy,
    /// How writes are confirmed.
    #[serde(default)]
    pub confirmation: Confirmation,
    /// Check deployed code and interfaces when binding proxies.
    #[serde(default = "default_verify_bindings")]
    pub verify_bindings: bool,
}

fn default_verify_bindings() -> bool {
    true
}

impl DirectoryConfig {
    /// Creates a config with default write policy and verification.
    pub fn new<E, R, S>(endpoint: E, registry: R, resolver: S) -> Self
    where
        E: Into<String>,
        R: Into<String>,
        S: Into<String>,
    {
        DirectoryConfig {
            endpoint: endpoint.into(),
            registry: registry.into(),
            resolver: resolver.into(),
            policy: TxPolicy::default(),
            confirmation: Confirmation::default(),
            verify_bindings: default_verify_bindings(),
        }
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Fixed transaction economics for writes.
///
/// There is no fee estimation: every write is sent with exactly these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TxPolicy {
    /// Value to transfer, in wei.
    pub value: U256,
    /// Gas limit, in units.
    pub gas_limit: U256,
    /// Gas price, in wei.
    pub gas_price: U256,
}

impl Default for TxPolicy {
    fn default() -> Self {
        TxPolicy {
            value: U256::zero(),
            gas_limit: DEFAULT_GAS_LIMIT.into(),
            gas_price: DEFAULT_GAS_PRICE.into(),
        }
    }
}

impl TxPolicy {
    /// Create new default `TxPolicy` object with some modifications.
    pub fn with<F>(func: F) -> TxPolicy
    where
        F: FnOnce(&mut TxPolicy),
    {
        let mut policy = TxPolicy::default();
        func(&mut policy);
        policy
    }
}

/// Post-submission check for writes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Confirmation {
    /// Re-read the record right after submission and require a non-empty value.
    ///
    /// Cannot tell an unmined or failed transaction from an intentionally empty
    /// value, and races against block inclusion on most networks.
    ReadBack,
    /// Poll for the transaction receipt and require a successful status.
    Receipt {
        /// Delay between receipt queries.
        #[serde(rename = "pollIntervalMs", with = "millis")]
        poll_interval: Duration,
        /// Give up after this long without a receipt.
        #[serde(rename = "timeoutMs", with = "millis")]
        timeout: Duration,
    },
}

impl Default for Confirmation {
    fn default() -> Self {
        Confirmation::ReadBack
    }
}

impl Confirmation {
    /// Receipt polling every second for up to two minutes.
    pub fn receipt() -> Self {
        Confirmation::Receipt {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
