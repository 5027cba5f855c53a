//! Core data types shared by the client, the storage backends and the scanner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A block height. Heights reported by the chain are non-negative; `0` is used
/// by the scanner as the "not yet baselined" sentinel.
pub type BlockHeight = i64;

/// A hex-encoded account address.
///
/// Addresses are normalized on construction (surrounding whitespace trimmed,
/// lowercased), so `0xAbC` and `0xabc` refer to the same key everywhere.
/// A JSON `null` decodes to the empty address, which is what a node returns
/// as the recipient of a contract-creation transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty address (no sender/recipient).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<Option<String>> for Address {
    fn from(raw: Option<String>) -> Self {
        raw.map(Self::new).unwrap_or_default()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// A transfer as reported by the chain. All fields except the addresses are
/// kept as the node encoded them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: Address,
    #[serde(default)]
    pub to: Address,
    pub value: String,
    pub block_number: String,
}
