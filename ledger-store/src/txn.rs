//! Transaction identifiers
//!
//! A transaction id is the hex SHA-256 of a fresh UUIDv7 nonce followed by
//! the creator name. All revisions written by one invocation share one id.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Ledger transaction identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(String);

impl TxnId {
    /// Derive a new id for `creator`
    pub fn generate(creator: &str) -> Self {
        Self::derive(Uuid::now_v7(), creator)
    }

    /// Deterministic derivation from an explicit nonce
    pub fn derive(nonce: Uuid, creator: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(nonce.as_bytes());
        hasher.update(creator.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        let mut hex = String::with_capacity(64);
        for byte in digest {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TxnId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TxnId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
