// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Canonical wire envelope shared by every artifact that crosses the network
//! or lands in storage.
//!
//! ```json
//! { "kind": "Ciphertext", "context_id": "<hex>", "epoch": 3, "payload": "<base64>" }
//! ```
//!
//! The payload holds the `fhe` crate's own byte encoding (or a bincode record
//! wrapping several of them). The envelope lets a receiver reject an artifact
//! produced under another context before handing any bytes to the FHE library.

use crate::error::{FheError, FheResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ArtifactKind {
    CryptoContext,
    PublicKeyContribution,
    JointPublicKey,
    Ciphertext,
    PartialDecryption,
}

/// SHA-256 fingerprint of a context's BFV parameters and CRP.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId([u8; 32]);

impl ContextId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(value: &str) -> FheResult<Self> {
        let bytes = hex::decode(value)
            .map_err(|e| FheError::deserialization(ArtifactKind::CryptoContext, e))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            FheError::deserialization(ArtifactKind::CryptoContext, "context id must be 32 bytes")
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // short form is enough to tell contexts apart in logs
        write!(f, "{}", &self.to_hex()[..12])
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self)
    }
}

impl Serialize for ContextId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContextId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ContextId::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// Validity period of one joint public key. Every ceremony run gets a new epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyEpoch(u64);

impl KeyEpoch {
    pub const INITIAL: KeyEpoch = KeyEpoch(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for KeyEpoch {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for KeyEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireArtifact {
    pub kind: ArtifactKind,
    pub context_id: ContextId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<KeyEpoch>,
    #[serde(with = "base64_payload")]
    pub payload: Vec<u8>,
}

impl WireArtifact {
    pub fn new(
        kind: ArtifactKind,
        context_id: ContextId,
        epoch: Option<KeyEpoch>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            context_id,
            epoch,
            payload,
        }
    }

    pub fn to_json(&self) -> FheResult<String> {
        serde_json::to_string(self).map_err(|e| FheError::deserialization(self.kind, e))
    }

    /// Parses the envelope and checks that it carries the expected kind.
    pub fn from_json(value: &str, expected: ArtifactKind) -> FheResult<Self> {
        let artifact: WireArtifact =
            serde_json::from_str(value).map_err(|e| FheError::deserialization(expected, e))?;
        if artifact.kind != expected {
            return Err(FheError::WrongKind {
                expected,
                found: artifact.kind,
            });
        }
        Ok(artifact)
    }

    pub fn ensure_context(&self, expected: &ContextId) -> FheResult<()> {
        if &self.context_id != expected {
            return Err(FheError::ContextMismatch {
                expected: *expected,
                found: self.context_id,
            });
        }
        Ok(())
    }

    pub fn require_epoch(&self) -> FheResult<KeyEpoch> {
        self.epoch
            .ok_or_else(|| FheError::deserialization(self.kind, "missing key epoch"))
    }
}

mod base64_payload {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let value = String::deserialize(deserializer)?;
        STANDARD.decode(value).map_err(serde::de::Error::custom)
    }
}
