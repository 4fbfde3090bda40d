// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::artifact::{ArtifactKind, ContextId, KeyEpoch, WireArtifact};
use crate::context::CryptoContext;
use crate::encoding::encode_vector;
use crate::error::{FheError, FheResult};
use crate::keys::JointPublicKey;
use fhe::bfv::Ciphertext;
use fhe_traits::{DeserializeParametrized, FheEncrypter, Serialize};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

/// A BFV ciphertext tagged with the context and key epoch it was produced under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedVector {
    context_id: ContextId,
    epoch: KeyEpoch,
    ct: Arc<Ciphertext>,
}

impl EncryptedVector {
    /// Encrypts a signed move vector under the joint public key.
    pub fn encrypt<R: RngCore + CryptoRng>(
        ctx: &CryptoContext,
        joint: &JointPublicKey,
        values: &[i64],
        rng: &mut R,
    ) -> FheResult<Self> {
        if joint.context_id() != ctx.id() {
            return Err(FheError::ContextMismatch {
                expected: ctx.id(),
                found: joint.context_id(),
            });
        }
        let pt = encode_vector(ctx, values)?;
        let ct: Ciphertext = joint
            .public_key()
            .try_encrypt(&pt, rng)
            .map_err(|e| FheError::Encryption(e.to_string()))?;
        Ok(Self {
            context_id: ctx.id(),
            epoch: joint.epoch(),
            ct: Arc::new(ct),
        })
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn epoch(&self) -> KeyEpoch {
        self.epoch
    }

    pub(crate) fn ciphertext(&self) -> &Arc<Ciphertext> {
        &self.ct
    }

    /// Homomorphic addition. Both operands must share context and epoch.
    pub fn add(&self, other: &EncryptedVector) -> FheResult<EncryptedVector> {
        if self.context_id != other.context_id {
            return Err(FheError::ContextMismatch {
                expected: self.context_id,
                found: other.context_id,
            });
        }
        if self.epoch != other.epoch {
            return Err(FheError::EpochMismatch {
                expected: self.epoch,
                found: other.epoch,
            });
        }
        let sum: Ciphertext = self.ct.as_ref() + other.ct.as_ref();
        Ok(Self {
            context_id: self.context_id,
            epoch: self.epoch,
            ct: Arc::new(sum),
        })
    }

    /// Sums a non-empty list of ciphertexts.
    pub fn sum<'a>(
        mut items: impl Iterator<Item = &'a EncryptedVector>,
    ) -> FheResult<Option<EncryptedVector>> {
        let Some(first) = items.next() else {
            return Ok(None);
        };
        items
            .try_fold(first.clone(), |acc, next| acc.add(next))
            .map(Some)
    }

    pub fn to_artifact(&self) -> WireArtifact {
        WireArtifact::new(
            ArtifactKind::Ciphertext,
            self.context_id,
            Some(self.epoch),
            self.ct.to_bytes(),
        )
    }

    pub fn to_json(&self) -> FheResult<String> {
        self.to_artifact().to_json()
    }

    /// Parses a ciphertext envelope. The context is checked here; callers
    /// decide what to do with the epoch.
    pub fn from_artifact(ctx: &CryptoContext, artifact: WireArtifact) -> FheResult<Self> {
        let kind = ArtifactKind::Ciphertext;
        if artifact.kind != kind {
            return Err(FheError::WrongKind {
                expected: kind,
                found: artifact.kind,
            });
        }
        artifact.ensure_context(&ctx.id())?;
        let epoch = artifact.require_epoch()?;
        let ct = Ciphertext::from_bytes(&artifact.payload, ctx.params())
            .map_err(|e| FheError::deserialization(kind, e))?;
        Ok(Self {
            context_id: artifact.context_id,
            epoch,
            ct: Arc::new(ct),
        })
    }

    pub fn from_json(ctx: &CryptoContext, value: &str) -> FheResult<Self> {
        Self::from_artifact(ctx, WireArtifact::from_json(value, ArtifactKind::Ciphertext)?)
    }
}
