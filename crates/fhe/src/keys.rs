// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Two-step joint key generation.
//!
//! Party 1 samples a secret share and publishes a public key contribution.
//! Party 2 samples its own share, derives its contribution from the same CRP
//! and aggregates both into the joint public key. Decryption under the joint
//! key needs both secret shares.

use crate::artifact::{ArtifactKind, ContextId, KeyEpoch, WireArtifact};
use crate::context::CryptoContext;
use crate::error::{FheError, FheResult};
use fhe::bfv::{PublicKey, SecretKey};
use fhe::mbfv::{AggregateIter, PublicKeyShare};
use fhe_traits::{DeserializeParametrized, Serialize};
use rand::{CryptoRng, RngCore};
use tracing::{debug, error};
use zeroize::Zeroizing;

/// A party's secret key share. Never leaves the party that generated it.
pub struct SecretShare {
    context_id: ContextId,
    epoch: KeyEpoch,
    inner: SecretKey,
}

impl std::fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretShare")
            .field("context_id", &self.context_id)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SecretShareData {
    context_id: ContextId,
    epoch: KeyEpoch,
    coeffs: Vec<i64>,
}

impl SecretShare {
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn epoch(&self) -> KeyEpoch {
        self.epoch
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.inner
    }

    /// Serializes the raw share for the owner's local keystore. The bytes are
    /// the secret itself and must never be sent to the other party.
    pub fn unsafe_to_bytes(&self) -> FheResult<Zeroizing<Vec<u8>>> {
        let data = SecretShareData {
            context_id: self.context_id,
            epoch: self.epoch,
            coeffs: self.inner.coeffs.to_vec(),
        };
        let bytes = bincode::serialize(&data)
            .map_err(|e| FheError::key_generation(format!("cannot serialize share: {e}")))?;
        let SecretShareData { mut coeffs, .. } = data;
        zeroize::Zeroize::zeroize(&mut coeffs);
        Ok(Zeroizing::new(bytes))
    }

    pub fn unsafe_from_bytes(ctx: &CryptoContext, bytes: &[u8]) -> FheResult<Self> {
        let SecretShareData {
            context_id,
            epoch,
            coeffs,
        } = bincode::deserialize(bytes)
            .map_err(|e| FheError::key_generation(format!("cannot read share: {e}")))?;
        if context_id != ctx.id() {
            return Err(FheError::ContextMismatch {
                expected: ctx.id(),
                found: context_id,
            });
        }
        let coeffs = Zeroizing::new(coeffs);
        Ok(Self {
            context_id,
            epoch,
            inner: SecretKey::new(coeffs.to_vec(), ctx.params()),
        })
    }
}

/// One party's public key share, tagged with the context and key epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyContribution {
    context_id: ContextId,
    epoch: KeyEpoch,
    bytes: Vec<u8>,
}

impl PublicKeyContribution {
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn epoch(&self) -> KeyEpoch {
        self.epoch
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn share(&self, ctx: &CryptoContext) -> FheResult<PublicKeyShare> {
        PublicKeyShare::deserialize(&self.bytes, ctx.params(), ctx.crp().clone())
            .map_err(|e| FheError::deserialization(ArtifactKind::PublicKeyContribution, e))
    }

    pub fn to_artifact(&self) -> WireArtifact {
        WireArtifact::new(
            ArtifactKind::PublicKeyContribution,
            self.context_id,
            Some(self.epoch),
            self.bytes.clone(),
        )
    }

    pub fn to_json(&self) -> FheResult<String> {
        self.to_artifact().to_json()
    }

    pub fn from_json(ctx: &CryptoContext, value: &str) -> FheResult<Self> {
        let artifact = WireArtifact::from_json(value, ArtifactKind::PublicKeyContribution)?;
        artifact.ensure_context(&ctx.id())?;
        let contribution = Self {
            context_id: artifact.context_id,
            epoch: artifact.require_epoch()?,
            bytes: artifact.payload,
        };
        contribution.share(ctx)?;
        Ok(contribution)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct JointKeyPayload {
    public_key: Vec<u8>,
    lead: Vec<u8>,
    extension: Vec<u8>,
}

/// Aggregated public key plus the two contributions it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointPublicKey {
    context_id: ContextId,
    epoch: KeyEpoch,
    public_key: PublicKey,
    lead: Vec<u8>,
    extension: Vec<u8>,
}

impl JointPublicKey {
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn epoch(&self) -> KeyEpoch {
        self.epoch
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The lead contribution this key was extended from.
    pub fn lead_contribution(&self) -> PublicKeyContribution {
        PublicKeyContribution {
            context_id: self.context_id,
            epoch: self.epoch,
            bytes: self.lead.clone(),
        }
    }

    /// Re-aggregates both contributions and checks they yield this key.
    pub fn verify(&self, ctx: &CryptoContext) -> FheResult<()> {
        if self.context_id != ctx.id() {
            return Err(FheError::ContextMismatch {
                expected: ctx.id(),
                found: self.context_id,
            });
        }
        let expected = aggregate(ctx, &[&self.lead, &self.extension])?;
        if expected != self.public_key {
            error!(epoch = %self.epoch, "joint public key does not match its contributions");
            return Err(FheError::key_generation(
                "joint public key does not match its contributions",
            ));
        }
        Ok(())
    }

    pub fn to_artifact(&self) -> FheResult<WireArtifact> {
        let payload = bincode::serialize(&JointKeyPayload {
            public_key: self.public_key.to_bytes(),
            lead: self.lead.clone(),
            extension: self.extension.clone(),
        })
        .map_err(|e| FheError::deserialization(ArtifactKind::JointPublicKey, e))?;
        Ok(WireArtifact::new(
            ArtifactKind::JointPublicKey,
            self.context_id,
            Some(self.epoch),
            payload,
        ))
    }

    pub fn to_json(&self) -> FheResult<String> {
        self.to_artifact()?.to_json()
    }

    pub fn from_artifact(ctx: &CryptoContext, artifact: WireArtifact) -> FheResult<Self> {
        let kind = ArtifactKind::JointPublicKey;
        if artifact.kind != kind {
            return Err(FheError::WrongKind {
                expected: kind,
                found: artifact.kind,
            });
        }
        artifact.ensure_context(&ctx.id())?;
        let epoch = artifact.require_epoch()?;
        let JointKeyPayload {
            public_key,
            lead,
            extension,
        } = bincode::deserialize(&artifact.payload)
            .map_err(|e| FheError::deserialization(kind, e))?;
        let public_key = PublicKey::from_bytes(&public_key, ctx.params())
            .map_err(|e| FheError::deserialization(kind, e))?;
        Ok(Self {
            context_id: artifact.context_id,
            epoch,
            public_key,
            lead,
            extension,
        })
    }

    pub fn from_json(ctx: &CryptoContext, value: &str) -> FheResult<Self> {
        Self::from_artifact(
            ctx,
            WireArtifact::from_json(value, ArtifactKind::JointPublicKey)?,
        )
    }
}

fn aggregate(ctx: &CryptoContext, contributions: &[&[u8]]) -> FheResult<PublicKey> {
    let shares = contributions
        .iter()
        .map(|bytes| {
            PublicKeyShare::deserialize(bytes, ctx.params(), ctx.crp().clone())
                .map_err(FheError::key_generation)
        })
        .collect::<FheResult<Vec<_>>>()?;
    shares
        .into_iter()
        .aggregate()
        .map_err(FheError::key_generation)
}

fn sample_share<R: RngCore + CryptoRng>(
    ctx: &CryptoContext,
    rng: &mut R,
) -> FheResult<(SecretKey, Vec<u8>)> {
    let sk = SecretKey::random(ctx.params(), rng);
    let pk_share =
        PublicKeyShare::new(&sk, ctx.crp().clone(), rng).map_err(FheError::key_generation)?;
    Ok((sk, pk_share.to_bytes()))
}

/// First ceremony step, run by the lead party.
pub fn generate_party1_keys<R: RngCore + CryptoRng>(
    ctx: &CryptoContext,
    epoch: KeyEpoch,
    rng: &mut R,
) -> FheResult<(PublicKeyContribution, SecretShare)> {
    let (sk, bytes) = sample_share(ctx, rng)?;
    let contribution = PublicKeyContribution {
        context_id: ctx.id(),
        epoch,
        bytes,
    };
    // the contribution must be readable by the second party before we trust it
    contribution.share(ctx).map_err(FheError::key_generation)?;
    debug!(context = %ctx.id(), %epoch, "generated lead key contribution");
    Ok((
        contribution,
        SecretShare {
            context_id: ctx.id(),
            epoch,
            inner: sk,
        },
    ))
}

/// Second ceremony step: extends the lead contribution into the joint key.
pub fn extend_joint_key<R: RngCore + CryptoRng>(
    ctx: &CryptoContext,
    lead: &PublicKeyContribution,
    rng: &mut R,
) -> FheResult<(JointPublicKey, SecretShare)> {
    if lead.context_id != ctx.id() {
        return Err(FheError::ContextMismatch {
            expected: ctx.id(),
            found: lead.context_id,
        });
    }
    let (sk, extension) = sample_share(ctx, rng)?;
    let public_key = aggregate(ctx, &[&lead.bytes, &extension])?;
    let joint = JointPublicKey {
        context_id: ctx.id(),
        epoch: lead.epoch,
        public_key,
        lead: lead.bytes.clone(),
        extension,
    };
    joint.verify(ctx)?;
    debug!(context = %ctx.id(), epoch = %lead.epoch, "extended joint public key");
    Ok((
        joint,
        SecretShare {
            context_id: ctx.id(),
            epoch: lead.epoch,
            inner: sk,
        },
    ))
}
