// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Two-phase threshold decryption.
//!
//! The lead party publishes one noise-flooded decryption share per target
//! ciphertext. The main party checks the lead shares against the same targets,
//! computes its own shares and binds them to the digest of the lead record.
//! Only the two records together open the targets.

use crate::artifact::{ArtifactKind, ContextId, KeyEpoch, WireArtifact};
use crate::ciphertext::EncryptedVector;
use crate::context::CryptoContext;
use crate::encoding::decode_vector;
use crate::error::{FheError, FheResult};
use crate::keys::SecretShare;
use fhe::bfv::Plaintext;
use fhe::mbfv::{AggregateIter, DecryptionShare};
use fhe_traits::Serialize;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize as SerdeSerialize};
use sha2::{Digest, Sha256};
use strum::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerdeSerialize, Deserialize, Display)]
pub enum DecryptionRole {
    Lead,
    Main,
}

#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, Deserialize)]
struct PartialPayload {
    stage: u64,
    role: DecryptionRole,
    lead_digest: Option<[u8; 32]>,
    shares: Vec<Vec<u8>>,
}

/// One party's decryption shares for every checkpoint target of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialDecryption {
    context_id: ContextId,
    epoch: KeyEpoch,
    payload: PartialPayload,
}

impl PartialDecryption {
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn epoch(&self) -> KeyEpoch {
        self.epoch
    }

    pub fn stage(&self) -> u64 {
        self.payload.stage
    }

    pub fn role(&self) -> DecryptionRole {
        self.payload.role
    }

    pub fn lead_digest(&self) -> Option<[u8; 32]> {
        self.payload.lead_digest
    }

    pub fn share_count(&self) -> usize {
        self.payload.shares.len()
    }

    /// SHA-256 over the canonical record, used by the main share to name the
    /// lead share it was computed against.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.context_id.as_bytes());
        hasher.update(self.epoch.value().to_le_bytes());
        hasher.update(self.payload.stage.to_le_bytes());
        hasher.update([self.payload.role as u8]);
        for share in &self.payload.shares {
            hasher.update((share.len() as u64).to_le_bytes());
            hasher.update(share);
        }
        hasher.finalize().into()
    }

    pub fn to_artifact(&self) -> FheResult<WireArtifact> {
        let payload = bincode::serialize(&self.payload)
            .map_err(|e| FheError::deserialization(ArtifactKind::PartialDecryption, e))?;
        Ok(WireArtifact::new(
            ArtifactKind::PartialDecryption,
            self.context_id,
            Some(self.epoch),
            payload,
        ))
    }

    pub fn to_json(&self) -> FheResult<String> {
        self.to_artifact()?.to_json()
    }

    /// Parses the envelope and the share list. Shares are only checked against
    /// their ciphertexts once the targets are known.
    pub fn from_artifact(ctx: &CryptoContext, artifact: WireArtifact) -> FheResult<Self> {
        let kind = ArtifactKind::PartialDecryption;
        if artifact.kind != kind {
            return Err(FheError::WrongKind {
                expected: kind,
                found: artifact.kind,
            });
        }
        artifact.ensure_context(&ctx.id())?;
        let epoch = artifact.require_epoch()?;
        let payload: PartialPayload = bincode::deserialize(&artifact.payload)
            .map_err(|e| FheError::deserialization(kind, e))?;
        match (payload.role, payload.lead_digest) {
            (DecryptionRole::Lead, Some(_)) => {
                return Err(FheError::deserialization(kind, "lead share names a lead"))
            }
            (DecryptionRole::Main, None) => {
                return Err(FheError::deserialization(kind, "main share without lead digest"))
            }
            _ => {}
        }
        Ok(Self {
            context_id: artifact.context_id,
            epoch,
            payload,
        })
    }

    pub fn from_json(ctx: &CryptoContext, value: &str) -> FheResult<Self> {
        Self::from_artifact(
            ctx,
            WireArtifact::from_json(value, ArtifactKind::PartialDecryption)?,
        )
    }

    /// Decodes every share against its checkpoint target without keeping the
    /// result.
    pub fn validate_against(
        &self,
        ctx: &CryptoContext,
        targets: &[EncryptedVector],
    ) -> FheResult<()> {
        self.decryption_shares(ctx, targets).map(|_| ())
    }

    fn decryption_shares(
        &self,
        ctx: &CryptoContext,
        targets: &[EncryptedVector],
    ) -> FheResult<Vec<DecryptionShare>> {
        if self.payload.shares.len() != targets.len() {
            return Err(FheError::IncompleteDecryption(format!(
                "{} share covers {} targets, expected {}",
                self.payload.role,
                self.payload.shares.len(),
                targets.len()
            )));
        }
        self.payload
            .shares
            .iter()
            .zip(targets)
            .map(|(bytes, target)| {
                DecryptionShare::deserialize(bytes, ctx.params(), target.ciphertext().clone())
                    .map_err(|e| FheError::deserialization(ArtifactKind::PartialDecryption, e))
            })
            .collect()
    }
}

fn check_targets(
    ctx: &CryptoContext,
    secret: &SecretShare,
    targets: &[EncryptedVector],
) -> FheResult<()> {
    if secret.context_id() != ctx.id() {
        return Err(FheError::ContextMismatch {
            expected: ctx.id(),
            found: secret.context_id(),
        });
    }
    if targets.is_empty() {
        return Err(FheError::Decryption("no ciphertexts to decrypt".to_string()));
    }
    for target in targets {
        target_matches(ctx, secret.epoch(), target)?;
    }
    Ok(())
}

fn target_matches(ctx: &CryptoContext, epoch: KeyEpoch, target: &EncryptedVector) -> FheResult<()> {
    if target.context_id() != ctx.id() {
        return Err(FheError::ContextMismatch {
            expected: ctx.id(),
            found: target.context_id(),
        });
    }
    if target.epoch() != epoch {
        return Err(FheError::EpochMismatch {
            expected: epoch,
            found: target.epoch(),
        });
    }
    Ok(())
}

fn share_targets<R: RngCore + CryptoRng>(
    secret: &SecretShare,
    targets: &[EncryptedVector],
    rng: &mut R,
) -> FheResult<Vec<Vec<u8>>> {
    targets
        .iter()
        .enumerate()
        .map(|(idx, target)| {
            DecryptionShare::new(secret.secret_key(), target.ciphertext(), rng)
                .map(|share| share.to_bytes())
                .map_err(|e| FheError::Decryption(format!("target {idx}: {e}")))
        })
        .collect()
}

/// Lead phase: partial decryption with the lead party's share only.
pub fn lead_partial_decrypt<R: RngCore + CryptoRng>(
    ctx: &CryptoContext,
    secret: &SecretShare,
    targets: &[EncryptedVector],
    stage: u64,
    rng: &mut R,
) -> FheResult<PartialDecryption> {
    check_targets(ctx, secret, targets)?;
    let shares = share_targets(secret, targets, rng)?;
    debug!(stage, targets = targets.len(), "computed lead partial decryption");
    Ok(PartialDecryption {
        context_id: ctx.id(),
        epoch: secret.epoch(),
        payload: PartialPayload {
            stage,
            role: DecryptionRole::Lead,
            lead_digest: None,
            shares,
        },
    })
}

/// Main phase: validates the lead record and adds the second party's shares.
pub fn main_partial_decrypt<R: RngCore + CryptoRng>(
    ctx: &CryptoContext,
    secret: &SecretShare,
    targets: &[EncryptedVector],
    lead: &PartialDecryption,
    rng: &mut R,
) -> FheResult<PartialDecryption> {
    check_targets(ctx, secret, targets)?;
    if lead.role() != DecryptionRole::Lead {
        return Err(FheError::IncompleteDecryption(
            "main phase needs a lead share".to_string(),
        ));
    }
    if lead.epoch() != secret.epoch() {
        return Err(FheError::EpochMismatch {
            expected: secret.epoch(),
            found: lead.epoch(),
        });
    }
    lead.decryption_shares(ctx, targets)?;
    let shares = share_targets(secret, targets, rng)?;
    debug!(
        stage = lead.stage(),
        targets = targets.len(),
        "computed main partial decryption"
    );
    Ok(PartialDecryption {
        context_id: ctx.id(),
        epoch: secret.epoch(),
        payload: PartialPayload {
            stage: lead.stage(),
            role: DecryptionRole::Main,
            lead_digest: Some(lead.digest()),
            shares,
        },
    })
}

/// Combines a lead and a main record into the decoded target vectors.
pub fn combine(
    ctx: &CryptoContext,
    targets: &[EncryptedVector],
    lead: Option<&PartialDecryption>,
    main: Option<&PartialDecryption>,
) -> FheResult<Vec<Vec<i64>>> {
    let lead =
        lead.ok_or_else(|| FheError::IncompleteDecryption("lead share missing".to_string()))?;
    let main =
        main.ok_or_else(|| FheError::IncompleteDecryption("main share missing".to_string()))?;

    if lead.role() != DecryptionRole::Lead || main.role() != DecryptionRole::Main {
        return Err(FheError::IncompleteDecryption(
            "need exactly one lead and one main share".to_string(),
        ));
    }
    if lead.stage() != main.stage() {
        return Err(FheError::IncompleteDecryption(format!(
            "lead share is for stage {} but main share is for stage {}",
            lead.stage(),
            main.stage()
        )));
    }
    if lead.epoch() != main.epoch() {
        return Err(FheError::EpochMismatch {
            expected: lead.epoch(),
            found: main.epoch(),
        });
    }
    if main.lead_digest() != Some(lead.digest()) {
        return Err(FheError::IncompleteDecryption(
            "main share was computed against a different lead share".to_string(),
        ));
    }
    for target in targets {
        target_matches(ctx, lead.epoch(), target)?;
    }

    let lead_shares = lead.decryption_shares(ctx, targets)?;
    let main_shares = main.decryption_shares(ctx, targets)?;

    lead_shares
        .into_iter()
        .zip(main_shares)
        .map(|(l, m)| {
            let plaintext: Plaintext = vec![l, m]
                .into_iter()
                .aggregate()
                .map_err(|e| FheError::Decryption(e.to_string()))?;
            decode_vector(ctx, &plaintext)
        })
        .collect()
}
