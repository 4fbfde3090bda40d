// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::artifact::{ArtifactKind, ContextId, WireArtifact};
use crate::error::{FheError, FheResult};
use fhe::bfv::BfvParameters;
use fhe::mbfv::CommonRandomPoly;
use fhe_traits::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;
use umbra_fhe_params::{create_deterministic_crp_from_seed, SchemeParameters};

/// Evaluation context for one game session.
///
/// Holds the BFV parameters and the common random polynomial both key
/// contributions are derived from. Owns no key material.
#[derive(Clone)]
pub struct CryptoContext {
    scheme: SchemeParameters,
    params: Arc<BfvParameters>,
    crp: CommonRandomPoly,
    id: ContextId,
}

impl std::fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoContext")
            .field("id", &self.id)
            .field("preset", &self.scheme.preset)
            .field("plaintext_modulus", &self.scheme.plaintext_modulus)
            .finish()
    }
}

/// Validates the scheme parameters and derives the session context.
pub fn create_context(scheme: &SchemeParameters) -> FheResult<CryptoContext> {
    let set = scheme.validate()?;
    let params = set.build_arc()?;
    let crp = create_deterministic_crp_from_seed(&params, scheme.crp_seed)?;
    let id = fingerprint(&params, &crp);
    debug!(context = %id, preset = %scheme.preset, "created crypto context");
    Ok(CryptoContext {
        scheme: scheme.clone(),
        params,
        crp,
        id,
    })
}

fn fingerprint(params: &BfvParameters, crp: &CommonRandomPoly) -> ContextId {
    let mut hasher = Sha256::new();
    hasher.update(params.to_bytes());
    hasher.update(crp.to_bytes());
    ContextId::from_bytes(hasher.finalize().into())
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ContextPayload {
    scheme: SchemeParameters,
    params: Vec<u8>,
    crp: Vec<u8>,
}

impl CryptoContext {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn params(&self) -> &Arc<BfvParameters> {
        &self.params
    }

    pub fn crp(&self) -> &CommonRandomPoly {
        &self.crp
    }

    pub fn scheme(&self) -> &SchemeParameters {
        &self.scheme
    }

    pub fn plaintext_modulus(&self) -> u64 {
        self.scheme.plaintext_modulus
    }

    pub fn dimensions(&self) -> usize {
        self.scheme.dimensions
    }

    pub fn to_artifact(&self) -> FheResult<WireArtifact> {
        let payload = bincode::serialize(&ContextPayload {
            scheme: self.scheme.clone(),
            params: self.params.to_bytes(),
            crp: self.crp.to_bytes(),
        })
        .map_err(|e| FheError::deserialization(ArtifactKind::CryptoContext, e))?;
        Ok(WireArtifact::new(
            ArtifactKind::CryptoContext,
            self.id,
            None,
            payload,
        ))
    }

    pub fn to_json(&self) -> FheResult<String> {
        self.to_artifact()?.to_json()
    }

    /// Rebuilds a context from its envelope and checks the fingerprint.
    pub fn from_artifact(artifact: &WireArtifact) -> FheResult<Self> {
        let kind = ArtifactKind::CryptoContext;
        if artifact.kind != kind {
            return Err(FheError::WrongKind {
                expected: kind,
                found: artifact.kind,
            });
        }
        let ContextPayload { scheme, params, crp } = bincode::deserialize(&artifact.payload)
            .map_err(|e| FheError::deserialization(kind, e))?;
        let params = Arc::new(
            BfvParameters::try_deserialize(&params)
                .map_err(|e| FheError::deserialization(kind, e))?,
        );
        let crp = CommonRandomPoly::deserialize(&crp, &params)
            .map_err(|e| FheError::deserialization(kind, e))?;
        let id = fingerprint(&params, &crp);
        artifact.ensure_context(&id)?;
        Ok(Self {
            scheme,
            params,
            crp,
            id,
        })
    }

    pub fn from_json(value: &str) -> FheResult<Self> {
        Self::from_artifact(&WireArtifact::from_json(
            value,
            ArtifactKind::CryptoContext,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_fhe_params::{GamePreset, MultipartyMode, ParameterError};

    fn scheme() -> SchemeParameters {
        SchemeParameters::from_preset(GamePreset::InsecureGame512)
    }

    #[test]
    fn same_inputs_same_context() {
        let a = create_context(&scheme()).unwrap();
        let b = create_context(&scheme()).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.plaintext_modulus(), 65537);
        assert_eq!(a.dimensions(), 2);
    }

    #[test]
    fn different_seed_different_context() {
        let a = create_context(&scheme()).unwrap();
        let b = create_context(&scheme().with_seed([3u8; 32])).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad = SchemeParameters::new(
            GamePreset::InsecureGame512,
            4096,
            MultipartyMode::NoiseFlooding,
        );
        let err = create_context(&bad).unwrap_err();
        assert!(matches!(
            err,
            FheError::Parameter(ParameterError::NonPrimeModulus(4096))
        ));
    }

    #[test]
    fn json_roundtrip_keeps_fingerprint() {
        let ctx = create_context(&scheme()).unwrap();
        let restored = CryptoContext::from_json(&ctx.to_json().unwrap()).unwrap();
        assert_eq!(restored.id(), ctx.id());
        assert_eq!(restored.scheme(), ctx.scheme());
        assert_eq!(restored.params().degree(), 512);
    }

    #[test]
    fn tampered_fingerprint_is_rejected() {
        let ctx = create_context(&scheme()).unwrap();
        let mut artifact = ctx.to_artifact().unwrap();
        artifact.context_id = ContextId::from_bytes([0u8; 32]);
        assert!(matches!(
            CryptoContext::from_artifact(&artifact),
            Err(FheError::ContextMismatch { .. })
        ));
    }
}
