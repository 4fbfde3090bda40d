// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::artifact::{ArtifactKind, ContextId, KeyEpoch};
use thiserror::Error;
use umbra_fhe_params::ParameterError;

/// Failures of the threshold BFV layer.
#[derive(Error, Debug)]
pub enum FheError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Could not deserialize {kind}: {reason}")]
    Deserialization { kind: ArtifactKind, reason: String },

    #[error("Expected artifact of kind {expected} but found {found}")]
    WrongKind {
        expected: ArtifactKind,
        found: ArtifactKind,
    },

    #[error("Artifact belongs to context {found}, expected {expected}")]
    ContextMismatch { expected: ContextId, found: ContextId },

    #[error("Artifact belongs to key epoch {found}, expected {expected}")]
    EpochMismatch { expected: KeyEpoch, found: KeyEpoch },

    #[error("Move vector must have {expected} coordinates, got {found}")]
    InvalidVector { expected: usize, found: usize },

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption is incomplete: {0}")]
    IncompleteDecryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),
}

impl FheError {
    pub(crate) fn deserialization(kind: ArtifactKind, reason: impl ToString) -> Self {
        FheError::Deserialization {
            kind,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn key_generation(reason: impl ToString) -> Self {
        FheError::KeyGeneration(reason.to_string())
    }
}

pub type FheResult<T> = Result<T, FheError>;
