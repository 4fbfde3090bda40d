// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::player::PlayerId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use umbra_fhe::{FheError, KeyEpoch, ParameterError};

/// How a caller should react to a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ErrorClass {
    /// The session or its crypto cannot make progress through this request.
    Fatal,
    /// The request itself is wrong and must be changed before resending.
    CallerCorrectable,
    /// The request is fine but arrived at the wrong moment.
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncompleteReason {
    #[error("the lead share has not been submitted")]
    MissingLead,
    #[error("share is for stage {found}, the open checkpoint is stage {expected}")]
    StaleShare { expected: u64, found: u64 },
    #[error("main share was computed against a different lead share")]
    LeadMismatch,
    #[error("{0}")]
    Combination(String),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid scheme parameters: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Could not deserialize artifact: {0}")]
    Deserialization(String),

    #[error("Player {player} may not act now: {reason}")]
    TurnViolation { player: PlayerId, reason: String },

    #[error("Not allowed in the current stage: {0}")]
    StageViolation(String),

    #[error("Decryption is incomplete: {0}")]
    IncompleteDecryption(IncompleteReason),

    #[error("Artifact belongs to key epoch {found}, current epoch is {expected}")]
    EpochMismatch { expected: KeyEpoch, found: KeyEpoch },

    #[error("Crypto operation failed: {0}")]
    Crypto(String),

    #[error("Session {0} is full")]
    SessionFull(SessionId),

    #[error("Session {0} already exists")]
    SessionExists(SessionId),

    #[error("Unknown session {0}")]
    UnknownSession(SessionId),

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl GameError {
    pub fn class(&self) -> ErrorClass {
        match self {
            GameError::Parameter(_)
            | GameError::KeyGeneration(_)
            | GameError::Crypto(_)
            | GameError::LockPoisoned(_) => ErrorClass::Fatal,
            GameError::TurnViolation { .. }
            | GameError::StageViolation(_)
            | GameError::Storage(_)
            | GameError::IncompleteDecryption(IncompleteReason::MissingLead) => {
                ErrorClass::Transient
            }
            GameError::IncompleteDecryption(IncompleteReason::Combination(_)) => ErrorClass::Fatal,
            GameError::Deserialization(_)
            | GameError::IncompleteDecryption(_)
            | GameError::EpochMismatch { .. }
            | GameError::SessionFull(_)
            | GameError::SessionExists(_)
            | GameError::UnknownSession(_)
            | GameError::UnknownPlayer(_) => ErrorClass::CallerCorrectable,
        }
    }

    pub(crate) fn turn(player: &PlayerId, reason: impl Into<String>) -> Self {
        GameError::TurnViolation {
            player: player.clone(),
            reason: reason.into(),
        }
    }

    pub(crate) fn stage(reason: impl Into<String>) -> Self {
        GameError::StageViolation(reason.into())
    }
}

impl From<FheError> for GameError {
    fn from(value: FheError) -> Self {
        match value {
            FheError::Parameter(e) => GameError::Parameter(e),
            FheError::KeyGeneration(e) => GameError::KeyGeneration(e),
            FheError::EpochMismatch { expected, found } => {
                GameError::EpochMismatch { expected, found }
            }
            FheError::IncompleteDecryption(e) => {
                GameError::IncompleteDecryption(IncompleteReason::Combination(e))
            }
            e @ (FheError::Deserialization { .. }
            | FheError::WrongKind { .. }
            | FheError::ContextMismatch { .. }
            | FheError::InvalidVector { .. }) => GameError::Deserialization(e.to_string()),
            e @ (FheError::Encryption(_) | FheError::Decryption(_)) => {
                GameError::Crypto(e.to_string())
            }
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_fhe::{ArtifactKind, ContextId};

    #[test]
    fn classes_follow_recoverability() {
        let p = PlayerId::from("alice");
        assert_eq!(GameError::turn(&p, "not yours").class(), ErrorClass::Transient);
        assert_eq!(
            GameError::IncompleteDecryption(IncompleteReason::MissingLead).class(),
            ErrorClass::Transient
        );
        assert_eq!(
            GameError::IncompleteDecryption(IncompleteReason::StaleShare {
                expected: 2,
                found: 1
            })
            .class(),
            ErrorClass::CallerCorrectable
        );
        assert_eq!(
            GameError::KeyGeneration("bad".into()).class(),
            ErrorClass::Fatal
        );
        assert_eq!(
            GameError::LockPoisoned("sessions").class(),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn fhe_errors_map_onto_game_errors() {
        let mismatch = FheError::ContextMismatch {
            expected: ContextId::from_bytes([0; 32]),
            found: ContextId::from_bytes([1; 32]),
        };
        assert!(matches!(
            GameError::from(mismatch),
            GameError::Deserialization(_)
        ));
        let kind = FheError::WrongKind {
            expected: ArtifactKind::Ciphertext,
            found: ArtifactKind::JointPublicKey,
        };
        assert!(matches!(GameError::from(kind), GameError::Deserialization(_)));
        let epoch = FheError::EpochMismatch {
            expected: KeyEpoch::new(2),
            found: KeyEpoch::new(1),
        };
        assert!(matches!(
            GameError::from(epoch),
            GameError::EpochMismatch { .. }
        ));
    }
}
