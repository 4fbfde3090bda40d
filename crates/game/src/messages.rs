// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Responses handed back to the transport layer.

use crate::ceremony::CeremonyStatus;
use crate::player::{PlayerId, Role};
use crate::scheduler::{Outcome, TurnState};
use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use umbra_fhe::{DecryptionRole, KeyEpoch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joined {
    pub session: SessionId,
    pub player_id: PlayerId,
    pub role: Role,
    pub seat: usize,
    pub epoch: KeyEpoch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAccepted {
    pub stage: u64,
    pub moves_this_stage: u32,
    pub turn: TurnState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedPosition {
    pub player: PlayerId,
    pub role: Role,
    pub position: Vec<i64>,
}

/// What both players learn at a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReveal {
    pub stage: u64,
    pub positions: Vec<RevealedPosition>,
    /// Sum of all positions, added under encryption before decrypting.
    pub combined: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareResponse {
    ShareAccepted { role: DecryptionRole },
    Revealed(StageReveal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub role: Role,
    pub seat: usize,
    pub moves_this_stage: u32,
}

/// Public session state. Contains no ciphertexts and no key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateView {
    pub session: SessionId,
    pub stage: u64,
    pub max_stages: u64,
    pub turn: TurnState,
    pub is_decryption_stage: bool,
    pub epoch: KeyEpoch,
    pub ceremony: CeremonyStatus,
    pub players: Vec<PlayerView>,
    pub last_reveal: Option<StageReveal>,
    pub outcome: Option<Outcome>,
}

/// What a client needs for its ceremony step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeremonyView {
    pub epoch: KeyEpoch,
    pub status: CeremonyStatus,
    /// Wire envelope of the stored lead contribution, once submitted.
    pub lead_contribution: Option<String>,
}

/// What a client needs to compute its decryption share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointView {
    pub stage: u64,
    /// Ciphertext envelopes: each player's position in seat order, then the combined sum.
    pub targets: Vec<String>,
    pub lead_share: Option<String>,
}
