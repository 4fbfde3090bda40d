// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! One game: players, key ceremony, move ledger, scheduler and decryption
//! coordinator behind a single owner. Every operation either applies fully or
//! leaves the session as it was.

use crate::ceremony::KeyCeremony;
use crate::coordinator::{DecryptionCoordinator, ShareOutcome};
use crate::error::{GameError, GameResult};
use crate::ledger::MoveLedger;
use crate::messages::{
    CeremonyView, CheckpointView, GameStateView, Joined, MoveAccepted, PlayerView,
    RevealedPosition, ShareResponse, StageReveal,
};
use crate::player::{Player, PlayerId, Role};
use crate::scheduler::{MoveTransition, Scheduler, TurnState};
use core::fmt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use umbra_fhe::{
    CryptoContext, DecryptionRole, EncryptedVector, JointPublicKey, KeyEpoch, PartialDecryption,
    PublicKeyContribution,
};

use umbra_config::MAX_PLAYERS;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    ctx: CryptoContext,
    players: Vec<Player>,
    scheduler: Scheduler,
    ceremony: KeyCeremony,
    ledger: MoveLedger,
    coordinator: DecryptionCoordinator,
    last_reveal: Option<StageReveal>,
}

impl GameSession {
    pub fn new(id: SessionId, ctx: CryptoContext, max_stages: u64) -> Self {
        Self {
            id,
            ctx,
            players: Vec::with_capacity(MAX_PLAYERS),
            scheduler: Scheduler::new(max_stages),
            ceremony: KeyCeremony::new(),
            ledger: MoveLedger::new(),
            coordinator: DecryptionCoordinator::new(),
            last_reveal: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn context(&self) -> &CryptoContext {
        &self.ctx
    }

    pub fn epoch(&self) -> KeyEpoch {
        self.ceremony.epoch()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn joint_key(&self) -> Option<&JointPublicKey> {
        self.ceremony.joint_key()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    fn order(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    fn player(&self, id: &PlayerId) -> GameResult<&Player> {
        self.players
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| GameError::UnknownPlayer(id.clone()))
    }

    fn joined(&self, player: &Player) -> Joined {
        Joined {
            session: self.id.clone(),
            player_id: player.id.clone(),
            role: player.role,
            seat: player.seat,
            epoch: self.ceremony.epoch(),
        }
    }

    /// Seats a new player. A player that is already seated re-joins, which
    /// restarts the key ceremony under a fresh epoch.
    pub fn join(&mut self, id: PlayerId) -> GameResult<Joined> {
        if let Some(existing) = self.players.iter().find(|p| p.id == id).cloned() {
            if !self.scheduler.is_over() {
                info!(session = %self.id, player = %id, "player re-joined");
                self.restart_ceremony()?;
            }
            return Ok(self.joined(&existing));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::SessionFull(self.id.clone()));
        }
        let player = Player::new(id, self.players.len());
        info!(session = %self.id, player = %player.id, role = %player.role, "player joined");
        self.players.push(player.clone());
        Ok(self.joined(&player))
    }

    /// Discards the joint key and everything encrypted under it.
    pub fn restart_ceremony(&mut self) -> GameResult<KeyEpoch> {
        self.scheduler.reset_for_ceremony()?;
        self.ledger.clear();
        self.coordinator.reset();
        Ok(self.ceremony.restart())
    }

    fn require_role(&self, id: &PlayerId, role: Role, step: &str) -> GameResult<()> {
        let player = self.player(id)?;
        if player.role != role {
            return Err(GameError::turn(id, format!("{step} belongs to the {role}")));
        }
        Ok(())
    }

    pub fn submit_key_contribution(&mut self, id: &PlayerId, serialized: &str) -> GameResult<()> {
        self.require_role(id, Role::Seeker, "the lead contribution")?;
        let contribution = PublicKeyContribution::from_json(&self.ctx, serialized)?;
        self.ceremony.submit_lead(contribution)
    }

    pub fn submit_joint_key(&mut self, id: &PlayerId, serialized: &str) -> GameResult<()> {
        self.require_role(id, Role::Hider, "the key extension")?;
        let joint = JointPublicKey::from_json(&self.ctx, serialized)?;
        self.ceremony.submit_joint(&self.ctx, joint)?;
        self.maybe_start()
    }

    fn maybe_start(&mut self) -> GameResult<()> {
        if self.players.len() == MAX_PLAYERS
            && self.ceremony.is_complete()
            && self.scheduler.state() == &TurnState::AwaitingPlayers
        {
            let order = self.order();
            self.scheduler.start(&order)?;
        }
        Ok(())
    }

    pub fn submit_move(&mut self, id: &PlayerId, serialized: &str) -> GameResult<MoveAccepted> {
        let seat = self.player(id)?.seat;
        self.scheduler.check_turn(id)?;
        let ct = EncryptedVector::from_json(&self.ctx, serialized)?;
        if ct.epoch() != self.ceremony.epoch() {
            warn!(session = %self.id, player = %id, found = %ct.epoch(), "move under stale key");
            return Err(GameError::EpochMismatch {
                expected: self.ceremony.epoch(),
                found: ct.epoch(),
            });
        }

        let moves_this_stage = self.ledger.accumulate(seat, ct)?;
        let order = self.order();
        if let MoveTransition::Checkpoint { stage } = self.scheduler.advance(&order)? {
            let targets = self.ledger.checkpoint_targets(self.players.len())?;
            self.coordinator.open(stage, targets);
        }
        debug!(session = %self.id, player = %id, moves_this_stage, "move accepted");
        Ok(MoveAccepted {
            stage: self.scheduler.current_stage(),
            moves_this_stage,
            turn: self.scheduler.state().clone(),
        })
    }

    pub fn submit_decryption_share(
        &mut self,
        id: &PlayerId,
        serialized: &str,
    ) -> GameResult<ShareResponse> {
        if !self.scheduler.is_decryption_stage() {
            return Err(GameError::stage("no decryption is pending"));
        }
        let player = self.player(id)?.clone();
        let share = PartialDecryption::from_json(&self.ctx, serialized)?;
        let role = share.role();
        match self
            .coordinator
            .submit(&self.ctx, self.ceremony.epoch(), &player, share)?
        {
            ShareOutcome::AwaitingMain => Ok(ShareResponse::ShareAccepted { role }),
            ShareOutcome::Revealed { stage, plaintexts } => {
                let reveal = self.build_reveal(stage, plaintexts)?;
                self.ledger.clear();
                let order = self.order();
                self.scheduler.finish_decryption(&order)?;
                self.last_reveal = Some(reveal.clone());
                Ok(ShareResponse::Revealed(reveal))
            }
        }
    }

    fn build_reveal(&self, stage: u64, mut plaintexts: Vec<Vec<i64>>) -> GameResult<StageReveal> {
        if plaintexts.len() != self.players.len() + 1 {
            return Err(GameError::Crypto(format!(
                "expected {} decrypted targets, got {}",
                self.players.len() + 1,
                plaintexts.len()
            )));
        }
        let combined = plaintexts.pop().unwrap_or_default();
        let positions = self
            .players
            .iter()
            .zip(plaintexts)
            .map(|(p, position)| RevealedPosition {
                player: p.id.clone(),
                role: p.role,
                position,
            })
            .collect();
        Ok(StageReveal {
            stage,
            positions,
            combined,
        })
    }

    pub fn state(&self) -> GameStateView {
        GameStateView {
            session: self.id.clone(),
            stage: self.scheduler.current_stage(),
            max_stages: self.scheduler.max_stages(),
            turn: self.scheduler.state().clone(),
            is_decryption_stage: self.scheduler.is_decryption_stage(),
            epoch: self.ceremony.epoch(),
            ceremony: self.ceremony.status(),
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id.clone(),
                    role: p.role,
                    seat: p.seat,
                    moves_this_stage: self.ledger.moves(p.seat),
                })
                .collect(),
            last_reveal: self.last_reveal.clone(),
            outcome: match self.scheduler.state() {
                TurnState::GameOver(outcome) => Some(*outcome),
                _ => None,
            },
        }
    }

    pub fn ceremony_view(&self) -> GameResult<CeremonyView> {
        Ok(CeremonyView {
            epoch: self.ceremony.epoch(),
            status: self.ceremony.status(),
            lead_contribution: self
                .ceremony
                .lead_contribution()
                .map(|c| c.to_json())
                .transpose()?,
        })
    }

    pub fn checkpoint(&self) -> GameResult<CheckpointView> {
        let Some(stage) = self.coordinator.stage() else {
            return Err(GameError::stage("no decryption checkpoint is open"));
        };
        Ok(CheckpointView {
            stage,
            targets: self
                .coordinator
                .targets()
                .iter()
                .map(|t| t.to_json())
                .collect::<Result<Vec<_>, _>>()?,
            lead_share: self.coordinator.lead().map(|l| l.to_json()).transpose()?,
        })
    }

    pub fn context_json(&self) -> GameResult<String> {
        Ok(self.ctx.to_json()?)
    }

    pub fn joint_key_json(&self) -> GameResult<Option<String>> {
        Ok(self.joint_key().map(|k| k.to_json()).transpose()?)
    }

    /// Everything needed to rebuild the session except the context and the
    /// joint key, which are stored as their own artifacts.
    pub fn snapshot(&self) -> GameResult<SessionSnapshot> {
        Ok(SessionSnapshot {
            id: self.id.clone(),
            players: self.players.clone(),
            scheduler: self.scheduler.clone(),
            epoch: self.ceremony.epoch(),
            lead_contribution: self
                .ceremony
                .lead_contribution()
                .map(|c| c.to_json())
                .transpose()?,
            positions: self
                .ledger
                .entries()
                .map(|(seat, ct, moves)| -> GameResult<_> { Ok((seat, ct.to_json()?, moves)) })
                .collect::<GameResult<Vec<_>>>()?,
            checkpoint: self.coordinator.stage(),
            lead_share: self.coordinator.lead().map(|l| l.to_json()).transpose()?,
            last_reveal: self.last_reveal.clone(),
        })
    }

    pub fn restore(
        ctx: CryptoContext,
        joint: Option<JointPublicKey>,
        snapshot: SessionSnapshot,
    ) -> GameResult<Self> {
        let lead = snapshot
            .lead_contribution
            .as_deref()
            .map(|s| PublicKeyContribution::from_json(&ctx, s))
            .transpose()?;
        let ceremony = KeyCeremony::from_parts(snapshot.epoch, lead, joint);

        let mut ledger = MoveLedger::new();
        for (seat, ct, moves) in snapshot.positions {
            ledger.restore_entry(seat, EncryptedVector::from_json(&ctx, &ct)?, moves);
        }

        let mut coordinator = DecryptionCoordinator::new();
        if let Some(stage) = snapshot.checkpoint {
            coordinator.open(stage, ledger.checkpoint_targets(snapshot.players.len())?);
            if let Some(lead) = snapshot.lead_share.as_deref() {
                let lead = PartialDecryption::from_json(&ctx, lead)?;
                if lead.role() != DecryptionRole::Lead {
                    return Err(GameError::Deserialization(
                        "stored lead share has the main role".to_string(),
                    ));
                }
                coordinator.restore_lead(lead);
            }
        }

        info!(session = %snapshot.id, epoch = %snapshot.epoch, "session restored");
        Ok(Self {
            id: snapshot.id,
            ctx,
            players: snapshot.players,
            scheduler: snapshot.scheduler,
            ceremony,
            ledger,
            coordinator,
            last_reveal: snapshot.last_reveal,
        })
    }
}

/// Persisted form of a session. Holds ciphertext envelopes and public key
/// material only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub players: Vec<Player>,
    pub scheduler: Scheduler,
    pub epoch: KeyEpoch,
    pub lead_contribution: Option<String>,
    pub positions: Vec<(usize, String, u32)>,
    pub checkpoint: Option<u64>,
    pub lead_share: Option<String>,
    pub last_reveal: Option<StageReveal>,
}
