// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Session-side bookkeeping of the two-step key ceremony.
//!
//! The server never holds a secret share. It stores the lead contribution,
//! checks that the joint key published by the second party embeds exactly that
//! contribution and re-aggregates it before anyone may encrypt under it.

use crate::error::{GameError, GameResult};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{error, info};
use umbra_fhe::{CryptoContext, JointPublicKey, KeyEpoch, PublicKeyContribution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyState {
    AwaitingLead,
    AwaitingExtension(PublicKeyContribution),
    Complete(JointPublicKey),
}

/// Public summary of the ceremony for state views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum CeremonyStatus {
    AwaitingLead,
    AwaitingExtension,
    Complete,
}

#[derive(Debug, Clone)]
pub struct KeyCeremony {
    epoch: KeyEpoch,
    state: CeremonyState,
}

impl Default for KeyCeremony {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyCeremony {
    pub fn new() -> Self {
        Self {
            epoch: KeyEpoch::INITIAL,
            state: CeremonyState::AwaitingLead,
        }
    }

    /// Rebuilds a ceremony from persisted pieces.
    pub(crate) fn from_parts(
        epoch: KeyEpoch,
        lead: Option<PublicKeyContribution>,
        joint: Option<JointPublicKey>,
    ) -> Self {
        let state = match (joint, lead) {
            (Some(joint), _) if joint.epoch() == epoch => CeremonyState::Complete(joint),
            (_, Some(lead)) if lead.epoch() == epoch => CeremonyState::AwaitingExtension(lead),
            _ => CeremonyState::AwaitingLead,
        };
        Self { epoch, state }
    }

    pub fn epoch(&self) -> KeyEpoch {
        self.epoch
    }

    pub fn state(&self) -> &CeremonyState {
        &self.state
    }

    pub fn status(&self) -> CeremonyStatus {
        match self.state {
            CeremonyState::AwaitingLead => CeremonyStatus::AwaitingLead,
            CeremonyState::AwaitingExtension(_) => CeremonyStatus::AwaitingExtension,
            CeremonyState::Complete(_) => CeremonyStatus::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, CeremonyState::Complete(_))
    }

    pub fn joint_key(&self) -> Option<&JointPublicKey> {
        match &self.state {
            CeremonyState::Complete(joint) => Some(joint),
            _ => None,
        }
    }

    pub fn lead_contribution(&self) -> Option<&PublicKeyContribution> {
        match &self.state {
            CeremonyState::AwaitingExtension(lead) => Some(lead),
            _ => None,
        }
    }

    fn check_epoch(&self, found: KeyEpoch) -> GameResult<()> {
        if found != self.epoch {
            return Err(GameError::EpochMismatch {
                expected: self.epoch,
                found,
            });
        }
        Ok(())
    }

    /// Step 1: store the lead party's contribution.
    pub fn submit_lead(&mut self, contribution: PublicKeyContribution) -> GameResult<()> {
        let CeremonyState::AwaitingLead = self.state else {
            return Err(GameError::stage(format!(
                "lead contribution not expected while {}",
                self.status()
            )));
        };
        self.check_epoch(contribution.epoch())?;
        info!(epoch = %self.epoch, "lead contribution stored");
        self.state = CeremonyState::AwaitingExtension(contribution);
        Ok(())
    }

    /// Step 2: accept the joint key if it was extended from the stored lead
    /// contribution and re-aggregates correctly. Otherwise the attempt is
    /// discarded and the ceremony restarts under a new epoch.
    pub fn submit_joint(&mut self, ctx: &CryptoContext, joint: JointPublicKey) -> GameResult<()> {
        let CeremonyState::AwaitingExtension(lead) = &self.state else {
            return Err(GameError::stage(format!(
                "joint key not expected while {}",
                self.status()
            )));
        };
        self.check_epoch(joint.epoch())?;

        let verdict = if &joint.lead_contribution() != lead {
            Err(GameError::KeyGeneration(
                "joint key was not extended from the stored lead contribution".to_string(),
            ))
        } else {
            joint.verify(ctx).map_err(GameError::from)
        };

        if let Err(err) = verdict {
            error!(epoch = %self.epoch, error = %err, "key ceremony aborted");
            self.restart();
            return Err(err);
        }

        info!(epoch = %self.epoch, "joint public key established");
        self.state = CeremonyState::Complete(joint);
        Ok(())
    }

    /// Drops whatever was collected and starts over under the next epoch.
    pub fn restart(&mut self) -> KeyEpoch {
        self.epoch = self.epoch.next();
        self.state = CeremonyState::AwaitingLead;
        info!(epoch = %self.epoch, "key ceremony restarted");
        self.epoch
    }
}
