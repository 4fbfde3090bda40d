// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{GameError, GameResult, IncompleteReason};
use crate::player::Player;
use tracing::{info, warn};
use umbra_fhe::{
    combine, CryptoContext, DecryptionRole, EncryptedVector, KeyEpoch, PartialDecryption,
};

#[derive(Debug, Clone)]
struct OpenCheckpoint {
    stage: u64,
    targets: Vec<EncryptedVector>,
    lead: Option<PartialDecryption>,
}

/// Result of a share that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The lead share is stored; the main party can now decrypt.
    AwaitingMain,
    /// Both shares are in. One decoded vector per target.
    Revealed { stage: u64, plaintexts: Vec<Vec<i64>> },
}

/// Collects the lead and main shares for one checkpoint.
#[derive(Debug, Clone, Default)]
pub struct DecryptionCoordinator {
    open: Option<OpenCheckpoint>,
}

impl DecryptionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, stage: u64, targets: Vec<EncryptedVector>) {
        info!(stage, targets = targets.len(), "decryption checkpoint opened");
        self.open = Some(OpenCheckpoint {
            stage,
            targets,
            lead: None,
        });
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn stage(&self) -> Option<u64> {
        self.open.as_ref().map(|o| o.stage)
    }

    pub fn targets(&self) -> &[EncryptedVector] {
        self.open.as_ref().map(|o| o.targets.as_slice()).unwrap_or(&[])
    }

    pub fn lead(&self) -> Option<&PartialDecryption> {
        self.open.as_ref().and_then(|o| o.lead.as_ref())
    }

    pub(crate) fn restore_lead(&mut self, lead: PartialDecryption) {
        if let Some(open) = self.open.as_mut() {
            open.lead = Some(lead);
        }
    }

    pub fn reset(&mut self) {
        self.open = None;
    }

    /// Validates and records a share from `player`.
    pub fn submit(
        &mut self,
        ctx: &CryptoContext,
        epoch: KeyEpoch,
        player: &Player,
        share: PartialDecryption,
    ) -> GameResult<ShareOutcome> {
        let Some(open) = self.open.as_mut() else {
            return Err(GameError::stage("no decryption checkpoint is open"));
        };
        if share.epoch() != epoch {
            return Err(GameError::EpochMismatch {
                expected: epoch,
                found: share.epoch(),
            });
        }
        if share.stage() != open.stage {
            warn!(expected = open.stage, found = share.stage(), "stale share");
            return Err(GameError::IncompleteDecryption(
                IncompleteReason::StaleShare {
                    expected: open.stage,
                    found: share.stage(),
                },
            ));
        }
        let expected_role = player.role.decryption_role();
        if share.role() != expected_role {
            return Err(GameError::turn(
                &player.id,
                format!("{} must submit the {expected_role} share", player.role),
            ));
        }

        match share.role() {
            DecryptionRole::Lead => {
                if open.lead.is_some() {
                    return Err(GameError::stage("lead share already submitted"));
                }
                if share.share_count() != open.targets.len() {
                    return Err(GameError::Deserialization(format!(
                        "lead share covers {} targets, checkpoint has {}",
                        share.share_count(),
                        open.targets.len()
                    )));
                }
                share.validate_against(ctx, &open.targets)?;
                info!(stage = open.stage, player = %player.id, "lead share accepted");
                open.lead = Some(share);
                Ok(ShareOutcome::AwaitingMain)
            }
            DecryptionRole::Main => {
                let Some(lead) = open.lead.as_ref() else {
                    return Err(GameError::IncompleteDecryption(
                        IncompleteReason::MissingLead,
                    ));
                };
                if share.lead_digest() != Some(lead.digest()) {
                    return Err(GameError::IncompleteDecryption(
                        IncompleteReason::LeadMismatch,
                    ));
                }
                let plaintexts = combine(ctx, &open.targets, Some(lead), Some(&share))?;
                let stage = open.stage;
                info!(stage, player = %player.id, "checkpoint decrypted");
                self.open = None;
                Ok(ShareOutcome::Revealed { stage, plaintexts })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use umbra_fhe::{create_context, GamePreset, LocalParty, SchemeParameters};

    struct Fixture {
        ctx: CryptoContext,
        rng: ChaCha20Rng,
        p1: LocalParty,
        p2: LocalParty,
        seeker: Player,
        hider: Player,
        targets: Vec<EncryptedVector>,
    }

    fn fixture() -> Fixture {
        let ctx =
            create_context(&SchemeParameters::from_preset(GamePreset::InsecureGame512)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        let mut p1 = LocalParty::new(ctx.clone());
        let mut p2 = LocalParty::new(ctx.clone());
        let lead = p1.start_ceremony(KeyEpoch::INITIAL, &mut rng).unwrap();
        p1.install_joint_key(p2.extend(&lead, &mut rng).unwrap())
            .unwrap();
        let a = p1.encrypt_move(&[0, 1], &mut rng).unwrap();
        let b = p2.encrypt_move(&[1, 0], &mut rng).unwrap();
        let sum = a.add(&b).unwrap();
        Fixture {
            ctx,
            rng,
            p1,
            p2,
            seeker: Player::new(PlayerId::from("p1"), 0),
            hider: Player::new(PlayerId::from("p2"), 1),
            targets: vec![a, b, sum],
        }
    }

    #[test]
    fn lead_then_main_reveals() -> GameResult<()> {
        let mut f = fixture();
        let mut coord = DecryptionCoordinator::new();
        coord.open(2, f.targets.clone());

        let lead = f.p1.lead_decrypt(&f.targets, 2, &mut f.rng)?;
        let main = f.p2.main_decrypt(&f.targets, &lead, &mut f.rng)?;

        assert_eq!(
            coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.seeker, lead.clone())?,
            ShareOutcome::AwaitingMain
        );
        assert!(matches!(
            coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.seeker, lead),
            Err(GameError::StageViolation(_))
        ));
        let ShareOutcome::Revealed { stage, plaintexts } =
            coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.hider, main)?
        else {
            panic!("expected reveal");
        };
        assert_eq!(stage, 2);
        assert_eq!(plaintexts, vec![vec![0, 1], vec![1, 0], vec![1, 1]]);
        assert!(!coord.is_open());
        Ok(())
    }

    #[test]
    fn main_before_lead_is_missing_lead() -> GameResult<()> {
        let mut f = fixture();
        let mut coord = DecryptionCoordinator::new();
        coord.open(2, f.targets.clone());

        let lead = f.p1.lead_decrypt(&f.targets, 2, &mut f.rng)?;
        let main = f.p2.main_decrypt(&f.targets, &lead, &mut f.rng)?;
        assert!(matches!(
            coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.hider, main),
            Err(GameError::IncompleteDecryption(IncompleteReason::MissingLead))
        ));
        assert!(coord.lead().is_none());
        Ok(())
    }

    #[test]
    fn wrong_stage_role_and_lead_are_rejected() -> GameResult<()> {
        let mut f = fixture();
        let mut coord = DecryptionCoordinator::new();
        coord.open(2, f.targets.clone());

        let stale = f.p1.lead_decrypt(&f.targets, 1, &mut f.rng)?;
        assert!(matches!(
            coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.seeker, stale),
            Err(GameError::IncompleteDecryption(
                IncompleteReason::StaleShare {
                    expected: 2,
                    found: 1
                }
            ))
        ));

        let lead = f.p1.lead_decrypt(&f.targets, 2, &mut f.rng)?;
        assert!(matches!(
            coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.hider, lead.clone()),
            Err(GameError::TurnViolation { .. })
        ));
        assert!(matches!(
            coord.submit(&f.ctx, KeyEpoch::new(2), &f.seeker, lead.clone()),
            Err(GameError::EpochMismatch { .. })
        ));

        coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.seeker, lead)?;
        let other_lead = f.p1.lead_decrypt(&f.targets, 2, &mut f.rng)?;
        let main = f.p2.main_decrypt(&f.targets, &other_lead, &mut f.rng)?;
        assert!(matches!(
            coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.hider, main),
            Err(GameError::IncompleteDecryption(IncompleteReason::LeadMismatch))
        ));
        assert!(coord.is_open());
        Ok(())
    }

    #[test]
    fn closed_coordinator_rejects_shares() -> GameResult<()> {
        let mut f = fixture();
        let mut coord = DecryptionCoordinator::new();
        let lead = f.p1.lead_decrypt(&f.targets, 2, &mut f.rng)?;
        assert!(matches!(
            coord.submit(&f.ctx, KeyEpoch::INITIAL, &f.seeker, lead),
            Err(GameError::StageViolation(_))
        ));
        Ok(())
    }
}
