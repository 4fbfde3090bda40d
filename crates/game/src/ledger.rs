// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{GameError, GameResult};
use std::collections::BTreeMap;
use tracing::debug;
use umbra_fhe::EncryptedVector;

/// Per-seat encrypted positions for the current stage.
///
/// The first move of a stage becomes the seat's accumulator and later moves
/// are added to it homomorphically. Nothing here ever sees a plaintext.
#[derive(Debug, Clone, Default)]
pub struct MoveLedger {
    positions: BTreeMap<usize, EncryptedVector>,
    moves: BTreeMap<usize, u32>,
}

impl MoveLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `ct` to the seat's accumulator and returns the number of moves
    /// the seat made this stage. On error the ledger is left untouched.
    pub fn accumulate(&mut self, seat: usize, ct: EncryptedVector) -> GameResult<u32> {
        let next = match self.positions.get(&seat) {
            Some(current) => current.add(&ct)?,
            None => ct,
        };
        self.positions.insert(seat, next);
        let count = self.moves.entry(seat).or_default();
        *count += 1;
        debug!(seat, moves = *count, "accumulated encrypted move");
        Ok(*count)
    }

    pub fn position(&self, seat: usize) -> Option<&EncryptedVector> {
        self.positions.get(&seat)
    }

    pub fn moves(&self, seat: usize) -> u32 {
        self.moves.get(&seat).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Checkpoint targets: every seat's position in seat order followed by
    /// the homomorphic sum of all of them.
    pub fn checkpoint_targets(&self, seats: usize) -> GameResult<Vec<EncryptedVector>> {
        let mut targets = (0..seats)
            .map(|seat| {
                self.positions.get(&seat).cloned().ok_or_else(|| {
                    GameError::stage(format!("seat {seat} has no move this stage"))
                })
            })
            .collect::<GameResult<Vec<_>>>()?;
        let Some(combined) = EncryptedVector::sum(targets.iter())? else {
            return Err(GameError::stage("no positions to reveal"));
        };
        targets.push(combined);
        Ok(targets)
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.moves.clear();
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (usize, &EncryptedVector, u32)> {
        self.positions
            .iter()
            .map(|(seat, ct)| (*seat, ct, self.moves(*seat)))
    }

    pub(crate) fn restore_entry(&mut self, seat: usize, ct: EncryptedVector, moves: u32) {
        self.positions.insert(seat, ct);
        self.moves.insert(seat, moves);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use umbra_fhe::{combine, create_context, GamePreset, KeyEpoch, LocalParty, SchemeParameters};

    #[test]
    fn accumulates_and_reveals_sum() -> GameResult<()> {
        let ctx = create_context(&SchemeParameters::from_preset(GamePreset::InsecureGame512))?;
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let mut p1 = LocalParty::new(ctx.clone());
        let mut p2 = LocalParty::new(ctx.clone());
        let lead = p1.start_ceremony(KeyEpoch::INITIAL, &mut rng)?;
        p1.install_joint_key(p2.extend(&lead, &mut rng)?)?;

        let mut ledger = MoveLedger::new();
        assert!(matches!(
            ledger.checkpoint_targets(2),
            Err(GameError::StageViolation(_))
        ));
        ledger.accumulate(0, p1.encrypt_move(&[0, 1], &mut rng)?)?;
        assert_eq!(ledger.accumulate(0, p1.encrypt_move(&[0, 1], &mut rng)?)?, 2);
        ledger.accumulate(1, p2.encrypt_move(&[-1, 0], &mut rng)?)?;

        let targets = ledger.checkpoint_targets(2)?;
        assert_eq!(targets.len(), 3);
        let l = p1.lead_decrypt(&targets, 2, &mut rng)?;
        let m = p2.main_decrypt(&targets, &l, &mut rng)?;
        assert_eq!(
            combine(&ctx, &targets, Some(&l), Some(&m))?,
            vec![vec![0, 2], vec![-1, 0], vec![-1, 2]]
        );

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.moves(0), 0);
        Ok(())
    }
}
