// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Player-side state: the secret share a client keeps for itself plus the
//! artifacts it needs to encrypt moves and take part in decryption.

use crate::artifact::KeyEpoch;
use crate::ciphertext::EncryptedVector;
use crate::context::CryptoContext;
use crate::decryption::{lead_partial_decrypt, main_partial_decrypt, PartialDecryption};
use crate::error::{FheError, FheResult};
use crate::keys::{
    extend_joint_key, generate_party1_keys, JointPublicKey, PublicKeyContribution, SecretShare,
};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter};

/// Unit moves on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Move vector for this direction. Axes past the second stay zero.
    pub fn vector(&self, dimensions: usize) -> FheResult<Vec<i64>> {
        if dimensions < 2 {
            return Err(FheError::InvalidVector {
                expected: 2,
                found: dimensions,
            });
        }
        let mut v = vec![0i64; dimensions];
        match self {
            Direction::Up => v[1] = 1,
            Direction::Down => v[1] = -1,
            Direction::Left => v[0] = -1,
            Direction::Right => v[0] = 1,
        }
        Ok(v)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// A party's local view of the session crypto.
#[derive(Debug)]
pub struct LocalParty {
    ctx: CryptoContext,
    secret: Option<SecretShare>,
    contribution: Option<PublicKeyContribution>,
    joint: Option<JointPublicKey>,
}

impl LocalParty {
    pub fn new(ctx: CryptoContext) -> Self {
        Self {
            ctx,
            secret: None,
            contribution: None,
            joint: None,
        }
    }

    pub fn context(&self) -> &CryptoContext {
        &self.ctx
    }

    pub fn epoch(&self) -> Option<KeyEpoch> {
        self.secret.as_ref().map(|s| s.epoch())
    }

    pub fn joint_key(&self) -> Option<&JointPublicKey> {
        self.joint.as_ref()
    }

    /// Lead step. Replaces any share from an earlier epoch.
    pub fn start_ceremony<R: RngCore + CryptoRng>(
        &mut self,
        epoch: KeyEpoch,
        rng: &mut R,
    ) -> FheResult<PublicKeyContribution> {
        let (contribution, secret) = generate_party1_keys(&self.ctx, epoch, rng)?;
        self.secret = Some(secret);
        self.contribution = Some(contribution.clone());
        self.joint = None;
        Ok(contribution)
    }

    /// Extension step, run by the second party.
    pub fn extend<R: RngCore + CryptoRng>(
        &mut self,
        lead: &PublicKeyContribution,
        rng: &mut R,
    ) -> FheResult<JointPublicKey> {
        let (joint, secret) = extend_joint_key(&self.ctx, lead, rng)?;
        self.secret = Some(secret);
        self.contribution = None;
        self.joint = Some(joint.clone());
        Ok(joint)
    }

    /// Accepts the joint key published by the other party. The lead checks
    /// that its own contribution went into it.
    pub fn install_joint_key(&mut self, joint: JointPublicKey) -> FheResult<()> {
        joint.verify(&self.ctx)?;
        let secret = self.secret()?;
        if joint.epoch() != secret.epoch() {
            return Err(FheError::EpochMismatch {
                expected: secret.epoch(),
                found: joint.epoch(),
            });
        }
        if let Some(own) = &self.contribution {
            if &joint.lead_contribution() != own {
                return Err(FheError::key_generation(
                    "joint key was not extended from our contribution",
                ));
            }
        }
        self.joint = Some(joint);
        Ok(())
    }

    pub fn encrypt_move<R: RngCore + CryptoRng>(
        &self,
        values: &[i64],
        rng: &mut R,
    ) -> FheResult<EncryptedVector> {
        let joint = self
            .joint
            .as_ref()
            .ok_or_else(|| FheError::Encryption("no joint public key installed".to_string()))?;
        EncryptedVector::encrypt(&self.ctx, joint, values, rng)
    }

    pub fn encrypt_direction<R: RngCore + CryptoRng>(
        &self,
        direction: Direction,
        rng: &mut R,
    ) -> FheResult<EncryptedVector> {
        let values = direction.vector(self.ctx.dimensions())?;
        self.encrypt_move(&values, rng)
    }

    pub fn lead_decrypt<R: RngCore + CryptoRng>(
        &self,
        targets: &[EncryptedVector],
        stage: u64,
        rng: &mut R,
    ) -> FheResult<PartialDecryption> {
        lead_partial_decrypt(&self.ctx, self.secret()?, targets, stage, rng)
    }

    pub fn main_decrypt<R: RngCore + CryptoRng>(
        &self,
        targets: &[EncryptedVector],
        lead: &PartialDecryption,
        rng: &mut R,
    ) -> FheResult<PartialDecryption> {
        main_partial_decrypt(&self.ctx, self.secret()?, targets, lead, rng)
    }

    fn secret(&self) -> FheResult<&SecretShare> {
        self.secret
            .as_ref()
            .ok_or_else(|| FheError::key_generation("party holds no secret share"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::create_context;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use umbra_fhe_params::{GamePreset, SchemeParameters};

    #[test]
    fn directions_map_to_unit_vectors() {
        assert_eq!(Direction::Up.vector(2).unwrap(), vec![0, 1]);
        assert_eq!(Direction::Down.vector(2).unwrap(), vec![0, -1]);
        assert_eq!(Direction::Left.vector(3).unwrap(), vec![-1, 0, 0]);
        assert_eq!(Direction::Right.vector(2).unwrap(), vec![1, 0]);
        assert!(Direction::Up.vector(1).is_err());
    }

    #[test]
    fn directions_parse() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("r".parse::<Direction>().unwrap(), Direction::Right);
        assert!("north".parse::<Direction>().is_err());
        assert_eq!(Direction::Left.to_string(), "left");
    }

    #[test]
    fn lead_rejects_joint_key_from_other_contribution() {
        let ctx =
            create_context(&SchemeParameters::from_preset(GamePreset::InsecureGame512)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let mut lead = LocalParty::new(ctx.clone());
        let mut stranger = LocalParty::new(ctx.clone());
        let mut second = LocalParty::new(ctx.clone());

        lead.start_ceremony(KeyEpoch::INITIAL, &mut rng).unwrap();
        let foreign = stranger.start_ceremony(KeyEpoch::INITIAL, &mut rng).unwrap();
        let joint = second.extend(&foreign, &mut rng).unwrap();

        assert!(matches!(
            lead.install_joint_key(joint),
            Err(FheError::KeyGeneration(_))
        ));
        assert!(lead.encrypt_move(&[0, 1], &mut rng).is_err());
    }

    #[test]
    fn party_without_share_cannot_decrypt() {
        let ctx =
            create_context(&SchemeParameters::from_preset(GamePreset::InsecureGame512)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let party = LocalParty::new(ctx);
        assert!(party.epoch().is_none());
        assert!(party.lead_decrypt(&[], 1, &mut rng).is_err());
    }
}
