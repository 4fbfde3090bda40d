// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::create_seed_from_u64;
use rand_chacha::ChaCha20Rng;
use umbra_fhe::{
    create_context, CryptoContext, FheResult, GamePreset, KeyEpoch, LocalParty, SchemeParameters,
};

/// Small insecure context, fast enough for unit tests.
pub fn test_context(seed: u64) -> FheResult<CryptoContext> {
    create_context(
        &SchemeParameters::from_preset(GamePreset::InsecureGame512)
            .with_seed(create_seed_from_u64(seed)),
    )
}

/// Two client-side parties sharing one context.
pub struct PartyPair {
    pub lead: LocalParty,
    pub main: LocalParty,
}

impl PartyPair {
    pub fn new(ctx: &CryptoContext) -> Self {
        Self {
            lead: LocalParty::new(ctx.clone()),
            main: LocalParty::new(ctx.clone()),
        }
    }

    /// Runs both ceremony steps locally so both parties hold the joint key.
    pub fn with_joint_key(
        ctx: &CryptoContext,
        epoch: KeyEpoch,
        rng: &mut ChaCha20Rng,
    ) -> FheResult<Self> {
        let mut pair = Self::new(ctx);
        let contribution = pair.lead.start_ceremony(epoch, rng)?;
        let joint = pair.main.extend(&contribution, rng)?;
        pair.lead.install_joint_key(joint)?;
        Ok(pair)
    }
}
