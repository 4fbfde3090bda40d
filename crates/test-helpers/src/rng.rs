// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

pub fn create_rng_from_u64(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// 32 byte seed derived from a small integer, for common random polynomials.
pub fn create_seed_from_u64(seed: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    create_rng_from_u64(seed).fill_bytes(&mut out);
    out
}
