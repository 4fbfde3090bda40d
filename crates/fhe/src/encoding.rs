// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::CryptoContext;
use crate::error::{FheError, FheResult};
use fhe::bfv::{Encoding, Plaintext};
use fhe_traits::{FheDecoder, FheEncoder};

/// Packs a signed move vector into the first slots of a plaintext.
/// Negative coordinates wrap modulo t.
pub fn encode_vector(ctx: &CryptoContext, values: &[i64]) -> FheResult<Plaintext> {
    if values.len() != ctx.dimensions() {
        return Err(FheError::InvalidVector {
            expected: ctx.dimensions(),
            found: values.len(),
        });
    }
    let t = ctx.plaintext_modulus() as i64;
    let slots: Vec<u64> = values.iter().map(|v| v.rem_euclid(t) as u64).collect();
    Plaintext::try_encode(&slots as &[u64], Encoding::simd(), ctx.params())
        .map_err(|e| FheError::Encryption(e.to_string()))
}

/// Reads the first `dimensions` slots back as centered values in (-t/2, t/2].
pub fn decode_vector(ctx: &CryptoContext, plaintext: &Plaintext) -> FheResult<Vec<i64>> {
    let slots = Vec::<u64>::try_decode(plaintext, Encoding::simd())
        .map_err(|e| FheError::Decryption(e.to_string()))?;
    Ok(slots
        .into_iter()
        .take(ctx.dimensions())
        .map(|v| center(v, ctx.plaintext_modulus()))
        .collect())
}

pub fn center(value: u64, modulus: u64) -> i64 {
    if value > modulus / 2 {
        value as i64 - modulus as i64
    } else {
        value as i64
    }
}
