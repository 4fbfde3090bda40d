// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Common Random Polynomial (CRP) construction from BFV parameters.
//!
//! Both parties of the key ceremony must derive their public key shares from
//! the same CRP, so it is generated deterministically from the session seed.

use crate::scheme::ParameterError;
use fhe::bfv::BfvParameters;
use fhe::mbfv::CommonRandomPoly;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

/// Creates a Common Random Polynomial for the given BFV parameters and seed.
pub fn create_deterministic_crp_from_seed(
    params: &Arc<BfvParameters>,
    seed: [u8; 32],
) -> Result<CommonRandomPoly, ParameterError> {
    let mut rng = ChaCha20Rng::from_seed(seed);
    CommonRandomPoly::new(params, &mut rng).map_err(|e| ParameterError::Builder(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_bfv_params_arc;
    use crate::constants::{insecure_512, PLAINTEXT_MODULUS};
    use fhe_traits::Serialize;

    fn params() -> Arc<BfvParameters> {
        build_bfv_params_arc(insecure_512::DEGREE, PLAINTEXT_MODULUS, insecure_512::MODULI)
            .unwrap()
    }

    #[test]
    fn crp_bytes_roundtrip_via_deserialize() {
        let params = params();
        let crp = create_deterministic_crp_from_seed(&params, [7u8; 32]).unwrap();
        let bytes = crp.to_bytes();

        let restored = CommonRandomPoly::deserialize(&bytes, &params)
            .expect("CRP deserialization should succeed");
        assert_eq!(bytes, restored.to_bytes(), "CRP roundtrip should match");
    }

    #[test]
    fn deterministic_crp_same_seed_same_output() {
        let params = params();
        let crp1 = create_deterministic_crp_from_seed(&params, [42u8; 32]).unwrap();
        let crp2 = create_deterministic_crp_from_seed(&params, [42u8; 32]).unwrap();
        assert_eq!(crp1.to_bytes(), crp2.to_bytes());
    }

    #[test]
    fn deterministic_crp_different_seed_different_output() {
        let params = params();
        let crp1 = create_deterministic_crp_from_seed(&params, [1u8; 32]).unwrap();
        let crp2 = create_deterministic_crp_from_seed(&params, [2u8; 32]).unwrap();
        assert_ne!(crp1.to_bytes(), crp2.to_bytes());
    }
}
