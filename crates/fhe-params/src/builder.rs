// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::presets::BfvParamSet;
use crate::scheme::ParameterError;
use fhe::bfv::{BfvParameters, BfvParametersBuilder};
use std::sync::Arc;

pub fn build_bfv_params_from_set_arc(
    param_set: BfvParamSet,
) -> Result<Arc<BfvParameters>, ParameterError> {
    build_bfv_params_arc(
        param_set.degree,
        param_set.plaintext_modulus,
        param_set.moduli,
    )
}

pub fn build_bfv_params_arc(
    degree: usize,
    plaintext_modulus: u64,
    moduli: &[u64],
) -> Result<Arc<BfvParameters>, ParameterError> {
    BfvParametersBuilder::new()
        .set_degree(degree)
        .set_plaintext_modulus(plaintext_modulus)
        .set_moduli(moduli)
        .build_arc()
        .map_err(|e| ParameterError::Builder(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{defaults, insecure_512, secure_4096, PLAINTEXT_MODULUS};
    use crate::presets::GamePreset;

    #[test]
    fn test_build_insecure_params_arc() {
        let params =
            build_bfv_params_arc(insecure_512::DEGREE, PLAINTEXT_MODULUS, insecure_512::MODULI)
                .unwrap();
        assert_eq!(params.degree(), insecure_512::DEGREE);
        assert_eq!(params.plaintext(), PLAINTEXT_MODULUS);
        assert_eq!(params.moduli(), insecure_512::MODULI);
        assert_eq!(params.variance(), defaults::VARIANCE);
    }

    #[test]
    fn test_build_secure_params_from_set_arc() {
        let params = build_bfv_params_from_set_arc(GamePreset::SecureGame4096.into()).unwrap();
        assert_eq!(params.degree(), secure_4096::DEGREE);
        assert_eq!(params.plaintext(), PLAINTEXT_MODULUS);
        assert_eq!(params.moduli(), secure_4096::MODULI);
    }

    #[test]
    fn test_builder_rejects_bad_degree() {
        let err = build_bfv_params_arc(500, PLAINTEXT_MODULUS, insecure_512::MODULI).unwrap_err();
        assert!(matches!(err, ParameterError::Builder(_)));
    }
}
