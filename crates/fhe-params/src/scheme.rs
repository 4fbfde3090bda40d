// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::constants::{defaults, DEFAULT_DIMENSIONS};
use crate::presets::{BfvParamSet, GamePreset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumIter, IntoEnumIterator};
use thiserror::Error as ThisError;

/// Capabilities a session context must have enabled.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
pub enum Feature {
    Encryption,
    KeySwitching,
    LeveledShe,
    AdvancedShe,
    Multiparty,
}

/// How partial decryptions hide the secret share of each party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum MultipartyMode {
    /// Each partial decryption adds fresh smudging noise.
    #[default]
    NoiseFlooding,
    /// Partial decryptions without smudging. Not supported.
    FixedNoise,
}

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("Plaintext modulus {0} is not prime")]
    NonPrimeModulus(u64),
    #[error("Plaintext modulus {modulus} does not support packed encoding at degree {degree}")]
    NotNttFriendly { modulus: u64, degree: usize },
    #[error("Multiparty mode {0} is not supported")]
    UnsupportedMultipartyMode(MultipartyMode),
    #[error("Required feature {0} is not enabled")]
    MissingFeature(Feature),
    #[error("Invalid number of dimensions {dimensions} for degree {degree}")]
    InvalidDimensions { dimensions: usize, degree: usize },
    #[error("BFV parameters rejected: {0}")]
    Builder(String),
}

/// Fixed cryptographic parameters for one game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeParameters {
    pub preset: GamePreset,
    pub plaintext_modulus: u64,
    pub multiparty_mode: MultipartyMode,
    pub features: BTreeSet<Feature>,
    /// Number of coordinates carried by a move vector
    pub dimensions: usize,
    /// Seed for the common random polynomial shared by both key contributions
    pub crp_seed: [u8; 32],
}

impl SchemeParameters {
    pub fn new(
        preset: GamePreset,
        plaintext_modulus: u64,
        multiparty_mode: MultipartyMode,
    ) -> Self {
        Self {
            preset,
            plaintext_modulus,
            multiparty_mode,
            features: Feature::iter().collect(),
            dimensions: DEFAULT_DIMENSIONS,
            crp_seed: defaults::CRP_SEED,
        }
    }

    pub fn from_preset(preset: GamePreset) -> Self {
        let set = BfvParamSet::from(preset);
        Self::new(preset, set.plaintext_modulus, MultipartyMode::NoiseFlooding)
    }

    pub fn with_seed(mut self, crp_seed: [u8; 32]) -> Self {
        self.crp_seed = crp_seed;
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features = features.into_iter().collect();
        self
    }

    pub fn param_set(&self) -> BfvParamSet {
        BfvParamSet::from(self.preset).with_plaintext_modulus(self.plaintext_modulus)
    }

    /// Checks every constraint the context needs before any BFV object is built.
    pub fn validate(&self) -> Result<BfvParamSet, ParameterError> {
        let set = self.param_set();

        if !fhe_util::is_prime(self.plaintext_modulus) {
            return Err(ParameterError::NonPrimeModulus(self.plaintext_modulus));
        }

        // Packed encoding needs a 2n-th root of unity modulo t.
        if (self.plaintext_modulus - 1) % (2 * set.degree as u64) != 0 {
            return Err(ParameterError::NotNttFriendly {
                modulus: self.plaintext_modulus,
                degree: set.degree,
            });
        }

        if self.multiparty_mode != MultipartyMode::NoiseFlooding {
            return Err(ParameterError::UnsupportedMultipartyMode(
                self.multiparty_mode,
            ));
        }

        if let Some(missing) = Feature::iter().find(|f| !self.features.contains(f)) {
            return Err(ParameterError::MissingFeature(missing));
        }

        if self.dimensions == 0 || self.dimensions > set.degree {
            return Err(ParameterError::InvalidDimensions {
                dimensions: self.dimensions,
                degree: set.degree,
            });
        }

        Ok(set)
    }
}

impl Default for SchemeParameters {
    fn default() -> Self {
        Self::from_preset(GamePreset::default())
    }
}
