// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::builder::build_bfv_params_from_set_arc;
use crate::constants::{insecure_512, secure_4096, PLAINTEXT_MODULUS};
use crate::scheme::ParameterError;
use fhe::bfv::BfvParameters;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error as ThisError;

/// Ring presets for a game session.
///
/// Both presets share the plaintext modulus 65537. They only differ in the ring
/// degree and the ciphertext moduli chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePreset {
    /// Degree 512 - DO NOT USE IN PRODUCTION
    ///
    /// Small enough that a full key ceremony, a stage of moves and a threshold
    /// decryption run in milliseconds. Used by tests and local simulations.
    #[serde(rename = "INSECURE_GAME_512")]
    InsecureGame512,
    /// Degree 4096 with a 109 bit ciphertext modulus.
    #[default]
    #[serde(rename = "SECURE_GAME_4096")]
    SecureGame4096,
}

/// Metadata describing a preset
#[derive(Debug, Clone, Copy)]
pub struct PresetMetadata {
    /// The canonical name of the preset (e.g., "INSECURE_GAME_512")
    pub name: &'static str,
    /// LWE dimension (d), the degree of the polynomial ring
    pub degree: usize,
    /// Number of ciphertext moduli in the chain
    pub num_moduli: usize,
    /// Approximate security level in bits
    pub lambda: usize,
}

#[derive(ThisError, Debug)]
pub enum PresetError {
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

/// A complete BFV parameter set definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BfvParamSet {
    /// Degree of the polynomial ring R_q = Z_q[X]/(X^d + 1), a power of 2
    pub degree: usize,
    /// Plaintext modulus (t)
    pub plaintext_modulus: u64,
    /// Ciphertext moduli (q_i), NTT-friendly primes
    pub moduli: &'static [u64],
}

impl BfvParamSet {
    pub fn with_plaintext_modulus(self, plaintext_modulus: u64) -> Self {
        Self {
            plaintext_modulus,
            ..self
        }
    }

    pub fn build_arc(self) -> Result<Arc<BfvParameters>, ParameterError> {
        build_bfv_params_from_set_arc(self)
    }
}

impl GamePreset {
    pub const ALL: [GamePreset; 2] = [GamePreset::InsecureGame512, GamePreset::SecureGame4096];

    pub fn from_name(name: &str) -> Result<Self, PresetError> {
        let normalized = name.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "INSECURE_GAME_512" => Ok(Self::InsecureGame512),
            "SECURE_GAME_4096" => Ok(Self::SecureGame4096),
            _ => Err(PresetError::UnknownPreset(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GamePreset::InsecureGame512 => "INSECURE_GAME_512",
            GamePreset::SecureGame4096 => "SECURE_GAME_4096",
        }
    }

    pub fn list() -> Vec<&'static str> {
        Self::ALL.iter().map(GamePreset::name).collect()
    }

    pub fn metadata(&self) -> PresetMetadata {
        let set = BfvParamSet::from(*self);
        let lambda = match self {
            GamePreset::InsecureGame512 => insecure_512::LAMBDA,
            GamePreset::SecureGame4096 => secure_4096::LAMBDA,
        };
        PresetMetadata {
            name: self.name(),
            degree: set.degree,
            num_moduli: set.moduli.len(),
            lambda,
        }
    }
}

impl std::str::FromStr for GamePreset {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl std::fmt::Display for GamePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<GamePreset> for BfvParamSet {
    fn from(value: GamePreset) -> Self {
        match value {
            GamePreset::InsecureGame512 => BfvParamSet {
                degree: insecure_512::DEGREE,
                plaintext_modulus: PLAINTEXT_MODULUS,
                moduli: insecure_512::MODULI,
            },
            GamePreset::SecureGame4096 => BfvParamSet {
                degree: secure_4096::DEGREE,
                plaintext_modulus: PLAINTEXT_MODULUS,
                moduli: secure_4096::MODULI,
            },
        }
    }
}
