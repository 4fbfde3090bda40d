// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod artifact;
mod ciphertext;
mod context;
mod decryption;
mod encoding;
mod error;
mod keys;
mod party;

pub use artifact::*;
pub use ciphertext::*;
pub use context::*;
pub use decryption::*;
pub use encoding::*;
pub use error::*;
pub use keys::*;
pub use party::*;

// Re-export params so dependents can build contexts without depending on umbra-fhe-params.
pub use umbra_fhe_params::{
    GamePreset, MultipartyMode, ParameterError, PresetError, SchemeParameters,
};
