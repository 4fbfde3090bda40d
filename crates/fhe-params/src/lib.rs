// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Scheme parameters, presets and validation for the game's BFV context.

pub mod builder;
pub mod constants;
pub mod crp;
pub mod presets;
pub mod scheme;

pub use builder::{build_bfv_params_arc, build_bfv_params_from_set_arc};
pub use crp::create_deterministic_crp_from_seed;
pub use presets::{BfvParamSet, GamePreset, PresetError, PresetMetadata};
pub use scheme::{Feature, MultipartyMode, ParameterError, SchemeParameters};
