// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod parties;
mod rng;
mod tracing_setup;

pub use parties::*;
pub use rng::*;
pub use tracing_setup::*;
