// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Server side of an encrypted hide and seek game.
//!
//! Players only ever hand the server ciphertexts and decryption shares. The
//! server accumulates moves homomorphically, decides whose turn it is and
//! combines the two shares at every checkpoint.

mod ceremony;
mod coordinator;
mod error;
mod ledger;
mod manager;
mod messages;
mod player;
mod repo;
mod scheduler;
mod session;

pub use ceremony::*;
pub use coordinator::*;
pub use error::*;
pub use ledger::*;
pub use manager::*;
pub use messages::*;
pub use player::*;
pub use repo::*;
pub use scheduler::*;
pub use session::*;
