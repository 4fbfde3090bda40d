// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;
use serde::{Deserialize, Serialize};
use strum::Display;
use umbra_fhe::DecryptionRole;

/// Player identifier supplied (and authenticated) by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The first player to join seeks and leads decryption; the second hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Role {
    Seeker,
    Hider,
}

impl Role {
    pub fn for_seat(seat: usize) -> Self {
        if seat == 0 {
            Role::Seeker
        } else {
            Role::Hider
        }
    }

    pub fn decryption_role(&self) -> DecryptionRole {
        match self {
            Role::Seeker => DecryptionRole::Lead,
            Role::Hider => DecryptionRole::Main,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub seat: usize,
    pub role: Role,
}

impl Player {
    pub fn new(id: PlayerId, seat: usize) -> Self {
        Self {
            id,
            seat,
            role: Role::for_seat(seat),
        }
    }
}
