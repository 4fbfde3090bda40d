// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::DataStore;

/// Handle that domain crates extend with their own typed repository factories.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub store: DataStore,
}

pub trait RepositoriesFactory {
    fn repositories(&self) -> Repositories;
}

impl RepositoriesFactory for DataStore {
    fn repositories(&self) -> Repositories {
        Repositories {
            store: self.base(Vec::<u8>::new()),
        }
    }
}
