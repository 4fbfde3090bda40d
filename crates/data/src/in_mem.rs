// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Get, Insert, KeyValStore, Remove};
use anyhow::Result;
use std::collections::BTreeMap;

/// Ordered in-memory store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemStore {
    db: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValStore for InMemStore {
    fn insert(&mut self, msg: Insert) -> Result<()> {
        self.db.insert(msg.key().to_vec(), msg.value().to_vec());
        Ok(())
    }

    fn remove(&mut self, msg: Remove) -> Result<()> {
        self.db.remove(msg.key());
        Ok(())
    }

    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(msg.key()).cloned())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
