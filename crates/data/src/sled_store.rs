// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::sled_utils::get_or_open_db_tree;
use crate::{Get, Insert, KeyValStore, Remove};
use anyhow::{Context, Result};
use sled::Tree;
use std::path::Path;
use tracing::info;

pub const DEFAULT_TREE: &str = "sessions";

/// Durable store backed by one sled tree.
pub struct SledStore {
    db: Tree,
}

impl SledStore {
    pub fn new(path: &Path, tree: &str) -> Result<Self> {
        info!("Starting SledStore with {:?}", path);
        let db = get_or_open_db_tree(path, tree)?;
        Ok(Self { db })
    }
}

impl KeyValStore for SledStore {
    fn insert(&mut self, msg: Insert) -> Result<()> {
        self.db
            .insert(msg.key(), msg.value().to_vec())
            .context("Could not insert data into db")?;
        Ok(())
    }

    fn remove(&mut self, msg: Remove) -> Result<()> {
        self.db
            .remove(msg.key())
            .context("Could not remove data from db")?;
        Ok(())
    }

    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>> {
        let key = msg.key();
        let res = self
            .db
            .get(key)
            .with_context(|| format!("Failed to fetch {}", String::from_utf8_lossy(key)))?;
        Ok(res.map(|v| v.to_vec()))
    }

    fn flush(&mut self) -> Result<()> {
        self.db.flush().context("Could not flush db")?;
        Ok(())
    }
}
