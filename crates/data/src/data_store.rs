// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Get, InMemStore, Insert, IntoKey, KeyValStore, Remove, SledStore};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;

type SharedStore = Arc<Mutex<dyn KeyValStore>>;

/// Scoped handle onto a shared key/value store.
///
/// Clones share the backing store; `scope` and `base` only change the key the
/// handle reads and writes.
#[derive(Clone)]
pub struct DataStore {
    scope: Vec<u8>,
    store: SharedStore,
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("scope", &String::from_utf8_lossy(&self.scope))
            .finish_non_exhaustive()
    }
}

impl DataStore {
    pub fn new<S: KeyValStore + 'static>(store: S) -> Self {
        Self {
            scope: vec![],
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn in_mem() -> Self {
        Self::new(InMemStore::new())
    }

    fn lock(&self) -> Result<MutexGuard<'_, dyn KeyValStore + 'static>> {
        self.store
            .lock()
            .map_err(|_| anyhow!("data store lock poisoned"))
    }

    /// Read data at the scope location
    pub fn read<T>(&self) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let Some(bytes) = self.read_bytes()? else {
            return Ok(None);
        };
        let value = bincode::deserialize(&bytes)
            .with_context(|| format!("Could not deserialize value at {}", self.get_scope()))?;
        Ok(Some(value))
    }

    /// Writes data to the scope location
    pub fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        let serialized = bincode::serialize(value)
            .with_context(|| format!("Could not serialize value passed to {}", self.get_scope()))?;
        self.write_bytes(serialized)
    }

    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.lock()?.get(Get::new(&self.scope))
    }

    pub fn write_bytes(&self, bytes: Vec<u8>) -> Result<()> {
        trace!(scope = %self.get_scope(), len = bytes.len(), "write");
        self.lock()?.insert(Insert::new(&self.scope, bytes))
    }

    /// Removes data from the scope location
    pub fn clear(&self) -> Result<()> {
        self.lock()?.remove(Remove::new(&self.scope))
    }

    /// Flushes the backing store. Applies to every scope sharing it.
    pub fn flush(&self) -> Result<()> {
        self.lock()?.flush()
    }

    pub fn get_scope(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.scope)
    }

    /// Appends a segment to the scope. A leading slash is added when missing.
    pub fn scope<K: IntoKey>(&self, key: K) -> Self {
        let mut scope = self.scope.clone();
        let encoded_key = key.into_key();
        if !encoded_key.starts_with(b"/") {
            scope.push(b'/');
        }
        scope.extend(encoded_key);
        Self {
            store: self.store.clone(),
            scope,
        }
    }

    /// Same backing store, scope replaced by `key`.
    pub fn base<K: IntoKey>(&self, key: K) -> Self {
        Self {
            store: self.store.clone(),
            scope: key.into_key(),
        }
    }
}

impl From<InMemStore> for DataStore {
    fn from(store: InMemStore) -> Self {
        DataStore::new(store)
    }
}

impl From<SledStore> for DataStore {
    fn from(store: SledStore) -> Self {
        DataStore::new(store)
    }
}
