// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::marker::PhantomData;

use crate::DataStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A [`DataStore`] slot that only holds values of type `T`.
#[derive(Debug)]
pub struct Repository<T> {
    store: DataStore,
    _p: PhantomData<T>,
}

impl<T> Repository<T> {
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            _p: PhantomData,
        }
    }
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<T> From<Repository<T>> for DataStore {
    fn from(value: Repository<T>) -> Self {
        value.store
    }
}

impl<T> From<&Repository<T>> for DataStore {
    fn from(value: &Repository<T>) -> Self {
        value.store.clone()
    }
}

impl<T> Repository<T>
where
    T: for<'de> Deserialize<'de> + Serialize,
{
    pub fn read(&self) -> Result<Option<T>> {
        self.store.read()
    }

    pub fn write(&self, value: &T) -> Result<()> {
        self.store.write(value)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}
