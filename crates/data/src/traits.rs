// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;

use crate::{Get, Insert, Remove};

pub trait KeyValStore: Send {
    fn insert(&mut self, msg: Insert) -> Result<()>;
    fn remove(&mut self, msg: Remove) -> Result<()>;
    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>>;
    /// Makes every earlier write durable.
    fn flush(&mut self) -> Result<()>;
}
