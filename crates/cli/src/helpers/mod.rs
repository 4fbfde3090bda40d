// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

pub mod telemetry;

/// Writes `content` to `path`, creating parent directories, or prints it when
/// no path is given.
pub fn emit(path: Option<&Path>, content: &str) -> Result<()> {
    let Some(path) = path else {
        println!("{content}");
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))?;
    info!(path = %path.display(), "written");
    Ok(())
}
