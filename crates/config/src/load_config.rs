// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use path_clean::clean;

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walks from `path` up to the filesystem root looking for `filename`.
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = path.to_path_buf();
    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Where the configuration lives, and whether the caller named it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfigPath {
    pub path: PathBuf,
    pub explicit: bool,
}

/// Resolution order: the file given on the command line (relative to `cwd`),
/// then the nearest `default_filename` in `cwd` or a parent, then the
/// default config directory.
pub fn resolve_config_path<P: Into<PathBuf>>(
    find_in_parent: FindInParent,
    cwd: P,
    default_config_dir: P,
    default_filename: &str,
    cli_file: Option<P>,
) -> ResolvedConfigPath {
    let cwd = cwd.into();

    if let Some(cli_file) = cli_file.map(Into::into) {
        let path = if cli_file.is_absolute() {
            cli_file
        } else {
            clean(cwd.join(cli_file))
        };
        return ResolvedConfigPath {
            path,
            explicit: true,
        };
    }

    let path = find_in_parent(&cwd, default_filename)
        .unwrap_or_else(|| clean(default_config_dir.into().join(default_filename)));
    ResolvedConfigPath {
        path,
        explicit: false,
    }
}
