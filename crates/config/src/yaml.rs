// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Reads a YAML file and expands `${VAR}` references from the environment.
/// Unset variables are left as written.
pub fn load_yaml_with_env(file_path: &Path) -> Result<String> {
    let content = fs::read_to_string(file_path)?;
    let expanded = shellexpand::env_with_context_no_errors(&content, |var| {
        std::env::var(var).ok()
    });
    // parse once so a broken file is reported against its path
    serde_yaml::from_str::<serde_yaml::Value>(&expanded)
        .with_context(|| format!("Invalid YAML in {}", file_path.display()))?;
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn expands_known_variables() -> Result<()> {
        std::env::set_var("UMBRA_YAML_TEST_STAGES", "7");
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "max_stages: ${{UMBRA_YAML_TEST_STAGES}}")?;
        writeln!(file, "name: ${{UMBRA_YAML_TEST_UNSET}}")?;
        let out = load_yaml_with_env(file.path())?;
        assert!(out.contains("max_stages: 7"));
        assert!(out.contains("${UMBRA_YAML_TEST_UNSET}"));
        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_yaml_with_env(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }
}
