// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use umbra_config::AppConfig;

pub fn execute(config: &AppConfig) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
