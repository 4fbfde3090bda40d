// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::emit;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use umbra_config::AppConfig;
use umbra_fhe::create_context;

pub fn execute(config: &AppConfig, out: Option<PathBuf>) -> Result<()> {
    let scheme = config
        .scheme_parameters()
        .with_seed(rand::random::<[u8; 32]>());
    let ctx = create_context(&scheme)?;
    info!(context = %ctx.id(), preset = %scheme.preset, "context generated");
    emit(out.as_deref(), &ctx.to_json()?)
}
