// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path};
use crate::yaml::load_yaml_with_env;
use anyhow::{anyhow, bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use tracing::debug;
use umbra_fhe_params::{
    constants::{DEFAULT_DIMENSIONS, PLAINTEXT_MODULUS},
    GamePreset, MultipartyMode, SchemeParameters,
};

pub const DEFAULT_CONFIG_NAME: &str = "umbra.config.yaml";
pub const ENV_PREFIX: &str = "UMBRA_";

/// Sessions are strictly two-party.
pub const MAX_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    InMem,
    Sled,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Instance name, used to namespace the database directory.
    name: String,
    preset: GamePreset,
    plaintext_modulus: u64,
    max_players: usize,
    max_stages: u64,
    dimensions: usize,
    data_dir: PathBuf,
    store: StoreKind,
    /// The file this configuration was read from, if any.
    config_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "umbra".to_string(),
            preset: GamePreset::default(),
            plaintext_modulus: PLAINTEXT_MODULUS,
            max_players: MAX_PLAYERS,
            max_stages: 3,
            dimensions: DEFAULT_DIMENSIONS,
            data_dir: OsDirs::data_dir(),
            store: StoreKind::default(),
            config_file: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_players != MAX_PLAYERS {
            bail!(
                "max_players must be {MAX_PLAYERS}, got {}",
                self.max_players
            );
        }
        if self.max_stages == 0 {
            bail!("max_stages must be at least 1");
        }
        if self.dimensions < 2 {
            bail!("dimensions must be at least 2, got {}", self.dimensions);
        }
        if self.name.is_empty() {
            bail!("name must not be empty");
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn preset(&self) -> GamePreset {
        self.preset
    }

    pub fn plaintext_modulus(&self) -> u64 {
        self.plaintext_modulus
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn max_stages(&self) -> u64 {
        self.max_stages
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn store(&self) -> StoreKind {
        self.store
    }

    pub fn use_in_mem_store(&self) -> bool {
        self.store == StoreKind::InMem
    }

    pub fn config_file(&self) -> Option<&PathBuf> {
        self.config_file.as_ref()
    }

    pub fn db_file(&self) -> PathBuf {
        self.data_dir.join(&self.name).join("db")
    }

    /// Scheme parameters every session created under this config will use.
    pub fn scheme_parameters(&self) -> SchemeParameters {
        SchemeParameters::new(
            self.preset,
            self.plaintext_modulus,
            MultipartyMode::NoiseFlooding,
        )
        .with_dimensions(self.dimensions)
    }

    pub fn with_preset(mut self, preset: GamePreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_max_stages(mut self, max_stages: u64) -> Self {
        self.max_stages = max_stages;
        self
    }
}

/// Value struct for passing configuration from the cli to the configuration
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
struct CliOverrides {
    config_file: Option<PathBuf>,
}

/// Loads defaults, then the YAML file, then `UMBRA_*` environment variables.
///
/// A file named on the command line must exist. When no file is named and
/// none is found, the defaults and environment are used on their own.
pub fn load_config(config_file: Option<String>) -> Result<AppConfig> {
    let resolved = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        config_file.map(PathBuf::from),
    );

    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    let found = match load_yaml_with_env(&resolved.path) {
        Ok(yaml) => {
            figment = figment.merge(Yaml::string(&yaml));
            Some(resolved.path)
        }
        Err(err) if !resolved.explicit && is_not_found(&err) => {
            debug!(path = ?resolved.path, "no configuration file, using defaults");
            None
        }
        Err(err) => return Err(err.context("Configuration file not found")),
    };

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX))
        .merge(Serialized::defaults(CliOverrides {
            config_file: found,
        }))
        .extract()
        .context("Could not parse configuration")?;

    config.validate()?;
    Ok(config)
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("umbra"))
            .ok_or_else(|| anyhow!("this OS does not provide a config dir"))
    }

    /// Falls back to the working directory when the OS has no data dir.
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("umbra"))
            .unwrap_or_else(|| PathBuf::from(".umbra"))
    }
}
