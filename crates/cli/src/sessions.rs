// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use clap::Subcommand;
use tracing::warn;
use umbra_config::AppConfig;
use umbra_game::{SessionId, SessionManager};

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// List stored sessions
    List,

    /// Print the public state of one session as JSON
    Show {
        /// Session id
        id: String,
    },

    /// Delete a session and everything stored for it
    Abandon {
        /// Session id
        id: String,
    },
}

pub fn execute(command: SessionCommands, config: &AppConfig) -> Result<()> {
    if config.use_in_mem_store() {
        warn!("store is in memory, no sessions survive between runs");
    }
    let manager = SessionManager::from_config(config)?;
    manager.restore_all()?;

    match command {
        SessionCommands::List => {
            for id in manager.session_ids()? {
                let state = manager.state(&id)?;
                println!(
                    "{id}\tstage {}/{}\tepoch {}\t{}",
                    state.stage,
                    state.max_stages,
                    state.epoch,
                    state.ceremony
                );
            }
        }
        SessionCommands::Show { id } => {
            let state = manager.state(&SessionId::new(id))?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        SessionCommands::Abandon { id } => {
            manager.abandon(&SessionId::new(id))?;
        }
    }
    Ok(())
}
