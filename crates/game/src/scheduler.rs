// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Stage and turn state machine.
//!
//! ```text
//! AwaitingPlayers -> InTurn(p1) -> InTurn(p2) -> DecryptionPending -> InTurn(p1) ...
//!                                                                  \-> GameOver
//! ```

use crate::error::{GameError, GameResult};
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Outcome {
    /// The hider was never caught before the last stage.
    HiderSurvived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TurnState {
    AwaitingPlayers,
    InTurn(PlayerId),
    DecryptionPending,
    GameOver(Outcome),
}

/// What a successful move did to the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTransition {
    NextTurn(PlayerId),
    Checkpoint { stage: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    state: TurnState,
    current_stage: u64,
    max_stages: u64,
}

impl Scheduler {
    pub fn new(max_stages: u64) -> Self {
        Self {
            state: TurnState::AwaitingPlayers,
            current_stage: 1,
            max_stages,
        }
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn current_stage(&self) -> u64 {
        self.current_stage
    }

    pub fn max_stages(&self) -> u64 {
        self.max_stages
    }

    pub fn is_decryption_stage(&self) -> bool {
        self.state == TurnState::DecryptionPending
    }

    pub fn turn_holder(&self) -> Option<&PlayerId> {
        match &self.state {
            TurnState::InTurn(p) => Some(p),
            _ => None,
        }
    }

    /// Opens the first turn once the table is full and the joint key exists.
    pub fn start(&mut self, order: &[PlayerId]) -> GameResult<()> {
        let TurnState::AwaitingPlayers = self.state else {
            return Err(GameError::stage(format!(
                "cannot start play from {}",
                self.state
            )));
        };
        let Some(first) = order.first() else {
            return Err(GameError::stage("cannot start play without players"));
        };
        self.state = TurnState::InTurn(first.clone());
        info!(stage = self.current_stage, player = %first, "play started");
        Ok(())
    }

    /// Checks that `player` may submit a move right now.
    pub fn check_turn(&self, player: &PlayerId) -> GameResult<()> {
        let TurnState::InTurn(holder) = &self.state else {
            return Err(GameError::stage(format!(
                "moves are not accepted in {}",
                self.state
            )));
        };
        if holder != player {
            return Err(GameError::turn(player, format!("it is {holder}'s turn")));
        }
        Ok(())
    }

    /// Hands the turn to the next player in registration order, or opens the
    /// checkpoint after the last player of the cycle.
    pub fn advance(&mut self, order: &[PlayerId]) -> GameResult<MoveTransition> {
        let TurnState::InTurn(holder) = &self.state else {
            return Err(GameError::stage(format!(
                "cannot advance from {}",
                self.state
            )));
        };
        let Some(pos) = order.iter().position(|p| p == holder) else {
            return Err(GameError::UnknownPlayer(holder.clone()));
        };
        match order.get(pos + 1) {
            Some(next) => {
                self.state = TurnState::InTurn(next.clone());
                Ok(MoveTransition::NextTurn(next.clone()))
            }
            None => {
                self.current_stage += 1;
                self.state = TurnState::DecryptionPending;
                info!(stage = self.current_stage, "checkpoint reached");
                Ok(MoveTransition::Checkpoint {
                    stage: self.current_stage,
                })
            }
        }
    }

    /// Leaves `DecryptionPending` after the reveal.
    pub fn finish_decryption(&mut self, order: &[PlayerId]) -> GameResult<&TurnState> {
        let TurnState::DecryptionPending = self.state else {
            return Err(GameError::stage(format!(
                "no decryption pending in {}",
                self.state
            )));
        };
        if self.current_stage >= self.max_stages {
            self.state = TurnState::GameOver(Outcome::HiderSurvived);
            info!(stage = self.current_stage, "game over");
        } else {
            let Some(first) = order.first() else {
                return Err(GameError::stage("no players to hand the turn to"));
            };
            self.state = TurnState::InTurn(first.clone());
            info!(stage = self.current_stage, player = %first, "next stage");
        }
        Ok(&self.state)
    }

    /// Back to `AwaitingPlayers` for a new key ceremony. The stage counter is kept.
    pub fn reset_for_ceremony(&mut self) -> GameResult<()> {
        if let TurnState::GameOver(_) = self.state {
            return Err(GameError::stage("the game is over"));
        }
        self.state = TurnState::AwaitingPlayers;
        Ok(())
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, TurnState::GameOver(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Vec<PlayerId> {
        vec!["p1".into(), "p2".into()]
    }

    #[test]
    fn full_cycle() -> GameResult<()> {
        let order = order();
        let mut s = Scheduler::new(3);
        assert_eq!(s.state(), &TurnState::AwaitingPlayers);
        s.start(&order)?;
        assert_eq!(s.turn_holder(), Some(&order[0]));

        assert_eq!(s.advance(&order)?, MoveTransition::NextTurn(order[1].clone()));
        assert!(!s.is_decryption_stage());
        assert_eq!(s.advance(&order)?, MoveTransition::Checkpoint { stage: 2 });
        assert!(s.is_decryption_stage());

        assert_eq!(s.finish_decryption(&order)?, &TurnState::InTurn(order[0].clone()));
        s.advance(&order)?;
        s.advance(&order)?;
        assert_eq!(s.current_stage(), 3);
        assert_eq!(
            s.finish_decryption(&order)?,
            &TurnState::GameOver(Outcome::HiderSurvived)
        );
        assert!(s.is_over());
        Ok(())
    }

    #[test]
    fn wrong_player_and_wrong_state_are_rejected() -> GameResult<()> {
        let order = order();
        let mut s = Scheduler::new(3);
        assert!(matches!(
            s.check_turn(&order[0]),
            Err(GameError::StageViolation(_))
        ));
        s.start(&order)?;
        assert!(matches!(
            s.check_turn(&order[1]),
            Err(GameError::TurnViolation { .. })
        ));
        assert!(s.check_turn(&order[0]).is_ok());
        assert!(matches!(s.start(&order), Err(GameError::StageViolation(_))));
        assert!(matches!(
            s.finish_decryption(&order),
            Err(GameError::StageViolation(_))
        ));
        Ok(())
    }

    #[test]
    fn rejections_name_the_current_state() -> GameResult<()> {
        let order = order();
        let mut s = Scheduler::new(3);
        s.start(&order)?;
        assert_eq!(s.state().to_string(), "InTurn");
        s.advance(&order)?;
        s.advance(&order)?;
        match s.check_turn(&order[0]) {
            Err(GameError::StageViolation(msg)) => {
                assert_eq!(msg, "moves are not accepted in DecryptionPending")
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn single_stage_game_ends_after_first_checkpoint() -> GameResult<()> {
        let order = order();
        let mut s = Scheduler::new(1);
        s.start(&order)?;
        s.advance(&order)?;
        s.advance(&order)?;
        assert!(!s.is_over());
        s.finish_decryption(&order)?;
        assert!(s.is_over());
        assert!(matches!(
            s.reset_for_ceremony(),
            Err(GameError::StageViolation(_))
        ));
        Ok(())
    }

    #[test]
    fn reset_keeps_stage() -> GameResult<()> {
        let order = order();
        let mut s = Scheduler::new(5);
        s.start(&order)?;
        s.advance(&order)?;
        s.advance(&order)?;
        s.finish_decryption(&order)?;
        s.reset_for_ceremony()?;
        assert_eq!(s.state(), &TurnState::AwaitingPlayers);
        assert_eq!(s.current_stage(), 2);
        Ok(())
    }
}
