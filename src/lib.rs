/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Rules of chess on a plain 8x8 board: move legality, check, checkmate and draws,
//! with an optional UCI engine as an opponent.
//!
//! ```
//! # use gambit::*;
//! let mut game = Game::default();
//! assert!(game.make_move("e2", "e4").success);
//! assert_eq!(game.current_turn(), Team::Black);
//! ```

/// Mailbox representation of the board.
mod board;

/// Commands typed into a running game.
mod cli;

/// Command-line and environment settings.
mod config;

/// Orchestration of a game: turns, move results, and how games end.
mod game;

/// The ledger of every movement played.
mod history;

/// Move generation, check detection and castling.
mod movegen;

/// A single entry in the ledger.
mod moves;

/// Move path enumeration, for validating move generation.
mod perft;

/// Pieces and the teams they belong to.
mod piece;

/// The interactive loop that drives a game from `stdin`.
mod session;

/// Squares, files and ranks.
mod square;

/// Talking to UCI engines.
mod uci;

/// Misc constants.
mod utils;

pub use board::*;
pub use cli::*;
pub use config::*;
pub use game::*;
pub use history::*;
pub use movegen::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use session::*;
pub use square::*;
pub use uci::*;
pub use utils::*;
