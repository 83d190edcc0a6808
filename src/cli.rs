/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use clap::Parser;

use crate::{Piece, Square};

/// A command typed into a running game.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<COMMAND> | <FROM> <TO>")
)]
pub enum GameCommand {
    /// Move a piece, such as `move e2 e4` or `move e2e4`.
    ///
    /// Typing the two squares alone (`e2 e4`) does the same.
    #[command(alias = "m")]
    Move {
        /// Square to move from, or both squares run together.
        from: String,

        /// Square to move to.
        to: Option<String>,
    },

    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Ask the engine to play a move for the team on move.
    #[command(alias = "go")]
    Engine,

    /// Quit the game.
    #[command(aliases = ["quit", "q"])]
    Exit,

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Print every move played so far.
    History,

    /// Shows all legal moves in the current position, or for a specific piece.
    Moves { square: Option<Square> },

    /// Start over from the standard starting position.
    New,

    /// Performs a perft on the current position at the supplied depth, printing total node count.
    Perft { depth: usize },

    /// Place a piece on the provided square.
    Place { piece: Piece, square: Square },

    /// Set up the position described by a FEN string.
    Position { fen: Vec<String> },

    /// Performs a perft on the current position, printing the node count below every move.
    #[command(alias = "sperft")]
    Splitperft { depth: usize },

    /// Print whether the team on move is in check, and whether the game is over.
    Status,

    /// Remove the piece at the provided square.
    Take { square: Square },
}

impl GameCommand {
    /// The two squares of a move, however they were typed.
    ///
    /// `("e2e4", None)` is split into `("e2", "e4")`.
    pub fn move_squares<'a>(from: &'a str, to: Option<&'a str>) -> (&'a str, &'a str) {
        match to {
            Some(to) => (from, to),
            None if from.is_char_boundary(2) => from.split_at(2),
            None => (from, ""),
        }
    }
}

impl FromStr for GameCommand {
    type Err = clap::Error;
    /// Attempt to parse a [`GameCommand`] from a string.
    ///
    /// If this fails, it will attempt to read the string as a bare move.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words = s.split_ascii_whitespace().collect::<Vec<_>>();

        match Self::try_parse_from(words.iter().copied()) {
            Ok(cmd) => Ok(cmd),
            Err(err) => match words.as_slice() {
                [from, to] if from.len() == 2 && to.len() == 2 => Ok(Self::Move {
                    from: from.to_string(),
                    to: Some(to.to_string()),
                }),
                [mv] if mv.len() == 4 => Ok(Self::Move {
                    from: mv.to_string(),
                    to: None,
                }),
                _ => Err(err),
            },
        }
    }
}
