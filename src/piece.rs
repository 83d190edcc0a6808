/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Neg, str::FromStr};

use anyhow::{bail, Result};

use crate::{Rank, Square};

/// The side a piece belongs to.
///
/// Empty squares belong to [`Team::NoTeam`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Team {
    #[default]
    NoTeam,
    White,
    Black,
}

impl Team {
    /// Both playable teams, starting with White.
    #[inline(always)]
    pub const fn both() -> [Self; 2] {
        [Self::White, Self::Black]
    }

    /// Returns this [`Team`]'s opponent.
    ///
    /// [`Team::NoTeam`] has no opponent and maps to itself.
    ///
    /// # Example
    /// ```
    /// # use gambit::Team;
    /// assert_eq!(Team::White.opponent(), Team::Black);
    /// assert_eq!(Team::Black.opponent(), Team::White);
    /// assert_eq!(Team::NoTeam.opponent(), Team::NoTeam);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
            Self::NoTeam => Self::NoTeam,
        }
    }

    /// Rank direction this team's Pawns advance in.
    #[inline(always)]
    pub const fn forward(&self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
            Self::NoTeam => 0,
        }
    }

    /// Creates a [`Team`] from the case of a piece character: uppercase is White, lowercase is Black.
    #[inline(always)]
    pub const fn from_case(c: char) -> Self {
        if c.is_ascii_uppercase() {
            Self::White
        } else {
            Self::Black
        }
    }

    /// Parses the side-to-move field of a FEN string.
    pub fn from_uci(team: &str) -> Result<Self> {
        match team {
            "w" | "W" => Ok(Self::White),
            "b" | "B" => Ok(Self::Black),
            _ => bail!("Team must be either 'w' or 'b' (case-insensitive). Found {team:?}"),
        }
    }

    /// Converts this [`Team`] to its FEN side-to-move character.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
            Self::NoTeam => '-',
        }
    }

    /// Fetches a human-readable name for this [`Team`].
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
            Self::NoTeam => "nobody",
        }
    }
}

impl Neg for Team {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self::Output {
        self.opponent()
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Represents the kind (or "role") of whatever occupies a square.
///
/// [`PieceKind::Empty`] is the occupant of every square without a piece.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum PieceKind {
    #[default]
    Empty,
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceKind {
    /// Creates a new [`PieceKind`] from a FEN character, ignoring case.
    ///
    /// # Example
    /// ```
    /// # use gambit::PieceKind;
    /// assert_eq!(PieceKind::from_uci('Q').unwrap(), PieceKind::Queen);
    /// assert!(PieceKind::from_uci('x').is_err());
    /// ```
    pub fn from_uci(kind: char) -> Result<Self> {
        match kind {
            'P' | 'p' => Ok(Self::Pawn),
            'N' | 'n' => Ok(Self::Knight),
            'B' | 'b' => Ok(Self::Bishop),
            'R' | 'r' => Ok(Self::Rook),
            'Q' | 'q' => Ok(Self::Queen),
            'K' | 'k' => Ok(Self::King),
            _ => bail!("Invalid char for PieceKind: Got {kind:?}."),
        }
    }

    /// Converts this [`PieceKind`] to a lowercase FEN character.
    ///
    /// [`PieceKind::Empty`] is displayed as `'.'`.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::Empty => '.',
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    /// Fetches a human-readable name for this [`PieceKind`].
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    /// Returns `true` if this kind moves along rays of unbounded length.
    #[inline(always)]
    pub const fn is_slider(&self) -> bool {
        matches!(self, Self::Rook | Self::Bishop | Self::Queen)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Whatever occupies one square of the board.
///
/// Every piece remembers every square it has stood on, starting with the square it was spawned on.
/// A history longer than one entry means the piece has moved, which castling and the Pawn's
/// double step both depend on.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    team: Team,
    kind: PieceKind,
    square: Square,
    history: Vec<Square>,
}

impl Piece {
    /// Spawns a new piece on `square`.
    #[inline(always)]
    pub fn new(team: Team, kind: PieceKind, square: Square) -> Self {
        Self {
            team,
            kind,
            square,
            history: vec![square],
        }
    }

    /// The occupant of an empty square.
    ///
    /// Empty squares have no history, so creating one never allocates.
    #[inline(always)]
    pub const fn empty(square: Square) -> Self {
        Self {
            team: Team::NoTeam,
            kind: PieceKind::Empty,
            square,
            history: Vec::new(),
        }
    }

    #[inline(always)]
    pub const fn team(&self) -> Team {
        self.team
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// The square this piece currently stands on.
    #[inline(always)]
    pub const fn square(&self) -> Square {
        self.square
    }

    /// Every square this piece has stood on, oldest first.
    #[inline(always)]
    pub fn history(&self) -> &[Square] {
        &self.history
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        matches!(self.kind, PieceKind::Empty)
    }

    #[inline(always)]
    pub const fn is(&self, team: Team, kind: PieceKind) -> bool {
        self.team as u8 == team as u8 && self.kind as u8 == kind as u8
    }

    /// Returns `true` if this piece has ever left its spawn square, even if it has since returned.
    #[inline(always)]
    pub fn has_moved(&self) -> bool {
        self.history.len() > 1
    }

    /// Returns this piece as it would be after moving to `to`, with `to` appended to its history.
    #[inline(always)]
    pub fn moved_to(mut self, to: Square) -> Self {
        self.square = to;
        self.history.push(to);
        self
    }

    /// Relocates this piece without recording the move.
    ///
    /// Used by hypothetical moves that are always rolled back.
    #[inline(always)]
    pub(crate) fn force_square(&mut self, square: Square) {
        self.square = square;
    }

    /// Records a move this piece made before the game was loaded, marking it as having moved.
    #[inline(always)]
    pub(crate) fn mark_moved(&mut self) {
        if !self.has_moved() {
            self.history.push(self.square);
        }
    }

    /// Changes what kind of piece this is, keeping its team, square and history.
    #[inline(always)]
    pub(crate) fn promote(&mut self, kind: PieceKind) {
        self.kind = kind;
    }

    /// FEN character for this piece: uppercase for White, lowercase for Black.
    ///
    /// # Example
    /// ```
    /// # use gambit::{Piece, PieceKind, Square, Team};
    /// assert_eq!(Piece::new(Team::White, PieceKind::Knight, Square::B1).char(), 'N');
    /// assert_eq!(Piece::new(Team::Black, PieceKind::Queen, Square::D8).char(), 'q');
    /// assert_eq!(Piece::empty(Square::E1).char(), '.');
    /// ```
    #[inline(always)]
    pub const fn char(&self) -> char {
        let c = self.kind.to_uci();
        match self.team {
            Team::White => c.to_ascii_uppercase(),
            _ => c,
        }
    }

    /// The rank this piece would promote on, if it were a Pawn.
    #[inline(always)]
    pub const fn promotion_rank(&self) -> Rank {
        Rank::last(self.team)
    }
}

impl FromStr for Piece {
    type Err = anyhow::Error;
    /// Parses a FEN piece character into a piece that has not been placed yet (it sits on `a1`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            bail!("Piece string must be a single character. Got {s:?}")
        };

        Ok(Self::new(
            Team::from_case(c),
            PieceKind::from_uci(c)?,
            Square::default(),
        ))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} on {} (moves: {})",
            self.team,
            self.kind,
            self.square,
            self.history.len().saturating_sub(1)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_starts_at_spawn() {
        let rook = Piece::new(Team::White, PieceKind::Rook, Square::A1);
        assert_eq!(rook.history(), &[Square::A1]);
        assert!(!rook.has_moved());
    }

    #[test]
    fn test_moving_and_returning_still_counts_as_moved() {
        let rook = Piece::new(Team::White, PieceKind::Rook, Square::A1);
        let rook = rook.moved_to(Square::B1).moved_to(Square::A1);
        assert_eq!(rook.square(), Square::A1);
        assert_eq!(rook.history(), &[Square::A1, Square::B1, Square::A1]);
        assert!(rook.has_moved());
    }

    #[test]
    fn test_forced_square_leaves_history_alone() {
        let mut king = Piece::new(Team::Black, PieceKind::King, Square::E8);
        king.force_square(Square::D8);
        assert_eq!(king.square(), Square::D8);
        assert!(!king.has_moved());
    }

    #[test]
    fn test_promotion_keeps_history() {
        let mut pawn = Piece::new(Team::White, PieceKind::Pawn, Square::A1).moved_to(Square::A8);
        pawn.promote(PieceKind::Queen);
        assert_eq!(pawn.kind(), PieceKind::Queen);
        assert_eq!(pawn.team(), Team::White);
        assert!(pawn.has_moved());
    }

    #[test]
    fn test_empty_piece() {
        let empty = Piece::empty(Square::E1);
        assert!(empty.is_empty());
        assert_eq!(empty.team(), Team::NoTeam);
        assert_eq!(empty.team().opponent(), Team::NoTeam);
        assert!(empty.history().is_empty());
        assert_eq!(empty.history.capacity(), 0);
        assert!(!empty.has_moved());
    }

    #[test]
    fn test_piece_from_str() {
        let queen: Piece = "q".parse().unwrap();
        assert!(queen.is(Team::Black, PieceKind::Queen));
        let knight: Piece = "N".parse().unwrap();
        assert!(knight.is(Team::White, PieceKind::Knight));
        assert!("x".parse::<Piece>().is_err());
        assert!("Qq".parse::<Piece>().is_err());
    }
}
