/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::Index,
};

use anyhow::{anyhow, bail, Result};

use crate::{File, Piece, PieceKind, Rank, Square, Team};

/// Back rank layout shared by both teams, from the `a` file to the `h` file.
const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// An `8x8` grid of pieces, along with whose turn it is.
///
/// Every square always holds a [`Piece`]; empty squares hold one of kind [`PieceKind::Empty`].
/// Has no knowledge of move history. If you need that, see [`crate::Game`].
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    /// Indexed by [`Square::index`].
    squares: [Piece; Square::COUNT],

    /// The [`Team`] whose turn it is.
    current_turn: Team,
}

impl Board {
    /// Creates a new [`Board`] with every square empty and White to move.
    ///
    /// # Example
    /// ```
    /// # use gambit::Board;
    /// let board = Board::new();
    /// assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8");
    /// ```
    pub fn new() -> Self {
        Self {
            squares: std::array::from_fn(|i| Piece::empty(Square(i as u8))),
            current_turn: Team::White,
        }
    }

    /// Creates a new [`Board`] in the standard starting position.
    ///
    /// # Example
    /// ```
    /// # use gambit::Board;
    /// let board = Board::standard();
    /// assert_eq!(board.to_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
    /// ```
    pub fn standard() -> Self {
        let mut board = Self::new();
        board.reset();
        board
    }

    /// Resets this board to the standard starting position, with White to move.
    pub fn reset(&mut self) {
        self.clear();

        for team in Team::both() {
            for (file, kind) in File::iter().zip(BACK_RANK) {
                self.place(team, kind, Square::new(file, Rank::first(team)));
                self.place(team, PieceKind::Pawn, Square::new(file, Rank::second(team)));
            }
        }

        self.current_turn = Team::White;
    }

    /// Removes every piece from the board.
    ///
    /// Whose turn it is remains unchanged.
    pub fn clear(&mut self) {
        for square in Square::iter() {
            *self.piece_at_mut(square) = Piece::empty(square);
        }
    }

    /// Constructs a [`Board`] from the piece placement field of a FEN string.
    ///
    /// Every piece is placed as though it had never moved. White is to move.
    pub fn from_placements(placements: &str) -> Result<Self> {
        let mut board = Self::new();

        let ranks = placements.split('/').collect::<Vec<_>>();
        if ranks.len() != 8 {
            bail!("FEN placements must have 8 ranks. Got {} in {placements:?}", ranks.len());
        }

        // FEN lists ranks from 8 down to 1
        for (rank, row) in Rank::iter().rev().zip(ranks) {
            let mut file = 0;
            for c in row.chars() {
                if let Some(empty) = c.to_digit(10) {
                    if empty == 0 {
                        bail!("Rank {rank} of {placements:?} has an empty-square count of 0");
                    }

                    file += empty as u8;
                    if file > 8 {
                        bail!("Rank {rank} of {placements:?} has too many squares");
                    }
                } else {
                    let square = File::new(file)
                        .map(|file| Square::new(file, rank))
                        .map_err(|_| anyhow!("Rank {rank} of {placements:?} has too many squares"))?;
                    board.place(Team::from_case(c), PieceKind::from_uci(c)?, square);
                    file += 1;
                }
            }

            if file != 8 {
                bail!("Rank {rank} of {placements:?} must describe exactly 8 squares. Got {file}");
            }
        }

        Ok(board)
    }

    /// Generates the piece placement field of a FEN string, from rank 8 down to rank 1.
    pub fn to_fen(&self) -> String {
        let mut ranks = Vec::with_capacity(8);

        for rank in Rank::iter().rev() {
            let mut placements = String::with_capacity(8);
            let mut empty_spaces = 0;

            for file in File::iter() {
                let piece = &self[Square::new(file, rank)];
                if piece.is_empty() {
                    empty_spaces += 1;
                    continue;
                }

                if empty_spaces != 0 {
                    placements += &empty_spaces.to_string();
                    empty_spaces = 0;
                }
                placements.push(piece.char());
            }

            if empty_spaces != 0 {
                placements += &empty_spaces.to_string();
            }

            ranks.push(placements);
        }

        ranks.join("/")
    }

    /// The [`Team`] whose turn it is.
    #[inline(always)]
    pub const fn current_turn(&self) -> Team {
        self.current_turn
    }

    #[inline(always)]
    pub fn set_current_turn(&mut self, team: Team) {
        self.current_turn = team;
    }

    /// Passes the turn to the other team.
    #[inline(always)]
    pub fn toggle_turn(&mut self) {
        self.current_turn = self.current_turn.opponent();
    }

    /// Fetches whatever occupies `square`.
    #[inline(always)]
    pub fn piece_at(&self, square: Square) -> &Piece {
        &self[square]
    }

    /// Mutable access to the occupant of `square`.
    ///
    /// Whatever is stored here must report `square` as its own square.
    #[inline(always)]
    pub(crate) fn piece_at_mut(&mut self, square: Square) -> &mut Piece {
        &mut self.squares[square.index()]
    }

    /// Spawns a fresh (never moved) piece on `square`, replacing whatever stood there.
    #[inline(always)]
    pub fn place(&mut self, team: Team, kind: PieceKind, square: Square) {
        *self.piece_at_mut(square) = Piece::new(team, kind, square);
    }

    /// Removes the piece on `square`, returning it and leaving the square empty.
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Piece {
        std::mem::replace(self.piece_at_mut(square), Piece::empty(square))
    }

    /// Moves the piece on `from` to `to`, recording the move in the piece's own history.
    ///
    /// Returns whatever previously stood on `to`. `from` is left empty.
    pub fn relocate(&mut self, from: Square, to: Square) -> Piece {
        let piece = self.take(from).moved_to(to);
        std::mem::replace(self.piece_at_mut(to), piece)
    }

    /// Replaces the kind of the piece on `square`.
    #[inline(always)]
    pub(crate) fn promote(&mut self, square: Square, kind: PieceKind) {
        self.piece_at_mut(square).promote(kind);
    }

    /// Location of `team`'s King, if it has one.
    pub fn king(&self, team: Team) -> Option<Square> {
        self.pieces(team)
            .find(|piece| piece.kind() == PieceKind::King)
            .map(Piece::square)
    }

    /// Iterates over every non-empty piece belonging to `team`.
    #[inline(always)]
    pub fn pieces(&self, team: Team) -> impl Iterator<Item = &Piece> {
        self.squares
            .iter()
            .filter(move |piece| !piece.is_empty() && piece.team() == team)
    }

    /// Iterates over every square, paired with its occupant.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = (Square, &Piece)> {
        Square::iter().zip(self.squares.iter())
    }

    /// Number of pieces (of any kind, Kings included) belonging to `team`.
    #[inline(always)]
    pub fn count(&self, team: Team) -> usize {
        self.pieces(team).count()
    }

    /// Returns an error unless each team has exactly one King.
    pub fn validate_kings(&self) -> Result<()> {
        for team in Team::both() {
            let kings = self
                .pieces(team)
                .filter(|piece| piece.kind() == PieceKind::King)
                .count();

            if kings != 1 {
                bail!("{} must have exactly one king. Found {kings}", team.name());
            }
        }

        Ok(())
    }
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        Self::standard()
    }
}

impl Index<Square> for Board {
    type Output = Piece;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self.squares[index.index()]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}| ")?;

            for file in File::iter() {
                write!(f, "{} ", self[Square::new(file, rank)])?;
            }

            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;
        write!(f, "{} to move", self.current_turn.name())
    }
}
