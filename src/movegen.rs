/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref};

use crate::{Board, File, Movement, Piece, PieceKind, Rank, Square, Team};

/// Unit vectors along files and ranks.
pub const ORTHOGONALS: &[(i8, i8)] = &[(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Unit vectors along diagonals.
pub const DIAGONALS: &[(i8, i8)] = &[(1, 1), (-1, 1), (-1, -1), (1, -1)];

/// All eight unit vectors, used by both the Queen and the King.
pub const ALL_DIRECTIONS: &[(i8, i8)] = &[
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// The L-shaped jumps of a Knight.
pub const KNIGHT_JUMPS: &[(i8, i8)] = &[
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const NO_RAYS: &[(i8, i8)] = &[];

/// Longest distance a slider can travel in one move.
const MAX_STEPS: u8 = 7;

/// Direction vectors and maximum step count for a kind of piece.
///
/// Pawns and empty squares walk no rays here; Pawns are special-cased entirely.
#[inline(always)]
const fn rays(kind: PieceKind) -> (&'static [(i8, i8)], u8) {
    match kind {
        PieceKind::Rook => (ORTHOGONALS, MAX_STEPS),
        PieceKind::Bishop => (DIAGONALS, MAX_STEPS),
        PieceKind::Queen => (ALL_DIRECTIONS, MAX_STEPS),
        PieceKind::King => (ALL_DIRECTIONS, 1),
        PieceKind::Knight => (KNIGHT_JUMPS, 1),
        PieceKind::Pawn | PieceKind::Empty => (NO_RAYS, 0),
    }
}

/// One of the two ways a King can castle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CastleSide {
    /// Towards the `h` file.
    Short,
    /// Towards the `a` file.
    Long,
}

impl CastleSide {
    #[inline(always)]
    pub const fn both() -> [Self; 2] {
        [Self::Short, Self::Long]
    }

    /// File direction the King travels in.
    #[inline(always)]
    pub const fn direction(&self) -> i8 {
        match self {
            Self::Short => 1,
            Self::Long => -1,
        }
    }

    /// File the castling Rook starts on.
    #[inline(always)]
    pub const fn rook_file(&self) -> File {
        match self {
            Self::Short => File::H,
            Self::Long => File::A,
        }
    }

    /// Square `team`'s King must start on to castle.
    #[inline(always)]
    pub const fn king_square(team: Team) -> Square {
        Square::new(File::E, Rank::first(team))
    }

    /// Square `team`'s castling Rook starts on.
    #[inline(always)]
    pub const fn rook_square(&self, team: Team) -> Square {
        Square::new(self.rook_file(), Rank::first(team))
    }

    /// Where `team`'s King lands: two squares towards the Rook.
    #[inline(always)]
    pub const fn king_destination(&self, team: Team) -> Square {
        let file = match self {
            Self::Short => File::G,
            Self::Long => File::C,
        };
        Square::new(file, Rank::first(team))
    }

    /// Where `team`'s Rook lands: the square the King passed over, next to the King's destination.
    #[inline(always)]
    pub const fn rook_destination(&self, team: Team) -> Square {
        let file = match self {
            Self::Short => File::F,
            Self::Long => File::D,
        };
        Square::new(file, Rank::first(team))
    }

    /// Determines which side a King is castling towards, if `from -> to` is a castle at all.
    #[inline(always)]
    pub const fn of_king_move(from: Square, to: Square) -> Option<Self> {
        match from.file_delta(to) {
            2 => Some(Self::Short),
            -2 => Some(Self::Long),
            _ => None,
        }
    }

    /// Castling rights character in FEN: `K`/`Q` for White, `k`/`q` for Black.
    #[inline(always)]
    pub const fn char(&self, team: Team) -> char {
        let c = match self {
            Self::Short => 'k',
            Self::Long => 'q',
        };

        match team {
            Team::White => c.to_ascii_uppercase(),
            _ => c,
        }
    }
}

impl fmt::Display for CastleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "O-O"),
            Self::Long => write!(f, "O-O-O"),
        }
    }
}

/// A hypothetical move applied directly to a [`Board`].
///
/// The moving piece is relocated (without touching its history) and any captured piece is lifted
/// off the board. Everything is put back exactly as it was when the probe is dropped.
pub(crate) struct Probe<'a> {
    board: &'a mut Board,
    from: Square,
    to: Square,
    displaced: Piece,
    lifted: Option<Piece>,
}

impl<'a> Probe<'a> {
    /// Moves the piece on `from` to `to`, also removing the piece on `lift` if one is provided.
    pub(crate) fn new(board: &'a mut Board, from: Square, to: Square, lift: Option<Square>) -> Self {
        let mut mover = board.take(from);
        let lifted = lift.map(|square| board.take(square));

        mover.force_square(to);
        let displaced = std::mem::replace(board.piece_at_mut(to), mover);

        Self {
            board,
            from,
            to,
            displaced,
            lifted,
        }
    }
}

impl Deref for Probe<'_> {
    type Target = Board;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.board
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        let displaced = std::mem::replace(&mut self.displaced, Piece::empty(self.to));
        let mut mover = std::mem::replace(self.board.piece_at_mut(self.to), displaced);
        mover.force_square(self.from);
        *self.board.piece_at_mut(self.from) = mover;

        if let Some(lifted) = self.lifted.take() {
            let square = lifted.square();
            *self.board.piece_at_mut(square) = lifted;
        }
    }
}

/// Returns `true` if a `kind` moving `from -> to` would capture en passant, given the move played just before.
///
/// That is: the last move was a Pawn's double step, the mover is a Pawn on the same rank the
/// double-stepping Pawn landed on, and the mover is heading for that Pawn's file.
/// Whether the destination is empty is up to the caller.
///
/// # Example
/// ```
/// # use gambit::*;
/// let double_step = Movement::new(Team::Black, PieceKind::Pawn, PieceKind::Empty, "d7".parse().unwrap(), "d5".parse().unwrap());
/// let (e5, d6) = ("e5".parse().unwrap(), "d6".parse().unwrap());
/// assert!(is_en_passant_move(PieceKind::Pawn, e5, d6, Some(&double_step)));
/// assert!(!is_en_passant_move(PieceKind::Pawn, e5, d6, None));
/// ```
pub fn is_en_passant_move(
    kind: PieceKind,
    from: Square,
    to: Square,
    last_move: Option<&Movement>,
) -> bool {
    let Some(last) = last_move else {
        return false;
    };

    kind == PieceKind::Pawn
        && last.is_two_step_pawn_move()
        && last.to().rank() == from.rank()
        && last.to().file() == to.file()
}

/// Walks every ray from `from`, stopping at the edge of the board or the first occupied square.
///
/// Squares held by `team` are excluded; squares held by anyone else are included as captures.
fn ray_walk(
    board: &Board,
    from: Square,
    team: Team,
    directions: &[(i8, i8)],
    max_steps: u8,
    moves: &mut Vec<Square>,
) {
    for &(df, dr) in directions {
        let mut current = from;

        for _ in 0..max_steps {
            let Some(next) = current.offset(df, dr) else {
                break;
            };

            let occupant = &board[next];
            if occupant.is_empty() {
                moves.push(next);
                current = next;
                continue;
            }

            if occupant.team() != team {
                moves.push(next);
            }
            break;
        }
    }
}

/// Pawns push forward onto empty squares only, and capture diagonally only.
fn pawn_moves(board: &Board, pawn: &Piece, last_move: Option<&Movement>, moves: &mut Vec<Square>) {
    let from = pawn.square();
    let team = pawn.team();
    let forward = team.forward();
    let steps = if pawn.has_moved() { 1 } else { 2 };

    let mut current = from;
    for _ in 0..steps {
        let Some(next) = current.offset(0, forward) else {
            break;
        };

        if !board[next].is_empty() {
            break;
        }

        moves.push(next);
        current = next;
    }

    for df in [-1, 1] {
        let Some(to) = from.offset(df, forward) else {
            continue;
        };

        let target = &board[to];
        if target.is_empty() {
            if is_en_passant_move(PieceKind::Pawn, from, to, last_move) {
                moves.push(to);
            }
        } else if target.team() == team.opponent() {
            moves.push(to);
        }
    }
}

/// Returns `true` if `team` could castle on `side` as far as piece placement alone is concerned.
///
/// Both the King and the Rook must be on their starting squares, never having moved,
/// with every square between them empty.
fn castle_is_open(board: &Board, team: Team, side: CastleSide) -> bool {
    if !has_castling_rights(board, team, side) {
        return false;
    }

    let king = CastleSide::king_square(team);
    let rook = side.rook_square(team);
    let rank = Rank::first(team);

    let (low, high) = if king.file() < rook.file() {
        (king.file().0, rook.file().0)
    } else {
        (rook.file().0, king.file().0)
    };

    (low + 1..high).all(|file| board[Square::new(File(file), rank)].is_empty())
}

/// Returns `true` if neither `team`'s King nor its Rook on `side` has ever moved.
///
/// Once either piece moves, this is `false` for the rest of the game, even if the piece returns
/// to its starting square. This is what the castling field of a FEN string reports.
pub fn has_castling_rights(board: &Board, team: Team, side: CastleSide) -> bool {
    let king = &board[CastleSide::king_square(team)];
    let rook = &board[side.rook_square(team)];

    king.is(team, PieceKind::King)
        && !king.has_moved()
        && rook.is(team, PieceKind::Rook)
        && !rook.has_moved()
}

/// Returns `true` if `team` may castle on `side`.
///
/// If `enforce_check` is set, castling is also refused if the King is in check, would cross
/// an attacked square, or would land in check.
pub fn can_castle(board: &mut Board, team: Team, side: CastleSide, enforce_check: bool) -> bool {
    if !castle_is_open(board, team, side) {
        return false;
    }

    if !enforce_check {
        return true;
    }

    if is_in_check(board, team) {
        return false;
    }

    let king = CastleSide::king_square(team);
    [side.rook_destination(team), side.king_destination(team)]
        .into_iter()
        .all(|square| {
            let probe = Probe::new(board, king, square, None);
            !is_in_check(&probe, team)
        })
}

/// Returns `true` if `team`'s King may castle on at least one side.
pub fn king_can_castle(board: &mut Board, team: Team, enforce_check: bool) -> bool {
    CastleSide::both()
        .into_iter()
        .any(|side| can_castle(board, team, side, enforce_check))
}

/// Destinations of the King for every side `team` can castle on, ignoring check.
fn castle_moves(board: &Board, team: Team, moves: &mut Vec<Square>) {
    for side in CastleSide::both() {
        if castle_is_open(board, team, side) {
            moves.push(side.king_destination(team));
        }
    }
}

/// Every square the piece on `from` could move to by its movement rules alone.
///
/// Ignores whether the move would leave its own King in check. `last_move` is the most recent entry
/// in the game's history, needed to recognize en passant.
///
/// # Example
/// ```
/// # use gambit::*;
/// let board = Board::standard();
/// let moves = pseudo_legal_moves(&board, "g1".parse().unwrap(), None);
/// assert_eq!(moves.len(), 2); // f3 and h3
/// ```
pub fn pseudo_legal_moves(board: &Board, from: Square, last_move: Option<&Movement>) -> Vec<Square> {
    let piece = &board[from];
    let mut moves = Vec::with_capacity(28);

    match piece.kind() {
        PieceKind::Empty => {}

        PieceKind::Pawn => pawn_moves(board, piece, last_move, &mut moves),

        kind => {
            let (directions, max_steps) = rays(kind);
            ray_walk(board, from, piece.team(), directions, max_steps, &mut moves);

            if kind == PieceKind::King && from == CastleSide::king_square(piece.team()) {
                castle_moves(board, piece.team(), &mut moves);
            }
        }
    }

    moves
}

/// Returns `true` if `team`'s King is attacked by any of the opponent's pseudo-legal moves.
///
/// A team without a King is always considered to be in check.
pub fn is_in_check(board: &Board, team: Team) -> bool {
    let Some(king) = board.king(team) else {
        log::error!("No {} king on the board; treating it as in check", team.name());
        return true;
    };

    board
        .pieces(team.opponent())
        .any(|piece| pseudo_legal_moves(board, piece.square(), None).contains(&king))
}

/// Returns `true` if moving `from -> to` would not leave the mover's King in check.
///
/// Castling additionally requires that the King is not in check before the move and does not cross check.
fn leaves_king_safe(board: &mut Board, from: Square, to: Square, last_move: Option<&Movement>) -> bool {
    let piece = &board[from];
    let team = piece.team();
    let kind = piece.kind();

    if kind == PieceKind::King {
        if let Some(side) = CastleSide::of_king_move(from, to) {
            if !can_castle(board, team, side, true) {
                return false;
            }
        }
    }

    let lift = (board[to].is_empty() && is_en_passant_move(kind, from, to, last_move))
        .then(|| Square::new(to.file(), from.rank()));

    let probe = Probe::new(board, from, to, lift);
    !is_in_check(&probe, team)
}

/// Every square the piece on `from` could move to.
///
/// With `enforce_king_safety` set, moves that would leave the mover's own King in check are removed.
/// The board is probed in place but is always left exactly as it was found.
pub fn valid_moves(
    board: &mut Board,
    from: Square,
    last_move: Option<&Movement>,
    enforce_king_safety: bool,
) -> Vec<Square> {
    let moves = pseudo_legal_moves(board, from, last_move);

    if !enforce_king_safety {
        return moves;
    }

    moves
        .into_iter()
        .filter(|&to| leaves_king_safe(board, from, to, last_move))
        .collect()
}

/// Every legal `(from, to)` pair for `team`.
pub fn all_legal_moves(board: &mut Board, team: Team, last_move: Option<&Movement>) -> Vec<(Square, Square)> {
    let origins = board.pieces(team).map(Piece::square).collect::<Vec<_>>();

    origins
        .into_iter()
        .flat_map(|from| {
            valid_moves(board, from, last_move, true)
                .into_iter()
                .map(move |to| (from, to))
        })
        .collect()
}

/// Returns `true` if `team` has at least one legal move.
pub fn has_legal_moves(board: &mut Board, team: Team, last_move: Option<&Movement>) -> bool {
    let origins = board.pieces(team).map(Piece::square).collect::<Vec<_>>();

    origins.into_iter().any(|from| {
        pseudo_legal_moves(board, from, last_move)
            .into_iter()
            .any(|to| leaves_king_safe(board, from, to, last_move))
    })
}
