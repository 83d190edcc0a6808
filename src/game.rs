/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};

use crate::{
    all_legal_moves, has_castling_rights, has_legal_moves, is_en_passant_move, is_in_check,
    valid_moves, Board, CastleSide, History, MoveSearcher, Movement, Piece, PieceKind, Rank,
    Square, Team, MOVE_LIMIT,
};

/// Why a call to [`Game::make_move`] did or did not succeed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MoveReason {
    Success,
    /// The game is already over.
    GameEnded,
    /// One of the squares could not be parsed.
    CoordOutOfRange,
    /// There is no piece on the source square.
    EmptySquare,
    /// The piece on the source square belongs to the team not on move.
    WrongTeam,
    /// The piece cannot legally move to the destination.
    IllegalMove,
}

impl MoveReason {
    /// A short, human-readable explanation.
    #[inline(always)]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Success => "move played",
            Self::GameEnded => "the game has already ended",
            Self::CoordOutOfRange => "squares must be a file a-h followed by a rank 1-8",
            Self::EmptySquare => "there is no piece on that square",
            Self::WrongTeam => "that piece belongs to the other team",
            Self::IllegalMove => "that piece cannot move there",
        }
    }
}

impl fmt::Display for MoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Result of attempting to play a move.
#[must_use]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MoveResult {
    pub success: bool,
    pub reason: MoveReason,
}

impl MoveResult {
    #[inline(always)]
    pub const fn success() -> Self {
        Self {
            success: true,
            reason: MoveReason::Success,
        }
    }

    #[inline(always)]
    pub const fn failure(reason: MoveReason) -> Self {
        Self {
            success: false,
            reason,
        }
    }
}

impl fmt::Display for MoveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "illegal: {}", self.reason)
        }
    }
}

/// Why a game ended in a draw.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DrawReason {
    /// The team to move has no legal moves, but is not in check.
    Stalemate,
    /// Too many moves in a row without a Pawn move or a capture.
    MoveLimit,
    /// Neither side has enough pieces left to deliver checkmate.
    InsufficientMaterial,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Stalemate => "stalemate",
            Self::MoveLimit => "move limit",
            Self::InsufficientMaterial => "insufficient material",
        };
        write!(f, "{reason}")
    }
}

/// The state of a game, as far as winning and losing goes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Outcome {
    Ongoing,
    Checkmate { winner: Team },
    Draw(DrawReason),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ongoing => write!(f, "ongoing"),
            Self::Checkmate { winner } => write!(f, "checkmate, {} wins", winner.name()),
            Self::Draw(reason) => write!(f, "draw by {reason}"),
        }
    }
}

/// A game of chess.
///
/// Owns the [`Board`] and the [`History`] of moves played on it, and keeps track of whether
/// the team on move is in check, checkmated, or drawn.
///
/// The basic methods you're probably looking for are [`Game::make_move`], [`Game::legal_moves`] and [`Game::to_fen`].
#[derive(Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,

    history: History,

    /// Whether the team on move is in check.
    is_check: bool,

    /// Whether the team on move is checkmated.
    is_checkmate: bool,

    /// Set if the game is drawn.
    draw: Option<DrawReason>,

    has_ended: bool,
}

impl Game {
    /// Starts a new game from the standard starting position.
    pub fn new() -> Self {
        Self::from_board(Board::standard())
    }

    /// Starts a new game on `board`, with an empty history.
    ///
    /// The status flags are computed immediately, so a game may begin already over.
    pub fn from_board(board: Board) -> Self {
        Self::with_history(board, History::new())
    }

    fn with_history(board: Board, history: History) -> Self {
        let mut game = Self {
            board,
            history,
            is_check: false,
            is_checkmate: false,
            draw: None,
            has_ended: false,
        };

        game.refresh();
        game
    }

    /// Creates a new [`Game`] from the provided FEN string.
    ///
    /// Pieces are placed without history, so castling rights are expressed by marking every King
    /// and Rook that has lost them as having moved. Pawns off their starting rank are likewise
    /// marked as moved. An en passant target is recorded as the double step that produced it.
    ///
    /// The halfmove and fullmove counters must be numbers, but are otherwise ignored.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let fen = "rnbqkbnr/pppppppp/8/8/2P5/8/PP1PPPPP/RNBQKBNR b KQkq c3 0 1";
    /// let game = Game::from_fen(fen).unwrap();
    /// assert_eq!(game.current_turn(), Team::Black);
    /// assert_eq!(game.history().en_passant_target(), "c3".parse().ok());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut split = fen.split_ascii_whitespace();

        let placements = split
            .next()
            .ok_or(anyhow!("FEN string must have piece placements."))?;
        let mut board = Board::from_placements(placements)?;
        board.validate_kings()?;

        let active_team = split.next().unwrap_or("w");
        board.set_current_turn(Team::from_uci(active_team)?);

        let castling = split.next().unwrap_or("-");
        apply_castling_rights(&mut board, castling)?;

        // Pawns that have left their starting rank can no longer double step
        for square in Square::iter() {
            let piece = &board[square];
            if piece.kind() == PieceKind::Pawn && square.rank() != Rank::second(piece.team()) {
                board.piece_at_mut(square).mark_moved();
            }
        }

        let mut history = History::new();
        let en_passant_target = split.next().unwrap_or("-");
        if en_passant_target != "-" {
            let target = Square::from_uci(en_passant_target)
                .with_context(|| format!("Invalid en passant target in FEN {fen:?}"))?;
            history.push(double_step_through(&board, target)?);
        }

        let halfmove = split.next().unwrap_or("0");
        halfmove.parse::<usize>().or(Err(anyhow!(
            "FEN string must have valid halfmove counter. Got {halfmove:?}"
        )))?;

        let fullmove = split.next().unwrap_or("1");
        fullmove.parse::<usize>().or(Err(anyhow!(
            "FEN string must have valid fullmove counter. Got {fullmove:?}"
        )))?;

        Ok(Self::with_history(board, history))
    }

    /// Generates a FEN string of the current position.
    ///
    /// The halfmove clock is always `0`, and the fullmove number is [`History::turn_count`].
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let game = Game::default();
    /// assert_eq!(game.to_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0");
    /// ```
    pub fn to_fen(&self) -> String {
        let mut castling = String::with_capacity(4);
        for team in Team::both() {
            for side in CastleSide::both() {
                if has_castling_rights(&self.board, team, side) {
                    castling.push(side.char(team));
                }
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let en_passant = self
            .history
            .en_passant_target()
            .map(Square::to_uci)
            .unwrap_or(String::from("-"));

        format!(
            "{} {} {castling} {en_passant} 0 {}",
            self.board.to_fen(),
            self.board.current_turn().to_uci(),
            self.history.turn_count()
        )
    }

    /// Resets to the standard starting position, forgetting all history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the board, for setting up positions by hand.
    ///
    /// Nothing is validated here. Call [`Game::refresh`] afterwards so the status flags match the new board.
    #[inline(always)]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Applies `edit` to the board, then refreshes the status flags.
    ///
    /// If the edit leaves either team without exactly one King, the board is put back as it was
    /// and an error is returned.
    pub fn edit_board<T>(&mut self, edit: impl FnOnce(&mut Board) -> T) -> Result<T> {
        let before = self.board.clone();
        let edited = edit(&mut self.board);

        if let Err(err) = self.board.validate_kings() {
            self.board = before;
            return Err(err.context("Board edit rejected"));
        }

        self.refresh();
        Ok(edited)
    }

    #[inline(always)]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// The [`Team`] whose turn it is.
    #[inline(always)]
    pub const fn current_turn(&self) -> Team {
        self.board.current_turn()
    }

    /// Whether the team on move is in check.
    #[inline(always)]
    pub const fn is_check(&self) -> bool {
        self.is_check
    }

    /// Whether the team on move has been checkmated.
    #[inline(always)]
    pub const fn is_checkmate(&self) -> bool {
        self.is_checkmate
    }

    /// Whether the game has been drawn.
    #[inline(always)]
    pub const fn is_draw(&self) -> bool {
        self.draw.is_some()
    }

    /// Whether no more moves may be played.
    #[inline(always)]
    pub const fn has_ended(&self) -> bool {
        self.has_ended
    }

    /// The state of the game as of the last move.
    pub fn outcome(&self) -> Outcome {
        if self.is_checkmate {
            Outcome::Checkmate {
                winner: self.current_turn().opponent(),
            }
        } else if let Some(reason) = self.draw {
            Outcome::Draw(reason)
        } else {
            Outcome::Ongoing
        }
    }

    /// Returns `true` if `team`'s King is attacked.
    #[inline(always)]
    pub fn is_in_check(&self, team: Team) -> bool {
        is_in_check(&self.board, team)
    }

    /// Returns `true` if `team` is in check and has no legal moves.
    pub fn is_in_checkmate(&self, team: Team) -> bool {
        self.is_in_check(team) && !self.can_move(team)
    }

    /// Returns `true` if the game would be drawn with `team` about to move.
    #[inline(always)]
    pub fn is_in_draw(&self, team: Team) -> bool {
        self.draw_reason(team).is_some()
    }

    /// Determines whether (and why) the game would be drawn with `team` about to move.
    pub fn draw_reason(&self, team: Team) -> Option<DrawReason> {
        if !self.is_in_check(team) && !self.can_move(team) {
            Some(DrawReason::Stalemate)
        } else if self.history.is_move_limit_reached(MOVE_LIMIT) {
            Some(DrawReason::MoveLimit)
        } else if self.is_insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else {
            None
        }
    }

    /// Returns `true` if neither side can possibly deliver checkmate.
    ///
    /// Covers King vs King, King vs King and one minor piece, and King and Bishop vs King and Bishop
    /// with both Bishops on squares of the same colour.
    pub fn is_insufficient_material(&self) -> bool {
        let white = self.board.pieces(Team::White).collect::<Vec<_>>();
        let black = self.board.pieces(Team::Black).collect::<Vec<_>>();

        if white.len() > 2 || black.len() > 2 {
            return false;
        }

        // Whatever each side has besides its King
        let companion = |pieces: Vec<&Piece>| {
            pieces
                .into_iter()
                .find(|piece| piece.kind() != PieceKind::King)
                .map(|piece| (piece.kind(), piece.square()))
        };

        match (companion(white), companion(black)) {
            (None, None) => true,

            (Some((kind, _)), None) | (None, Some((kind, _))) => {
                matches!(kind, PieceKind::Knight | PieceKind::Bishop)
            }

            (Some((a, a_square)), Some((b, b_square))) => {
                a == PieceKind::Bishop
                    && b == PieceKind::Bishop
                    && a_square.parity() == b_square.parity()
            }
        }
    }

    /// Every square the piece on `square` can legally move to.
    ///
    /// Works for either team's pieces, regardless of whose turn it is.
    pub fn legal_moves_from(&self, square: Square) -> Vec<Square> {
        let mut board = self.board.clone();
        valid_moves(&mut board, square, self.history.last(), true)
    }

    /// Every legal `(from, to)` pair for the team on move.
    pub fn legal_moves(&self) -> Vec<(Square, Square)> {
        let mut board = self.board.clone();
        all_legal_moves(&mut board, self.current_turn(), self.history.last())
    }

    /// Attempts to move the piece on `from` to `to`, where both are squares in board notation (case-insensitive).
    ///
    /// Checks, in order: that the game is still going, that both squares parse, that there is a
    /// piece on `from`, that the piece belongs to the team on move, and that it can legally reach `to`.
    /// The first failed check determines the returned [`MoveReason`].
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let mut game = Game::default();
    /// assert_eq!(game.make_move("C2", "c4"), MoveResult::success());
    /// assert_eq!(game.make_move("c4", "c5").reason, MoveReason::WrongTeam);
    /// assert_eq!(game.make_move("c9", "c5").reason, MoveReason::CoordOutOfRange);
    /// ```
    pub fn make_move(&mut self, from: &str, to: &str) -> MoveResult {
        if self.has_ended {
            return MoveResult::failure(MoveReason::GameEnded);
        }

        let (Ok(from), Ok(to)) = (Square::from_uci(from.trim()), Square::from_uci(to.trim())) else {
            return MoveResult::failure(MoveReason::CoordOutOfRange);
        };

        self.make_move_squares(from, to)
    }

    /// Same as [`Game::make_move`], with the squares already parsed.
    pub fn make_move_squares(&mut self, from: Square, to: Square) -> MoveResult {
        if self.has_ended {
            return MoveResult::failure(MoveReason::GameEnded);
        }

        let piece = &self.board[from];
        if piece.is_empty() {
            return MoveResult::failure(MoveReason::EmptySquare);
        }

        if piece.team() != self.current_turn() {
            return MoveResult::failure(MoveReason::WrongTeam);
        }

        if !valid_moves(&mut self.board, from, self.history.last(), true).contains(&to) {
            return MoveResult::failure(MoveReason::IllegalMove);
        }

        self.execute(from, to);
        MoveResult::success()
    }

    /// Asks `searcher` for a move in the current position and plays it.
    ///
    /// Returns `None` if the searcher could not provide a move. A failure to reach the searcher is
    /// logged, never propagated.
    pub fn play_engine_move(&mut self, searcher: &mut dyn MoveSearcher) -> Option<MoveResult> {
        if self.has_ended {
            return Some(MoveResult::failure(MoveReason::GameEnded));
        }

        match searcher.best_move(&self.to_fen()) {
            Ok(Some(best)) => {
                log::debug!("Engine suggests {best}");
                Some(self.make_move_squares(best.from, best.to))
            }

            Ok(None) => {
                log::warn!("Engine had no move to offer");
                None
            }

            Err(err) => {
                log::warn!("Engine unavailable: {err:#}");
                None
            }
        }
    }

    /// Recomputes the check, checkmate and draw flags for the team on move.
    pub fn refresh(&mut self) {
        let team = self.current_turn();

        self.is_check = self.is_in_check(team);
        let can_move = has_legal_moves(&mut self.board, team, self.history.last());

        self.is_checkmate = self.is_check && !can_move;
        self.draw = if self.is_checkmate {
            None
        } else if !self.is_check && !can_move {
            Some(DrawReason::Stalemate)
        } else if self.history.is_move_limit_reached(MOVE_LIMIT) {
            Some(DrawReason::MoveLimit)
        } else if self.is_insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else {
            None
        };

        self.has_ended = self.is_checkmate || self.draw.is_some();
        if self.has_ended {
            log::info!("Game over: {}", self.outcome());
        }
    }

    /// Returns `true` if `team` has any legal move.
    fn can_move(&self, team: Team) -> bool {
        let mut board = self.board.clone();
        has_legal_moves(&mut board, team, self.history.last())
    }

    /// Plays a move already known to be legal.
    fn execute(&mut self, from: Square, to: Square) {
        let piece = &self.board[from];
        let team = piece.team();
        let kind = piece.kind();
        let captured = self.board[to].kind();

        let en_passant =
            captured == PieceKind::Empty && is_en_passant_move(kind, from, to, self.history.last());

        let movement = Movement::new(team, kind, captured, from, to);
        log::debug!("{movement:?}");
        self.history.push(movement);
        self.board.relocate(from, to);

        if en_passant {
            let victim = self.board.take(Square::new(to.file(), from.rank()));
            log::debug!("{} captured en passant", victim.square());
        }

        if kind == PieceKind::King {
            if let Some(side) = CastleSide::of_king_move(from, to) {
                let (rook_from, rook_to) = (side.rook_square(team), side.rook_destination(team));
                self.history.push(Movement::new(
                    team,
                    PieceKind::Rook,
                    PieceKind::Empty,
                    rook_from,
                    rook_to,
                ));
                self.board.relocate(rook_from, rook_to);
                log::debug!("{} castled {side}", team.name());
            }
        }

        if kind == PieceKind::Pawn && to.rank() == Rank::last(team) {
            self.board.promote(to, PieceKind::Queen);
            log::debug!("{} pawn promoted on {to}", team.name());
        }

        self.board.toggle_turn();
        self.refresh();
    }
}

/// Marks every King and Rook that lacks the castling rights listed in `castling` as having moved.
fn apply_castling_rights(board: &mut Board, castling: &str) -> Result<()> {
    if castling != "-" {
        if let Some(c) = castling.chars().find(|c| !matches!(c, 'K' | 'Q' | 'k' | 'q')) {
            bail!("Invalid castling rights {castling:?}: unexpected {c:?}");
        }
    }

    for team in Team::both() {
        let mut any_rights = false;

        for side in CastleSide::both() {
            let right = side.char(team);
            if castling.contains(right) {
                if !has_castling_rights(board, team, side) {
                    bail!("Castling right {right:?} requires the {} king and rook on their starting squares", team.name());
                }
                any_rights = true;
            } else {
                let rook = side.rook_square(team);
                if board[rook].is(team, PieceKind::Rook) {
                    board.piece_at_mut(rook).mark_moved();
                }
            }
        }

        if !any_rights {
            if let Some(king) = board.king(team) {
                board.piece_at_mut(king).mark_moved();
            }
        }
    }

    Ok(())
}

/// Reconstructs the double step that passed over `target`.
fn double_step_through(board: &Board, target: Square) -> Result<Movement> {
    // The double step was made by the team *not* on move
    let team = board.current_turn().opponent();
    let forward = team.forward();

    let (Some(from), Some(to)) = (target.offset(0, -forward), target.offset(0, forward)) else {
        bail!("En passant target {target} is not reachable by a double step");
    };

    if from.rank() != Rank::second(team) || !board[to].is(team, PieceKind::Pawn) || !board[target].is_empty() {
        bail!(
            "En passant target {target} requires a {} pawn on {to} that just moved from {from}",
            team.name()
        );
    }

    Ok(Movement::new(team, PieceKind::Pawn, PieceKind::Empty, from, to))
}

impl FromStr for Game {
    type Err = anyhow::Error;
    /// Wrapper for [`Game::from_fen`]
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Default for Game {
    /// Standard starting position for Chess.
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = self.board.to_string();

        for (i, line) in board.lines().enumerate() {
            write!(f, "{line}")?;

            match i {
                0 => write!(f, "       FEN: {}", self.to_fen())?,
                1 => write!(f, "      Turn: {}", self.current_turn().name())?,
                2 => write!(f, "     Check: {}", self.is_check)?,
                3 => write!(f, "   Outcome: {}", self.outcome())?,
                4 => write!(f, "   History: {}", self.history)?,
                _ => {}
            }

            if i + 1 < board.lines().count() {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
