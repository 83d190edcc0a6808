/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{is_en_passant_move, PieceKind, Square, Team};

/// A single entry in the move ledger.
///
/// Records who moved, what moved, what stood on the destination beforehand, and where the piece went.
/// Everything else about the move (capture, castle, en passant, ...) is derived from these fields.
///
/// A castle is recorded as two entries: the King's move, immediately followed by the Rook's.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Movement {
    team: Team,
    from_kind: PieceKind,
    to_kind: PieceKind,
    from: Square,
    to: Square,

    /// Index of the entry recorded just before this one in its [`crate::History`].
    preceding: Option<usize>,
}

impl Movement {
    /// Creates a new ledger entry that is not yet attached to a history.
    #[inline(always)]
    pub const fn new(
        team: Team,
        from_kind: PieceKind,
        to_kind: PieceKind,
        from: Square,
        to: Square,
    ) -> Self {
        Self {
            team,
            from_kind,
            to_kind,
            from,
            to,
            preceding: None,
        }
    }

    #[inline(always)]
    pub(crate) fn with_preceding(mut self, preceding: Option<usize>) -> Self {
        self.preceding = preceding;
        self
    }

    /// The team that made this move.
    #[inline(always)]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// The kind of piece that moved.
    #[inline(always)]
    pub const fn from_kind(&self) -> PieceKind {
        self.from_kind
    }

    /// Whatever occupied the destination before the move.
    #[inline(always)]
    pub const fn to_kind(&self) -> PieceKind {
        self.to_kind
    }

    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// Index of the entry recorded just before this one, if any.
    #[inline(always)]
    pub const fn preceding(&self) -> Option<usize> {
        self.preceding
    }

    /// Returns `true` if this move landed on an occupied square.
    ///
    /// En passant captures land on an empty square and are therefore *not* captures by this definition.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        !matches!(self.to_kind, PieceKind::Empty)
    }

    /// Returns `true` if this is the King's half of a castle.
    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        matches!(self.from_kind, PieceKind::King) && self.from.file_delta(self.to).abs() == 2
    }

    /// Returns `true` if a Pawn advanced two ranks.
    #[inline(always)]
    pub const fn is_two_step_pawn_move(&self) -> bool {
        matches!(self.from_kind, PieceKind::Pawn) && self.from.rank_delta(self.to).abs() == 2
    }

    #[inline(always)]
    pub const fn is_pawn_move(&self) -> bool {
        matches!(self.from_kind, PieceKind::Pawn)
    }

    /// Returns `true` if this move captured en passant, given the entry recorded just before it.
    #[inline(always)]
    pub fn is_en_passant(&self, preceding: Option<&Movement>) -> bool {
        !self.is_capture() && is_en_passant_move(self.from_kind, self.from, self.to, preceding)
    }

    /// The square a Pawn passed over with this move, if it was a two-step Pawn move.
    #[inline(always)]
    pub fn bypassed_square(&self) -> Option<Square> {
        if !self.is_two_step_pawn_move() {
            return None;
        }

        self.from.offset(0, self.from.rank_delta(self.to) / 2)
    }

    /// Board notation of this move, such as `e2e4`.
    #[inline(always)]
    pub fn to_uci(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} {} -> {}",
            self.team, self.from_kind, self.from, self.to
        )?;

        if self.is_capture() {
            write!(f, " (takes {})", self.to_kind)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_movement_is_capture() {
        let quiet = Movement::new(Team::White, PieceKind::Knight, PieceKind::Empty, sq("b1"), sq("c3"));
        let capture = Movement::new(Team::White, PieceKind::Knight, PieceKind::Pawn, sq("c3"), sq("d5"));
        assert!(!quiet.is_capture());
        assert!(capture.is_capture());
    }

    #[test]
    fn test_movement_is_castle() {
        let short = Movement::new(Team::White, PieceKind::King, PieceKind::Empty, Square::E1, Square::G1);
        let long = Movement::new(Team::Black, PieceKind::King, PieceKind::Empty, Square::E8, Square::C8);
        let step = Movement::new(Team::White, PieceKind::King, PieceKind::Empty, Square::E1, Square::F1);
        let rook = Movement::new(Team::White, PieceKind::Rook, PieceKind::Empty, Square::H1, Square::F1);
        assert!(short.is_castle());
        assert!(long.is_castle());
        assert!(!step.is_castle());
        assert!(!rook.is_castle());
    }

    #[test]
    fn test_movement_is_two_step_pawn_move() {
        let double = Movement::new(Team::White, PieceKind::Pawn, PieceKind::Empty, sq("c2"), sq("c4"));
        let single = Movement::new(Team::White, PieceKind::Pawn, PieceKind::Empty, sq("c2"), sq("c3"));
        let black = Movement::new(Team::Black, PieceKind::Pawn, PieceKind::Empty, sq("d7"), sq("d5"));
        let rook = Movement::new(Team::White, PieceKind::Rook, PieceKind::Empty, sq("a1"), sq("a3"));
        assert!(double.is_two_step_pawn_move());
        assert!(!single.is_two_step_pawn_move());
        assert!(black.is_two_step_pawn_move());
        assert!(!rook.is_two_step_pawn_move());

        assert_eq!(double.bypassed_square(), Some(sq("c3")));
        assert_eq!(black.bypassed_square(), Some(sq("d6")));
        assert_eq!(single.bypassed_square(), None);
    }

    #[test]
    fn test_movement_is_en_passant() {
        let double = Movement::new(Team::Black, PieceKind::Pawn, PieceKind::Empty, sq("d7"), sq("d5"));
        let ep = Movement::new(Team::White, PieceKind::Pawn, PieceKind::Empty, sq("e5"), sq("d6"));
        let wrong_file = Movement::new(Team::White, PieceKind::Pawn, PieceKind::Empty, sq("e5"), sq("f6"));
        assert!(ep.is_en_passant(Some(&double)));
        assert!(!ep.is_en_passant(None));
        assert!(!wrong_file.is_en_passant(Some(&double)));
    }

    #[test]
    fn test_movement_display() {
        let mv = Movement::new(Team::White, PieceKind::Pawn, PieceKind::Empty, sq("c2"), sq("c4"));
        assert_eq!(mv.to_string(), "c2c4");
    }
}
