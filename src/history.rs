/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Index};

use crate::{Movement, Square};

/// Append-only ledger of every [`Movement`] executed in a game.
///
/// There is no way to remove entries; moves cannot be taken back.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct History(Vec<Movement>);

impl History {
    /// Creates an empty [`History`].
    #[inline(always)]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends `movement`, linking it to the entry recorded before it.
    pub fn push(&mut self, movement: Movement) {
        let preceding = self.0.len().checked_sub(1);
        self.0.push(movement.with_preceding(preceding));
    }

    /// The most recently executed move, if any.
    #[inline(always)]
    pub fn last(&self) -> Option<&Movement> {
        self.0.last()
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&Movement> {
        self.0.get(index)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all entries, oldest first.
    #[inline(always)]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Movement> + ExactSizeIterator {
        self.0.iter()
    }

    /// The entry recorded just before `movement`.
    #[inline(always)]
    pub fn preceding(&self, movement: &Movement) -> Option<&Movement> {
        movement.preceding().and_then(|i| self.0.get(i))
    }

    /// Returns `true` if the entry at `index` was an en passant capture.
    #[inline(always)]
    pub fn is_en_passant(&self, index: usize) -> bool {
        self.0
            .get(index)
            .is_some_and(|mv| mv.is_en_passant(self.preceding(mv)))
    }

    /// Number of completed turns.
    ///
    /// The King's half of a castle is not counted, since its Rook's half is recorded right after it.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let mut game = Game::default();
    /// assert_eq!(game.history().turn_count(), 0);
    /// assert!(game.make_move("e2", "e4").success);
    /// assert_eq!(game.history().turn_count(), 0);
    /// assert!(game.make_move("e7", "e5").success);
    /// assert_eq!(game.history().turn_count(), 1);
    /// ```
    pub fn turn_count(&self) -> usize {
        self.0.iter().filter(|mv| !mv.is_castle()).count() / 2
    }

    /// The square a Pawn just passed over with a two-step move, if the last move was one.
    #[inline(always)]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.last().and_then(Movement::bypassed_square)
    }

    /// Returns `true` if at least `limit` entries exist and none of the last `limit` was a Pawn move or a capture.
    pub fn is_move_limit_reached(&self, limit: usize) -> bool {
        if self.0.len() < limit {
            return false;
        }

        !self
            .0
            .iter()
            .rev()
            .take(limit)
            .any(|mv| mv.is_pawn_move() || mv.is_capture())
    }
}

impl Index<usize> for History {
    type Output = Movement;
    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a History {
    type IntoIter = std::slice::Iter<'a, Movement>;
    type Item = &'a Movement;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for History {
    /// Displays the ledger as numbered turns of UCI moves, with castles shown as the King's move only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut turn = 0;
        let mut plies = 0;

        for (i, mv) in self.0.iter().enumerate() {
            // The Rook's half of a castle was already shown with the King's move
            if i > 0 && self.0[i - 1].is_castle() {
                continue;
            }

            if plies % 2 == 0 {
                if turn > 0 {
                    write!(f, " ")?;
                }
                turn += 1;
                write!(f, "{turn}. {mv}")?;
            } else {
                write!(f, " {mv}")?;
            }
            plies += 1;
        }

        Ok(())
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PieceKind, Team};

    fn mv(team: Team, kind: PieceKind, captured: PieceKind, from: &str, to: &str) -> Movement {
        Movement::new(team, kind, captured, from.parse().unwrap(), to.parse().unwrap())
    }

    fn knight_shuffle(n: usize) -> History {
        let mut history = History::new();
        let hops = [
            (Team::White, "g1", "f3"),
            (Team::Black, "g8", "f6"),
            (Team::White, "f3", "g1"),
            (Team::Black, "f6", "g8"),
        ];
        for (team, from, to) in hops.into_iter().cycle().take(n) {
            history.push(mv(team, PieceKind::Knight, PieceKind::Empty, from, to));
        }
        history
    }

    #[test]
    fn test_entries_link_to_their_predecessor() {
        let history = knight_shuffle(3);
        assert_eq!(history[0].preceding(), None);
        assert_eq!(history[1].preceding(), Some(0));
        assert_eq!(history[2].preceding(), Some(1));
        assert_eq!(history.preceding(&history[2]), Some(&history[1]));
    }

    #[test]
    fn test_turn_count_skips_castling_king_moves() {
        let mut history = History::new();
        history.push(mv(Team::White, PieceKind::Pawn, PieceKind::Empty, "e2", "e4"));
        history.push(mv(Team::Black, PieceKind::Pawn, PieceKind::Empty, "e7", "e5"));
        assert_eq!(history.turn_count(), 1);

        history.push(mv(Team::White, PieceKind::King, PieceKind::Empty, "e1", "g1"));
        history.push(mv(Team::White, PieceKind::Rook, PieceKind::Empty, "h1", "f1"));
        assert_eq!(history.len(), 4);
        assert_eq!(history.turn_count(), 1);

        history.push(mv(Team::Black, PieceKind::Pawn, PieceKind::Empty, "d7", "d6"));
        assert_eq!(history.turn_count(), 2);
    }

    #[test]
    fn test_en_passant_target() {
        let mut history = History::new();
        assert_eq!(history.en_passant_target(), None);

        history.push(mv(Team::White, PieceKind::Pawn, PieceKind::Empty, "c2", "c4"));
        assert_eq!(history.en_passant_target(), "c3".parse().ok());

        history.push(mv(Team::Black, PieceKind::Pawn, PieceKind::Empty, "e7", "e6"));
        assert_eq!(history.en_passant_target(), None);
    }

    #[test]
    fn test_is_en_passant_by_index() {
        let mut history = History::new();
        history.push(mv(Team::Black, PieceKind::Pawn, PieceKind::Empty, "d7", "d5"));
        history.push(mv(Team::White, PieceKind::Pawn, PieceKind::Empty, "e5", "d6"));
        assert!(!history.is_en_passant(0));
        assert!(history.is_en_passant(1));
        assert!(!history.is_en_passant(2));
    }

    #[test]
    fn test_move_limit() {
        assert!(!knight_shuffle(149).is_move_limit_reached(150));
        assert!(knight_shuffle(150).is_move_limit_reached(150));

        // A pawn move inside the window resets the count
        let mut history = knight_shuffle(150);
        history.push(mv(Team::White, PieceKind::Pawn, PieceKind::Empty, "a2", "a3"));
        assert!(!history.is_move_limit_reached(150));

        // ...but not once it falls out of the window
        let mut history = History::new();
        history.push(mv(Team::White, PieceKind::Pawn, PieceKind::Empty, "a2", "a3"));
        for entry in knight_shuffle(150).iter() {
            history.push(*entry);
        }
        assert!(history.is_move_limit_reached(150));
    }

    #[test]
    fn test_captures_reset_the_move_limit() {
        let mut history = knight_shuffle(149);
        history.push(mv(Team::Black, PieceKind::Bishop, PieceKind::Knight, "c8", "f5"));
        assert!(!history.is_move_limit_reached(150));
    }

    #[test]
    fn test_display() {
        let mut history = History::new();
        history.push(mv(Team::White, PieceKind::Pawn, PieceKind::Empty, "e2", "e4"));
        history.push(mv(Team::Black, PieceKind::Pawn, PieceKind::Empty, "e7", "e5"));
        history.push(mv(Team::White, PieceKind::King, PieceKind::Empty, "e1", "g1"));
        history.push(mv(Team::White, PieceKind::Rook, PieceKind::Empty, "h1", "f1"));
        assert_eq!(history.to_string(), "1. e2e4 e7e5 2. e1g1");
    }
}
