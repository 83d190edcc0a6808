/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{anyhow, Result};
use gambit::*;

fn sq(s: &str) -> Square {
    Square::from_uci(s).unwrap()
}

fn play(game: &mut Game, moves: &[&str]) {
    for mv in moves {
        let (from, to) = mv.split_at(2);
        let res = game.make_move(from, to);
        assert!(res.success, "{mv} failed: {res}\n{game}");
    }
}

fn non_castle_entries(game: &Game) -> usize {
    game.history().iter().filter(|mv| !mv.is_castle()).count()
}

#[test]
fn test_double_step_fen() {
    let mut game = Game::default();
    play(&mut game, &["c2c4"]);

    assert!(game.board()[sq("c2")].is_empty());
    assert!(game.board()[sq("c4")].is(Team::White, PieceKind::Pawn));
    assert_eq!(game.current_turn(), Team::Black);
    assert_eq!(
        game.to_fen(),
        "rnbqkbnr/pppppppp/8/8/2P5/8/PP1PPPPP/RNBQKBNR b KQkq c3 0 0"
    );
}

#[test]
fn test_fools_mate() {
    let mut game = Game::default();
    play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);

    assert!(game.is_in_checkmate(Team::White));
    assert!(game.is_check());
    assert!(game.has_ended());
    assert!(!game.is_draw());
    assert_eq!(
        game.outcome(),
        Outcome::Checkmate {
            winner: Team::Black
        }
    );

    assert_eq!(game.make_move("a2", "a3").reason, MoveReason::GameEnded);
    assert_eq!(game.history().len(), 4);
}

#[test]
fn test_bare_kings_draw() {
    let mut game = Game::default();

    // Edit the board in place, without refreshing, so the game is still running
    let board = game.board_mut();
    board.clear();
    board.place(Team::White, PieceKind::King, Square::A1);
    board.place(Team::Black, PieceKind::King, Square::H8);
    assert!(!game.has_ended());

    play(&mut game, &["a1a2"]);

    assert!(game.is_draw());
    assert!(game.has_ended());
    assert_eq!(
        game.outcome(),
        Outcome::Draw(DrawReason::InsufficientMaterial)
    );
}

#[test]
fn test_bare_kings_are_drawn_from_the_start() {
    let mut board = Board::new();
    board.place(Team::White, PieceKind::King, Square::A1);
    board.place(Team::Black, PieceKind::King, Square::H8);

    let mut game = Game::from_board(board);
    assert!(game.is_draw());
    assert_eq!(game.make_move("a1", "a2").reason, MoveReason::GameEnded);
}

#[test]
fn test_long_castle_moves_the_rook() {
    let mut game = Game::default();
    for square in ["b1", "c1", "d1", "b8", "c8", "d8"] {
        game.board_mut().take(sq(square));
    }
    game.refresh();

    assert!(can_castle(
        &mut game.board().clone(),
        Team::White,
        CastleSide::Long,
        true
    ));

    play(&mut game, &["e1c1"]);

    assert!(game.board()[sq("c1")].is(Team::White, PieceKind::King));
    assert!(game.board()[sq("d1")].is(Team::White, PieceKind::Rook));
    assert!(game.board()[sq("a1")].is_empty());
    assert!(game.board()[sq("e1")].is_empty());

    // The King's half and the Rook's half, counted as a single turn
    assert_eq!(game.history().len(), 2);
    assert_eq!(non_castle_entries(&game), 1);
    assert_eq!(game.current_turn(), Team::Black);

    let turns = game.history().turn_count();
    play(&mut game, &["e8c8"]);
    assert_eq!(game.history().len(), 4);
    assert_eq!(game.history().turn_count(), turns + 1);
    assert!(game.board()[sq("d8")].is(Team::Black, PieceKind::Rook));

    assert_eq!(game.to_fen(), "2kr1bnr/pppppppp/8/8/8/8/PPPPPPPP/2KR1BNR w - - 0 1");
}

#[test]
fn test_promotion_makes_a_queen() {
    let mut game: Game = "7k/P7/8/8/8/8/8/K7 w - - 0 1".parse().unwrap();
    play(&mut game, &["a7a8"]);

    assert!(game.board()[sq("a8")].is(Team::White, PieceKind::Queen));
    assert!(game.board()[sq("a7")].is_empty());

    // The new Queen checks along the back rank
    assert!(game.is_check());
    assert!(!game.has_ended());
}

#[test]
fn test_en_passant_only_right_after_double_step() {
    let mut game = Game::default();
    play(&mut game, &["e2e4", "a7a6", "e4e5", "d7d5"]);
    assert!(game.legal_moves_from(sq("e5")).contains(&sq("d6")));

    // Let the chance pass; it does not come back
    play(&mut game, &["h2h3", "h7h6"]);
    assert!(!game.legal_moves_from(sq("e5")).contains(&sq("d6")));
}

#[test]
fn test_check_filtering_leaves_board_untouched() {
    let game = Game::from_fen(FEN_KIWIPETE).unwrap();

    for (square, piece) in game.board().iter() {
        if piece.is_empty() {
            continue;
        }

        let mut board = game.board().clone();
        let first = valid_moves(&mut board, square, game.history().last(), true);
        assert_eq!(board, *game.board(), "probing {square} changed the board");

        let second = valid_moves(&mut board, square, game.history().last(), true);
        assert_eq!(first, second);
    }
}

#[test]
fn test_slider_stops_at_first_blocker() {
    let game: Game = "4k3/8/8/8/1p1R2P1/8/8/4K3 w - - 0 1".parse().unwrap();
    let moves = game.legal_moves_from(sq("d4"));

    assert!(moves.contains(&sq("b4")));
    assert!(!moves.contains(&sq("a4")));
    assert!(moves.contains(&sq("f4")));
    assert!(!moves.contains(&sq("g4")));
    assert!(!moves.contains(&sq("h4")));
}

/// Plays whatever move it was built with, or fails.
struct FixedSearcher(Option<&'static str>);

impl MoveSearcher for FixedSearcher {
    fn best_move(&mut self, _fen: &str) -> Result<Option<BestMove>> {
        let mv = self.0.ok_or(anyhow!("engine is offline"))?;
        BestMove::from_uci(mv).map(Some)
    }
}

#[test]
fn test_engine_moves() {
    let mut game = Game::default();

    let played = game.play_engine_move(&mut FixedSearcher(Some("g1f3")));
    assert_eq!(played, Some(MoveResult::success()));
    assert!(game.board()[sq("f3")].is(Team::White, PieceKind::Knight));

    let illegal = game.play_engine_move(&mut FixedSearcher(Some("e7e4")));
    assert_eq!(illegal.map(|res| res.reason), Some(MoveReason::IllegalMove));

    let before = game.clone();
    assert_eq!(game.play_engine_move(&mut FixedSearcher(None)), None);
    assert_eq!(game, before);

    assert_eq!(game.play_engine_move(&mut FixedSearcher(Some("e7e9"))), None);
    assert_eq!(game, before);
}
