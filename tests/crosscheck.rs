/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Compares legal move generation against `chessie`.

use std::collections::BTreeSet;

use gambit::{Game, PieceKind, Square, FEN_KIWIPETE, FEN_STARTPOS};

const POSITIONS: &[&str] = &[
    FEN_STARTPOS,
    FEN_KIWIPETE,
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    // En passant that would expose the king along the rank
    "8/8/8/K2pP2r/8/8/8/7k w - d6 0 1",
    // Castling through an attacked square
    "r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1",
];

/// The same position, as `chessie` sees it.
fn reference(game: &Game) -> chessie::Game {
    // Fullmove counters start at 1
    let mut fields = game.to_fen().split(' ').map(String::from).collect::<Vec<_>>();
    if let Some(fullmove) = fields.last_mut() {
        *fullmove = String::from("1");
    }

    chessie::Game::from_fen(&fields.join(" ")).unwrap()
}

/// `chessie` may write castling as the King capturing its own Rook, and lists each promotion piece separately.
fn normalize(game: &Game, mv: &str) -> String {
    let mv = &mv[..4];
    let from = Square::from_uci(&mv[..2]).unwrap();
    let to = Square::from_uci(&mv[2..]).unwrap();

    let mover = &game.board()[from];
    let target = &game.board()[to];

    if mover.kind() == PieceKind::King && target.is(mover.team(), PieceKind::Rook) {
        let file = if to.file() > from.file() { 'g' } else { 'c' };
        format!("{from}{file}{}", to.rank())
    } else {
        String::from(mv)
    }
}

fn expected_moves(game: &Game) -> BTreeSet<String> {
    reference(game)
        .get_legal_moves()
        .into_iter()
        .map(|mv| normalize(game, &mv.to_string()))
        .collect()
}

fn generated_moves(game: &Game) -> BTreeSet<String> {
    game.legal_moves()
        .into_iter()
        .map(|(from, to)| format!("{from}{to}"))
        .collect()
}

fn assert_same_moves(game: &Game) {
    let expected = expected_moves(game);
    let generated = generated_moves(game);

    assert_eq!(
        generated,
        expected,
        "\nMissing: {:?}\nExtra: {:?}\n{game}",
        expected.difference(&generated).collect::<Vec<_>>(),
        generated.difference(&expected).collect::<Vec<_>>(),
    );
}

#[test]
fn test_positions_match_reference() {
    for fen in POSITIONS {
        assert_same_moves(&Game::from_fen(fen).unwrap());
    }
}

/// Small linear congruential generator, so walks are repeatable.
struct Walk(u64);

impl Walk {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) % bound as u64) as usize
    }
}

#[test]
fn test_random_walks_match_reference() {
    for (seed, fen) in POSITIONS.iter().enumerate() {
        let mut game = Game::from_fen(fen).unwrap();
        let mut walk = Walk(seed as u64 + 1);

        for _ in 0..40 {
            if game.has_ended() {
                break;
            }

            assert_same_moves(&game);

            let moves = game.legal_moves();
            let (from, to) = moves[walk.next(moves.len())];
            let res = game.make_move_squares(from, to);
            assert!(res.success, "{from}{to} failed: {res}\n{game}");
        }
    }
}
