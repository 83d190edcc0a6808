/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use crate::{Game, Square};

/// Counts the positions reachable from `game` in exactly `depth` moves.
///
/// Games that have ended have no children, and Pawns only ever promote to Queens, so counts
/// match the published tables only for positions where neither matters at the searched depth.
///
/// This performs bulk counting, meaning that, at depth 1, it returns the number of available moves
/// rather than making them.
///
/// # Example
/// ```
/// # use gambit::*;
/// assert_eq!(perft(&Game::default(), 2), 400);
/// ```
pub fn perft(game: &Game, depth: usize) -> u64 {
    // Recursion limit; return 1, since we're fathoming this node.
    if depth == 0 {
        return 1;
    }

    if game.has_ended() {
        return 0;
    }

    let moves = game.legal_moves();

    // Bulk counting; no need to recurse again just to apply a singular move and return 1.
    if depth == 1 {
        return moves.len() as u64;
    }

    moves.into_iter().fold(0, |nodes, (from, to)| {
        nodes + perft(&with_move_made(game, from, to), depth - 1)
    })
}

/// Same as [`perft`], but keeps the node count below each move available at the root.
///
/// Moves are listed in the order they were generated.
pub fn splitperft(game: &Game, depth: usize) -> Vec<((Square, Square), u64)> {
    if depth == 0 || game.has_ended() {
        return Vec::new();
    }

    game.legal_moves()
        .into_iter()
        .map(|(from, to)| {
            let nodes = perft(&with_move_made(game, from, to), depth - 1);
            ((from, to), nodes)
        })
        .collect()
}

/// Runs a perft and prints the results, returning the total node count.
///
/// If `SPLIT` is set, the count below every root move is printed first.
pub fn print_perft<const SPLIT: bool>(game: &Game, depth: usize) -> u64 {
    let now = Instant::now();

    let nodes = if SPLIT {
        let split = splitperft(game, depth);
        for ((from, to), nodes) in &split {
            println!("{from}{to}\t{nodes}");
        }

        // Depth 0 has no moves to split on, but still counts the root
        if depth == 0 {
            1
        } else {
            split.iter().map(|(_, nodes)| nodes).sum()
        }
    } else {
        perft(game, depth)
    };

    let elapsed = now.elapsed();
    let nps = nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON);

    println!("\nDepth {depth}: {nodes} nodes in {elapsed:.2?} ({:.2}M nps)", nps / 1e6);
    log::debug!("perft({depth}) = {nodes}");

    nodes
}

fn with_move_made(game: &Game, from: Square, to: Square) -> Game {
    let mut child = game.clone();
    let result = child.make_move_squares(from, to);
    debug_assert!(result.success, "{from}{to} was listed as legal: {result}");
    child
}
