/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    io::{self, BufRead},
    ops::ControlFlow,
    sync::mpsc::{channel, Receiver, Sender},
    thread,
};

use anyhow::{bail, Context, Result};

use crate::{print_perft, Config, Game, GameCommand, MoveSearcher, UciEngine};

/// A game being played on the command line.
///
/// Every command is executed on the thread that calls [`Session::run`], one at a time, so the
/// [`Game`] is never touched concurrently.
pub struct Session {
    game: Game,

    config: Config,

    /// Launched on first use, and dropped whenever it fails to provide a move.
    searcher: Option<Box<dyn MoveSearcher>>,

    /// One half of a channel, responsible for sending commands to the session to execute.
    sender: Sender<GameCommand>,

    /// One half of a channel, responsible for receiving commands for the session to execute.
    receiver: Receiver<GameCommand>,
}

impl Session {
    /// Constructs a new [`Session`] to be executed with [`Session::run`].
    ///
    /// The game starts from [`Config::fen`], if one was supplied.
    pub fn new(config: Config) -> Result<Self> {
        let game = match &config.fen {
            Some(fen) => Game::from_fen(fen)?,
            None => Game::new(),
        };

        let (sender, receiver) = channel();

        Ok(Self {
            game,
            config,
            searcher: None,
            sender,
            receiver,
        })
    }

    /// Constructs a [`Session`] that asks `searcher` for moves instead of launching an engine.
    pub fn with_searcher(config: Config, searcher: Box<dyn MoveSearcher>) -> Result<Self> {
        let mut session = Self::new(config)?;
        session.searcher = Some(searcher);
        Ok(session)
    }

    #[inline(always)]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Queues a command to be executed by [`Session::run`].
    pub fn send_command(&self, command: GameCommand) -> Result<()> {
        self.sender
            .send(command)
            .context("Failed to queue command for the session")
    }

    /// Execute the main event loop for the session.
    ///
    /// This function spawns a thread to handle input from `stdin` and waits on received commands.
    pub fn run(&mut self) -> Result<()> {
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                log::debug!("Input handler thread stopping: {err}");
            }
        });

        println!("{}", self.game);
        self.reply_if_engine_to_move();

        while let Ok(cmd) = self.receiver.recv() {
            // Keep running, even on error
            match self.execute(cmd) {
                Ok(ControlFlow::Break(())) => break,
                Ok(ControlFlow::Continue(())) => {}
                Err(err) => eprintln!("Error: {err:#}"),
            }
        }

        Ok(())
    }

    /// Executes a single command, returning [`ControlFlow::Break`] if the session should end.
    pub fn execute(&mut self, cmd: GameCommand) -> Result<ControlFlow<()>> {
        match cmd {
            GameCommand::Move { from, to } => {
                let (from, to) = GameCommand::move_squares(&from, to.as_deref());
                let result = self.game.make_move(from, to);
                println!("{result}");

                if result.success {
                    self.announce_if_ended();
                    self.reply_if_engine_to_move();
                }
            }

            GameCommand::Display => println!("{}", self.game),

            GameCommand::Engine => self.engine_move(),

            GameCommand::Exit => return Ok(ControlFlow::Break(())),

            GameCommand::Fen => println!("{}", self.game.to_fen()),

            GameCommand::History => {
                if self.game.history().is_empty() {
                    println!("(none)");
                } else {
                    println!("{}", self.game.history());
                }
            }

            GameCommand::Moves { square } => {
                let moves = match square {
                    Some(from) => self
                        .game
                        .legal_moves_from(from)
                        .into_iter()
                        .map(|to| format!("{from}{to}"))
                        .collect(),
                    None => self
                        .game
                        .legal_moves()
                        .into_iter()
                        .map(|(from, to)| format!("{from}{to}"))
                        .collect(),
                };
                println!("{}", list_moves(moves));
            }

            GameCommand::New => self.start_over(Game::new()),

            GameCommand::Perft { depth } => {
                print_perft::<false>(&self.game, depth);
            }

            GameCommand::Splitperft { depth } => {
                print_perft::<true>(&self.game, depth);
            }

            GameCommand::Place { piece, square } => {
                self.game
                    .edit_board(|board| board.place(piece.team(), piece.kind(), square))?;
            }

            GameCommand::Take { square } => {
                let taken = self.game.edit_board(|board| board.take(square))?;
                if taken.is_empty() {
                    bail!("There is no piece on {square} to take");
                }
            }

            GameCommand::Position { fen } => {
                let game = match fen.as_slice() {
                    [] => Game::new(),
                    [startpos] if startpos == "startpos" => Game::new(),
                    _ => Game::from_fen(&fen.join(" "))?,
                };
                self.start_over(game);
                self.announce_if_ended();
            }

            GameCommand::Status => {
                println!(
                    "{} to move, {}in check, {}",
                    self.game.current_turn().name(),
                    if self.game.is_check() { "" } else { "not " },
                    self.game.outcome()
                );
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    /// Replaces the current game, telling the engine a new game has begun.
    fn start_over(&mut self, game: Game) {
        self.game = game;

        if let Some(searcher) = self.searcher.as_mut() {
            if let Err(err) = searcher.new_game() {
                log::warn!("Engine failed to start a new game: {err:#}");
                self.searcher = None;
            }
        }
    }

    fn announce_if_ended(&self) {
        if self.game.has_ended() {
            println!("Game over: {}", self.game.outcome());
        }
    }

    fn reply_if_engine_to_move(&mut self) {
        if !self.game.has_ended() && self.config.engine_plays == Some(self.game.current_turn()) {
            self.engine_move();
        }
    }

    /// Has the engine play a move for the team on move, launching it first if needed.
    fn engine_move(&mut self) {
        if self.searcher.is_none() {
            match UciEngine::spawn(self.config.engine_config()) {
                Ok(engine) => self.searcher = Some(Box::new(engine)),
                Err(err) => {
                    log::warn!("Could not launch engine: {err:#}");
                    println!("Engine unavailable");
                    return;
                }
            }
        }

        let Some(searcher) = self.searcher.as_mut() else {
            return;
        };

        let played = self.game.history().len();
        match self.game.play_engine_move(searcher.as_mut()) {
            Some(result) => {
                println!("Engine: {result}");
                if result.success {
                    if let Some(movement) = self.game.history().get(played) {
                        println!("Engine played {movement}");
                    }
                    self.announce_if_ended();
                }
            }

            // The engine may still be working on a stale request, so start fresh next time
            None => {
                println!("Engine unavailable");
                self.searcher = None;
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("game", &self.game.to_fen())
            .field("config", &self.config)
            .field("has_searcher", &self.searcher.is_some())
            .finish()
    }
}

/// Joins moves by comma-space, or `(none)` if there are none.
fn list_moves(moves: Vec<String>) -> String {
    if moves.is_empty() {
        String::from("(none)")
    } else {
        moves.join(", ")
    }
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<GameCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(256);
    let mut stdin = io::stdin().lock();

    loop {
        buffer.clear();
        let bytes = stdin
            .read_line(&mut buffer)
            .context("Failed to read line from stdin")?;

        // For ctrl + d
        if 0 == bytes {
            sender
                .send(GameCommand::Exit)
                .context("Failed to send 'exit' command after receiving empty input")?;

            bail!("Received input of 0 bytes; quitting");
        }

        let buf = buffer.trim();
        if buf.is_empty() {
            continue;
        }

        match buf.parse::<GameCommand>() {
            Ok(cmd) => sender.send(cmd).context("Failed to send command to session")?,

            Err(err) => eprintln!("{err}"),
        }
    }
}
