/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    io::{BufRead, BufReader, Write},
    process::{Child, ChildStdin, Command, Stdio},
    sync::mpsc::{channel, Receiver, RecvTimeoutError},
    thread,
    time::Instant,
};

use anyhow::{anyhow, bail, Context, Result};
use uci_parser::{UciCommand, UciResponse};

use crate::{EngineConfig, PieceKind, Square};

/// A move suggested by a [`MoveSearcher`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BestMove {
    pub from: Square,
    pub to: Square,
}

impl BestMove {
    /// Parses a move in UCI notation, such as `e2e4` or `e7e8q`.
    ///
    /// A promotion letter is accepted but discarded, since Pawns always promote to Queens.
    ///
    /// # Example
    /// ```
    /// # use gambit::*;
    /// let mv = BestMove::from_uci("e7e8q").unwrap();
    /// assert_eq!(mv.to_string(), "e7e8");
    /// assert!(BestMove::from_uci("e7e8x").is_err());
    /// assert!(BestMove::from_uci("e7").is_err());
    /// ```
    pub fn from_uci(mv: &str) -> Result<Self> {
        if !mv.is_ascii() || !(4..=5).contains(&mv.len()) {
            bail!("UCI move must be 4 or 5 ASCII characters. Got {mv:?}");
        }

        let from = Square::from_uci(&mv[0..2])?;
        let to = Square::from_uci(&mv[2..4])?;

        if let Some(promotion) = mv[4..].chars().next() {
            let kind = PieceKind::from_uci(promotion)?;
            if matches!(kind, PieceKind::Pawn | PieceKind::King) {
                bail!("Cannot promote to a {kind}. Got {mv:?}");
            }
        }

        Ok(Self { from, to })
    }
}

impl fmt::Display for BestMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Something that can pick a move for a position.
pub trait MoveSearcher {
    /// Chooses a move for the position described by `fen`.
    ///
    /// `Ok(None)` means the searcher has nothing to offer, such as in a finished game.
    fn best_move(&mut self, fen: &str) -> Result<Option<BestMove>>;

    /// Informs the searcher that subsequent positions belong to a new game.
    fn new_game(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Parses an engine's `bestmove` reply.
///
/// `bestmove (none)` and the null move `0000` yield `Ok(None)`.
///
/// # Example
/// ```
/// # use gambit::*;
/// let best = parse_best_move("bestmove g1f3 ponder d7d5").unwrap().unwrap();
/// assert_eq!(best.to_string(), "g1f3");
/// assert_eq!(parse_best_move("bestmove (none)").unwrap(), None);
/// ```
pub fn parse_best_move(line: &str) -> Result<Option<BestMove>> {
    let mut parts = line.split_ascii_whitespace();

    if parts.next() != Some("bestmove") {
        bail!("Expected a bestmove reply. Got {line:?}");
    }

    match parts.next() {
        None => bail!("bestmove reply is missing its move: {line:?}"),
        Some("(none)" | "0000") => Ok(None),
        Some(mv) => BestMove::from_uci(mv).map(Some),
    }
}

/// A UCI chess engine running as a child process.
///
/// Lines the engine writes are forwarded over a channel by a reader thread, so every wait for a
/// reply is bounded by [`EngineConfig::timeout`].
pub struct UciEngine {
    config: EngineConfig,

    process: Child,

    stdin: ChildStdin,

    /// Lines read from the engine's `stdout`.
    lines: Receiver<String>,
}

impl UciEngine {
    /// Launches the engine described by `config` and performs the UCI handshake.
    pub fn spawn(config: EngineConfig) -> Result<Self> {
        let mut process = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch engine at {:?}", config.path))?;

        let stdin = process
            .stdin
            .take()
            .context("Engine process has no stdin")?;
        let stdout = process
            .stdout
            .take()
            .context("Engine process has no stdout")?;

        let (sender, lines) = channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else {
                    break;
                };

                // The engine has been dropped; nobody is listening anymore
                if sender.send(line).is_err() {
                    break;
                }
            }
        });

        let mut engine = Self {
            config,
            process,
            stdin,
            lines,
        };

        engine.handshake()?;
        log::debug!("Engine at {:?} is ready", engine.config.path);

        Ok(engine)
    }

    /// Sends `line` to the engine, after making sure it is a well-formed UCI command.
    pub fn send(&mut self, line: &str) -> Result<()> {
        UciCommand::new(line)
            .map_err(|err| anyhow!("Refusing to send malformed UCI command {line:?}: {err}"))?;

        log::trace!("> {line}");
        writeln!(self.stdin, "{line}")
            .and_then(|_| self.stdin.flush())
            .with_context(|| format!("Failed to send {line:?} to engine"))
    }

    /// Discards engine output until a line starting with `prefix` arrives, and returns that line.
    fn await_line(&self, prefix: &str) -> Result<String> {
        let deadline = Instant::now() + self.config.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());

            match self.lines.recv_timeout(remaining) {
                Ok(line) => {
                    log::trace!("< {line}");
                    if line.trim_start().starts_with(prefix) {
                        return Ok(line);
                    }
                }

                Err(RecvTimeoutError::Timeout) => bail!(
                    "Engine did not reply with {prefix:?} within {}ms",
                    self.config.timeout.as_millis()
                ),

                Err(RecvTimeoutError::Disconnected) => {
                    bail!("Engine exited while we awaited {prefix:?}")
                }
            }
        }
    }

    fn handshake(&mut self) -> Result<()> {
        self.send("uci")?;
        self.await_line(&UciResponse::<&str>::UciOk.to_string())?;

        self.send(&format!("setoption name Skill Level value {}", self.config.skill))?;
        self.sync()
    }

    /// Blocks until the engine reports it is ready.
    fn sync(&mut self) -> Result<()> {
        self.send("isready")?;
        self.await_line(&UciResponse::<&str>::ReadyOk.to_string())
            .map(|_| ())
    }
}

impl MoveSearcher for UciEngine {
    fn best_move(&mut self, fen: &str) -> Result<Option<BestMove>> {
        self.send(&format!("position fen {fen}"))?;
        self.send(&format!("go movetime {}", self.config.movetime.as_millis()))?;

        let reply = self.await_line("bestmove")?;
        parse_best_move(&reply)
    }

    fn new_game(&mut self) -> Result<()> {
        self.send("ucinewgame")?;
        self.sync()
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Ask nicely first; the process may already be gone
        _ = writeln!(self.stdin, "quit");
        _ = self.stdin.flush();

        if let Err(err) = self.process.kill() {
            log::trace!("Engine process already exited: {err}");
        }
        _ = self.process.wait();
    }
}

impl fmt::Debug for UciEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UciEngine")
            .field("config", &self.config)
            .field("pid", &self.process.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_parse_best_move() {
        let best = parse_best_move("bestmove e2e4").unwrap().unwrap();
        assert_eq!(best.from, "e2".parse().unwrap());
        assert_eq!(best.to, "e4".parse().unwrap());

        let promotion = parse_best_move("bestmove a7a8n ponder h7h6").unwrap().unwrap();
        assert_eq!(promotion.to_string(), "a7a8");

        assert_eq!(parse_best_move("bestmove 0000").unwrap(), None);
    }

    #[test]
    fn test_malformed_best_move_is_rejected() {
        for line in [
            "",
            "bestmove",
            "info depth 1",
            "bestmove e2",
            "bestmove e2e4e6",
            "bestmove e2e9",
            "bestmove a7a8k",
            "bestmove a7a8x",
            "bestmove é2e4",
        ] {
            assert!(parse_best_move(line).is_err(), "{line:?} should not parse");
        }
    }

    /// Runs `script` with `/bin/sh` as a stand-in for a real engine.
    #[cfg(unix)]
    fn fake_engine(script: &str, timeout: Duration) -> EngineConfig {
        EngineConfig {
            path: "/bin/sh".into(),
            args: vec![String::from("-c"), String::from(script)],
            skill: 3,
            movetime: Duration::from_millis(10),
            timeout,
        }
    }

    #[cfg(unix)]
    const ANSWERS_E2E4: &str = r#"
while read -r line; do
    case "$line" in
        uci) echo "id name fake"; echo "uciok" ;;
        isready) echo "readyok" ;;
        go*) echo "info depth 1 score cp 20"; echo "bestmove e2e4 ponder e7e5" ;;
        quit) exit 0 ;;
    esac
done
"#;

    #[cfg(unix)]
    #[test]
    fn test_fake_engine_answers() {
        let config = fake_engine(ANSWERS_E2E4, Duration::from_secs(5));
        let mut engine = UciEngine::spawn(config).unwrap();

        let best = engine.best_move(crate::FEN_STARTPOS).unwrap();
        assert_eq!(best.map(|mv| mv.to_string()), Some(String::from("e2e4")));

        engine.new_game().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_engine_times_out() {
        let script = r#"
while read -r line; do
    case "$line" in
        uci) echo "uciok" ;;
        isready) echo "readyok" ;;
    esac
done
"#;
        let config = fake_engine(script, Duration::from_millis(200));
        let mut engine = UciEngine::spawn(config).unwrap();
        assert!(engine.best_move(crate::FEN_STARTPOS).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_that_exits_is_an_error() {
        let config = fake_engine("exit 0", Duration::from_secs(5));
        assert!(UciEngine::spawn(config).is_err());
    }

    #[test]
    fn test_missing_engine_is_an_error() {
        let config = EngineConfig {
            path: "./definitely/not/an/engine".into(),
            ..Default::default()
        };
        assert!(UciEngine::spawn(config).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_malformed_commands_are_not_sent() {
        let config = fake_engine(ANSWERS_E2E4, Duration::from_secs(5));
        let mut engine = UciEngine::spawn(config).unwrap();
        assert!(engine.send("definitely not uci").is_err());
    }
}
