/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{path::PathBuf, time::Duration};

use clap::{builder::PossibleValue, Parser, ValueEnum};

use crate::Team;

/// Default difficulty handed to the engine through its `Skill Level` option.
pub const DEFAULT_SKILL: u8 = 10;

/// Default time the engine may think per move, in milliseconds.
pub const DEFAULT_MOVETIME_MS: u64 = 1_000;

/// Default time to wait on any single engine reply, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Play chess on the command line, optionally against a UCI engine.
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path to a UCI engine executable.
    ///
    /// Defaults to a Stockfish binary under `engines/`, named after the host operating system.
    #[arg(short, long, env = "GAMBIT_ENGINE", default_value_os_t = default_engine_path())]
    pub engine: PathBuf,

    /// Extra argument passed to the engine on launch. May be repeated.
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Engine difficulty, from 0 (weakest) to 20 (strongest).
    #[arg(short, long, default_value_t = DEFAULT_SKILL, value_parser = clap::value_parser!(u8).range(0..=20))]
    pub skill: u8,

    /// Milliseconds the engine may think per move.
    #[arg(short, long, default_value_t = DEFAULT_MOVETIME_MS)]
    pub movetime: u64,

    /// Milliseconds to wait for any single reply from the engine before giving up on it.
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Let the engine reply automatically whenever it is this team's turn.
    #[arg(long, value_enum)]
    pub engine_plays: Option<Team>,

    /// Start from this position instead of the standard one.
    #[arg(long)]
    pub fen: Option<String>,
}

impl Config {
    /// Settings for launching and talking to the engine.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            path: self.engine.clone(),
            args: self.engine_args.clone(),
            skill: self.skill,
            movetime: Duration::from_millis(self.movetime),
            timeout: Duration::from_millis(self.timeout),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: default_engine_path(),
            engine_args: Vec::new(),
            skill: DEFAULT_SKILL,
            movetime: DEFAULT_MOVETIME_MS,
            timeout: DEFAULT_TIMEOUT_MS,
            engine_plays: None,
            fen: None,
        }
    }
}

/// Everything needed to launch and talk to a [`crate::UciEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// Sent as the engine's `Skill Level` option.
    pub skill: u8,
    /// Thinking time per move.
    pub movetime: Duration,
    /// Longest wait on any single reply.
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Config::default().engine_config()
    }
}

/// Location of the bundled engine for the host operating system.
pub fn default_engine_path() -> PathBuf {
    let name = if cfg!(target_os = "windows") {
        "stockfish.exe"
    } else if cfg!(target_os = "macos") {
        "stockfish-macos"
    } else {
        "stockfish"
    };

    ["engines", name].iter().collect()
}

impl ValueEnum for Team {
    fn value_variants<'a>() -> &'a [Self] {
        &[Team::White, Team::Black]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Team::White => Some(PossibleValue::new("white").alias("w")),
            Team::Black => Some(PossibleValue::new("black").alias("b")),
            Team::NoTeam => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["gambit"]).unwrap();
        assert_eq!(config.skill, DEFAULT_SKILL);
        assert_eq!(config.engine_plays, None);

        let engine = config.engine_config();
        assert_eq!(engine.movetime, Duration::from_millis(DEFAULT_MOVETIME_MS));
        assert_eq!(engine.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert!(engine.args.is_empty());
    }

    #[test]
    fn test_default_engine_lives_under_engines() {
        let path = default_engine_path();
        assert!(path.starts_with("engines"));
        assert!(path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with("stockfish")));
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "gambit",
            "--engine",
            "/usr/bin/stockfish",
            "--skill",
            "20",
            "--movetime",
            "250",
            "--engine-plays",
            "b",
            "--engine-arg",
            "--quiet",
        ])
        .unwrap();

        assert_eq!(config.engine, PathBuf::from("/usr/bin/stockfish"));
        assert_eq!(config.skill, 20);
        assert_eq!(config.engine_config().movetime, Duration::from_millis(250));
        assert_eq!(config.engine_plays, Some(Team::Black));
        assert_eq!(config.engine_args, vec![String::from("--quiet")]);
    }

    #[test]
    fn test_skill_out_of_range() {
        assert!(Config::try_parse_from(["gambit", "--skill", "21"]).is_err());
        assert!(Config::try_parse_from(["gambit", "--engine-plays", "nobody"]).is_err());
    }
}
