/*
cli_options.rs

Copyright 2025 The Cogniplay developers

This file is part of Cogniplay.

Cogniplay is free software: you can redistribute it and/or modify it under the
terms of the GNU General Public License as published by the Free Software
Foundation, either version 3 of the License, or (at your option) any later
version.

Cogniplay is distributed in the hope that it will be useful, but WITHOUT ANY
WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
A PARTICULAR PURPOSE. See the GNU General Public License for more details.

You should have received a copy of the GNU General Public License along with
Cogniplay. If not, see <https://www.gnu.org/licenses/>.

SPDX-License-Identifier: GPL-3.0-or-later
*/

//! Process command-line options.
//!
//! Without options, Cogniplay starts a game in the terminal. The `--ls` and `--count` options
//! are intended for developers tuning the level tables.
//!
//! # Examples
//!
//! List the tiers and the level tables of the code puzzles:
//!
//! ```
//! $ cogniplay --ls --kind code
//! Easy: 5 levels, multiplier 1, penalty 5s / 20%
//!   level 1: 3 codes, 45s
//!   level 2: 3 codes, 40s
//!   level 3: 4 codes, 40s
//! ...
//! ```
//!
//! Generate three grid puzzles for level 4 of the hard tier:
//!
//! ```
//! $ cogniplay -c 3 -l 4 -f hard --seed 12
//! ```

use clap::Parser;
use log::debug;
use std::env;

use cogniplay::game::Mode;
use cogniplay::generator::tiers::{LevelSpec, Tier};
use cogniplay::generator::{self, GenerationError, Puzzle, PuzzleKind, rng_from_seed};

use crate::terminal;

const COPYRIGHT_NOTICE: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nCopyright 2025 The Cogniplay developers\n",
    "License GPL-3.0-or-later <https://www.gnu.org/licenses/gpl-3.0.html>"
);

/// Timed puzzle game.
#[derive(Parser)]
#[command(about, long_about = None, version, long_version = COPYRIGHT_NOTICE)]
struct Args {
    /// Puzzle family
    #[arg(value_enum, short, long, default_value_t = PuzzleKind::Grid)]
    kind: PuzzleKind,

    /// Difficulty tier
    #[arg(value_enum, short = 'f', long, default_value_t = Tier::Easy)]
    difficulty: Tier,

    /// Seed for reproducible puzzles
    #[arg(short, long)]
    seed: Option<u64>,

    /// Practice run: the final score is not recorded
    #[arg(long, default_value_t = false)]
    preview: bool,

    /// Player identifier, passed through to the score record
    #[arg(long, default_value = "anonymous")]
    player: String,

    /// Do not show the rules before the first level
    #[arg(long, default_value_t = false)]
    skip_instructions: bool,

    /// Print the report and the generated puzzles as JSON
    #[arg(short, long, default_value_t = false)]
    json: bool,

    /// List the tiers and their level tables
    #[arg(long, default_value_t = false)]
    ls: bool,

    /// Number of puzzles to generate instead of playing
    #[arg(short, long)]
    count: Option<usize>,

    /// Level of the generated puzzles
    #[arg(short, long, default_value_t = 1, requires = "count")]
    level: usize,

    /// Enable debug messages
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

/// Parse and process command-line options, and return the exit code.
pub fn parse() -> u8 {
    let args: Args = Args::parse();

    if args.debug {
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    env_logger::init();
    debug!("Seed = {:?}, kind = {}", args.seed, args.kind);

    if args.ls {
        list_tiers(args.kind);
        return 0;
    }

    if let Some(count) = args.count {
        return match dump_puzzles(&args, count) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {e}");
                1
            }
        };
    }

    let options = terminal::PlayOptions {
        kind: args.kind,
        tier: args.difficulty,
        seed: args.seed,
        mode: if args.preview {
            Mode::Preview
        } else {
            Mode::Assessment
        },
        player_id: args.player,
        show_instructions: !args.skip_instructions,
        json: args.json,
    };
    match terminal::play(options) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

/// Print the parameters of every tier and its level table.
fn list_tiers(kind: PuzzleKind) {
    let unit: &str = match kind {
        PuzzleKind::Grid => "grid",
        PuzzleKind::Code => "codes",
    };
    for tier in Tier::ALL {
        println!(
            "{tier}: {} levels, multiplier {}, penalty {}s / {}%",
            tier.level_count(),
            tier.score_multiplier(),
            tier.time_penalty_secs(),
            (tier.score_penalty_fraction() * 100.0).round()
        );
        for level in 1..=tier.level_count() {
            match tier.level_spec(kind, level) {
                Ok(LevelSpec {
                    size,
                    time_limit_secs,
                }) => {
                    let size: String = match kind {
                        PuzzleKind::Grid => format!("{size}x{size}"),
                        PuzzleKind::Code => format!("{size}"),
                    };
                    println!("  level {level}: {size} {unit}, {time_limit_secs}s");
                }
                Err(e) => println!("  level {level}: {e}"),
            }
        }
    }
}

/// Generate and print puzzles.
fn dump_puzzles(args: &Args, count: usize) -> Result<(), GenerationError> {
    let mut rng = rng_from_seed(args.seed);
    let generator: Box<dyn generator::Generator> = args.kind.generator();
    let mut puzzles: Vec<Puzzle> = Vec::with_capacity(count);
    for i in 0..count {
        debug!("Iteration {i}");
        puzzles.push(generator.generate(args.difficulty, args.level, &mut rng)?);
    }

    if args.json {
        match serde_json::to_string_pretty(&puzzles) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Cannot serialize the puzzles: {e}"),
        }
        return Ok(());
    }
    for (i, p) in puzzles.iter().enumerate() {
        println!(
            "# Puzzle {} ({} {}, level {}, {}s)",
            i + 1,
            p.kind(),
            p.tier,
            p.level,
            p.time_limit_secs
        );
        print!("{}", terminal::render_puzzle(p));
        println!("Answer: {}\n", p.answer());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn long_version_credits_the_project() {
        let command = Args::command();
        let version: &str = command.get_long_version().unwrap_or_default();
        assert!(version.contains("Copyright 2025 The Cogniplay developers"));
        assert!(version.contains("GPL-3.0-or-later"));
    }

    #[test]
    fn level_requires_count() {
        assert!(Args::try_parse_from(["cogniplay", "--level", "3"]).is_err());
        let args = Args::try_parse_from(["cogniplay", "-c", "2", "-l", "3"]).unwrap();
        assert_eq!((args.count, args.level), (Some(2), 3));
    }
}
