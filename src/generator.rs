/*
generator.rs

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

//! Generate the puzzles played at each level.
//!
//! A [`Puzzle`] is produced by a [`Generator`] for a [`tiers::Tier`] and a level.
//! Two strategies are provided:
//!
//! * [`latin_square::LatinSquareGenerator`] builds a Latin square of shapes, hides some of the
//!   cells, and asks the player for the shape of one of the hidden cells.
//!
//! * [`codes::CodeGenerator`] shows a sequence of four shapes and the same sequence reordered by
//!   a code from a fixed catalogue. The player must pick the code among a few candidates.
//!
//! [`PuzzleKind`] selects one of the strategies. Other strategies can be plugged into the
//! game controller by implementing [`Generator`].
//!
//! Generation is deterministic for a given seed (see [`rng_from_seed`]).

pub mod codes;
pub mod latin_square;
pub mod shapes;
pub mod tiers;

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use codes::{CodeGenerator, CodeLayout};
use latin_square::{GridLayout, LatinSquareGenerator};
use shapes::Shape;
use tiers::Tier;

/// Errors raised when a puzzle cannot be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("no canonical Latin square available for a {0}x{0} grid")]
    UnsupportedGridSize(usize),

    #[error("{requested} codes requested but only {available} are available")]
    NotEnoughCodes { requested: usize, available: usize },

    #[error("the shape catalogue is too small for the puzzle")]
    NotEnoughSymbols,

    #[error("invalid code catalogue: {0}")]
    InvalidCatalogue(String),

    #[error("generated puzzle breaks its invariant: {0}")]
    BrokenInvariant(&'static str),

    #[error("no level specification for level {level} of the {tier} tier")]
    NoLevelSpec { tier: Tier, level: usize },
}

/// Puzzle family.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleKind {
    /// Latin-square grid of shapes.
    #[default]
    Grid,

    /// Permutation codes.
    Code,
}

impl PuzzleKind {
    /// Return the generator for the kind.
    pub fn generator(self) -> Box<dyn Generator> {
        match self {
            PuzzleKind::Grid => Box::new(LatinSquareGenerator),
            PuzzleKind::Code => Box::new(CodeGenerator::default()),
        }
    }
}

impl fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PuzzleKind::Grid => write!(f, "shape grid"),
            PuzzleKind::Code => write!(f, "code breaker"),
        }
    }
}

/// Value the player gives for the target of a puzzle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// Shape of a grid cell.
    Shape(Shape),

    /// Position of a code in the code catalogue.
    Code(usize),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Answer::Shape(s) => write!(f, "{} {s}", s.glyph()),
            Answer::Code(c) => write!(f, "code {}", codes::code_name(*c)),
        }
    }
}

/// Structure of a puzzle, specific to each puzzle family.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    Grid(GridLayout),
    Code(CodeLayout),
}

/// Puzzle instance for one level.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Puzzle {
    /// Tier the puzzle was generated for.
    pub tier: Tier,

    /// Level the puzzle was generated for (starts at 1).
    pub level: usize,

    /// Time to solve the puzzle, before penalties.
    pub time_limit_secs: u64,

    /// Solved structure and the unknowns.
    pub layout: Layout,

    /// Candidate answers offered to the player. Exactly one of them is correct.
    pub candidates: Vec<Answer>,

    /// Correct answer for the target.
    answer: Answer,
}

impl Puzzle {
    /// Create a [`Puzzle`] object.
    ///
    /// # Errors
    ///
    /// The candidates must contain the answer exactly once.
    pub fn new(
        tier: Tier,
        level: usize,
        time_limit_secs: u64,
        layout: Layout,
        candidates: Vec<Answer>,
        answer: Answer,
    ) -> Result<Self, GenerationError> {
        let puzzle = Self {
            tier,
            level,
            time_limit_secs,
            layout,
            candidates,
            answer,
        };
        if puzzle.correct_candidates() != 1 {
            return Err(GenerationError::BrokenInvariant(
                "exactly one candidate must match the answer",
            ));
        }
        Ok(puzzle)
    }

    pub fn kind(&self) -> PuzzleKind {
        match self.layout {
            Layout::Grid(_) => PuzzleKind::Grid,
            Layout::Code(_) => PuzzleKind::Code,
        }
    }

    /// Return the correct answer.
    pub fn answer(&self) -> Answer {
        self.answer
    }

    /// Whether the given answer is among the offered candidates.
    pub fn offers(&self, answer: &Answer) -> bool {
        self.candidates.contains(answer)
    }

    /// Whether the given answer resolves the target.
    pub fn is_correct(&self, answer: &Answer) -> bool {
        *answer == self.answer
    }

    /// Number of offered candidates that resolve the target.
    pub fn correct_candidates(&self) -> usize {
        self.candidates.iter().filter(|c| self.is_correct(c)).count()
    }
}

/// Puzzle generation strategy.
pub trait Generator: Send {
    /// Puzzle family produced by the generator.
    fn kind(&self) -> PuzzleKind;

    /// Rules shown to the player before the first level.
    fn instructions(&self) -> &'static str;

    /// Generate the puzzle for the given tier and level (starts at 1).
    ///
    /// # Errors
    ///
    /// The method returns an error when no valid puzzle can be produced for the parameters.
    fn generate(&self, tier: Tier, level: usize, rng: &mut StdRng)
    -> Result<Puzzle, GenerationError>;
}

/// Return a random number generator, seeded if a seed is provided.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::seed_from_u64(rand::rng().random()),
    }
}

/// Generate a puzzle of the given kind.
///
/// The result is reproducible when a seed is provided.
pub fn generate(
    kind: PuzzleKind,
    tier: Tier,
    level: usize,
    seed: Option<u64>,
) -> Result<Puzzle, GenerationError> {
    let mut rng: StdRng = rng_from_seed(seed);
    kind.generator().generate(tier, level, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_seed_gives_same_puzzle() {
        for kind in [PuzzleKind::Grid, PuzzleKind::Code] {
            let a = generate(kind, Tier::Hard, 3, Some(42)).unwrap();
            let b = generate(kind, Tier::Hard, 3, Some(42)).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn generator_reports_its_kind() {
        assert_eq!(PuzzleKind::Grid.generator().kind(), PuzzleKind::Grid);
        assert_eq!(PuzzleKind::Code.generator().kind(), PuzzleKind::Code);
        let p = generate(PuzzleKind::Code, Tier::Easy, 1, Some(1)).unwrap();
        assert_eq!(p.kind(), PuzzleKind::Code);
    }

    #[test]
    fn puzzle_rejects_missing_answer() {
        let p = generate(PuzzleKind::Grid, Tier::Easy, 1, Some(7)).unwrap();
        let candidates: Vec<Answer> = p
            .candidates
            .iter()
            .copied()
            .filter(|c| *c != p.answer())
            .collect();
        let err = Puzzle::new(
            p.tier,
            p.level,
            p.time_limit_secs,
            p.layout.clone(),
            candidates,
            p.answer(),
        );
        assert!(matches!(err, Err(GenerationError::BrokenInvariant(_))));
    }

    #[test]
    fn level_zero_is_an_error() {
        assert!(matches!(
            generate(PuzzleKind::Grid, Tier::Easy, 0, None),
            Err(GenerationError::NoLevelSpec { .. })
        ));
    }

    fn any_tier() -> impl Strategy<Value = Tier> {
        prop::sample::select(Tier::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn exactly_one_correct_candidate(
            seed in any::<u64>(),
            tier in any_tier(),
            level in 1usize..=12,
            code in any::<bool>(),
        ) {
            let kind = if code { PuzzleKind::Code } else { PuzzleKind::Grid };
            let level = level.min(tier.level_count());
            let p = generate(kind, tier, level, Some(seed)).unwrap();
            prop_assert_eq!(p.correct_candidates(), 1);
            prop_assert!(p.offers(&p.answer()));
        }
    }
}
