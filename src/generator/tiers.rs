/*
tiers.rs

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

//! Difficulty tiers and per-level parameters.
//!
//! Everything here is compiled in. A [`Tier`] bundles the number of levels, the score multiplier
//! and the penalty rates. A [`LevelSpec`] gives the structural size and the time limit for a
//! given tier, puzzle kind, and level. The level tables are allowed to be shorter than the
//! number of levels in the tier: levels past the end of a table reuse its last entry.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::FromRepr;

use super::{GenerationError, PuzzleKind};

/// Difficulty tier.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Copy,
    Clone,
    PartialOrd,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    FromRepr,
    Default,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Tier {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Tier::Easy => write!(f, "Easy"),
            Tier::Medium => write!(f, "Medium"),
            Tier::Hard => write!(f, "Hard"),
            Tier::Expert => write!(f, "Expert"),
        }
    }
}

/// Parameters of a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierParams {
    /// Maximum number of levels.
    pub level_count: usize,

    /// Multiplier applied to the raw level reward. Always at least 1.
    pub score_multiplier: f64,

    /// Seconds removed from the remaining time for each wrong answer.
    pub time_penalty_secs: u64,

    /// Fraction of the level reward removed for each wrong answer (strictly between 0 and 1).
    pub score_penalty_fraction: f64,

    /// Fraction of the grid cells that are hidden from the player.
    pub hidden_fraction: f64,
}

const EASY: TierParams = TierParams {
    level_count: 5,
    score_multiplier: 1.0,
    time_penalty_secs: 5,
    score_penalty_fraction: 0.2,
    hidden_fraction: 0.25,
};

const MEDIUM: TierParams = TierParams {
    level_count: 8,
    score_multiplier: 1.5,
    time_penalty_secs: 8,
    score_penalty_fraction: 0.25,
    hidden_fraction: 0.35,
};

const HARD: TierParams = TierParams {
    level_count: 10,
    score_multiplier: 2.0,
    time_penalty_secs: 10,
    score_penalty_fraction: 0.3,
    hidden_fraction: 0.45,
};

const EXPERT: TierParams = TierParams {
    level_count: 12,
    score_multiplier: 3.0,
    time_penalty_secs: 12,
    score_penalty_fraction: 0.35,
    hidden_fraction: 0.55,
};

/// Structural size and time limit of a level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSpec {
    /// Grid dimension for the grid puzzles, number of offered codes for the code puzzles.
    pub size: usize,

    /// Nominal time to solve the level, before penalties.
    pub time_limit_secs: u64,
}

const fn spec(size: usize, time_limit_secs: u64) -> LevelSpec {
    LevelSpec {
        size,
        time_limit_secs,
    }
}

const GRID_EASY: [LevelSpec; 4] = [spec(3, 60), spec(3, 60), spec(4, 75), spec(4, 75)];
const GRID_MEDIUM: [LevelSpec; 7] = [
    spec(4, 60),
    spec(4, 60),
    spec(4, 55),
    spec(5, 75),
    spec(5, 70),
    spec(5, 65),
    spec(6, 90),
];
const GRID_HARD: [LevelSpec; 6] = [
    spec(4, 45),
    spec(5, 60),
    spec(5, 55),
    spec(6, 75),
    spec(6, 70),
    spec(6, 65),
];
const GRID_EXPERT: [LevelSpec; 6] = [
    spec(5, 50),
    spec(5, 45),
    spec(6, 60),
    spec(6, 55),
    spec(6, 50),
    spec(6, 45),
];

const CODE_EASY: [LevelSpec; 3] = [spec(3, 45), spec(3, 40), spec(4, 40)];
const CODE_MEDIUM: [LevelSpec; 4] = [spec(4, 40), spec(4, 35), spec(5, 35), spec(5, 30)];
const CODE_HARD: [LevelSpec; 3] = [spec(5, 30), spec(6, 30), spec(6, 25)];
const CODE_EXPERT: [LevelSpec; 3] = [spec(6, 25), spec(7, 20), spec(8, 20)];

impl Tier {
    /// All the tiers, from the easiest.
    pub const ALL: [Tier; 4] = [Tier::Easy, Tier::Medium, Tier::Hard, Tier::Expert];

    /// Return the parameters of the tier.
    pub fn params(self) -> &'static TierParams {
        match self {
            Tier::Easy => &EASY,
            Tier::Medium => &MEDIUM,
            Tier::Hard => &HARD,
            Tier::Expert => &EXPERT,
        }
    }

    pub fn level_count(self) -> usize {
        self.params().level_count
    }

    pub fn score_multiplier(self) -> f64 {
        self.params().score_multiplier
    }

    pub fn time_penalty_secs(self) -> u64 {
        self.params().time_penalty_secs
    }

    pub fn score_penalty_fraction(self) -> f64 {
        self.params().score_penalty_fraction
    }

    pub fn hidden_fraction(self) -> f64 {
        self.params().hidden_fraction
    }

    /// Return the level table of the tier for the given puzzle kind.
    pub fn level_table(self, kind: PuzzleKind) -> &'static [LevelSpec] {
        match (kind, self) {
            (PuzzleKind::Grid, Tier::Easy) => &GRID_EASY,
            (PuzzleKind::Grid, Tier::Medium) => &GRID_MEDIUM,
            (PuzzleKind::Grid, Tier::Hard) => &GRID_HARD,
            (PuzzleKind::Grid, Tier::Expert) => &GRID_EXPERT,
            (PuzzleKind::Code, Tier::Easy) => &CODE_EASY,
            (PuzzleKind::Code, Tier::Medium) => &CODE_MEDIUM,
            (PuzzleKind::Code, Tier::Hard) => &CODE_HARD,
            (PuzzleKind::Code, Tier::Expert) => &CODE_EXPERT,
        }
    }

    /// Return the [`LevelSpec`] for the given 1-indexed level.
    ///
    /// Levels past the end of the table are clamped to its last entry.
    ///
    /// # Errors
    ///
    /// Level 0 and levels beyond [`Tier::level_count`] have no specification.
    pub fn level_spec(self, kind: PuzzleKind, level: usize) -> Result<LevelSpec, GenerationError> {
        let table: &[LevelSpec] = self.level_table(kind);
        if level == 0 || level > self.level_count() || table.is_empty() {
            return Err(GenerationError::NoLevelSpec { tier: self, level });
        }
        Ok(table[(level - 1).min(table.len() - 1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parameters_are_within_bounds() {
        for tier in Tier::ALL {
            let p = tier.params();
            assert!(p.level_count > 0);
            assert!(p.score_multiplier >= 1.0);
            assert!(p.score_penalty_fraction > 0.0 && p.score_penalty_fraction < 1.0);
            assert!((0.25..=0.55).contains(&p.hidden_fraction));
        }
    }

    #[test]
    fn medium_tier_matches_published_rates() {
        let p = Tier::Medium.params();
        assert_eq!(p.level_count, 8);
        assert_eq!(p.score_multiplier, 1.5);
        assert_eq!(p.time_penalty_secs, 8);
        assert_eq!(p.score_penalty_fraction, 0.25);
    }

    #[test]
    fn level_spec_clamps_to_last_entry() {
        let last = *GRID_EASY.last().unwrap();
        assert_eq!(Tier::Easy.level_spec(PuzzleKind::Grid, 5), Ok(last));
        assert_eq!(Tier::Easy.level_spec(PuzzleKind::Grid, 1), Ok(GRID_EASY[0]));
        assert_eq!(
            Tier::Expert.level_spec(PuzzleKind::Code, 12),
            Ok(*CODE_EXPERT.last().unwrap())
        );
    }

    #[test]
    fn level_spec_rejects_out_of_range_levels() {
        assert_eq!(
            Tier::Easy.level_spec(PuzzleKind::Grid, 0),
            Err(GenerationError::NoLevelSpec {
                tier: Tier::Easy,
                level: 0
            })
        );
        assert!(Tier::Easy.level_spec(PuzzleKind::Code, 6).is_err());
    }

    #[test]
    fn every_level_of_every_tier_has_a_spec() {
        for tier in Tier::ALL {
            for kind in [PuzzleKind::Grid, PuzzleKind::Code] {
                for level in 1..=tier.level_count() {
                    assert!(tier.level_spec(kind, level).is_ok());
                }
            }
        }
    }
}
