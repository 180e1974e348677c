/*
scoring.rs

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

//! Compute the level rewards and the total score.
//!
//! The reward of a level is `level² × multiplier / time`, reduced by a fraction of itself for
//! each wrong answer. The reduction never goes below [`MIN_PENALTY_FACTOR`], so that a completed
//! level is always worth something.

use serde::{Deserialize, Serialize};

use crate::generator::tiers::Tier;

/// Lowest factor applied to a reward because of wrong answers.
pub const MIN_PENALTY_FACTOR: f64 = 0.1;

/// Result of a completed level.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LevelReward {
    /// Level number (starts at 1).
    pub level: usize,

    /// Time spent on the level, penalties included. At least one second.
    pub time_spent_secs: u64,

    /// Number of wrong answers before the correct one.
    pub wrong_answers: usize,

    /// Reward, rounded to two decimals.
    pub reward: f64,
}

impl LevelReward {
    /// Create a [`LevelReward`] object and compute its reward.
    pub fn new(level: usize, tier: Tier, time_spent_secs: u64, wrong_answers: usize) -> Self {
        let time_spent_secs: u64 = time_spent_secs.max(1);
        Self {
            level,
            time_spent_secs,
            wrong_answers,
            reward: level_reward(level, tier, time_spent_secs, wrong_answers),
        }
    }
}

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Factor applied to the raw reward for the given number of wrong answers.
pub fn penalty_factor(tier: Tier, wrong_answers: usize) -> f64 {
    if wrong_answers == 0 {
        return 1.0;
    }
    (1.0 - wrong_answers as f64 * tier.score_penalty_fraction()).max(MIN_PENALTY_FACTOR)
}

/// Compute the reward of a level, rounded to two decimals.
pub fn level_reward(level: usize, tier: Tier, time_spent_secs: u64, wrong_answers: usize) -> f64 {
    let level: f64 = level as f64;
    let raw: f64 = level * level * tier.score_multiplier() / time_spent_secs.max(1) as f64;
    round2(raw * penalty_factor(tier, wrong_answers))
}

/// Sum of the level rewards, rounded to two decimals.
pub fn total_score(rewards: &[LevelReward]) -> f64 {
    round2(rewards.iter().map(|r| r.reward).sum())
}
