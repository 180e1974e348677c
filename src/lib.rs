/*
lib.rs

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

//! Timed puzzle progression engine.
//!
//! A session runs through the levels of a difficulty tier. Each level presents a generated
//! puzzle (see [`generator`]) against a countdown (see [`timer`]) that wrong answers shorten.
//! Solved levels earn a reward that depends on the level, the tier, the time taken, and the
//! mistakes (see [`scoring`]). The [`game::Controller`] drives the whole lifecycle, from the
//! tier selection to the final [`report::Report`].

pub mod game;
pub mod generator;
pub mod report;
pub mod scoring;
pub mod timer;

pub use game::{Completion, Controller, GameConfig, Mode, Outcome, Stage, SubmitOutcome};
pub use generator::tiers::Tier;
pub use generator::{Answer, GenerationError, Generator, Puzzle, PuzzleKind};
