/*
report.rs

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

//! Summary of a session, shown at the report stage.
//!
//! A [`Report`] is a read-only snapshot: it can be rendered as text (through [`fmt::Display`])
//! or serialized with serde.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::{Outcome, Session};
use crate::generator::PuzzleKind;
use crate::generator::tiers::Tier;
use crate::scoring::LevelReward;

/// Session summary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: PuzzleKind,
    pub tier: Tier,

    /// None while the session is still in progress.
    pub outcome: Option<Outcome>,

    /// Completed levels, in order.
    pub levels: Vec<LevelReward>,

    pub total_score: f64,

    /// Time of the completed levels plus the time of an abandoned level.
    pub total_time_secs: u64,

    /// Number of levels in the tier.
    pub level_count: usize,

    /// Reason why the session was aborted.
    pub failure: Option<String>,

    /// When the report was produced.
    pub finished_at: DateTime<Local>,
}

impl Report {
    /// Create a [`Report`] object from the state of a session.
    pub fn from_session(kind: PuzzleKind, session: &Session) -> Self {
        Self {
            kind,
            tier: session.tier(),
            outcome: session.outcome(),
            levels: session.level_rewards().to_vec(),
            total_score: session.total_score(),
            total_time_secs: session.total_time_secs(),
            level_count: session.tier().level_count(),
            failure: session.failure().map(|e| e.to_string()),
            finished_at: Local::now(),
        }
    }

    /// Number of completed levels.
    pub fn levels_completed(&self) -> usize {
        self.levels.len()
    }

    /// Render the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Format a number of seconds for display, such as `01m 05s`.
pub fn format_duration(secs: u64) -> String {
    let h: u64 = secs / 3600;
    let m: u64 = (secs % 3600) / 60;
    let s: u64 = secs % 60;
    if h > 0 {
        format!("{h:02}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m:02}m {s:02}s")
    } else {
        format!("{s:02}s")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let outcome: &str = match self.outcome {
            Some(Outcome::Completed) => "all levels completed",
            Some(Outcome::TimedOut) => "time over",
            Some(Outcome::Aborted) => "aborted",
            None => "in progress",
        };
        writeln!(f, "{} ({}): {outcome}", self.kind, self.tier)?;
        writeln!(
            f,
            "Levels completed: {}/{}",
            self.levels_completed(),
            self.level_count
        )?;
        if let Some(reason) = &self.failure {
            writeln!(f, "Reason: {reason}")?;
        }
        writeln!(f)?;
        writeln!(f, "Level       Time  Mistakes  Reward")?;
        for r in &self.levels {
            writeln!(
                f,
                "{:>5}  {:>9}  {:>8}  {:>6.2}",
                r.level,
                format_duration(r.time_spent_secs),
                r.wrong_answers,
                r.reward
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Total score: {:.2}", self.total_score)?;
        write!(
            f,
            "Total time: {}  ({})",
            format_duration(self.total_time_secs),
            self.finished_at.format("%Y-%m-%d %H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report {
            kind: PuzzleKind::Grid,
            tier: Tier::Medium,
            outcome: Some(Outcome::TimedOut),
            levels: vec![
                LevelReward::new(1, Tier::Medium, 5, 0),
                LevelReward::new(2, Tier::Medium, 71, 2),
            ],
            total_score: 0.34,
            total_time_secs: 136,
            level_count: 8,
            failure: None,
            finished_at: Local::now(),
        }
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "00s");
        assert_eq!(format_duration(65), "01m 05s");
        assert_eq!(format_duration(3725), "01h 02m 05s");
    }

    #[test]
    fn text_rendering() {
        let text = sample().to_string();
        assert!(text.starts_with("shape grid (Medium): time over"));
        assert!(text.contains("Levels completed: 2/8"));
        assert!(text.contains("    1        05s         0    0.30"));
        assert!(text.contains("Total score: 0.34"));
        assert!(text.contains("Total time: 02m 16s"));
    }

    #[test]
    fn json_rendering() {
        let report = sample();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"outcome\": \"timed_out\""));
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.levels, report.levels);
        assert_eq!(back.tier, Tier::Medium);
    }
}
