/*
session_flow.rs

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

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use cogniplay::timer::ManualClock;
use cogniplay::{
    Completion, Controller, GameConfig, Mode, Outcome, PuzzleKind, Stage, SubmitOutcome, Tier,
};

fn medium_session(kind: PuzzleKind, clock: &ManualClock) -> Controller {
    let mut controller = Controller::new(kind, Mode::Assessment, "learner-42")
        .with_seed(2025)
        .with_clock(Arc::new(clock.clone()));
    assert_eq!(
        controller.configure(GameConfig {
            tier: Tier::Medium,
            show_instructions: true,
        }),
        Ok(Stage::Instructions)
    );
    controller.acknowledge_instructions(true).unwrap();
    assert_eq!(controller.start(), Ok(Stage::Play));
    controller
}

#[test]
fn medium_first_level_scores_point_three() {
    for kind in [PuzzleKind::Grid, PuzzleKind::Code] {
        let clock = ManualClock::new();
        let mut controller = medium_session(kind, &clock);
        clock.advance_secs(5);
        let answer = controller.puzzle().unwrap().answer();
        let SubmitOutcome::Correct { reward, next } = controller.submit(&answer).unwrap() else {
            panic!("correct answer expected");
        };
        assert_eq!(reward.reward, 0.3);
        assert_eq!(next, Stage::Play);
        let session = controller.session().unwrap();
        assert_eq!(session.total_score(), 0.3);
        assert_eq!(session.level(), 2);
    }
}

#[test]
fn full_session_reports_completion() {
    let clock = ManualClock::new();
    let completions: Rc<RefCell<Vec<Completion>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&completions);
    let mut controller = Controller::new(PuzzleKind::Code, Mode::Assessment, "learner-7")
        .with_seed(99)
        .with_clock(Arc::new(clock.clone()))
        .on_complete(move |c| sink.borrow_mut().push(c.clone()));
    controller
        .configure(GameConfig {
            tier: Tier::Medium,
            show_instructions: false,
        })
        .unwrap();

    let mut total_time = 0;
    for level in 1..=Tier::Medium.level_count() as u64 {
        let puzzle = controller.puzzle().unwrap();
        let wrong = puzzle
            .candidates
            .iter()
            .copied()
            .find(|a| !puzzle.is_correct(a))
            .unwrap();
        let right = puzzle.answer();
        assert!(matches!(
            controller.submit(&wrong),
            Ok(SubmitOutcome::Wrong { wrong_answers: 1, .. })
        ));
        clock.advance_secs(level);
        controller.submit(&right).unwrap();
        total_time += level + Tier::Medium.time_penalty_secs();
    }
    assert_eq!(controller.stage(), Stage::Report);

    let report = controller.report().unwrap();
    assert_eq!(report.outcome, Some(Outcome::Completed));
    assert_eq!(report.levels.len(), 8);
    assert_eq!(report.total_time_secs, total_time);
    let sum: f64 = report.levels.iter().map(|l| l.reward).sum();
    assert_eq!(report.total_score, (sum * 100.0).round() / 100.0);

    let completion = controller.finish().unwrap().unwrap();
    assert_eq!(completion.player_id, "learner-7");
    assert_eq!(completion.total_time_secs, total_time);
    assert_eq!(completions.borrow().as_slice(), &[completion]);
    assert_eq!(controller.stage(), Stage::Config);
}

#[test]
fn expiry_then_play_again() {
    let clock = ManualClock::new();
    let mut controller = medium_session(PuzzleKind::Grid, &clock);
    let limit = controller.puzzle().unwrap().time_limit_secs;
    clock.advance_secs(limit - 1);
    assert_eq!(controller.remaining(), Some(1));
    controller.tick();
    assert_eq!(controller.stage(), Stage::Play);
    clock.advance_secs(1);
    controller.tick();
    assert_eq!(controller.stage(), Stage::Report);
    let report = controller.report().unwrap();
    assert_eq!(report.outcome, Some(Outcome::TimedOut));
    assert!(report.levels.is_empty());
    assert_eq!(report.total_time_secs, limit);

    assert_eq!(controller.play_again(), Ok(Stage::Play));
    assert_eq!(controller.session().unwrap().level(), 1);
}
