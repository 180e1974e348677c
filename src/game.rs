/*
game.rs

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

//! Manage the progression of a game through its levels.
//!
//! The [`Controller`] is a state machine over [`Stage`]:
//!
//! ```text
//! Config ──> (Instructions) ──> Play ──> Report ──> Config
//!                  │              ↺        │
//!                  └──> Config             └──> Play (play again)
//! ```
//!
//! It owns the [`Session`], the puzzle of the current level, and the level timer. Entering a
//! level generates exactly one puzzle and starts a new timer. A correct answer cancels the timer
//! before anything else happens, so a late expiry cannot abandon a level that was already
//! rewarded. A wrong answer adds a time penalty and leaves the timer running, unless the
//! penalty uses up the remaining time, in which case the level expires at once.
//!
//! The timer can be driven in two ways:
//!
//! * The host calls [`Controller::tick`] (typically once per second).
//! * The host calls [`Controller::timer_events`] once. Each level then runs a background
//!   [`Ticker`] that publishes [`TimerEvent`] objects on the returned channel. The host forwards
//!   them to [`Controller::handle_timer_event`].

use async_channel::{Receiver, Sender};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::generator::tiers::Tier;
use crate::generator::{Answer, GenerationError, Generator, Puzzle, PuzzleKind, rng_from_seed};
use crate::report::Report;
use crate::scoring::{self, LevelReward};
use crate::timer::{
    Clock, LevelTimer, SharedTimer, SystemClock, TICK_PERIOD, Ticker, TickerHandle, TimerEvent,
};

/// Stage of the game.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The player chooses the tier.
    Config,

    /// The rules are shown and must be acknowledged.
    Instructions,

    /// A level is in progress.
    Play,

    /// Summary of the session.
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "config"),
            Stage::Instructions => write!(f, "instructions"),
            Stage::Play => write!(f, "play"),
            Stage::Report => write!(f, "report"),
        }
    }
}

/// Whether the session counts.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The final score is handed to the completion callback.
    #[default]
    Assessment,

    /// Practice run: the completion callback is never called.
    Preview,
}

/// How a session ended.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// All the levels of the tier were solved.
    Completed,

    /// The time ran out on a level.
    TimedOut,

    /// A puzzle could not be generated.
    Aborted,
}

impl Outcome {
    /// Whether the session reached an end that can be reported to the completion callback.
    pub fn is_terminal(self) -> bool {
        matches!(self, Outcome::Completed | Outcome::TimedOut)
    }
}

/// Choices made at the config stage.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct GameConfig {
    pub tier: Tier,
    pub show_instructions: bool,
}

/// Data handed to the completion callback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Completion {
    /// Opaque player identifier, passed through unchanged.
    pub player_id: String,

    pub total_score: f64,

    pub total_time_secs: u64,
}

/// Errors for controller operations invoked at the wrong time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageError {
    #[error("operation not allowed in the {actual} stage (expected {expected})")]
    WrongStage { expected: Stage, actual: Stage },

    #[error("the instructions must be acknowledged first")]
    InstructionsNotAcknowledged,
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The level is solved. `next` is the stage entered afterwards (play for the next level, or
    /// report after the last level).
    Correct { reward: LevelReward, next: Stage },

    /// Wrong answer. The player can try again while time remains.
    Wrong { wrong_answers: usize, remaining: u64 },

    /// The time is over, possibly because of the penalty of this answer: the level is abandoned.
    Expired,

    /// The answer is not one of the candidates. Nothing is counted.
    Rejected,
}

/// Runtime state of a session.
#[derive(Debug, Clone)]
pub struct Session {
    tier: Tier,
    level: usize,
    wrong_answers: usize,
    level_rewards: Vec<LevelReward>,
    total_score: f64,
    abandoned_secs: u64,
    outcome: Option<Outcome>,
    failure: Option<GenerationError>,
}

impl Session {
    fn new(tier: Tier) -> Self {
        Self {
            tier,
            level: 1,
            wrong_answers: 0,
            level_rewards: Vec::with_capacity(tier.level_count()),
            total_score: 0.0,
            abandoned_secs: 0,
            outcome: None,
            failure: None,
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Current level (starts at 1).
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn wrong_answers(&self) -> usize {
        self.wrong_answers
    }

    /// Results of the completed levels, in order.
    pub fn level_rewards(&self) -> &[LevelReward] {
        &self.level_rewards
    }

    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    /// How the session ended, or None while it is in progress.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Generation error that aborted the session.
    pub fn failure(&self) -> Option<&GenerationError> {
        self.failure.as_ref()
    }

    /// Time spent on the completed levels, plus the time consumed by an abandoned level.
    pub fn total_time_secs(&self) -> u64 {
        self.level_rewards
            .iter()
            .map(|r| r.time_spent_secs)
            .sum::<u64>()
            + self.abandoned_secs
    }

    fn reset_level(&mut self) {
        self.wrong_answers = 0;
    }

    fn record(&mut self, reward: LevelReward) {
        self.level_rewards.push(reward);
        self.total_score = scoring::total_score(&self.level_rewards);
    }
}

/// Level progression controller.
pub struct Controller {
    stage: Stage,
    mode: Mode,
    player_id: String,
    config: GameConfig,
    instructions_acknowledged: bool,
    generator: Box<dyn Generator>,
    rng: StdRng,
    clock: Arc<dyn Clock>,
    tick_period: Duration,
    session: Option<Session>,
    puzzle: Option<Puzzle>,
    timer: Option<Arc<SharedTimer>>,
    ticker: Option<TickerHandle>,
    epoch: u64,
    publisher: Option<(Sender<TimerEvent>, Receiver<TimerEvent>)>,
    on_complete: Option<Box<dyn FnMut(&Completion)>>,
}

impl Controller {
    /// Create a [`Controller`] object in the config stage.
    pub fn new(kind: PuzzleKind, mode: Mode, player_id: impl Into<String>) -> Self {
        Self {
            stage: Stage::Config,
            mode,
            player_id: player_id.into(),
            config: GameConfig::default(),
            instructions_acknowledged: false,
            generator: kind.generator(),
            rng: rng_from_seed(None),
            clock: Arc::new(SystemClock),
            tick_period: TICK_PERIOD,
            session: None,
            puzzle: None,
            timer: None,
            ticker: None,
            epoch: 0,
            publisher: None,
            on_complete: None,
        }
    }

    /// Replace the puzzle generator.
    pub fn with_generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generator = generator;
        self
    }

    /// Make the puzzles reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = rng_from_seed(Some(seed));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Period of the background ticker.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Set the callback invoked when the player finishes a session.
    pub fn on_complete(mut self, callback: impl FnMut(&Completion) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Enable background ticking and return the channel where the timer events are published.
    pub fn timer_events(&mut self) -> Receiver<TimerEvent> {
        let (_, receiver) = self
            .publisher
            .get_or_insert_with(async_channel::unbounded::<TimerEvent>);
        receiver.clone()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn kind(&self) -> PuzzleKind {
        self.generator.kind()
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Rules of the puzzle family.
    pub fn instructions(&self) -> &'static str {
        self.generator.instructions()
    }

    pub fn instructions_acknowledged(&self) -> bool {
        self.instructions_acknowledged
    }

    /// Whether the play stage can be entered from the instructions.
    pub fn can_start(&self) -> bool {
        self.stage == Stage::Instructions && self.instructions_acknowledged
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Puzzle of the level in progress.
    pub fn puzzle(&self) -> Option<&Puzzle> {
        match self.stage {
            Stage::Play => self.puzzle.as_ref(),
            _ => None,
        }
    }

    /// Identifier of the current level entry, as carried by the timer events.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Remaining time of the level in progress.
    pub fn remaining(&self) -> Option<u64> {
        if self.stage != Stage::Play {
            return None;
        }
        let now: Instant = self.clock.now();
        self.timer.as_ref().map(|t| t.lock().remaining(now))
    }

    /// Penalty accumulated by wrong answers on the level in progress.
    pub fn penalty_secs(&self) -> Option<u64> {
        if self.stage != Stage::Play {
            return None;
        }
        self.timer.as_ref().map(|t| t.lock().penalty_secs())
    }

    fn expect_stage(&self, expected: Stage) -> Result<(), StageError> {
        if self.stage != expected {
            return Err(StageError::WrongStage {
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    /// Leave the config stage with the player's choices.
    ///
    /// Return the stage entered: the instructions if requested and not yet acknowledged,
    /// otherwise play (or report if the first puzzle cannot be generated).
    pub fn configure(&mut self, config: GameConfig) -> Result<Stage, StageError> {
        self.expect_stage(Stage::Config)?;
        self.config = config;
        self.session = Some(Session::new(config.tier));
        info!(
            "New {} session for player {:?}: tier = {}",
            self.kind(),
            self.player_id,
            config.tier
        );
        if config.show_instructions && !self.instructions_acknowledged {
            self.stage = Stage::Instructions;
        } else {
            self.enter_level();
        }
        Ok(self.stage)
    }

    /// Tick or untick the acknowledgement checkbox of the instructions.
    pub fn acknowledge_instructions(&mut self, acknowledged: bool) -> Result<(), StageError> {
        self.expect_stage(Stage::Instructions)?;
        self.instructions_acknowledged = acknowledged;
        Ok(())
    }

    /// Leave the instructions for the first level.
    pub fn start(&mut self) -> Result<Stage, StageError> {
        self.expect_stage(Stage::Instructions)?;
        if !self.instructions_acknowledged {
            return Err(StageError::InstructionsNotAcknowledged);
        }
        self.enter_level();
        Ok(self.stage)
    }

    /// Go back to the config stage. The session in progress, if any, is discarded.
    pub fn exit_to_config(&mut self) {
        self.stop_timer();
        if self.session.take().is_some() {
            debug!("Session discarded");
        }
        self.puzzle = None;
        self.stage = Stage::Config;
    }

    /// Enter the play stage for the current level of the session.
    ///
    /// This is the only place where puzzles are generated and timers started.
    fn enter_level(&mut self) {
        self.stop_timer();
        let now: Instant = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            self.stage = Stage::Config;
            return;
        };
        session.reset_level();
        self.epoch += 1;

        match self
            .generator
            .generate(session.tier, session.level, &mut self.rng)
        {
            Ok(puzzle) => {
                debug!(
                    "Level {} (epoch {}): {} candidates, {}s",
                    session.level,
                    self.epoch,
                    puzzle.candidates.len(),
                    puzzle.time_limit_secs
                );
                let timer: Arc<SharedTimer> =
                    SharedTimer::new(LevelTimer::new(self.epoch, now, puzzle.time_limit_secs));
                if let Some((sender, _)) = &self.publisher {
                    self.ticker = Some(Ticker::spawn(
                        Arc::clone(&timer),
                        Arc::clone(&self.clock),
                        self.tick_period,
                        sender.clone(),
                    ));
                }
                self.timer = Some(timer);
                self.puzzle = Some(puzzle);
                self.stage = Stage::Play;
            }
            Err(e) => {
                warn!(
                    "Cannot generate level {} of the {} tier: {e}",
                    session.level, session.tier
                );
                session.outcome = Some(Outcome::Aborted);
                session.failure = Some(e);
                self.puzzle = None;
                self.stage = Stage::Report;
            }
        }
    }

    /// Cancel the timer of the current level and stop its ticker thread.
    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    /// Abandon the current level because the time ran out.
    fn expire_level(&mut self) {
        self.stop_timer();
        if let Some(session) = self.session.as_mut() {
            let limit: u64 = self.puzzle.as_ref().map_or(0, |p| p.time_limit_secs);
            session.abandoned_secs = limit;
            session.outcome = Some(Outcome::TimedOut);
            info!(
                "Time over on level {}: total score = {:.2}",
                session.level, session.total_score
            );
        }
        self.puzzle = None;
        self.stage = Stage::Report;
    }

    /// Submit an answer for the target of the current puzzle.
    pub fn submit(&mut self, answer: &Answer) -> Result<SubmitOutcome, StageError> {
        self.expect_stage(Stage::Play)?;
        let now: Instant = self.clock.now();
        let (Some(puzzle), Some(timer), Some(session)) =
            (self.puzzle.as_ref(), self.timer.as_ref(), self.session.as_mut())
        else {
            return Err(StageError::WrongStage {
                expected: Stage::Play,
                actual: self.stage,
            });
        };

        // Decide under the timer lock: the ticker cannot expire the level in between.
        let mut guard = timer.lock();
        if guard.is_expired() || guard.remaining(now) == 0 {
            guard.poll(now);
            drop(guard);
            warn!("Late submission on level {}", session.level);
            self.expire_level();
            return Ok(SubmitOutcome::Expired);
        }
        if !puzzle.offers(answer) {
            debug!("Rejected answer {answer}: not a candidate");
            return Ok(SubmitOutcome::Rejected);
        }

        if !puzzle.is_correct(answer) {
            session.wrong_answers += 1;
            guard.add_penalty(session.tier.time_penalty_secs());
            let remaining: u64 = guard.remaining(now);
            debug!(
                "Wrong answer {answer} on level {}: {} wrong, {}s penalty, {remaining}s left",
                session.level,
                session.wrong_answers,
                guard.penalty_secs()
            );
            if remaining == 0 {
                guard.poll(now);
                drop(guard);
                self.expire_level();
                return Ok(SubmitOutcome::Expired);
            }
            return Ok(SubmitOutcome::Wrong {
                wrong_answers: session.wrong_answers,
                remaining,
            });
        }

        guard.cancel();
        let time_spent: u64 = guard.elapsed_secs(now) + guard.penalty_secs();
        drop(guard);

        let reward: LevelReward = LevelReward::new(
            session.level,
            session.tier,
            time_spent,
            session.wrong_answers,
        );
        session.record(reward);
        info!(
            "Level {} solved in {}s with {} wrong answers: reward = {:.2}, total = {:.2}",
            reward.level,
            reward.time_spent_secs,
            reward.wrong_answers,
            reward.reward,
            session.total_score
        );

        let last_level: bool = session.level >= session.tier.level_count();
        if last_level {
            session.outcome = Some(Outcome::Completed);
        } else {
            session.level += 1;
        }

        self.stop_timer();
        if last_level {
            self.puzzle = None;
            self.stage = Stage::Report;
        } else {
            self.enter_level();
        }
        Ok(SubmitOutcome::Correct {
            reward,
            next: self.stage,
        })
    }

    /// Recompute the remaining time once, as a tick of the level timer would.
    ///
    /// Return the event produced, or None outside the play stage.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if self.stage != Stage::Play {
            return None;
        }
        let now: Instant = self.clock.now();
        let event: Option<TimerEvent> = self.timer.as_ref().and_then(|t| t.lock().poll(now));
        if let Some(e) = event {
            self.handle_timer_event(e);
        }
        event
    }

    /// Process an event published by the background ticker.
    ///
    /// Return true when the event abandoned the level. Events from an earlier level entry, and
    /// events received outside the play stage, are ignored.
    pub fn handle_timer_event(&mut self, event: TimerEvent) -> bool {
        if self.stage != Stage::Play || event.epoch() != self.epoch {
            debug!("Ignoring stale timer event {event:?}");
            return false;
        }
        match event {
            TimerEvent::Tick { .. } => false,
            TimerEvent::Expired { .. } => {
                let expired: bool = self.timer.as_ref().is_some_and(|t| t.lock().is_expired());
                if !expired {
                    warn!("Expiry event for a running timer ignored");
                    return false;
                }
                self.expire_level();
                true
            }
        }
    }

    /// Summary of the session, available in the report stage.
    pub fn report(&self) -> Option<Report> {
        if self.stage != Stage::Report {
            return None;
        }
        self.session
            .as_ref()
            .map(|s| Report::from_session(self.kind(), s))
    }

    /// Start a fresh session with the same tier, at level 1.
    pub fn play_again(&mut self) -> Result<Stage, StageError> {
        self.expect_stage(Stage::Report)?;
        self.session = Some(Session::new(self.config.tier));
        self.enter_level();
        Ok(self.stage)
    }

    /// Close the report and return to the config stage.
    ///
    /// The completion callback is invoked, and its data returned, only for assessment sessions
    /// that completed all the levels or ran out of time.
    pub fn finish(&mut self) -> Result<Option<Completion>, StageError> {
        self.expect_stage(Stage::Report)?;
        let completion: Option<Completion> = match (&self.session, self.mode) {
            (Some(session), Mode::Assessment)
                if session.outcome.is_some_and(Outcome::is_terminal) =>
            {
                Some(Completion {
                    player_id: self.player_id.clone(),
                    total_score: session.total_score,
                    total_time_secs: session.total_time_secs(),
                })
            }
            _ => None,
        };
        if let Some(c) = &completion {
            info!(
                "Session complete for player {:?}: score = {:.2}, time = {}s",
                c.player_id, c.total_score, c.total_time_secs
            );
            if let Some(callback) = self.on_complete.as_mut() {
                callback(c);
            }
        }
        self.exit_to_config();
        Ok(completion)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop_timer();
    }
}
