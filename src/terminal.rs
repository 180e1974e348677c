/*
terminal.rs

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

//! Play in the terminal.
//!
//! Two threads feed a single channel: one reads the player's lines from the standard input, the
//! other forwards the events of the level timer. The main loop receives from that channel and
//! drives the [`Controller`].

use async_channel::{Receiver, Sender};
use log::{debug, warn};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::thread;

use cogniplay::game::{Completion, Controller, GameConfig, Mode, Stage, SubmitOutcome};
use cogniplay::generator::codes::{self, CODE_LEN};
use cogniplay::generator::shapes::Shape;
use cogniplay::generator::tiers::Tier;
use cogniplay::generator::{Answer, Layout, Puzzle, PuzzleKind};
use cogniplay::timer::TimerEvent;

/// Remaining times at which a reminder is printed.
const REMINDERS: [u64; 5] = [30, 20, 10, 5, 3];

/// Options of a terminal game.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub kind: PuzzleKind,
    pub tier: Tier,
    pub seed: Option<u64>,
    pub mode: Mode,
    pub player_id: String,
    pub show_instructions: bool,
    pub json: bool,
}

/// Event received by the main loop.
#[derive(Debug)]
enum UiEvent {
    /// A line typed by the player.
    Line(String),

    /// The standard input is closed.
    Closed,

    Timer(TimerEvent),
}

/// Return the puzzle as displayed to the player.
///
/// Hidden grid cells are shown as `·`, and the target cell as `?`.
pub fn render_puzzle(puzzle: &Puzzle) -> String {
    let mut out: String = String::new();
    match &puzzle.layout {
        Layout::Grid(grid) => {
            let n: usize = grid.square.size();
            for (i, cell) in grid.visible_cells().iter().enumerate() {
                let c: char = match cell {
                    Some(shape) => shape.glyph(),
                    None if i == grid.target => '?',
                    None => '·',
                };
                out.push(c);
                out.push(if (i + 1) % n == 0 { '\n' } else { ' ' });
            }
            let (row, column) = grid.target_position();
            let _ = writeln!(out, "Which shape goes at row {}, column {}?", row + 1, column + 1);
            for (i, a) in puzzle.candidates.iter().enumerate() {
                let _ = writeln!(out, "  {}: {a}", i + 1);
            }
        }
        Layout::Code(code) => {
            let _ = writeln!(out, "Input:  {}", glyphs(&code.input));
            let _ = writeln!(out, "Output: {}", glyphs(&code.output));
            let _ = writeln!(out, "Which code turns the input into the output?");
            for (a, c) in puzzle.candidates.iter().zip(&code.offered) {
                if let Answer::Code(i) = a {
                    let _ = writeln!(out, "  {}: {}", codes::code_name(*i), codes::describe(c));
                }
            }
        }
    }
    out
}

fn glyphs(sequence: &[Shape; CODE_LEN]) -> String {
    sequence
        .iter()
        .map(|s| s.glyph().to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Convert the player's input into one of the offered candidates.
///
/// The input can be the position of the candidate in the list, a shape name or glyph for the grid
/// puzzles, or a code letter for the code puzzles. Return None if the input does not designate an
/// offered candidate.
pub fn parse_answer(puzzle: &Puzzle, input: &str) -> Option<Answer> {
    let input: String = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    let answer: Answer = if let Ok(n) = input.parse::<usize>() {
        *puzzle.candidates.get(n.checked_sub(1)?)?
    } else {
        match puzzle.kind() {
            PuzzleKind::Grid => (0..Shape::COUNT)
                .filter_map(Shape::from_index)
                .find(|s| s.to_string() == input || s.glyph().to_string() == input)
                .map(Answer::Shape)?,
            PuzzleKind::Code => puzzle.candidates.iter().copied().find(|a| {
                matches!(a, Answer::Code(i)
                    if codes::code_name(*i).to_ascii_lowercase().to_string() == input)
            })?,
        }
    };
    puzzle.offers(&answer).then_some(answer)
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = io::stdout().flush();
}

/// Start the threads that feed the main loop.
fn spawn_feeders(timer_events: Receiver<TimerEvent>) -> Receiver<UiEvent> {
    let (sender, receiver) = async_channel::unbounded::<UiEvent>();

    let input_sender: Sender<UiEvent> = sender.clone();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if input_sender.send_blocking(UiEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = input_sender.send_blocking(UiEvent::Closed);
    });

    thread::spawn(move || {
        while let Ok(event) = timer_events.recv_blocking() {
            if sender.send_blocking(UiEvent::Timer(event)).is_err() {
                break;
            }
        }
        debug!("Timer forwarder stopped");
    });

    receiver
}

/// Print the current stage and ask for input.
fn show_stage(controller: &Controller) {
    match controller.stage() {
        Stage::Config => (),
        Stage::Instructions => {
            println!("\n{}\n", controller.instructions());
            prompt("Type \"ok\" once you have read the rules, or \"back\" to quit: ");
        }
        Stage::Play => {
            if let (Some(puzzle), Some(session)) = (controller.puzzle(), controller.session()) {
                println!(
                    "\nLevel {}/{} ({}s)",
                    session.level(),
                    session.tier().level_count(),
                    controller.remaining().unwrap_or(0)
                );
                print!("{}", render_puzzle(puzzle));
                prompt("> ");
            }
        }
        Stage::Report => prompt("\n[a]gain or [f]inish? "),
    }
}

fn print_report(controller: &Controller, json: bool) {
    let Some(report) = controller.report() else {
        return;
    };
    if json {
        match report.to_json() {
            Ok(s) => println!("{s}"),
            Err(e) => warn!("Cannot serialize the report: {e}"),
        }
    } else {
        println!("\n{report}");
    }
}

/// Run a game in the terminal.
pub fn play(options: PlayOptions) -> io::Result<()> {
    let mut controller: Controller =
        Controller::new(options.kind, options.mode, options.player_id.clone()).on_complete(
            |c: &Completion| {
                println!(
                    "Score recorded for {}: {:.2} in {}s",
                    c.player_id, c.total_score, c.total_time_secs
                );
            },
        );
    if let Some(seed) = options.seed {
        controller = controller.with_seed(seed);
    }
    let events: Receiver<UiEvent> = spawn_feeders(controller.timer_events());

    controller
        .configure(GameConfig {
            tier: options.tier,
            show_instructions: options.show_instructions,
        })
        .map_err(io::Error::other)?;
    if controller.stage() == Stage::Report {
        print_report(&controller, options.json);
    }
    show_stage(&controller);

    while let Ok(event) = events.recv_blocking() {
        match event {
            UiEvent::Timer(e) => {
                let epoch: u64 = controller.epoch();
                if controller.handle_timer_event(e) {
                    println!("\nTime over!");
                    print_report(&controller, options.json);
                    show_stage(&controller);
                } else if let TimerEvent::Tick {
                    epoch: tick_epoch,
                    remaining,
                } = e
                    && tick_epoch == epoch
                    && REMINDERS.contains(&remaining)
                {
                    println!("\n{remaining}s left");
                    prompt("> ");
                }
            }
            UiEvent::Closed => {
                controller.exit_to_config();
                break;
            }
            UiEvent::Line(line) => {
                if !handle_line(&mut controller, line.trim(), options.json)? {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Process a line typed by the player. Return false to leave the game.
fn handle_line(controller: &mut Controller, line: &str, json: bool) -> io::Result<bool> {
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
        controller.exit_to_config();
        return Ok(false);
    }

    match controller.stage() {
        Stage::Config => return Ok(false),
        Stage::Instructions => match line.to_lowercase().as_str() {
            "ok" => {
                controller
                    .acknowledge_instructions(true)
                    .map_err(io::Error::other)?;
                controller.start().map_err(io::Error::other)?;
                if controller.stage() == Stage::Report {
                    print_report(controller, json);
                }
            }
            "back" => {
                controller.exit_to_config();
                return Ok(false);
            }
            _ => (),
        },
        Stage::Play => {
            let Some(answer) = controller.puzzle().and_then(|p| parse_answer(p, line)) else {
                prompt("Pick one of the listed candidates: ");
                return Ok(true);
            };
            match controller.submit(&answer).map_err(io::Error::other)? {
                SubmitOutcome::Correct { reward, next } => {
                    println!("Correct! Reward {:.2}", reward.reward);
                    if next == Stage::Report {
                        print_report(controller, json);
                    }
                }
                SubmitOutcome::Wrong { remaining, .. } => {
                    println!("Wrong answer, {remaining}s left");
                    prompt("> ");
                    return Ok(true);
                }
                SubmitOutcome::Expired => {
                    println!("Time over!");
                    print_report(controller, json);
                }
                SubmitOutcome::Rejected => {
                    prompt("Pick one of the listed candidates: ");
                    return Ok(true);
                }
            }
        }
        Stage::Report => match line.to_lowercase().as_str() {
            "a" | "again" => {
                controller.play_again().map_err(io::Error::other)?;
                if controller.stage() == Stage::Report {
                    print_report(controller, json);
                }
            }
            "f" | "finish" => {
                if controller.finish().map_err(io::Error::other)?.is_none() {
                    println!("Practice run over, no score recorded.");
                }
                return Ok(false);
            }
            _ => (),
        },
    }
    show_stage(controller);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogniplay::generator::generate;

    #[test]
    fn grid_answers_by_position_name_or_glyph() {
        let p = generate(PuzzleKind::Grid, Tier::Easy, 1, Some(5)).unwrap();
        let first = p.candidates[0];
        assert_eq!(parse_answer(&p, "1"), Some(first));
        let Answer::Shape(shape) = first else {
            panic!("shape expected");
        };
        assert_eq!(parse_answer(&p, &shape.to_string().to_uppercase()), Some(first));
        assert_eq!(parse_answer(&p, &shape.glyph().to_string()), Some(first));
    }

    #[test]
    fn invalid_input_is_rejected_before_submission() {
        let p = generate(PuzzleKind::Grid, Tier::Easy, 1, Some(5)).unwrap();
        assert_eq!(parse_answer(&p, ""), None);
        assert_eq!(parse_answer(&p, "   "), None);
        assert_eq!(parse_answer(&p, "0"), None);
        assert_eq!(parse_answer(&p, "99"), None);
        assert_eq!(parse_answer(&p, "banana"), None);
        // 3x3 grids only use the first three shapes
        assert_eq!(parse_answer(&p, "hexagon"), None);
    }

    #[test]
    fn code_answers_by_letter() {
        let p = generate(PuzzleKind::Code, Tier::Medium, 2, Some(8)).unwrap();
        let Answer::Code(i) = p.answer() else {
            panic!("code expected");
        };
        let letter = codes::code_name(i).to_string();
        assert_eq!(parse_answer(&p, &letter), Some(p.answer()));
        assert_eq!(parse_answer(&p, &letter.to_lowercase()), Some(p.answer()));
    }

    #[test]
    fn grid_rendering_marks_target() {
        let p = generate(PuzzleKind::Grid, Tier::Medium, 4, Some(1)).unwrap();
        let text = render_puzzle(&p);
        assert_eq!(text.matches('?').count(), 2);
        assert!(text.contains("Which shape goes at row"));
    }
}
