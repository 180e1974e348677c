/*
latin_square.rs

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

//! Generate shape grids.
//!
//! The grid is a Latin square: each of the `n` shapes appears exactly once in every row and in
//! every column. The generator starts from the cyclic square (`L[r][c] = (r + c) mod n`), then
//! shuffles the rows and the columns. Both permutations keep the Latin property.
//!
//! A fraction of the cells, which depends on the tier, is then hidden. One of the hidden cells is
//! the target that the player must resolve.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom, index};
use serde::{Deserialize, Serialize};

use super::shapes::Shape;
use super::tiers::{LevelSpec, Tier};
use super::{Answer, GenerationError, Generator, Layout, Puzzle, PuzzleKind};

/// Smallest grid that makes a puzzle.
const MIN_SIZE: usize = 2;

const INSTRUCTIONS: &str = "\
Each shape appears exactly once in every row and exactly once in every column.
Some cells are hidden. Find the shape of the highlighted cell and pick it from the candidates.
A wrong answer costs time and reduces the reward of the level.
The faster you answer, the higher the reward.";

/// Latin square of shapes, stored in row-major order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LatinSquare {
    /// Grid dimension.
    n: usize,

    /// Cells in row-major order. The cell at (r, c) is at index `r * n + c`.
    cells: Vec<Shape>,
}

impl LatinSquare {
    /// Create the cyclic Latin square of order `n`.
    ///
    /// # Errors
    ///
    /// The method returns an error if there are not enough shapes for the grid.
    pub fn canonical(n: usize) -> Result<Self, GenerationError> {
        if !(MIN_SIZE..=Shape::COUNT).contains(&n) {
            return Err(GenerationError::UnsupportedGridSize(n));
        }
        let mut cells: Vec<Shape> = Vec::with_capacity(n * n);
        for r in 0..n {
            for c in 0..n {
                cells.push(Shape::from_index((r + c) % n).ok_or(GenerationError::NotEnoughSymbols)?);
            }
        }
        Ok(Self { n, cells })
    }

    /// Create a random Latin square of order `n`.
    pub fn shuffled(n: usize, rng: &mut StdRng) -> Result<Self, GenerationError> {
        let mut square: LatinSquare = Self::canonical(n)?;

        let mut rows: Vec<usize> = (0..n).collect();
        rows.shuffle(rng);
        square.permute_rows(&rows);

        let mut columns: Vec<usize> = (0..n).collect();
        columns.shuffle(rng);
        square.permute_columns(&columns);

        debug!("Shuffled {n}x{n} square: rows = {rows:?}  columns = {columns:?}");
        Ok(square)
    }

    /// Row `i` of the result is row `order[i]` of the current square.
    fn permute_rows(&mut self, order: &[usize]) {
        let n: usize = self.n;
        let mut cells: Vec<Shape> = Vec::with_capacity(self.cells.len());
        for &r in order {
            cells.extend_from_slice(&self.cells[r * n..(r + 1) * n]);
        }
        self.cells = cells;
    }

    /// Column `i` of the result is column `order[i]` of the current square.
    fn permute_columns(&mut self, order: &[usize]) {
        let n: usize = self.n;
        let mut cells: Vec<Shape> = Vec::with_capacity(self.cells.len());
        for r in 0..n {
            for &c in order {
                cells.push(self.cells[r * n + c]);
            }
        }
        self.cells = cells;
    }

    /// Return the grid dimension.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Return the shape at (row, column).
    pub fn get(&self, row: usize, column: usize) -> Option<Shape> {
        if row >= self.n || column >= self.n {
            return None;
        }
        self.cells.get(row * self.n + column).copied()
    }

    /// Return the cells in row-major order.
    pub fn cells(&self) -> &[Shape] {
        &self.cells
    }

    /// Return the distinct shapes of the square, in catalogue order.
    pub fn symbols(&self) -> Vec<Shape> {
        let mut symbols: Vec<Shape> = self.cells.clone();
        symbols.sort_unstable();
        symbols.dedup();
        symbols
    }

    /// Whether every row and every column contains each shape exactly once.
    pub fn is_latin(&self) -> bool {
        let n: usize = self.n;
        if self.cells.len() != n * n || self.symbols().len() != n {
            return false;
        }
        let mut seen: Vec<bool> = vec![false; Shape::COUNT];
        for r in 0..n {
            seen.fill(false);
            for c in 0..n {
                let v: usize = self.cells[r * n + c].index();
                if seen[v] {
                    return false;
                }
                seen[v] = true;
            }
        }
        for c in 0..n {
            seen.fill(false);
            for r in 0..n {
                let v: usize = self.cells[r * n + c].index();
                if seen[v] {
                    return false;
                }
                seen[v] = true;
            }
        }
        true
    }
}

/// Grid puzzle structure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GridLayout {
    /// Solved grid. Never shown in full to the player.
    pub square: LatinSquare,

    /// Indexes (row-major) of the hidden cells, sorted.
    pub hidden: Vec<usize>,

    /// Index of the hidden cell the player must resolve.
    pub target: usize,
}

impl GridLayout {
    /// Return the grid as shown to the player: hidden cells are `None`.
    pub fn visible_cells(&self) -> Vec<Option<Shape>> {
        self.square
            .cells()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if self.hidden.binary_search(&i).is_ok() {
                    None
                } else {
                    Some(*s)
                }
            })
            .collect()
    }

    /// Return the (row, column) of the target cell.
    pub fn target_position(&self) -> (usize, usize) {
        let n: usize = self.square.size();
        (self.target / n, self.target % n)
    }
}

/// Number of cells to hide in an `n×n` grid. At least one cell is hidden and at least one is
/// shown.
fn hidden_count(n: usize, fraction: f64) -> usize {
    let cells: usize = n * n;
    let count: usize = (cells as f64 * fraction).round() as usize;
    count.clamp(1, cells - 1)
}

/// Grid puzzle generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatinSquareGenerator;

impl Generator for LatinSquareGenerator {
    fn kind(&self) -> PuzzleKind {
        PuzzleKind::Grid
    }

    fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    fn generate(
        &self,
        tier: Tier,
        level: usize,
        rng: &mut StdRng,
    ) -> Result<Puzzle, GenerationError> {
        let spec: LevelSpec = tier.level_spec(PuzzleKind::Grid, level)?;
        let n: usize = spec.size;
        let square: LatinSquare = LatinSquare::shuffled(n, rng)?;
        if !square.is_latin() {
            return Err(GenerationError::BrokenInvariant("grid is not a Latin square"));
        }

        let mut hidden: Vec<usize> =
            index::sample(rng, n * n, hidden_count(n, tier.hidden_fraction())).into_vec();
        hidden.sort_unstable();
        let target: usize = *hidden
            .choose(rng)
            .ok_or(GenerationError::BrokenInvariant("no hidden cell"))?;
        let answer: Answer = Answer::Shape(square.cells()[target]);
        let candidates: Vec<Answer> = square.symbols().into_iter().map(Answer::Shape).collect();

        debug!(
            "Grid puzzle {tier} level {level}: {n}x{n}, {} hidden, target = {target}",
            hidden.len()
        );
        Puzzle::new(
            tier,
            level,
            spec.time_limit_secs,
            Layout::Grid(GridLayout {
                square,
                hidden,
                target,
            }),
            candidates,
            answer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::rng_from_seed;
    use proptest::prelude::*;

    #[test]
    fn canonical_squares_are_latin() {
        for n in MIN_SIZE..=Shape::COUNT {
            let sq = LatinSquare::canonical(n).unwrap();
            assert!(sq.is_latin(), "cyclic square of order {n} should be Latin");
            assert_eq!(sq.symbols().len(), n);
        }
    }

    #[test]
    fn unsupported_sizes_are_rejected() {
        assert_eq!(
            LatinSquare::canonical(Shape::COUNT + 1),
            Err(GenerationError::UnsupportedGridSize(Shape::COUNT + 1))
        );
        assert_eq!(
            LatinSquare::canonical(1),
            Err(GenerationError::UnsupportedGridSize(1))
        );
    }

    #[test]
    fn broken_square_is_detected() {
        let mut sq = LatinSquare::canonical(3).unwrap();
        sq.cells[0] = sq.cells[1];
        assert!(!sq.is_latin());
    }

    #[test]
    fn get_is_bounds_checked() {
        let sq = LatinSquare::canonical(3).unwrap();
        assert_eq!(sq.get(0, 0), Some(Shape::Circle));
        assert_eq!(sq.get(1, 2), Some(Shape::Circle));
        assert_eq!(sq.get(3, 0), None);
    }

    #[test]
    fn hidden_fraction_follows_tier() {
        assert_eq!(hidden_count(4, 0.25), 4);
        assert_eq!(hidden_count(6, 0.55), 20);
        assert_eq!(hidden_count(2, 0.01), 1);
        assert_eq!(hidden_count(2, 1.0), 3);
    }

    #[test]
    fn visible_cells_mask_hidden_ones() {
        let mut rng = rng_from_seed(Some(3));
        let p = LatinSquareGenerator.generate(Tier::Medium, 4, &mut rng).unwrap();
        let Layout::Grid(grid) = &p.layout else {
            panic!("grid layout expected");
        };
        let visible = grid.visible_cells();
        assert_eq!(visible.iter().filter(|c| c.is_none()).count(), grid.hidden.len());
        assert!(visible[grid.target].is_none());
        let (r, c) = grid.target_position();
        assert_eq!(Some(p.answer()), grid.square.get(r, c).map(Answer::Shape));
    }

    proptest! {
        #[test]
        fn generated_grids_are_latin(seed in any::<u64>(), level in 1usize..=12) {
            let mut rng = rng_from_seed(Some(seed));
            let tier = Tier::Expert;
            let p = LatinSquareGenerator.generate(tier, level, &mut rng).unwrap();
            let Layout::Grid(grid) = &p.layout else {
                panic!("grid layout expected");
            };
            prop_assert!(grid.square.is_latin());
            prop_assert!(grid.hidden.contains(&grid.target));
            prop_assert_eq!(p.candidates.len(), grid.square.size());
        }

        #[test]
        fn shuffling_keeps_latin_property(seed in any::<u64>(), n in MIN_SIZE..=Shape::COUNT) {
            let mut rng = rng_from_seed(Some(seed));
            prop_assert!(LatinSquare::shuffled(n, &mut rng).unwrap().is_latin());
        }
    }
}
