/*
codes.rs

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

//! Generate code-breaking puzzles.
//!
//! A code is a fixed reordering of a four-element sequence. The player sees an input sequence
//! of four distinct shapes and the output produced by one of the codes, and must pick that code
//! among a few candidates. Because the input shapes are distinct and the codes in the catalogue
//! are pairwise different, exactly one candidate maps the input to the output.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom, index};
use serde::{Deserialize, Serialize};

use super::shapes::Shape;
use super::tiers::{LevelSpec, Tier};
use super::{Answer, GenerationError, Generator, Layout, Puzzle, PuzzleKind};

/// Length of the sequences.
pub const CODE_LEN: usize = 4;

/// A code: output position `i` takes the input element at position `code[i]`.
pub type Code = [usize; CODE_LEN];

/// Default code catalogue.
pub const CATALOGUE: [Code; 8] = [
    [1, 0, 3, 2],
    [3, 2, 1, 0],
    [1, 2, 3, 0],
    [3, 0, 1, 2],
    [0, 2, 1, 3],
    [2, 3, 0, 1],
    [0, 3, 2, 1],
    [2, 0, 3, 1],
];

const INSTRUCTIONS: &str = "\
A code reorders a sequence of four shapes.
You are shown an input sequence and the output produced by one of the codes.
Pick the code that turns the input into the output.
A wrong answer costs time and reduces the reward of the level.
The faster you answer, the higher the reward.";

/// Return the letter that names a code of the catalogue.
pub fn code_name(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(b'A'))
        .filter(u8::is_ascii_uppercase)
        .map_or('?', char::from)
}

/// Apply a code to a sequence.
pub fn apply(code: &Code, input: &[Shape; CODE_LEN]) -> [Shape; CODE_LEN] {
    let mut output: [Shape; CODE_LEN] = *input;
    for (i, &from) in code.iter().enumerate() {
        output[i] = input[from];
    }
    output
}

/// Return the code as the 1-based input positions read in output order, e.g. `2 1 4 3`.
pub fn describe(code: &Code) -> String {
    code.iter()
        .map(|p| (p + 1).to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Verify that every code is a bijection and that no two codes are equal.
///
/// # Errors
///
/// The function returns an error naming the first offending code.
pub fn validate_catalogue(catalogue: &[Code]) -> Result<(), GenerationError> {
    for (i, code) in catalogue.iter().enumerate() {
        let mut seen: [bool; CODE_LEN] = [false; CODE_LEN];
        for &p in code {
            if p >= CODE_LEN || seen[p] {
                return Err(GenerationError::InvalidCatalogue(format!(
                    "code {} is not a permutation",
                    code_name(i)
                )));
            }
            seen[p] = true;
        }
        if catalogue[..i].contains(code) {
            return Err(GenerationError::InvalidCatalogue(format!(
                "code {} is duplicated",
                code_name(i)
            )));
        }
    }
    Ok(())
}

/// Code puzzle structure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CodeLayout {
    /// Sequence shown to the player.
    pub input: [Shape; CODE_LEN],

    /// The input reordered by the secret code.
    pub output: [Shape; CODE_LEN],

    /// The codes offered as candidates, in the order of [`Puzzle::candidates`].
    pub offered: Vec<Code>,
}

/// Code puzzle generator.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    catalogue: Vec<Code>,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            catalogue: CATALOGUE.to_vec(),
        }
    }
}

impl CodeGenerator {
    /// Create a [`CodeGenerator`] object that draws its codes from the given catalogue.
    pub fn with_catalogue(catalogue: Vec<Code>) -> Self {
        Self { catalogue }
    }

    /// Return the code catalogue.
    pub fn catalogue(&self) -> &[Code] {
        &self.catalogue
    }
}

impl Generator for CodeGenerator {
    fn kind(&self) -> PuzzleKind {
        PuzzleKind::Code
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
        let spec: LevelSpec = tier.level_spec(PuzzleKind::Code, level)?;
        validate_catalogue(&self.catalogue)?;
        if spec.size < 2 || spec.size > self.catalogue.len() {
            return Err(GenerationError::NotEnoughCodes {
                requested: spec.size,
                available: self.catalogue.len(),
            });
        }
        if Shape::COUNT < CODE_LEN {
            return Err(GenerationError::NotEnoughSymbols);
        }

        // Input: four distinct shapes
        let mut input: [Shape; CODE_LEN] = [Shape::Circle; CODE_LEN];
        for (slot, i) in input
            .iter_mut()
            .zip(index::sample(rng, Shape::COUNT, CODE_LEN))
        {
            *slot = Shape::from_index(i).ok_or(GenerationError::NotEnoughSymbols)?;
        }

        // The secret code and the decoys
        let mut offered: Vec<usize> = index::sample(rng, self.catalogue.len(), spec.size).into_vec();
        offered.shuffle(rng);
        let secret: usize = *offered
            .choose(rng)
            .ok_or(GenerationError::BrokenInvariant("no code offered"))?;
        let output: [Shape; CODE_LEN] = apply(&self.catalogue[secret], &input);

        let matching: usize = offered
            .iter()
            .filter(|&&c| apply(&self.catalogue[c], &input) == output)
            .count();
        if matching != 1 {
            return Err(GenerationError::BrokenInvariant(
                "more than one offered code produces the output",
            ));
        }

        debug!(
            "Code puzzle {tier} level {level}: secret = {}, offered = {offered:?}",
            code_name(secret)
        );
        Puzzle::new(
            tier,
            level,
            spec.time_limit_secs,
            Layout::Code(CodeLayout {
                input,
                output,
                offered: offered.iter().map(|&c| self.catalogue[c]).collect(),
            }),
            offered.into_iter().map(Answer::Code).collect(),
            Answer::Code(secret),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::rng_from_seed;
    use proptest::prelude::*;

    #[test]
    fn default_catalogue_is_valid() {
        assert_eq!(validate_catalogue(&CATALOGUE), Ok(()));
    }

    #[test]
    fn non_bijective_code_is_rejected() {
        let catalogue: Vec<Code> = vec![[0, 1, 2, 3], [0, 0, 2, 3]];
        assert!(matches!(
            validate_catalogue(&catalogue),
            Err(GenerationError::InvalidCatalogue(_))
        ));
    }

    #[test]
    fn duplicated_code_is_rejected() {
        let catalogue: Vec<Code> = vec![[1, 0, 3, 2], [3, 2, 1, 0], [1, 0, 3, 2]];
        let err = validate_catalogue(&catalogue).unwrap_err();
        assert_eq!(
            err,
            GenerationError::InvalidCatalogue("code C is duplicated".into())
        );
    }

    #[test]
    fn apply_reorders_the_input() {
        let input = [Shape::Circle, Shape::Square, Shape::Triangle, Shape::Star];
        assert_eq!(
            apply(&[3, 2, 1, 0], &input),
            [Shape::Star, Shape::Triangle, Shape::Square, Shape::Circle]
        );
        assert_eq!(describe(&[1, 2, 3, 0]), "2 3 4 1");
    }

    #[test]
    fn code_names_are_letters() {
        assert_eq!(code_name(0), 'A');
        assert_eq!(code_name(7), 'H');
        assert_eq!(code_name(26), '?');
    }

    #[test]
    fn too_small_catalogue_fails() {
        let generator = CodeGenerator::with_catalogue(CATALOGUE[..2].to_vec());
        let mut rng = rng_from_seed(Some(9));
        assert_eq!(
            generator.generate(Tier::Medium, 1, &mut rng),
            Err(GenerationError::NotEnoughCodes {
                requested: 4,
                available: 2
            })
        );
    }

    proptest! {
        #[test]
        fn secret_code_maps_input_to_output(seed in any::<u64>(), level in 1usize..=12) {
            let mut rng = rng_from_seed(Some(seed));
            let generator = CodeGenerator::default();
            let p = generator.generate(Tier::Expert, level, &mut rng).unwrap();
            let Layout::Code(layout) = &p.layout else {
                panic!("code layout expected");
            };
            let Answer::Code(secret) = p.answer() else {
                panic!("code answer expected");
            };
            prop_assert_eq!(apply(&generator.catalogue()[secret], &layout.input), layout.output);
            prop_assert_eq!(layout.offered.len(), p.candidates.len());
            let mut distinct = layout.input.to_vec();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(distinct.len(), CODE_LEN);
        }
    }
}
