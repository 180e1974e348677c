/*
shapes.rs

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

//! Symbols placed in the puzzles.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::FromRepr;

/// Shape symbol.
///
/// The grid puzzles use the first `n` shapes for an `n×n` grid, so the number of shapes bounds
/// the largest grid that can be generated.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, FromRepr)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Star,
    Diamond,
    Hexagon,
}

impl Shape {
    /// Number of shapes in the catalogue.
    pub const COUNT: usize = 6;

    /// Return the shape at the given catalogue position.
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }

    /// Return the catalogue position of the shape.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Single character used by text front ends.
    pub fn glyph(self) -> char {
        match self {
            Shape::Circle => '●',
            Shape::Square => '■',
            Shape::Triangle => '▲',
            Shape::Star => '★',
            Shape::Diamond => '◆',
            Shape::Hexagon => '⬢',
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Shape::Circle => write!(f, "circle"),
            Shape::Square => write!(f, "square"),
            Shape::Triangle => write!(f, "triangle"),
            Shape::Star => write!(f, "star"),
            Shape::Diamond => write!(f, "diamond"),
            Shape::Hexagon => write!(f, "hexagon"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip_covers_catalogue() {
        for i in 0..Shape::COUNT {
            let shape = Shape::from_index(i).expect("shape in catalogue");
            assert_eq!(shape.index(), i);
        }
        assert_eq!(Shape::from_index(Shape::COUNT), None);
        assert_eq!(Shape::from_index(1000), None);
    }
}
