// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

/// A place in the pattern text, used for diagnostics.
///
/// Patterns are usually a single line, but the `line` and `column`
/// are still tracked so that multi-line patterns (e.g. loaded from
/// a file) report readable positions.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Location {
    pub index: usize,  // The character index in the pattern
    pub line: usize,   // 0-based
    pub column: usize, // 0-based
    pub length: usize, // The length of the text range; 0 for a single position
}

impl Location {
    /// Create a new `Location` representing a single position.
    pub fn new_position(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
            length: 0,
        }
    }

    /// Create a new `Location` representing a range of text.
    pub fn new_range(index: usize, line: usize, column: usize, length: usize) -> Self {
        Self {
            index,
            line,
            column,
            length,
        }
    }

    /// Create a range `Location` from a starting position and a length.
    pub fn from_position_and_length(position: &Location, length: usize) -> Self {
        Self::new_range(position.index, position.line, position.column, length)
    }

    /// Create a range `Location` from two positions: start and end (inclusive).
    pub fn from_position_pair_with_end_included(
        position_start: &Location,
        position_end_included: &Location,
    ) -> Self {
        Self::new_range(
            position_start.index,
            position_start.line,
            position_start.column,
            position_end_included.index - position_start.index + 1,
        )
    }

    /// Combine two ranges into a single range `Location`.
    pub fn from_range_pair(range_start: &Location, range_end: &Location) -> Self {
        Self::new_range(
            range_start.index,
            range_start.line,
            range_start.column,
            range_end.index - range_start.index + range_end.length,
        )
    }

    /// Get the starting position of a range as a `Location`.
    pub fn get_position_by_range_start(&self) -> Self {
        Self::new_position(self.index, self.line, self.column)
    }

    /// Move the position forward by one character.
    pub fn move_position_forward(&self) -> Self {
        Self {
            index: self.index + 1,
            column: self.column + 1,
            ..*self
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.length > 1 {
            write!(
                f,
                "{}:{}..{}",
                self.line + 1,
                self.column + 1,
                self.column + self.length
            )
        } else {
            write!(f, "{}:{}", self.line + 1, self.column + 1)
        }
    }
}
