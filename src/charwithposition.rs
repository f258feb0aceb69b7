// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::str::Chars;

use crate::location::Location;

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct CharWithPosition {
    pub character: char,
    pub position: Location,
}

impl CharWithPosition {
    pub fn new(character: char, position: Location) -> Self {
        Self {
            character,
            position,
        }
    }
}

/// Walks the pattern text and tags every char with its location.
pub struct CharsWithPositionIter<'a> {
    upstream: Chars<'a>,
    current_position: Location,
}

impl<'a> CharsWithPositionIter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            upstream: text.chars(),
            current_position: Location::new_position(0, 0, 0),
        }
    }

    /// The position just after the last char yielded, i.e. where
    /// the end of the pattern is.
    pub fn end_position(&self) -> Location {
        self.current_position
    }
}

impl Iterator for CharsWithPositionIter<'_> {
    type Item = CharWithPosition;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.upstream.next()?;
        let last_position = self.current_position;

        self.current_position.index += 1;

        // a lone '\r' does not start a new line, "\r\n" is counted
        // once by its '\n'.
        if c == '\n' {
            self.current_position.line += 1;
            self.current_position.column = 0;
        } else {
            self.current_position.column += 1;
        }

        Some(CharWithPosition::new(c, last_position))
    }
}
