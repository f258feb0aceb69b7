// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{charset::CharSet, flags::Flags, location::Location};

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    CharSetStart,         // [
    CharSetStartNegative, // [^
    CharSetEnd,           // ]

    ZeroOrMore,               // *
    ZeroOrMoreLazy,           // *?
    OneOrMore,                // +
    OneOrMoreLazy,            // +?
    Optional,                 // ?
    OptionalLazy,             // ??
    Repetition(Repetition, bool), // {m}, {m,}, {m,n}, and the lazy flag

    LogicOr,        // |
    StartAssertion, // ^
    EndAssertion,   // $
    Dot,            // .

    Char(char),
    CharRange(char, char), // a-z, only inside a charset

    // \d, \W, \p{Lu}, etc., the flag is true for the negated form
    PresetCharSet(CharSet, bool),

    BoundaryAssertion(char), // \b, \B, \A, \z, \Z

    GroupStart,                              // (
    NonCapturing,                            // (?:
    NamedCapture(String),                    // (?<name>
    LookAhead,                               // (?=
    LookAheadNegative,                       // (?!
    InlineFlags { on: Flags, off: Flags },   // (?i-s)
    ScopedFlags { on: Flags, off: Flags },   // (?i-s:
    GroupEnd,                                // )

    BackReferenceNumber(usize),      // \number
    BackReferenceIdentifier(String), // \k<name>
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Repetition {
    Specified(u32),
    AtLeast(u32),
    Range(u32, u32),
}

impl Repetition {
    pub fn bounds(&self) -> (u32, Option<u32>) {
        match self {
            Repetition::Specified(n) => (*n, Some(*n)),
            Repetition::AtLeast(n) => (*n, None),
            Repetition::Range(m, n) => (*m, Some(*n)),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct TokenWithRange {
    pub token: Token,
    pub range: Location,
}

impl TokenWithRange {
    pub fn new(token: Token, range: Location) -> Self {
        Self { token, range }
    }

    pub fn from_position_and_length(token: Token, position: &Location, length: usize) -> Self {
        Self {
            token,
            range: Location::from_position_and_length(position, length),
        }
    }
}
