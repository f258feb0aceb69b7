// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use bitflags::bitflags;

bitflags! {
    /// Matching modes, set when compiling a pattern or inline with
    /// `(?imsU-imsU)`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        const CASE_INSENSITIVE = 0x01;
        const MULTILINE = 0x02;
        const DOT_ALL = 0x04;
        const LAZY_DEFAULT = 0x08;
    }
}

impl Flags {
    /// The flag for an inline flag letter.
    pub fn from_letter(c: char) -> Option<Flags> {
        match c {
            'i' => Some(Flags::CASE_INSENSITIVE),
            'm' => Some(Flags::MULTILINE),
            's' => Some(Flags::DOT_ALL),
            'U' => Some(Flags::LAZY_DEFAULT),
            _ => None,
        }
    }
}

bitflags! {
    /// The optional machine extensions a backend accepts.
    ///
    /// A backend that declines an extension makes the compiler fall
    /// back to plain choice points, results are identical either way.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Extensions: u8 {
        const HINT = 0x01;
        const BATCHED_REPEAT = 0x02;
        const CONDITIONAL_JUMP = 0x04;
        const SHIFT_TABLE = 0x08;
    }
}
