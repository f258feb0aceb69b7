// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::{Display, Write};

use bitflags::bitflags;

pub const MAX_CODE_POINT: u32 = 0x10FFFF;
pub const ASCII_MAX: u32 = 0x7F;

// code points outside of this range have no simple lowercase mapping,
// the upper bound is the last Adlam capital letter.
const CASED_RANGE_START: u32 = 0x41;
const CASED_RANGE_END: u32 = 0x1E921;

bitflags! {
    /// A coarse classification of the non-ASCII code points.
    ///
    /// Every non-ASCII char belongs to exactly one of the four basic
    /// classes, see `CharClass::of`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharClass: u8 {
        const UPPER = 0b0001;
        const LOWER = 0b0010;
        const OTHER_LETTER = 0b0100;
        const NON_LETTER = 0b1000;

        const LETTER = Self::UPPER.bits() | Self::LOWER.bits() | Self::OTHER_LETTER.bits();
        const ALL = Self::LETTER.bits() | Self::NON_LETTER.bits();
    }
}

impl CharClass {
    /// The basic class of a (non-ASCII) char.
    pub fn of(c: char) -> CharClass {
        if c.is_alphabetic() {
            if c.is_uppercase() {
                CharClass::UPPER
            } else if c.is_lowercase() {
                CharClass::LOWER
            } else {
                CharClass::OTHER_LETTER
            }
        } else {
            CharClass::NON_LETTER
        }
    }
}

/// The simple (single char) lowercase mapping of `c`.
///
/// Chars whose lowercase form expands to several chars (e.g. 'İ')
/// are kept unchanged.
pub fn simple_fold(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }

    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// A set of code points.
///
/// The set is the union of a list of sorted, non-overlapping and
/// non-adjacent ranges and, for the chars above 0x7F only, a class tag.
///
/// ```diagram
/// [a-z\p{Lu}]  =>  ranges: [(0x41, 0x5A), (0x61, 0x7A)]
///                  class:  UPPER
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
    class: CharClass,
}

impl CharSet {
    pub fn empty() -> Self {
        Self {
            ranges: vec![],
            class: CharClass::empty(),
        }
    }

    /// Build a set from an arbitrary list of inclusive ranges.
    ///
    /// Panics if a range has `low > high`, the parser checks ranges
    /// before calling this.
    pub fn from_ranges(ranges: &[(u32, u32)]) -> Self {
        Self::new(ranges.to_vec(), CharClass::empty())
    }

    pub fn from_char(c: char) -> Self {
        Self {
            ranges: vec![(c as u32, c as u32)],
            class: CharClass::empty(),
        }
    }

    pub fn from_chars(chars: &[char]) -> Self {
        let ranges: Vec<(u32, u32)> = chars.iter().map(|c| (*c as u32, *c as u32)).collect();
        Self::new(ranges, CharClass::empty())
    }

    pub fn from_class(class: CharClass) -> Self {
        Self {
            ranges: vec![],
            class,
        }
    }

    /// Every code point.
    pub fn any() -> Self {
        Self {
            ranges: vec![(0, MAX_CODE_POINT)],
            class: CharClass::empty(),
        }
    }

    fn new(mut ranges: Vec<(u32, u32)>, class: CharClass) -> Self {
        for (low, high) in &ranges {
            assert!(
                low <= high && *high <= MAX_CODE_POINT,
                "invalid char range {:#x}-{:#x}",
                low,
                high
            );
        }

        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (low, high) in ranges {
            match merged.last_mut() {
                Some(last) if low <= last.1.saturating_add(1) => {
                    last.1 = last.1.max(high);
                }
                _ => merged.push((low, high)),
            }
        }

        Self {
            ranges: merged,
            class,
        }
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub fn class(&self) -> CharClass {
        self.class
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && self.class.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        let code = c as u32;

        let in_ranges = self
            .ranges
            .binary_search_by(|(low, high)| {
                if *high < code {
                    std::cmp::Ordering::Less
                } else if *low > code {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok();

        in_ranges || (code > ASCII_MAX && self.class.intersects(CharClass::of(c)))
    }

    /// Union of two sets.
    pub fn merge(&self, other: &CharSet) -> CharSet {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        Self::new(ranges, self.class | other.class)
    }

    /// Complement of the set.
    ///
    /// A tagged set can only be negated when all of its explicit ranges
    /// are ASCII: the ASCII part is complemented by ranges, and the
    /// non-ASCII part by flipping the class tag. Returns `None` for a
    /// tagged set with non-ASCII ranges.
    pub fn negate(&self) -> Option<CharSet> {
        if self.class.is_empty() {
            return Some(Self {
                ranges: complement_ranges(&self.ranges, MAX_CODE_POINT),
                class: CharClass::empty(),
            });
        }

        if self.ranges.iter().any(|(_, high)| *high > ASCII_MAX) {
            return None;
        }

        Some(Self {
            ranges: complement_ranges(&self.ranges, ASCII_MAX),
            class: CharClass::ALL.difference(self.class),
        })
    }

    /// The set extended with the simple lowercase form of every member.
    ///
    /// Matching under case-insensitive mode folds the subject char with
    /// `simple_fold` and then tests it against the folded set.
    pub fn to_lower_case(&self) -> CharSet {
        let mut ranges = self.ranges.clone();

        for (low, high) in &self.ranges {
            let from = (*low).max(CASED_RANGE_START);
            let to = (*high).min(CASED_RANGE_END);

            let mut code = from;
            while code <= to {
                if let Some(c) = char::from_u32(code) {
                    let folded = simple_fold(c);
                    if folded != c {
                        ranges.push((folded as u32, folded as u32));
                    }
                }
                code += 1;
            }
        }

        // a folded subject letter is never upper case, so a tag on
        // either case has to accept both.
        let class = if self.class.intersects(CharClass::UPPER | CharClass::LOWER) {
            self.class | CharClass::UPPER | CharClass::LOWER
        } else {
            self.class
        };

        Self::new(ranges, class)
    }

    /// Returns the only member of the set, if there is exactly one.
    pub fn single_char(&self) -> Option<char> {
        match self.ranges.as_slice() {
            [(low, high)] if low == high && self.class.is_empty() => char::from_u32(*low),
            _ => None,
        }
    }

    pub fn is_single_char(&self) -> bool {
        self.single_char().is_some()
    }

    /// The members of the set if it only contains a few ASCII chars,
    /// used by the search loop to scan with `memchr`.
    pub fn ascii_bytes(&self, max_count: usize) -> Option<Vec<u8>> {
        if !self.class.is_empty() {
            return None;
        }

        let mut bytes = vec![];
        for (low, high) in &self.ranges {
            if *high > ASCII_MAX {
                return None;
            }

            for code in *low..=*high {
                if bytes.len() == max_count {
                    return None;
                }
                bytes.push(code as u8);
            }
        }

        Some(bytes)
    }
}

fn complement_ranges(ranges: &[(u32, u32)], max: u32) -> Vec<(u32, u32)> {
    let mut complement = vec![];
    let mut next = 0u32;

    for (low, high) in ranges {
        if *low > next {
            complement.push((next, low - 1));
        }
        next = high + 1;
    }

    if next <= max {
        complement.push((next, max));
    }

    complement
}

// Preset sets.
impl CharSet {
    /// `\d`
    pub fn digit() -> Self {
        Self::from_ranges(&[('0' as u32, '9' as u32)])
    }

    /// `\w`
    pub fn word() -> Self {
        Self::from_ranges(&[
            ('0' as u32, '9' as u32),
            ('A' as u32, 'Z' as u32),
            ('_' as u32, '_' as u32),
            ('a' as u32, 'z' as u32),
        ])
    }

    /// `\s`
    pub fn space() -> Self {
        Self::from_ranges(&[(0x09, 0x0D), (0x20, 0x20)])
    }

    /// The set for the property name of `\p{name}`.
    ///
    /// The POSIX names are ASCII-only, the Unicode letter categories
    /// use the class tag for the non-ASCII part.
    pub fn from_property(name: &str) -> Option<Self> {
        let name = name.strip_prefix("Is").unwrap_or(name);

        let set = match name {
            "L" | "Letter" | "Alphabetic" => Self::new(
                vec![(0x41, 0x5A), (0x61, 0x7A)],
                CharClass::LETTER,
            ),
            "Lu" | "Uppercase" => Self::new(vec![(0x41, 0x5A)], CharClass::UPPER),
            "Ll" | "Lowercase" => Self::new(vec![(0x61, 0x7A)], CharClass::LOWER),
            "Lower" => Self::from_ranges(&[(0x61, 0x7A)]),
            "Upper" => Self::from_ranges(&[(0x41, 0x5A)]),
            "ASCII" => Self::from_ranges(&[(0x00, 0x7F)]),
            "Alpha" => Self::from_ranges(&[(0x41, 0x5A), (0x61, 0x7A)]),
            "Digit" => Self::digit(),
            "Alnum" => Self::from_ranges(&[(0x30, 0x39), (0x41, 0x5A), (0x61, 0x7A)]),
            "Punct" => {
                Self::from_ranges(&[(0x21, 0x2F), (0x3A, 0x40), (0x5B, 0x60), (0x7B, 0x7E)])
            }
            "Graph" => Self::from_ranges(&[(0x21, 0x7E)]),
            "Print" => Self::from_ranges(&[(0x20, 0x7E)]),
            "Blank" => Self::from_ranges(&[(0x09, 0x09), (0x20, 0x20)]),
            "Cntrl" => Self::from_ranges(&[(0x00, 0x1F), (0x7F, 0x7F)]),
            "XDigit" => Self::from_ranges(&[(0x30, 0x39), (0x41, 0x46), (0x61, 0x66)]),
            "Space" => Self::space(),
            _ => return None,
        };

        Some(set)
    }
}

fn write_code_point(f: &mut impl Write, code: u32) -> std::fmt::Result {
    match char::from_u32(code) {
        Some(c) if c.is_ascii_alphanumeric() => f.write_char(c),
        Some(c) if c.is_ascii_graphic() => write!(f, "\\{}", c),
        _ => write!(f, "\\x{{{:x}}}", code),
    }
}

impl Display for CharSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('[')?;

        for (low, high) in &self.ranges {
            write_code_point(f, *low)?;
            if high > low {
                f.write_char('-')?;
                write_code_point(f, *high)?;
            }
        }

        if !self.class.is_empty() {
            // e.g. `{upper|lower}`
            let names: Vec<&str> = self
                .class
                .iter_names()
                .filter(|(_, flag)| {
                    // skip the composed names
                    flag.bits().count_ones() == 1
                })
                .map(|(name, _)| name)
                .collect();
            write!(f, "{{{}}}", names.join("|").to_lowercase())?;
        }

        f.write_char(']')
    }
}
