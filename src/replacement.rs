// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! The replacement template of `Matcher::append_replacement`.
//!
//! - `$n` is the text of group `n`, all the digits after `$` make up
//!   the number.
//! - `${name}` is the text of a named group, or the value of an
//!   external variable.
//! - `\c` is the char `c` itself.
//!
//! Everything else is copied as it is. A group that did not
//! participate in the match expands to nothing.

use crate::{error::RegexError, variables::Variables};

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),

    // the index into the variable table
    Variable(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub pieces: Vec<Piece>,
}

fn replacement_error(message: impl Into<String>, offset: usize) -> RegexError {
    RegexError::Replacement {
        message: message.into(),
        offset,
    }
}

impl Replacement {
    pub fn parse(template: &str, variables: &Variables) -> Result<Replacement, RegexError> {
        let chars: Vec<char> = template.chars().collect();
        let mut pieces = vec![];
        let mut text = String::new();
        let mut idx = 0;

        while idx < chars.len() {
            match chars[idx] {
                '\\' => {
                    let Some(c) = chars.get(idx + 1) else {
                        return Err(replacement_error("Trailing backslash.", idx));
                    };
                    text.push(*c);
                    idx += 2;
                }
                '$' => {
                    let start = idx;
                    idx += 1;

                    let index = match chars.get(idx) {
                        Some(c) if c.is_ascii_digit() => {
                            let digits: String = chars[idx..]
                                .iter()
                                .take_while(|c| c.is_ascii_digit())
                                .collect();
                            idx += digits.len();

                            match digits.parse::<usize>() {
                                Ok(number) if number <= variables.group_count() => number,
                                _ => {
                                    return Err(replacement_error(
                                        format!("No group {}.", digits),
                                        start,
                                    ))
                                }
                            }
                        }
                        Some('{') => {
                            let name: String =
                                chars[idx + 1..].iter().take_while(|c| **c != '}').collect();
                            let close = idx + 1 + name.chars().count();
                            if close >= chars.len() {
                                return Err(replacement_error(
                                    "Unclosed group name, expected \"}\".",
                                    start,
                                ));
                            }
                            idx = close + 1;

                            variables.find(&name).ok_or_else(|| {
                                replacement_error(
                                    format!("No group or variable named \"{}\".", name),
                                    start,
                                )
                            })?
                        }
                        _ => {
                            return Err(replacement_error(
                                "Expected a group number or \"{name}\" after \"$\".",
                                start,
                            ))
                        }
                    };

                    if !text.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut text)));
                    }
                    pieces.push(Piece::Variable(index));
                }
                c => {
                    text.push(c);
                    idx += 1;
                }
            }
        }

        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }

        Ok(Replacement { pieces })
    }

    /// Appends the expansion to `out`, `value_of` returns the text of a
    /// variable by its index.
    pub fn expand<'a, F>(&self, value_of: F, out: &mut String)
    where
        F: Fn(usize) -> Option<&'a str>,
    {
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Variable(index) => {
                    if let Some(value) = value_of(*index) {
                        out.push_str(value);
                    }
                }
            }
        }
    }
}
