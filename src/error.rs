// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use thiserror::Error;

use crate::location::Location;

/// Errors raised while compiling a pattern or running a matcher.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RegexError {
    /// The pattern text is malformed. `offset` is the character index
    /// (not the byte index) of the offending construct.
    #[error("pattern error at offset {offset}: {message}")]
    Pattern { message: String, offset: usize },

    /// The replacement template given to `append_replacement` is malformed.
    #[error("replacement error at offset {offset}: {message}")]
    Replacement { message: String, offset: usize },

    /// The matcher was queried in a state where the query has no answer,
    /// e.g. asking for a group before any successful match.
    #[error("matcher state error: {0}")]
    State(String),

    /// The configured backtrack ceiling was reached before the attempt
    /// could succeed or fail.
    #[error("backtrack limit exceeded after {count} backtracks")]
    BacktrackLimitExceeded { count: u64 },

    /// The compiler or the interpreter found itself in an inconsistent state.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RegexError {
    pub fn pattern(message: impl Into<String>, location: &Location) -> Self {
        RegexError::Pattern {
            message: message.into(),
            offset: location.index,
        }
    }

    pub fn pattern_at(message: impl Into<String>, offset: usize) -> Self {
        RegexError::Pattern {
            message: message.into(),
            offset,
        }
    }

    /// The character offset carried by pattern and replacement errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            RegexError::Pattern { offset, .. } | RegexError::Replacement { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }
}
