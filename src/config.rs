// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::flags::{Extensions, Flags};

/// Options for compiling and running a regex.
///
/// Every knob is optional so that two configurations can be layered
/// with `overwrite` without the defaults of one clobbering the
/// explicit values of the other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    flags: Option<Flags>,
    elide_unreferenced_groups: Option<bool>,
    backtrack_limit: Option<Option<u64>>,
    extensions: Option<Extensions>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn flags(self, flags: Flags) -> Config {
        Config {
            flags: Some(flags),
            ..self
        }
    }

    /// Drop the capture bookkeeping of unnamed groups that no
    /// backreference refers to. Such groups always report no match.
    pub fn elide_unreferenced_groups(self, yes: bool) -> Config {
        Config {
            elide_unreferenced_groups: Some(yes),
            ..self
        }
    }

    /// Abort a search with `RegexError::BacktrackLimitExceeded` once one
    /// match attempt has backtracked `limit` times.
    pub fn backtrack_limit(self, limit: Option<u64>) -> Config {
        Config {
            backtrack_limit: Some(limit),
            ..self
        }
    }

    pub fn extensions(self, extensions: Extensions) -> Config {
        Config {
            extensions: Some(extensions),
            ..self
        }
    }

    pub fn get_flags(&self) -> Flags {
        self.flags.unwrap_or(Flags::empty())
    }

    pub fn get_elide_unreferenced_groups(&self) -> bool {
        self.elide_unreferenced_groups.unwrap_or(false)
    }

    pub fn get_backtrack_limit(&self) -> Option<u64> {
        self.backtrack_limit.unwrap_or(None)
    }

    pub fn get_extensions(&self) -> Extensions {
        self.extensions.unwrap_or(Extensions::all())
    }

    /// Values explicitly set in `o` win over the values of `self`.
    pub fn overwrite(&self, o: Config) -> Config {
        Config {
            flags: o.flags.or(self.flags),
            elide_unreferenced_groups: o
                .elide_unreferenced_groups
                .or(self.elide_unreferenced_groups),
            backtrack_limit: o.backtrack_limit.or(self.backtrack_limit),
            extensions: o.extensions.or(self.extensions),
        }
    }
}
