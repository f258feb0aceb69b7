// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

mod ast;
mod charwithposition;
mod compiler;
mod config;
mod error;
mod flags;
mod input;
mod location;
mod peekableiter;
mod replacement;
mod syntax;
mod variables;
mod vm;

pub mod charset;
pub mod instr;
pub mod machine;
pub mod regex;

pub use ast::AssertionKind;
pub use config::Config;
pub use error::RegexError;
pub use flags::{Extensions, Flags};
pub use input::{IterRefill, ReadRefill, Refill};
pub use instr::Program;
pub use machine::Machine;
pub use regex::{Captures, GroupRef, Match, Matcher, Regex, RegexBuilder};
