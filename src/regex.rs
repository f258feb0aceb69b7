// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    borrow::Cow,
    ops::{Index, Range},
};

use log::{debug, trace};

use crate::{
    compiler::compile,
    config::Config,
    error::RegexError,
    flags::{Extensions, Flags},
    input::{Input, Refill},
    instr::{Assembler, Program},
    replacement::Replacement,
    syntax::parser::parse_from_str,
    variables::{Slot, Variables},
    vm::{Anchor, Vm},
};

/// A compiled pattern.
///
/// A `Regex` is immutable and can be shared, the matching state lives
/// in the `Matcher`s created from it.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: String,
    config: Config,
    program: Program,
    variables: Variables,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, RegexError> {
        RegexBuilder::new(pattern).build()
    }

    pub fn with_flags(pattern: &str, flags: Flags) -> Result<Self, RegexError> {
        RegexBuilder::new(pattern).flags(flags).build()
    }

    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder::new(pattern)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> Flags {
        self.config.get_flags()
    }

    /// The number of capture groups, not counting the whole match.
    pub fn group_count(&self) -> usize {
        self.variables.group_count()
    }

    /// The names of the variables the pattern refers to but does not
    /// capture, see `Matcher::reset_with_variables`.
    pub fn external_names(&self) -> impl Iterator<Item = &str> {
        self.variables.external_names()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn matcher<'r, 't>(&'r self, text: impl Into<Cow<'t, str>>) -> Matcher<'r, 't> {
        Matcher {
            regex: self,
            vm: Vm::new(&self.program, self.config.get_backtrack_limit()),
            input: Input::new(text),
            externals: vec![None; self.variables.external_count()],
            matched: false,
            last_end: None,
            append_position: 0,
        }
    }

    pub fn is_match(&self, text: &str) -> Result<bool, RegexError> {
        self.matcher(text).find()
    }

    pub fn find<'r, 't>(&'r self, text: &'t str) -> Result<Option<Match<'r, 't>>, RegexError> {
        let mut matcher = self.matcher(text);
        if !matcher.find()? {
            return Ok(None);
        }
        matcher.current_match(text).map(Some)
    }

    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> Matches<'r, 't> {
        Matches {
            matcher: self.matcher(text),
            text,
            done: false,
        }
    }

    pub fn captures<'r, 't>(
        &'r self,
        text: &'t str,
    ) -> Result<Option<Captures<'r, 't>>, RegexError> {
        let mut matcher = self.matcher(text);
        if !matcher.find()? {
            return Ok(None);
        }
        matcher.current_captures(text).map(Some)
    }

    pub fn captures_iter<'r, 't>(&'r self, text: &'t str) -> CaptureMatches<'r, 't> {
        CaptureMatches {
            matcher: self.matcher(text),
            text,
            done: false,
        }
    }

    /// Replaces the first match, see `Matcher::append_replacement`
    /// for the syntax of the replacement.
    pub fn replace_first(&self, text: &str, replacement: &str) -> Result<String, RegexError> {
        let replacement = Replacement::parse(replacement, &self.variables)?;
        let mut matcher = self.matcher(text);
        let mut out = String::with_capacity(text.len());

        if matcher.find()? {
            matcher.append_expansion(&mut out, &replacement)?;
        }
        matcher.append_tail(&mut out);
        Ok(out)
    }

    pub fn replace_all(&self, text: &str, replacement: &str) -> Result<String, RegexError> {
        let replacement = Replacement::parse(replacement, &self.variables)?;
        let mut matcher = self.matcher(text);
        let mut out = String::with_capacity(text.len());

        while matcher.find()? {
            matcher.append_expansion(&mut out, &replacement)?;
        }
        matcher.append_tail(&mut out);
        Ok(out)
    }

    /// The pieces of the text between the matches.
    pub fn split<'t>(&self, text: &'t str) -> Result<Vec<&'t str>, RegexError> {
        let mut matcher = self.matcher(text);
        let mut pieces = vec![];
        let mut last = 0;

        while matcher.find()? {
            let (start, end) = matcher.whole_range()?;
            pieces.push(&text[last..start]);
            last = end;
        }
        pieces.push(&text[last..]);

        Ok(pieces)
    }
}

/// Builds a `Regex` with options other than the defaults.
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pattern: String,
    config: Config,
}

impl RegexBuilder {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_owned(),
            config: Config::new(),
        }
    }

    /// The options set in `config` override the ones of the builder.
    pub fn configure(&mut self, config: Config) -> &mut Self {
        self.config = self.config.overwrite(config);
        self
    }

    pub fn flags(&mut self, flags: Flags) -> &mut Self {
        self.configure(Config::new().flags(flags))
    }

    fn set_flag(&mut self, flag: Flags, yes: bool) -> &mut Self {
        let mut flags = self.config.get_flags();
        flags.set(flag, yes);
        self.flags(flags)
    }

    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.set_flag(Flags::CASE_INSENSITIVE, yes)
    }

    pub fn multi_line(&mut self, yes: bool) -> &mut Self {
        self.set_flag(Flags::MULTILINE, yes)
    }

    pub fn dot_all(&mut self, yes: bool) -> &mut Self {
        self.set_flag(Flags::DOT_ALL, yes)
    }

    /// Makes quantifiers lazy unless followed by `?`.
    pub fn lazy_default(&mut self, yes: bool) -> &mut Self {
        self.set_flag(Flags::LAZY_DEFAULT, yes)
    }

    pub fn elide_unreferenced_groups(&mut self, yes: bool) -> &mut Self {
        self.configure(Config::new().elide_unreferenced_groups(yes))
    }

    pub fn backtrack_limit(&mut self, limit: Option<u64>) -> &mut Self {
        self.configure(Config::new().backtrack_limit(limit))
    }

    pub fn extensions(&mut self, extensions: Extensions) -> &mut Self {
        self.configure(Config::new().extensions(extensions))
    }

    pub fn build(&self) -> Result<Regex, RegexError> {
        let config = self.config.clone();

        let mut ast = parse_from_str(&self.pattern, config.get_flags())?;
        ast.resolve_references()?;
        if config.get_elide_unreferenced_groups() {
            ast.elide_unreferenced_groups();
        }
        ast.analyze();

        let variables = Variables::from_ast(&ast);

        let mut assembler = Assembler::new(config.get_extensions());
        compile(&ast, &variables, &mut assembler)?;
        let program = assembler.finish()?;

        debug!(
            "Compiled {:?}: {} groups, {} external variables, {} bytes of code, hint {:?}.",
            self.pattern,
            variables.group_count(),
            variables.external_count(),
            program.code.len(),
            program.hint
        );
        trace!("Program of {:?}:\n{}", self.pattern, program);

        Ok(Regex {
            pattern: self.pattern.clone(),
            config,
            program,
            variables,
        })
    }
}

/// A group given by number or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for GroupRef<'_> {
    fn from(index: usize) -> Self {
        GroupRef::Index(index)
    }
}

impl<'a> From<&'a str> for GroupRef<'a> {
    fn from(name: &'a str) -> Self {
        GroupRef::Name(name)
    }
}

/// The matching state of a `Regex` over one input.
///
/// A matcher is not meant to be shared between threads, clone it
/// instead. A clone does not take over the refiller.
#[derive(Debug, Clone)]
pub struct Matcher<'r, 't> {
    regex: &'r Regex,
    vm: Vm<'r>,
    input: Input<'t>,
    externals: Vec<Option<String>>,

    // whether the cells hold a match
    matched: bool,

    // the end of the latest match, where `find` goes on from
    last_end: Option<usize>,

    // the end of the text copied by `append_replacement`
    append_position: usize,
}

impl<'r, 't> Matcher<'r, 't> {
    pub fn regex(&self) -> &'r Regex {
        self.regex
    }

    /// The input seen so far.
    pub fn text(&self) -> &str {
        self.input.as_str()
    }

    pub fn group_count(&self) -> usize {
        self.regex.group_count()
    }

    /// Whether the whole input matches.
    pub fn matches(&mut self) -> Result<bool, RegexError> {
        let found = self.run(0, Anchor::Whole)?;
        self.record_end()?;
        Ok(found)
    }

    /// Whether a prefix of the input matches.
    pub fn looking_at(&mut self) -> Result<bool, RegexError> {
        let found = self.run(0, Anchor::Start)?;
        self.record_end()?;
        Ok(found)
    }

    /// Finds the next match after the previous one.
    ///
    /// An empty match right at the end of the previous match is
    /// skipped, and the search is tried once more from one char later.
    pub fn find(&mut self) -> Result<bool, RegexError> {
        let previous_end = self.last_end;

        if !self.run(previous_end.unwrap_or(0), Anchor::Unanchored)? {
            return Ok(false);
        }

        let (start, end) = self.whole_range()?;
        if start == end && Some(start) == previous_end {
            let Some(c) = self.input.char_at(start) else {
                self.matched = false;
                return Ok(false);
            };

            if !self.run(start + c.len_utf8(), Anchor::Unanchored)? {
                return Ok(false);
            }
        }

        self.record_end()?;
        Ok(true)
    }

    /// Resets the matcher and finds the first match at or after `from`.
    pub fn find_from(&mut self, from: usize) -> Result<bool, RegexError> {
        if !self.input.ensure(from, 0) || !self.input.as_str().is_char_boundary(from) {
            return Err(RegexError::State(format!(
                "Offset {} is out of the input or not at a char boundary.",
                from
            )));
        }

        self.rewind();
        let found = self.run(from, Anchor::Unanchored)?;
        self.record_end()?;
        Ok(found)
    }

    pub fn start<'g>(&self, group: impl Into<GroupRef<'g>>) -> Result<Option<usize>, RegexError> {
        let index = self.group_index(group.into())?;
        Ok(self.group_range(index)?.map(|(start, _)| start))
    }

    pub fn end<'g>(&self, group: impl Into<GroupRef<'g>>) -> Result<Option<usize>, RegexError> {
        let index = self.group_index(group.into())?;
        Ok(self.group_range(index)?.map(|(_, end)| end))
    }

    /// The text of a group of the latest match, `None` when the group
    /// did not participate.
    pub fn group<'g>(&self, group: impl Into<GroupRef<'g>>) -> Result<Option<&str>, RegexError> {
        let index = self.group_index(group.into())?;
        Ok(self
            .group_range(index)?
            .and_then(|(start, end)| self.input.as_str().get(start..end)))
    }

    /// Appends the text between the previous append and the latest
    /// match, then the expanded replacement.
    ///
    /// In the replacement `$n` is group `n`, `${name}` is a named group
    /// (or an external variable) and `\` makes the next char literal.
    pub fn append_replacement(
        &mut self,
        out: &mut String,
        replacement: &str,
    ) -> Result<(), RegexError> {
        if !self.matched {
            return Err(no_match());
        }

        let replacement = Replacement::parse(replacement, &self.regex.variables)?;
        self.append_expansion(out, &replacement)
    }

    /// Appends the rest of the input after the latest append.
    pub fn append_tail(&mut self, out: &mut String) {
        self.input.drain();
        if let Some(tail) = self.input.as_str().get(self.append_position..) {
            out.push_str(tail);
        }
    }

    /// Starts over with a new input. The refiller is dropped, the
    /// external variables are kept.
    pub fn reset(&mut self, text: impl Into<Cow<'t, str>>) {
        self.input = Input::new(text);
        self.rewind();
    }

    /// Starts over with a new input and new values of the external
    /// variables. Variables not listed are unset, and a backreference
    /// to an unset variable fails.
    pub fn reset_with_variables(
        &mut self,
        text: impl Into<Cow<'t, str>>,
        assignments: &[(&str, &str)],
    ) -> Result<(), RegexError> {
        let mut externals = vec![None; self.regex.variables.external_count()];

        for (name, value) in assignments {
            match self.regex.variables.slot_of(name) {
                Some(Slot::External(index)) => externals[index] = Some((*value).to_owned()),
                _ => {
                    return Err(RegexError::State(format!(
                        "No external variable named \"{}\".",
                        name
                    )))
                }
            }
        }

        self.externals = externals;
        self.reset(text);
        Ok(())
    }

    /// Sets the supplier of more input.
    pub fn set_refill(&mut self, refill: impl Refill + 't) {
        self.input.set_refill(Some(Box::new(refill)));
    }

    fn rewind(&mut self) {
        self.vm.clear();
        self.matched = false;
        self.last_end = None;
        self.append_position = 0;
    }

    fn run(&mut self, from: usize, anchor: Anchor) -> Result<bool, RegexError> {
        self.matched = false;
        self.matched = self
            .vm
            .search(&mut self.input, from, anchor, &self.externals)?;
        Ok(self.matched)
    }

    fn record_end(&mut self) -> Result<(), RegexError> {
        if self.matched {
            self.last_end = Some(self.whole_range()?.1);
        }
        Ok(())
    }

    fn group_index(&self, group: GroupRef) -> Result<usize, RegexError> {
        if !self.matched {
            return Err(no_match());
        }

        let group_count = self.regex.group_count();
        match group {
            GroupRef::Index(index) if index <= group_count => Ok(index),
            GroupRef::Index(index) => Err(RegexError::State(format!(
                "No group {}, the pattern has {} groups.",
                index, group_count
            ))),
            GroupRef::Name(name) => match self.regex.variables.find(name) {
                Some(index) if index <= group_count => Ok(index),
                _ => Err(RegexError::State(format!("No group named \"{}\".", name))),
            },
        }
    }

    fn group_range(&self, index: usize) -> Result<Option<(usize, usize)>, RegexError> {
        if !self.matched {
            return Err(no_match());
        }

        let (begin_cell, end_cell) = self
            .regex
            .variables
            .capture_cells(index)
            .ok_or_else(|| RegexError::State(format!("No group {}.", index)))?;

        let cells = self.vm.cells();
        match (cells.get(begin_cell), cells.get(end_cell)) {
            (Some(&begin), Some(&end)) if begin >= 0 && end >= begin => {
                Ok(Some((begin as usize, end as usize)))
            }
            (Some(_), Some(_)) => Ok(None),
            _ => Err(RegexError::Internal(format!(
                "The cells of group {} do not exist.",
                index
            ))),
        }
    }

    fn whole_range(&self) -> Result<(usize, usize), RegexError> {
        self.group_range(0)?
            .ok_or_else(|| RegexError::Internal("The whole match is not set.".to_owned()))
    }

    // The value of a variable of the latest match.
    fn variable_value(&self, index: usize) -> Option<&str> {
        match self.regex.variables.get(index)?.slot {
            Slot::Capture { .. } => {
                let (start, end) = self.group_range(index).ok()??;
                self.input.as_str().get(start..end)
            }
            Slot::External(external) => self.externals.get(external)?.as_deref(),
        }
    }

    fn append_expansion(
        &mut self,
        out: &mut String,
        replacement: &Replacement,
    ) -> Result<(), RegexError> {
        let (start, end) = self.whole_range()?;

        if let Some(gap) = self.input.as_str().get(self.append_position..start) {
            out.push_str(gap);
        }
        replacement.expand(|index| self.variable_value(index), out);

        self.append_position = end;
        Ok(())
    }

    // The latest match as a value borrowing `text`, which must be the
    // text the matcher was created with.
    fn current_match(&self, text: &'t str) -> Result<Match<'r, 't>, RegexError> {
        let (start, end) = self.whole_range()?;
        Ok(Match::new(start, end, None, &text[start..end]))
    }

    fn current_captures(&self, text: &'t str) -> Result<Captures<'r, 't>, RegexError> {
        let regex = self.regex;
        let mut matches = vec![];

        for index in 0..=regex.group_count() {
            let item = self.group_range(index)?.map(|(start, end)| {
                Match::new(
                    start,
                    end,
                    regex.variables.group_name(index),
                    &text[start..end],
                )
            });
            matches.push(item);
        }

        Ok(Captures { matches })
    }
}

fn no_match() -> RegexError {
    RegexError::State("No match available.".to_owned())
}

/// An iterator over the successive matches in a text.
pub struct Matches<'r, 't> {
    matcher: Matcher<'r, 't>,
    text: &'t str,
    done: bool,
}

impl<'r, 't> Iterator for Matches<'r, 't> {
    type Item = Result<Match<'r, 't>, RegexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = match self.matcher.find() {
            Ok(true) => self.matcher.current_match(self.text),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };

        self.done = item.is_err();
        Some(item)
    }
}

pub struct CaptureMatches<'r, 't> {
    matcher: Matcher<'r, 't>,
    text: &'t str,
    done: bool,
}

impl<'r, 't> Iterator for CaptureMatches<'r, 't> {
    type Item = Result<Captures<'r, 't>, RegexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = match self.matcher.find() {
            Ok(true) => self.matcher.current_captures(self.text),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };

        self.done = item.is_err();
        Some(item)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Captures<'r, 't> {
    // `None` for the groups that did not participate
    pub matches: Vec<Option<Match<'r, 't>>>,
}

impl<'r, 't> Captures<'r, 't> {
    // the following methods are intended to
    // be compatible with the 'Captures' API of crate 'regex':
    // https://docs.rs/regex/latest/regex/struct.Captures.html

    pub fn get(&self, index: usize) -> Option<&Match<'r, 't>> {
        self.matches.get(index)?.as_ref()
    }

    pub fn name(&self, name: &str) -> Option<&Match<'r, 't>> {
        self.matches
            .iter()
            .flatten()
            .find(|item| item.name == Some(name))
    }

    // e.g.
    //
    // ```
    //   let c = re.captures("...").unwrap().unwrap();
    //   let (whole, [one, two, three]) = c.extract();
    // ```
    //
    // a group that did not participate gives an empty string.
    pub fn extract<const N: usize>(&self) -> (&'t str, [&'t str; N]) {
        let value_of = |index: usize| {
            self.matches
                .get(index)
                .and_then(|item| item.as_ref())
                .map_or("", |item| item.value)
        };

        let mut items: [&str; N] = [""; N];
        for (idx, item) in items.iter_mut().enumerate() {
            *item = value_of(idx + 1);
        }
        (value_of(0), items)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index<usize> for Captures<'_, '_> {
    type Output = str;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
            .unwrap_or_else(|| panic!(
                "Group {} did not participate in the match or is out of range, the length of capture groups is {}.",
                index, self.len()))
            .as_str()
    }
}

impl Index<&str> for Captures<'_, '_> {
    type Output = str;

    fn index(&self, name: &str) -> &Self::Output {
        self.name(name)
            .unwrap_or_else(|| panic!("Cannot find the capture group named \"{}\".", name))
            .as_str()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Match<'r, 't> {
    pub start: usize, // the position of utf-8 byte stream (value included)
    pub end: usize,   // the position of utf-8 byte stream (value excluded)
    pub name: Option<&'r str>,
    pub value: &'t str,
}

impl<'r, 't> Match<'r, 't> {
    pub fn new(start: usize, end: usize, name: Option<&'r str>, value: &'t str) -> Self {
        Match {
            start,
            end,
            name,
            value,
        }
    }

    // the following methods are intended to
    // be compatible with the 'Match' API of crate 'regex':
    // https://docs.rs/regex/latest/regex/struct.Match.html

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn range(&self) -> Range<usize> {
        Range {
            start: self.start,
            end: self.end,
        }
    }

    pub fn as_str(&self) -> &'t str {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{error::RegexError, flags::Extensions, flags::Flags, input::IterRefill};

    use super::{Captures, Match, Regex};

    fn new_match(start: usize, end: usize, value: &str) -> Match {
        Match::new(start, end, None, value)
    }

    fn new_captures<'a, 'b>(
        mes: &'a [Option<(
            /*start:*/ usize,
            /*end:*/ usize,
            /*name:*/ Option<&'a str>,
            /*value:*/ &'b str,
        )>],
    ) -> Captures<'a, 'b> {
        let matches: Vec<Option<Match>> = mes
            .iter()
            .map(|item| item.map(|item| Match::new(item.0, item.1, item.2, item.3)))
            .collect();

        Captures { matches }
    }

    // every pattern is tested with and without the machine extensions
    fn generate_res(pattern: &str) -> [Regex; 2] {
        [
            Regex::new(pattern).unwrap(),
            Regex::builder(pattern)
                .extensions(Extensions::empty())
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_process_char() {
        // exists in the middle and at the end of the text
        for re in generate_res("a") {
            let mut matches = re.find_iter("babbaa").map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(1, 2, "a")));
            assert_eq!(matches.next(), Some(new_match(4, 5, "a")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "a")));
            assert_eq!(matches.next(), None);
        }

        // exists in the middle and at the beginning of the text
        for re in generate_res("a") {
            let mut matches = re.find_iter("abaabb").map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "a")));
            assert_eq!(matches.next(), Some(new_match(3, 4, "a")));
            assert_eq!(matches.next(), None);
        }

        // non-existent
        for re in generate_res("a") {
            let mut matches = re.find_iter("xyz").map(Result::unwrap);

            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_char_with_utf8() {
        for re in generate_res("文") {
            let mut matches = re.find_iter("abc中文字符文字🌏人文").map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(6, 9, "文")));
            assert_eq!(matches.next(), Some(new_match(15, 18, "文")));
            assert_eq!(matches.next(), Some(new_match(28, 31, "文")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res("文") {
            let mut matches = re.find_iter("abc正则表达式🌏改").map(Result::unwrap);

            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_string() {
        for re in generate_res("abc") {
            let mut matches = re.find_iter("ababcbcabc").map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(2, 5, "abc")));
            assert_eq!(matches.next(), Some(new_match(7, 10, "abc")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res("文字") {
            let text = "abc文字文本象形文字🎁表情文字";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(3, 9, "文字")));
            assert_eq!(matches.next(), Some(new_match(21, 27, "文字")));
            assert_eq!(matches.next(), Some(new_match(37, 43, "文字")));
            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_preset_charset() {
        for re in generate_res(r#"\w"#) {
            let text = "a*1**_ **";
            //               "^ ^  ^   "
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "1")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "_")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"\W"#) {
            let text = "!a@12 bc_";
            //               "v v  v   "
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "!")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "@")));
            assert_eq!(matches.next(), Some(new_match(5, 6, " ")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"\d"#) {
            let text = "1a2b_3de*";
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "1")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "2")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "3")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"\s"#) {
            let text = " 1\tab\n_*!";
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, " ")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "\t")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "\n")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"\S"#) {
            let text = "a\t1\r\n*   ";
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "1")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "*")));
            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_charset() {
        for re in generate_res(r#"[abc]"#) {
            let text = "adbefcghi";
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "b")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "c")));
            assert_eq!(matches.next(), None);
        }

        // negative
        for re in generate_res(r#"[^a-c]"#) {
            let text = "xa1bb*ccc";
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "x")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "1")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "*")));
            assert_eq!(matches.next(), None);
        }

        // combine range with preset
        for re in generate_res(r#"[a-f\d]"#) {
            let text = "am1npfq*_";
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "1")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "f")));
            assert_eq!(matches.next(), None);
        }

        // negative
        for re in generate_res(r#"[^a-f\d]"#) {
            let text = "man12*def";
            let mut matches = re.find_iter(text).map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "m")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "n")));
            assert_eq!(matches.next(), Some(new_match(5, 6, "*")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"[文字🍅]"#) {
            let text = "abc正文写字🍉宋体字体🍅测试🍋";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(6, 9, "文")));
            assert_eq!(matches.next(), Some(new_match(12, 15, "字")));
            assert_eq!(matches.next(), Some(new_match(25, 28, "字")));
            assert_eq!(matches.next(), Some(new_match(31, 35, "🍅")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"[^文字🍅]"#) {
            let text = "哦字文🍅文噢字🍅文文字字喔";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 3, "哦")));
            assert_eq!(matches.next(), Some(new_match(16, 19, "噢")));
            assert_eq!(matches.next(), Some(new_match(38, 41, "喔")));
            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_special_char() {
        for re in generate_res(r#"."#) {
            let text = "\na\r\n1 \n";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(1, 2, "a")));
            assert_eq!(matches.next(), Some(new_match(4, 5, "1")));
            assert_eq!(matches.next(), Some(new_match(5, 6, " ")));
            assert_eq!(matches.next(), None);
        }

        // dot all
        {
            let re = Regex::with_flags(r#"a.b"#, Flags::DOT_ALL).unwrap();
            assert_eq!(
                re.find("xa\nb").unwrap(),
                Some(new_match(1, 4, "a\nb"))
            );
        }
    }

    #[test]
    fn test_process_group() {
        for re in generate_res(r#"[+-](%\d)"#) {
            let text = "%12+%56-%9";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(3, 6, "+%5")));
            assert_eq!(matches.next(), Some(new_match(7, 10, "-%9")));
            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_logic_or() {
        for re in generate_res(r#"a|b"#) {
            let text = "012a45b7a9";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(3, 4, "a")));
            assert_eq!(matches.next(), Some(new_match(6, 7, "b")));
            assert_eq!(matches.next(), Some(new_match(8, 9, "a")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"abc|mn|xyz"#) {
            let text = "aabcmmnnxyzz";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(1, 4, "abc")));
            assert_eq!(matches.next(), Some(new_match(5, 7, "mn")));
            assert_eq!(matches.next(), Some(new_match(8, 11, "xyz")));
            assert_eq!(matches.next(), None);
        }

        // the leftmost alternative wins, not the longest
        for re in generate_res(r#"a|ab"#) {
            assert_eq!(re.find("ab").unwrap(), Some(new_match(0, 1, "a")));
        }
    }

    #[test]
    fn test_process_start_and_end_assertion() {
        for re in generate_res(r#"^a"#) {
            let mut matches = re.find_iter("ab").map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), None);

            let mut matches = re.find_iter("ba").map(Result::unwrap);
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"a$"#) {
            let mut matches = re.find_iter("ab").map(Result::unwrap);
            assert_eq!(matches.next(), None);

            let mut matches = re.find_iter("ba").map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(1, 2, "a")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"^a$"#) {
            assert_eq!(re.find("a").unwrap(), Some(new_match(0, 1, "a")));
            assert_eq!(re.find("ab").unwrap(), None);
            assert_eq!(re.find("ba").unwrap(), None);
        }

        // `$` without multiline is the very end
        for re in generate_res(r#"^abc$"#) {
            assert!(re.is_match("abc").unwrap());
            assert!(!re.is_match("abc\n").unwrap());
        }

        // `\Z` allows a final line terminator
        for re in generate_res(r#"abc\Z"#) {
            assert!(re.is_match("abc\n").unwrap());
            assert!(re.is_match("abc\r\n").unwrap());
            assert!(!re.is_match("abc\n\n").unwrap());
        }

        // multiline
        {
            let re = Regex::with_flags(r#"^abc$"#, Flags::MULTILINE).unwrap();
            let text = "abc\nabd\r\nabc\r\nabc";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 3, "abc")));
            assert_eq!(matches.next(), Some(new_match(9, 12, "abc")));
            assert_eq!(matches.next(), Some(new_match(14, 17, "abc")));
            assert_eq!(matches.next(), None);

            // no empty line after the final terminator
            let re = Regex::with_flags(r#"^"#, Flags::MULTILINE).unwrap();
            let starts: Vec<usize> = re
                .find_iter("a\nb\n")
                .map(|item| item.unwrap().start())
                .collect();
            assert_eq!(starts, vec![0, 2]);
        }
    }

    #[test]
    fn test_process_boundary_assertion() {
        for re in generate_res(r#"\ba"#) {
            assert_eq!(re.find("ab").unwrap(), Some(new_match(0, 1, "a")));
            assert_eq!(re.find("a").unwrap(), Some(new_match(0, 1, "a")));
            assert_eq!(re.find(" a").unwrap(), Some(new_match(1, 2, "a")));
            assert_eq!(re.find("ba").unwrap(), None);
        }

        for re in generate_res(r#"a\b"#) {
            assert_eq!(re.find("ba").unwrap(), Some(new_match(1, 2, "a")));
            assert_eq!(re.find("a").unwrap(), Some(new_match(0, 1, "a")));
            assert_eq!(re.find("a ").unwrap(), Some(new_match(0, 1, "a")));
            assert_eq!(re.find("ab").unwrap(), None);
        }

        for re in generate_res(r#"\Ba\B"#) {
            assert_eq!(re.find("a bab").unwrap(), Some(new_match(3, 4, "a")));
        }
    }

    #[test]
    fn test_process_optional() {
        for re in generate_res(r#"ab?c"#) {
            let text = "ababccbacabc";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(2, 5, "abc")));
            assert_eq!(matches.next(), Some(new_match(7, 9, "ac")));
            assert_eq!(matches.next(), Some(new_match(9, 12, "abc")));
            assert_eq!(matches.next(), None);
        }

        // greedy
        for re in generate_res(r#"abc?"#) {
            let mut matches = re.find_iter("abcabx").map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 3, "abc")));
            assert_eq!(matches.next(), Some(new_match(3, 5, "ab")));
            assert_eq!(matches.next(), None);
        }

        // lazy
        for re in generate_res(r#"abc??"#) {
            let mut matches = re.find_iter("abcabx").map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 2, "ab")));
            assert_eq!(matches.next(), Some(new_match(3, 5, "ab")));
            assert_eq!(matches.next(), None);
        }

        // group optional
        for re in generate_res(r#"a(bc)?d"#) {
            let text = "abcabdacdabcdabacad";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(9, 13, "abcd")));
            assert_eq!(matches.next(), Some(new_match(17, 19, "ad")));
            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_repetition_specified() {
        for re in generate_res(r#"a{3}"#) {
            let text = "abaabbaaabbbaaaaa";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(6, 9, "aaa")));
            assert_eq!(matches.next(), Some(new_match(12, 15, "aaa")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"\d{3}"#) {
            let text = "a1ab12abc123abcd1234";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(9, 12, "123")));
            assert_eq!(matches.next(), Some(new_match(16, 19, "123")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"(ab){3}"#) {
            let text = "abbaababbaababababab";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(10, 16, "ababab")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"a{2}\d"#) {
            let text = "abaabbaa1bb1aa123bb123a11b11";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(6, 9, "aa1")));
            assert_eq!(matches.next(), Some(new_match(12, 15, "aa1")));
            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_repetition_range() {
        for re in generate_res(r#"a{1,3}"#) {
            let text = "abaabbaaabbbaaaabbbb";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), Some(new_match(2, 4, "aa")));
            assert_eq!(matches.next(), Some(new_match(6, 9, "aaa")));
            assert_eq!(matches.next(), Some(new_match(12, 15, "aaa")));
            assert_eq!(matches.next(), Some(new_match(15, 16, "a")));
            assert_eq!(matches.next(), None);
        }

        // lazy
        for re in generate_res(r#"a{1,3}?"#) {
            let text = "abaabbaaabbbaaaabbbb";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), Some(new_match(2, 3, "a")));
            assert_eq!(matches.next(), Some(new_match(3, 4, "a")));
            assert_eq!(matches.next(), Some(new_match(6, 7, "a")));
            assert_eq!(matches.next(), Some(new_match(7, 8, "a")));
        }

        for re in generate_res(r#"a{2,}"#) {
            let text = "abaabbaaabbbaaaabbbb";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(2, 4, "aa")));
            assert_eq!(matches.next(), Some(new_match(6, 9, "aaa")));
            assert_eq!(matches.next(), Some(new_match(12, 16, "aaaa")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"a{2,}?"#) {
            let text = "abaabbaaabbbaaaabbbb";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(2, 4, "aa")));
            assert_eq!(matches.next(), Some(new_match(6, 8, "aa")));
            assert_eq!(matches.next(), Some(new_match(12, 14, "aa")));
            assert_eq!(matches.next(), Some(new_match(14, 16, "aa")));
            assert_eq!(matches.next(), None);
        }

        // lazy by default
        {
            let re = Regex::with_flags(r#"a{2,}"#, Flags::LAZY_DEFAULT).unwrap();
            assert_eq!(re.find("aaaa").unwrap(), Some(new_match(0, 2, "aa")));

            let re = Regex::with_flags(r#"a{2,}?"#, Flags::LAZY_DEFAULT).unwrap();
            assert_eq!(re.find("aaaa").unwrap(), Some(new_match(0, 4, "aaaa")));
        }
    }

    #[test]
    fn test_process_optional_and_repetition_range() {
        for re in generate_res(r#"ab{0,3}c"#) {
            let text = "acaabcaabbcaabbbcaabbbbc";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 2, "ac")));
            assert_eq!(matches.next(), Some(new_match(3, 6, "abc")));
            assert_eq!(matches.next(), Some(new_match(7, 11, "abbc")));
            assert_eq!(matches.next(), Some(new_match(12, 17, "abbbc")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"a(b{2,3})?c"#) {
            let text = "acaabcaabbcaabbbcaabbbbc";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 2, "ac")));
            assert_eq!(matches.next(), Some(new_match(7, 11, "abbc")));
            assert_eq!(matches.next(), Some(new_match(12, 17, "abbbc")));
            assert_eq!(matches.next(), None);
        }
    }

    #[test]
    fn test_process_repetition_backtracking() {
        for re in generate_res(r#"^a.+c"#) {
            assert_eq!(re.find("abbcmn").unwrap(), Some(new_match(0, 4, "abbc")));

            // no char between 'a' and 'c'
            assert_eq!(re.find("acmn").unwrap(), None);
        }

        // not enough chars between 'a' and 'c'
        for re in generate_res(r#"^a.{3,}c"#) {
            assert_eq!(re.find("abbcmn").unwrap(), None);
        }

        for re in generate_res(r#"a.+?c"#) {
            assert_eq!(re.find("abbcmn").unwrap(), Some(new_match(0, 4, "abbc")));
        }

        // nested backtracking
        for re in generate_res(r#"^a.{2,}c.{2,}e"#) {
            let mut matches = re.find_iter("a88c88ewwefg").map(Result::unwrap);
            assert_eq!(matches.next(), Some(new_match(0, 10, "a88c88ewwe")));
            assert_eq!(matches.next(), None);
        }

        // the body of a repetition that can match empty
        for re in generate_res(r#"(a|)*b"#) {
            assert_eq!(re.find("aab").unwrap(), Some(new_match(0, 3, "aab")));
            assert_eq!(re.find("c").unwrap(), None);
        }
    }

    #[test]
    fn test_process_capture() {
        for re in generate_res(r#"(0x|0o|0b)(\d+)"#) {
            let text = "abc0x23def0o456xyz";
            let mut matches = re.captures_iter(text).map(Result::unwrap);

            assert_eq!(
                matches.next(),
                Some(new_captures(&[
                    Some((3, 7, None, "0x23")),
                    Some((3, 5, None, "0x")),
                    Some((5, 7, None, "23"))
                ]))
            );

            assert_eq!(
                matches.next(),
                Some(new_captures(&[
                    Some((10, 15, None, "0o456")),
                    Some((10, 12, None, "0o")),
                    Some((12, 15, None, "456"))
                ]))
            );

            assert_eq!(matches.next(), None);
        }

        // named
        for re in generate_res(r#"(?<prefix>0x|0o|0b)(?<number>\d+)"#) {
            let text = "abc0x23def0o456xyz";
            let mut matches = re.captures_iter(text).map(Result::unwrap);
            let one = matches.next().unwrap();

            assert_eq!(one.len(), 3);

            assert_eq!(one.get(0).unwrap().as_str(), "0x23");
            assert_eq!(one.get(1).unwrap().as_str(), "0x");
            assert_eq!(one.get(2).unwrap().as_str(), "23");

            assert_eq!(&one[0], "0x23");
            assert_eq!(&one[1], "0x");
            assert_eq!(&one[2], "23");

            assert_eq!(one.name("prefix").unwrap().as_str(), "0x");
            assert_eq!(one.name("number").unwrap().as_str(), "23");

            assert_eq!(&one["prefix"], "0x");
            assert_eq!(&one["number"], "23");

            assert_eq!(("0x23", ["0x", "23"]), one.extract());

            let two = matches.next().unwrap();
            assert_eq!(two.get(0).unwrap().range(), 10..15);
        }

        // a group that did not participate
        for re in generate_res(r#"(a)|(b)"#) {
            assert_eq!(
                re.captures("b").unwrap(),
                Some(new_captures(&[
                    Some((0, 1, None, "b")),
                    None,
                    Some((0, 1, None, "b"))
                ]))
            );
        }

        // the last iteration wins
        for re in generate_res(r#"(\d)+"#) {
            let captures = re.captures("x123").unwrap().unwrap();
            assert_eq!(&captures[0], "123");
            assert_eq!(&captures[1], "3");
        }
    }

    #[test]
    fn test_process_capture_in_empty_iteration() {
        // an iteration that matches empty ends the loop, and keeps
        // what it captured
        for re in generate_res(r#"(a?)*"#) {
            assert_eq!(
                re.captures("b").unwrap(),
                Some(new_captures(&[Some((0, 0, None, "")), Some((0, 0, None, ""))]))
            );
            assert_eq!(
                re.captures("aab").unwrap(),
                Some(new_captures(&[Some((0, 2, None, "aa")), Some((2, 2, None, ""))]))
            );
        }

        for re in generate_res(r#"(a|)*"#) {
            assert_eq!(
                re.captures("x").unwrap(),
                Some(new_captures(&[Some((0, 0, None, "")), Some((0, 0, None, ""))]))
            );
        }

        for re in generate_res(r#"(?:(a)|b|())*"#) {
            assert_eq!(
                re.captures("").unwrap(),
                Some(new_captures(&[
                    Some((0, 0, None, "")),
                    None,
                    Some((0, 0, None, ""))
                ]))
            );
        }

        for re in generate_res(r#"(a*)+"#) {
            assert_eq!(
                re.captures("b").unwrap(),
                Some(new_captures(&[Some((0, 0, None, "")), Some((0, 0, None, ""))]))
            );
        }

        // the loop goes on after a non-empty iteration
        for re in generate_res(r#"(a|)*b"#) {
            assert_eq!(
                re.captures("aab").unwrap(),
                Some(new_captures(&[Some((0, 3, None, "aab")), Some((2, 2, None, ""))]))
            );
        }
    }

    #[test]
    fn test_process_backreference() {
        for re in generate_res(r#"<(?<tag_name>\w+)>.+</\k<tag_name>>"#) {
            let text = "zero<div>one<div>two</div>three</div>four";
            let mut matches = re.captures_iter(text).map(Result::unwrap);

            assert_eq!(
                matches.next(),
                Some(new_captures(&[
                    Some((4, 37, None, "<div>one<div>two</div>three</div>")),
                    Some((5, 8, Some("tag_name"), "div"))
                ]))
            );
        }

        // lazy
        for re in generate_res(r#"<(?<tag_name>\w+)>.+?</\k<tag_name>>"#) {
            let text = "zero<div>one<div>two</div>three</div>four";
            let mut matches = re.captures_iter(text).map(Result::unwrap);

            assert_eq!(
                matches.next(),
                Some(new_captures(&[
                    Some((4, 26, None, "<div>one<div>two</div>")),
                    Some((5, 8, Some("tag_name"), "div"))
                ]))
            );
        }

        // numbered
        for re in generate_res(r#"(\w)\1"#) {
            assert_eq!(re.find("abccd").unwrap(), Some(new_match(2, 4, "cc")));
        }

        // case insensitive
        {
            let re = Regex::with_flags(r#"(a)\1"#, Flags::CASE_INSENSITIVE).unwrap();
            assert_eq!(re.find("xAa").unwrap(), Some(new_match(1, 3, "Aa")));
        }

        // a group that did not participate never matches
        for re in generate_res(r#"(a)?b\1"#) {
            assert_eq!(re.find("b").unwrap(), None);
            assert_eq!(re.find("aba").unwrap(), Some(new_match(0, 3, "aba")));
        }
    }

    #[test]
    fn test_process_lookahead() {
        for re in generate_res(r#"\b[a-f](?=\d)"#) {
            let text = "a1 22 f9 cc z3 b2";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 1, "a")));
            assert_eq!(matches.next(), Some(new_match(6, 7, "f")));
            assert_eq!(matches.next(), Some(new_match(15, 16, "b")));
            assert_eq!(matches.next(), None);
        }

        for re in generate_res(r#"\b[a-z]{2,}(?=ing|ed)"#) {
            let text = "jump jumping aaaabbbbing push pushed fork";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(5, 9, "jump")));
            assert_eq!(matches.next(), Some(new_match(13, 21, "aaaabbbb")));
            assert_eq!(matches.next(), Some(new_match(30, 34, "push")));
            assert_eq!(matches.next(), None);
        }

        // negative
        for re in generate_res(r#"\b[a-z]{4}(?!ing|ed)"#) {
            let text = "jump jumping aaaabbbbing push pushed fork";
            let mut matches = re.find_iter(text).map(Result::unwrap);

            assert_eq!(matches.next(), Some(new_match(0, 4, "jump")));
            assert_eq!(matches.next(), Some(new_match(13, 17, "aaaa")));
            assert_eq!(matches.next(), Some(new_match(25, 29, "push")));
            assert_eq!(matches.next(), Some(new_match(37, 41, "fork")));
            assert_eq!(matches.next(), None);
        }

        // impossible to be both 'a' and 'b' after 'c'
        for re in generate_res(r#"c(?=a)b"#) {
            let mut matches = re.find_iter("ca cb cab cba").map(Result::unwrap);
            assert_eq!(matches.next(), None);
        }

        // the captures made inside the body are undone
        for re in generate_res(r#"(?=(a))\w"#) {
            assert_eq!(
                re.captures("xa").unwrap(),
                Some(new_captures(&[Some((1, 2, None, "a")), None]))
            );
        }

        // lookbehind is not supported
        assert!(matches!(
            Regex::new(r#"(?<=a)b"#),
            Err(RegexError::Pattern { .. })
        ));
    }

    #[test]
    fn test_matcher_groups() {
        let re = Regex::new(r#"foo(?<xx>.*)(?<y>.)$"#).unwrap();
        let mut matcher = re.matcher("foobarx");

        assert!(matches!(matcher.group(0), Err(RegexError::State(_))));

        assert!(matcher.matches().unwrap());
        assert_eq!(matcher.group(1).unwrap(), Some("bar"));
        assert_eq!(matcher.group("xx").unwrap(), Some("bar"));
        assert_eq!(matcher.group("y").unwrap(), Some("x"));
        assert_eq!(matcher.start("y").unwrap(), Some(6));
        assert_eq!(matcher.end(0).unwrap(), Some(7));
        assert_eq!(matcher.group_count(), 2);

        assert!(matches!(matcher.group(3), Err(RegexError::State(_))));
        assert!(matches!(matcher.group("z"), Err(RegexError::State(_))));
    }

    #[test]
    fn test_matcher_find() {
        let re = Regex::new(r#"b(an)*(.)"#).unwrap();
        let mut matcher = re.matcher("by band banana");

        assert!(matcher.find().unwrap());
        assert_eq!(matcher.group(0).unwrap(), Some("by"));
        assert_eq!(matcher.group(1).unwrap(), None);
        assert_eq!(matcher.start(1).unwrap(), None);

        assert!(matcher.find().unwrap());
        assert_eq!(matcher.group(0).unwrap(), Some("band"));
        assert_eq!(matcher.group(1).unwrap(), Some("an"));

        assert!(matcher.find().unwrap());
        assert_eq!(matcher.group(0).unwrap(), Some("banana"));
        assert_eq!(matcher.group(1).unwrap(), Some("an"));
        assert_eq!(matcher.start(1).unwrap(), Some(11));

        assert!(!matcher.find().unwrap());
        assert!(matches!(matcher.group(0), Err(RegexError::State(_))));

        // start over
        assert!(matcher.find_from(3).unwrap());
        assert_eq!(matcher.group(0).unwrap(), Some("band"));

        assert!(matches!(
            matcher.find_from(100),
            Err(RegexError::State(_))
        ));
    }

    #[test]
    fn test_matcher_looking_at() {
        let re = Regex::new(r#"ab+"#).unwrap();

        let mut matcher = re.matcher("abbc");
        assert!(matcher.looking_at().unwrap());
        assert_eq!(matcher.group(0).unwrap(), Some("abb"));
        assert!(!matcher.matches().unwrap());

        let mut matcher = re.matcher("cab");
        assert!(!matcher.looking_at().unwrap());
        assert!(matcher.find().unwrap());
    }

    #[test]
    fn test_empty_match_after_previous_match() {
        let re = Regex::new(r#"a*"#).unwrap();
        let mut matches = re.find_iter("baaa").map(Result::unwrap);

        assert_eq!(matches.next(), Some(new_match(0, 0, "")));
        assert_eq!(matches.next(), Some(new_match(1, 4, "aaa")));
        assert_eq!(matches.next(), None);

        // the empty pattern
        let re = Regex::new("").unwrap();
        assert!(re.matcher("").matches().unwrap());
        assert!(!re.matcher("ab").matches().unwrap());
        assert!(re.is_match("ab").unwrap());

        let starts: Vec<usize> = re
            .find_iter("ab")
            .map(|item| item.unwrap().start())
            .collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn test_replace() {
        {
            let re = Regex::new(r#"[a-c]*"#).unwrap();
            assert_eq!(re.replace_all("f", "x").unwrap(), "xfx");
        }

        {
            let re = Regex::new(r#"cat"#).unwrap();
            let mut matcher = re.matcher("one cat two cats in the yard");
            let mut out = String::new();

            while matcher.find().unwrap() {
                matcher.append_replacement(&mut out, "dog").unwrap();
            }
            matcher.append_tail(&mut out);

            assert_eq!(out, "one dog two dogs in the yard");
        }

        {
            let re = Regex::new(r#"(?<key>\w+)=(\w+)"#).unwrap();
            assert_eq!(
                re.replace_all("a=1, b=2", r#"$2:${key}\$"#).unwrap(),
                "1:a$, 2:b$"
            );
            assert_eq!(re.replace_first("a=1, b=2", "[$0]").unwrap(), "[a=1], b=2");

            assert!(matches!(
                re.replace_all("a=1", "$3"),
                Err(RegexError::Replacement { .. })
            ));
        }

        {
            let re = Regex::new(r#"x"#).unwrap();
            let mut matcher = re.matcher("abc");
            let mut out = String::new();
            assert!(matches!(
                matcher.append_replacement(&mut out, "y"),
                Err(RegexError::State(_))
            ));
        }
    }

    #[test]
    fn test_split() {
        let re = Regex::new(r#",\s*"#).unwrap();
        assert_eq!(re.split("a, b,,c").unwrap(), vec!["a", "b", "", "c"]);
        assert_eq!(re.split("a,").unwrap(), vec!["a", ""]);
        assert_eq!(re.split("abc").unwrap(), vec!["abc"]);
    }

    #[test]
    fn test_external_variables() {
        let re = Regex::new(r#"<\k<tag>>"#).unwrap();
        assert_eq!(re.external_names().collect::<Vec<_>>(), vec!["tag"]);

        let mut matcher = re.matcher("");
        matcher
            .reset_with_variables("<p><div>", &[("tag", "div")])
            .unwrap();
        assert!(matcher.find().unwrap());
        assert_eq!(matcher.group(0).unwrap(), Some("<div>"));

        // unset
        matcher.reset_with_variables("<p><div>", &[]).unwrap();
        assert!(!matcher.find().unwrap());

        assert!(matches!(
            matcher.reset_with_variables("", &[("nope", "x")]),
            Err(RegexError::State(_))
        ));
    }

    #[test]
    fn test_reset_and_clone() {
        let re = Regex::new(r#"\d+"#).unwrap();
        let mut matcher = re.matcher("a1b22");

        assert!(matcher.find().unwrap());
        let mut other = matcher.clone();

        assert!(matcher.find().unwrap());
        assert_eq!(matcher.group(0).unwrap(), Some("22"));

        // the clone goes on from where it was cloned
        assert_eq!(other.group(0).unwrap(), Some("1"));
        assert!(other.find().unwrap());
        assert_eq!(other.group(0).unwrap(), Some("22"));

        matcher.reset("333");
        assert!(matcher.find().unwrap());
        assert_eq!(matcher.group(0).unwrap(), Some("333"));
    }

    #[test]
    fn test_refill() {
        let re = Regex::new(r#"(\w+)@(\w+)\.com$"#).unwrap();
        let mut matcher = re.matcher("mail ");
        matcher.set_refill(IterRefill::new(
            ["al", "ice@exa", "mple.", "com"].into_iter(),
        ));

        assert!(matcher.find().unwrap());
        assert_eq!(matcher.group(1).unwrap(), Some("alice"));
        assert_eq!(matcher.group(2).unwrap(), Some("example"));
        assert_eq!(matcher.text(), "mail alice@example.com");
    }

    #[test]
    fn test_backtrack_limit() {
        let re = Regex::builder(r#"(a|aa)*c"#)
            .backtrack_limit(Some(1000))
            .build()
            .unwrap();

        assert!(matches!(
            re.is_match(&"a".repeat(40)),
            Err(RegexError::BacktrackLimitExceeded { .. })
        ));

        assert!(re.is_match("aaac").unwrap());
    }

    #[test]
    fn test_elide_unreferenced_groups() {
        let re = Regex::builder(r#"(a)(b)\1"#)
            .elide_unreferenced_groups(true)
            .build()
            .unwrap();

        let mut matcher = re.matcher("aba");
        assert!(matcher.find().unwrap());
        assert_eq!(matcher.group(1).unwrap(), Some("a"));
        assert_eq!(matcher.group(2).unwrap(), None);
    }

    #[test]
    fn test_case_insensitive() {
        let re = Regex::builder(r#"straße [a-c]+"#)
            .case_insensitive(true)
            .build()
            .unwrap();
        assert_eq!(
            re.find("STRASSE x STRAßE AbC").unwrap(),
            Some(new_match(10, 21, "STRAßE AbC"))
        );
    }

    #[test]
    fn test_pattern_errors() {
        assert!(matches!(
            Regex::new("(ab"),
            Err(RegexError::Pattern { offset: 0, .. })
        ));
        assert!(matches!(
            Regex::new("ab)"),
            Err(RegexError::Pattern { offset: 2, .. })
        ));
        assert!(matches!(Regex::new("*a"), Err(RegexError::Pattern { .. })));
        assert!(matches!(Regex::new("[a"), Err(RegexError::Pattern { .. })));
        assert!(matches!(Regex::new(r#"\2(a)"#), Err(RegexError::Pattern { .. })));
    }
}
