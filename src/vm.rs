// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! The backtracking interpreter.
//!
//! One match attempt runs the program from offset 0 with the cells set
//! to their initial values and an empty backtrack stack. A failing
//! instruction pops the stack:
//!
//! ```diagram
//! Undo      restore one cell, keep popping
//! Fork      resume at (pc, pos)
//! MultiFork resume at (pc, pos), and push it back with the position
//!           one body width earlier while repetitions remain
//! ```
//!
//! An attempt fails when the stack runs out.

use log::warn;

use crate::{
    ast::AssertionKind,
    charset::simple_fold,
    error::RegexError,
    input::Input,
    instr::{Decoder, Opcode, Program},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Try every start position from the given one.
    Unanchored,

    /// Only try the given position.
    Start,

    /// Only try the given position, and require the match to end at
    /// the end of the input.
    Whole,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    Fork {
        pc: usize,
        pos: usize,
    },
    Undo {
        cell: usize,
        value: isize,
    },
    MultiFork {
        pc: usize,

        // the latest exit position
        pos: usize,

        // the exits left, each one `width` chars before the next
        count: u32,
        width: usize,
    },
}

pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

// the same chars as `\w`
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn chars_equal(a: char, b: char, ignore_case: bool) -> bool {
    a == b || (ignore_case && simple_fold(a) == simple_fold(b))
}

/// The mutable state of the interpreter for one program.
#[derive(Debug)]
pub struct Vm<'p> {
    program: &'p Program,
    cells: Vec<isize>,
    stack: Vec<Frame>,
    backtrack_limit: Option<u64>,

    // the first-char prefix as bytes, when it is a few ASCII chars
    prefix_bytes: Option<Vec<u8>>,
}

impl<'p> Vm<'p> {
    pub fn new(program: &'p Program, backtrack_limit: Option<u64>) -> Self {
        let prefix_bytes = program
            .hint
            .as_ref()
            .and_then(|hint| hint.prefix.as_ref())
            .and_then(|prefix| prefix.ascii_bytes(3));

        Self {
            program,
            cells: program.cells.clone(),
            stack: vec![],
            backtrack_limit,
            prefix_bytes,
        }
    }

    pub fn cells(&self) -> &[isize] {
        &self.cells
    }

    /// Sets every cell back to its initial value.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.cells.extend_from_slice(&self.program.cells);
        self.stack.clear();
    }

    /// Looks for a match from `from` on. On success the capture
    /// cells hold the match.
    pub fn search(
        &mut self,
        input: &mut Input,
        from: usize,
        anchor: Anchor,
        externals: &[Option<String>],
    ) -> Result<bool, RegexError> {
        let hint = self.program.hint.as_ref();
        let min_length = hint.map_or(0, |hint| hint.min_length);

        if anchor != Anchor::Unanchored {
            // a match needs at least `min_length` chars, so as many bytes
            if !input.ensure(from, min_length) {
                return Ok(false);
            }
            return self.attempt(input, from, anchor == Anchor::Whole, externals);
        }

        let mut pos = from;

        if let Some(hint) = hint {
            if hint.start_anchored {
                if from != 0 || !input.ensure(0, min_length) {
                    return Ok(false);
                }
                return self.attempt(input, 0, false, externals);
            }

            if let (true, Some(max_length)) = (hint.end_anchored, hint.max_length) {
                input.drain();
                pos = input.back(input.end(), max_length, from);
            }
        }

        loop {
            let Some(candidate) = self.next_candidate(input, pos) else {
                return Ok(false);
            };

            if !input.ensure(candidate, min_length) {
                return Ok(false);
            }

            if self.attempt(input, candidate, false, externals)? {
                return Ok(true);
            }

            match input.char_at(candidate) {
                Some(c) => pos = candidate + c.len_utf8(),
                None => return Ok(false),
            }
        }
    }

    // The first position from `pos` on where a match could start.
    fn next_candidate(&self, input: &mut Input, pos: usize) -> Option<usize> {
        if let Some(shift) = &self.program.shift {
            let mut scan = pos;
            loop {
                match shift.find(&input.as_str().as_bytes()[scan..]) {
                    Ok(offset) => return Some(scan + offset),
                    Err(offset) => {
                        scan += offset;
                        if !input.fill() {
                            return None;
                        }
                    }
                }
            }
        }

        let Some(prefix) = self
            .program
            .hint
            .as_ref()
            .and_then(|hint| hint.prefix.as_ref())
        else {
            return Some(pos);
        };

        let mut scan = pos;
        loop {
            let haystack = &input.as_str()[scan..];

            let found = match self.prefix_bytes.as_deref() {
                Some([a]) => memchr::memchr(*a, haystack.as_bytes()),
                Some([a, b]) => memchr::memchr2(*a, *b, haystack.as_bytes()),
                Some([a, b, c]) => memchr::memchr3(*a, *b, *c, haystack.as_bytes()),
                _ => haystack
                    .char_indices()
                    .find(|(_, c)| prefix.contains(*c))
                    .map(|(idx, _)| idx),
            };

            if let Some(offset) = found {
                return Some(scan + offset);
            }

            scan = input.end();
            if !input.fill() {
                return None;
            }
        }
    }

    fn attempt(
        &mut self,
        input: &mut Input,
        start: usize,
        require_end: bool,
        externals: &[Option<String>],
    ) -> Result<bool, RegexError> {
        self.clear();

        let program = self.program;
        let code = &program.code;
        let mut backtracks = 0u64;
        let mut pc = 0;
        let mut pos = start;

        loop {
            let mut decoder = Decoder::new(code, pc);
            let opcode = decoder.read_opcode()?;

            let success = match opcode {
                Opcode::Jump => {
                    pc = decoder.read_label()?;
                    continue;
                }
                Opcode::Fail => false,
                Opcode::Fork => {
                    let target = decoder.read_label()?;
                    self.stack.push(Frame::Fork { pc: target, pos });
                    true
                }
                Opcode::AnyChar | Opcode::AnyCharDotAll => match input.char_at(pos) {
                    Some(c) if opcode == Opcode::AnyCharDotAll || !is_line_terminator(c) => {
                        pos += c.len_utf8();
                        true
                    }
                    _ => false,
                },
                Opcode::Set | Opcode::SetIc => match input.char_at(pos) {
                    Some(c) => {
                        // the set of a case-insensitive node is folded
                        let subject = if opcode == Opcode::SetIc {
                            simple_fold(c)
                        } else {
                            c
                        };

                        if decoder.read_set_contains(subject)? {
                            pos += c.len_utf8();
                            true
                        } else {
                            false
                        }
                    }
                    None => false,
                },
                Opcode::Literal | Opcode::LiteralIc => {
                    let ignore_case = opcode == Opcode::LiteralIc;
                    let count = decoder.read_usize()?;

                    let mut matched = true;
                    for _ in 0..count {
                        let expected = decoder.read_char()?;
                        match input.char_at(pos) {
                            Some(c) if chars_equal(c, expected, ignore_case) => {
                                pos += c.len_utf8();
                            }
                            _ => {
                                matched = false;
                                break;
                            }
                        }
                    }
                    matched
                }
                Opcode::Capture | Opcode::CaptureIc => {
                    let begin = self.cell(decoder.read_usize()?)?;
                    let end = self.cell(decoder.read_usize()?)?;

                    if begin < 0 || end < begin {
                        // the group has not participated
                        false
                    } else {
                        match match_range(
                            input,
                            pos,
                            begin as usize,
                            end as usize,
                            opcode == Opcode::CaptureIc,
                        ) {
                            Some(new_pos) => {
                                pos = new_pos;
                                true
                            }
                            None => false,
                        }
                    }
                }
                Opcode::External | Opcode::ExternalIc => {
                    let index = decoder.read_usize()?;
                    match externals.get(index) {
                        Some(Some(text)) => {
                            match match_text(input, pos, text, opcode == Opcode::ExternalIc) {
                                Some(new_pos) => {
                                    pos = new_pos;
                                    true
                                }
                                None => false,
                            }
                        }
                        _ => false,
                    }
                }
                Opcode::Boundary => {
                    let kind = decoder.read_assertion()?;
                    check_boundary(input, pos, kind)
                }
                Opcode::DecJumpIfPositive => {
                    let cell = decoder.read_usize()?;
                    let target = decoder.read_label()?;
                    let value = self.cell(cell)? - 1;
                    self.write_cell(cell, value)?;
                    if value > 0 {
                        pc = target;
                        continue;
                    }
                    true
                }
                Opcode::DecFailIfNegative => {
                    let cell = decoder.read_usize()?;
                    let value = self.cell(cell)? - 1;
                    self.write_cell(cell, value)?;
                    value >= 0
                }
                Opcode::SetCell => {
                    let cell = decoder.read_usize()?;
                    let value = decoder.read_value()?;
                    self.write_cell(cell, value)?;
                    true
                }
                Opcode::SetCellHard => {
                    let cell = decoder.read_usize()?;
                    let value = decoder.read_value()?;
                    self.write_cell_hard(cell, value)?;
                    true
                }
                Opcode::SetCellPosition => {
                    let cell = decoder.read_usize()?;
                    self.write_cell(cell, pos as isize)?;
                    true
                }
                Opcode::FailIfCell => {
                    let cell = decoder.read_usize()?;
                    let value = decoder.read_value()?;
                    self.cell(cell)? != value
                }
                Opcode::JumpIfPosition => {
                    let cell = decoder.read_usize()?;
                    let target = decoder.read_label()?;
                    if self.cell(cell)? == pos as isize {
                        pc = target;
                        continue;
                    }
                    true
                }
                Opcode::SaveStack => {
                    let cell = decoder.read_usize()?;
                    self.write_cell_hard(cell, self.stack.len() as isize)?;
                    true
                }
                Opcode::CutFail => {
                    let depth = self.cell(decoder.read_usize()?)?;
                    self.cut(depth)?;
                    false
                }
                Opcode::Accept => {
                    if require_end && !input.is_end(pos) {
                        false
                    } else {
                        self.stack.clear();
                        return Ok(true);
                    }
                }
                Opcode::RepeatStart => {
                    let width = decoder.read_usize()?;
                    let exit = decoder.read_label()?;
                    self.stack.push(Frame::MultiFork {
                        pc: exit,
                        pos,
                        count: 1,
                        width,
                    });
                    true
                }
                Opcode::RepeatNext => {
                    let limit = decoder.read_limit()?;
                    let body = decoder.read_label()?;

                    let Some(Frame::MultiFork {
                        pos: exit_pos,
                        count,
                        ..
                    }) = self.stack.last_mut()
                    else {
                        return Err(RegexError::Internal(format!(
                            "Batched repeat at offset {} without its stack entry.",
                            pc
                        )));
                    };

                    // `count` is also the number of iterations done
                    if Some(*count) == limit {
                        true
                    } else {
                        *count += 1;
                        *exit_pos = pos;
                        pc = body;
                        continue;
                    }
                }
                Opcode::JumpIfRemainingOutside => {
                    let min = decoder.read_usize()?;
                    let max = decoder.read_limit()?;
                    let target = decoder.read_label()?;

                    let limit = match max {
                        Some(max) => {
                            input.drain();
                            (max as usize).saturating_add(1).max(min)
                        }
                        None => {
                            // a char takes at most 4 bytes
                            input.ensure(pos, min.saturating_mul(4));
                            min
                        }
                    };

                    let remaining = input.as_str()[pos..].chars().take(limit).count();
                    let outside =
                        remaining < min || max.map_or(false, |max| remaining > max as usize);

                    if outside {
                        pc = target;
                        continue;
                    }
                    true
                }
                Opcode::JumpIfNotInSet => {
                    let next = input.char_at(pos);
                    let contained = decoder.read_set_contains(next.unwrap_or('\0'))?;
                    let target = decoder.read_label()?;

                    if next.is_none() || !contained {
                        pc = target;
                        continue;
                    }
                    true
                }
                Opcode::JumpIfNotChar => {
                    let expected = decoder.read_char()?;
                    let target = decoder.read_label()?;

                    if input.char_at(pos) != Some(expected) {
                        pc = target;
                        continue;
                    }
                    true
                }
            };

            if success {
                pc = decoder.pc();
                continue;
            }

            match self.backtrack(input, &mut backtracks)? {
                Some((resume_pc, resume_pos)) => {
                    pc = resume_pc;
                    pos = resume_pos;
                }
                None => return Ok(false),
            }
        }
    }

    // Pops the stack up to the latest choice point.
    fn backtrack(
        &mut self,
        input: &Input,
        backtracks: &mut u64,
    ) -> Result<Option<(usize, usize)>, RegexError> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Undo { cell, value } => self.write_cell_hard(cell, value)?,
                Frame::Fork { pc, pos } => {
                    self.count_backtrack(backtracks)?;
                    return Ok(Some((pc, pos)));
                }
                Frame::MultiFork {
                    pc,
                    pos,
                    count,
                    width,
                } => {
                    self.count_backtrack(backtracks)?;
                    if count > 1 {
                        self.stack.push(Frame::MultiFork {
                            pc,
                            pos: input.back(pos, width, 0),
                            count: count - 1,
                            width,
                        });
                    }
                    return Ok(Some((pc, pos)));
                }
            }
        }

        Ok(None)
    }

    fn count_backtrack(&self, backtracks: &mut u64) -> Result<(), RegexError> {
        *backtracks += 1;

        match self.backtrack_limit {
            Some(limit) if *backtracks > limit => {
                warn!(
                    "Match attempt aborted after {} backtracks (limit {}).",
                    backtracks, limit
                );
                Err(RegexError::BacktrackLimitExceeded { count: *backtracks })
            }
            _ => Ok(()),
        }
    }

    // Drops the frames above `depth`, undoing their cell writes.
    fn cut(&mut self, depth: isize) -> Result<(), RegexError> {
        let depth = usize::try_from(depth)
            .map_err(|_| RegexError::Internal(format!("Invalid stack depth {}.", depth)))?;

        while self.stack.len() > depth {
            if let Some(Frame::Undo { cell, value }) = self.stack.pop() {
                self.write_cell_hard(cell, value)?;
            }
        }
        Ok(())
    }

    fn cell(&self, cell: usize) -> Result<isize, RegexError> {
        self.cells
            .get(cell)
            .copied()
            .ok_or_else(|| RegexError::Internal(format!("Cell {} does not exist.", cell)))
    }

    fn write_cell_hard(&mut self, cell: usize, value: isize) -> Result<(), RegexError> {
        let slot = self
            .cells
            .get_mut(cell)
            .ok_or_else(|| RegexError::Internal(format!("Cell {} does not exist.", cell)))?;
        *slot = value;
        Ok(())
    }

    // The old value is restored on backtracking.
    fn write_cell(&mut self, cell: usize, value: isize) -> Result<(), RegexError> {
        let old = self.cell(cell)?;
        self.stack.push(Frame::Undo { cell, value: old });
        self.write_cell_hard(cell, value)
    }
}

impl Clone for Vm<'_> {
    // a clone starts with an empty stack
    fn clone(&self) -> Self {
        Self {
            program: self.program,
            cells: self.cells.clone(),
            stack: vec![],
            backtrack_limit: self.backtrack_limit,
            prefix_bytes: self.prefix_bytes.clone(),
        }
    }
}

// Matches the text between `begin` and `end` of the input at `pos`.
fn match_range(
    input: &mut Input,
    pos: usize,
    begin: usize,
    end: usize,
    ignore_case: bool,
) -> Option<usize> {
    let mut from = begin;
    let mut pos = pos;

    while from < end {
        let expected = input.char_at(from)?;
        let c = input.char_at(pos)?;
        if !chars_equal(c, expected, ignore_case) {
            return None;
        }
        from += expected.len_utf8();
        pos += c.len_utf8();
    }

    Some(pos)
}

fn match_text(input: &mut Input, pos: usize, text: &str, ignore_case: bool) -> Option<usize> {
    let mut pos = pos;

    for expected in text.chars() {
        let c = input.char_at(pos)?;
        if !chars_equal(c, expected, ignore_case) {
            return None;
        }
        pos += c.len_utf8();
    }

    Some(pos)
}

fn check_boundary(input: &mut Input, pos: usize, kind: AssertionKind) -> bool {
    match kind {
        AssertionKind::TextStart => pos == 0,
        AssertionKind::TextEnd => input.is_end(pos),
        AssertionKind::LineStart => {
            if pos == 0 {
                return true;
            }

            let Some(previous) = input.char_before(pos) else {
                return true;
            };

            match input.char_at(pos) {
                // not after the final terminator
                None => false,
                // not between "\r" and "\n"
                Some('\n') if previous == '\r' => false,
                Some(_) => is_line_terminator(previous),
            }
        }
        AssertionKind::LineEnd => match input.char_at(pos) {
            None => true,
            Some('\n') => input.char_before(pos) != Some('\r'),
            Some(c) => is_line_terminator(c),
        },
        AssertionKind::TextEndNewline => match input.char_at(pos) {
            None => true,
            Some('\r') => match input.char_at(pos + 1) {
                None => true,
                Some('\n') => input.is_end(pos + 2),
                Some(_) => false,
            },
            Some('\n') if input.char_before(pos) == Some('\r') => false,
            Some(c) if is_line_terminator(c) => input.is_end(pos + c.len_utf8()),
            Some(_) => false,
        },
        AssertionKind::WordBoundary | AssertionKind::NotWordBoundary => {
            let before = input.char_before(pos).map_or(false, is_word_char);
            let after = input.char_at(pos).map_or(false, is_word_char);
            (before != after) == (kind == AssertionKind::WordBoundary)
        }
    }
}
