// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! The byte-encoded program of the interpreter.
//!
//! Every instruction is an opcode byte followed by inline operands.
//! Numbers are varints:
//!
//! ```diagram
//! 0xxxxxxx                      0 ..= 0x7F
//! 10xxxxxx xxxxxxxx             ..= 0x3FFF (big-endian)
//! 11000000 b0 b1 b2 b3          any u32 (little-endian)
//! ```
//!
//! `u32::MAX` stands for "none" (an unbounded limit, or the value -1).
//! Jump targets are 2-byte little-endian absolute offsets, patched by
//! `Assembler::finish` once every label is marked.

use std::fmt::{Display, Write};

use crate::{
    ast::AssertionKind,
    charset::{CharClass, CharSet},
    error::RegexError,
    flags::Extensions,
    machine::{Cell, Hint, Label, Machine},
};

const NONE_VALUE: u32 = u32::MAX;
const MAX_CODE_SIZE: usize = 0xFFFF;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Jump = 0x01,
    Fail,
    Fork,
    AnyChar,
    AnyCharDotAll,
    Set,
    SetIc,
    Literal,
    LiteralIc,
    Capture,
    CaptureIc,
    External,
    ExternalIc,
    Boundary,
    DecJumpIfPositive,
    DecFailIfNegative,
    SetCell,
    SetCellHard,
    SetCellPosition,
    FailIfCell,
    JumpIfPosition,
    SaveStack,
    CutFail,
    Accept,
    RepeatStart,
    RepeatNext,
    JumpIfRemainingOutside,
    JumpIfNotInSet,
    JumpIfNotChar,
}

impl Opcode {
    pub fn from_u8(byte: u8) -> Option<Opcode> {
        let opcode = match byte {
            0x01 => Opcode::Jump,
            0x02 => Opcode::Fail,
            0x03 => Opcode::Fork,
            0x04 => Opcode::AnyChar,
            0x05 => Opcode::AnyCharDotAll,
            0x06 => Opcode::Set,
            0x07 => Opcode::SetIc,
            0x08 => Opcode::Literal,
            0x09 => Opcode::LiteralIc,
            0x0A => Opcode::Capture,
            0x0B => Opcode::CaptureIc,
            0x0C => Opcode::External,
            0x0D => Opcode::ExternalIc,
            0x0E => Opcode::Boundary,
            0x0F => Opcode::DecJumpIfPositive,
            0x10 => Opcode::DecFailIfNegative,
            0x11 => Opcode::SetCell,
            0x12 => Opcode::SetCellHard,
            0x13 => Opcode::SetCellPosition,
            0x14 => Opcode::FailIfCell,
            0x15 => Opcode::JumpIfPosition,
            0x16 => Opcode::SaveStack,
            0x17 => Opcode::CutFail,
            0x18 => Opcode::Accept,
            0x19 => Opcode::RepeatStart,
            0x1A => Opcode::RepeatNext,
            0x1B => Opcode::JumpIfRemainingOutside,
            0x1C => Opcode::JumpIfNotInSet,
            0x1D => Opcode::JumpIfNotChar,
            _ => return None,
        };
        Some(opcode)
    }
}

pub fn encode_varint(code: &mut Vec<u8>, value: u32) {
    if value <= 0x7F {
        code.push(value as u8);
    } else if value <= 0x3FFF {
        code.push(0x80 | (value >> 8) as u8);
        code.push((value & 0xFF) as u8);
    } else {
        code.push(0xC0);
        code.extend_from_slice(&value.to_le_bytes());
    }
}

/// A Boyer-Moore-Horspool table over the UTF-8 bytes of the literal
/// every match starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftTable {
    needle: Vec<u8>,
    shifts: Vec<usize>,
}

impl ShiftTable {
    pub fn new(literal: &[char]) -> Self {
        let needle: Vec<u8> = literal.iter().collect::<String>().into_bytes();
        let length = needle.len();

        let mut shifts = vec![length; 256];
        for (idx, byte) in needle.iter().enumerate().take(length.saturating_sub(1)) {
            shifts[*byte as usize] = length - 1 - idx;
        }

        Self { needle, shifts }
    }

    pub fn needle(&self) -> &[u8] {
        &self.needle
    }

    /// Returns `Ok(offset)` of the first occurrence, or `Err(offset)`
    /// of the first alignment that could not be checked because the
    /// haystack is too short.
    pub fn find(&self, haystack: &[u8]) -> Result<usize, usize> {
        let length = self.needle.len();
        let mut idx = 0;

        while idx + length <= haystack.len() {
            if haystack[idx..idx + length] == self.needle[..] {
                return Ok(idx);
            }
            idx += self.shifts[haystack[idx + length - 1] as usize];
        }

        Err(idx)
    }
}

/// A compiled program, ready for the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub code: Vec<u8>,

    // the value of each cell at the start of an attempt
    pub cells: Vec<isize>,

    pub hint: Option<Hint>,
    pub shift: Option<ShiftTable>,
}

/// The interpreter backend of the machine contract.
pub struct Assembler {
    code: Vec<u8>,
    cells: Vec<isize>,
    extensions: Extensions,

    // `labels[n]` is the offset label `n` is marked at
    labels: Vec<Option<usize>>,

    // the places to write jump targets to
    patches: Vec<(usize, Label)>,

    hint: Option<Hint>,
    shift: Option<ShiftTable>,
}

impl Assembler {
    pub fn new(extensions: Extensions) -> Self {
        Self {
            code: vec![],
            cells: vec![],
            extensions,
            labels: vec![],
            patches: vec![],
            hint: None,
            shift: None,
        }
    }

    /// Resolves the jump targets and returns the program.
    pub fn finish(mut self) -> Result<Program, RegexError> {
        if self.code.len() > MAX_CODE_SIZE {
            return Err(RegexError::pattern_at(
                format!(
                    "The compiled pattern is too large ({} bytes).",
                    self.code.len()
                ),
                0,
            ));
        }

        for (offset, label) in &self.patches {
            let target = self.labels[label.0].ok_or_else(|| {
                RegexError::Internal(format!("Label {} is jumped to but never marked.", label.0))
            })?;

            self.code[*offset..*offset + 2].copy_from_slice(&(target as u16).to_le_bytes());
        }

        Ok(Program {
            code: self.code,
            cells: self.cells,
            hint: self.hint,
            shift: self.shift,
        })
    }

    fn emit_opcode(&mut self, opcode: Opcode) {
        self.code.push(opcode as u8);
    }

    fn emit_varint(&mut self, value: u32) {
        encode_varint(&mut self.code, value);
    }

    fn emit_cell(&mut self, cell: Cell) {
        self.emit_varint(cell.0 as u32);
    }

    fn emit_value(&mut self, value: isize) {
        // -1 is cast to u32::MAX
        self.emit_varint(value as u32);
    }

    fn emit_label(&mut self, label: Label) {
        self.patches.push((self.code.len(), label));
        self.code.extend_from_slice(&[0, 0]);
    }

    fn emit_set(&mut self, set: &CharSet) {
        self.emit_varint(set.ranges().len() as u32);
        for (low, high) in set.ranges() {
            self.emit_varint(*low);
            self.emit_varint(*high);
        }
        self.code.push(set.class().bits());
    }
}

impl Machine for Assembler {
    fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    fn new_cell(&mut self, initial: isize) -> Cell {
        self.cells.push(initial);
        Cell(self.cells.len() - 1)
    }

    fn mark(&mut self, label: Label) {
        self.labels[label.0] = Some(self.code.len());
    }

    fn jump(&mut self, label: Label) {
        self.emit_opcode(Opcode::Jump);
        self.emit_label(label);
    }

    fn fail(&mut self) {
        self.emit_opcode(Opcode::Fail);
    }

    fn fork(&mut self, label: Label) {
        self.emit_opcode(Opcode::Fork);
        self.emit_label(label);
    }

    fn any_char(&mut self, dot_all: bool) {
        self.emit_opcode(if dot_all {
            Opcode::AnyCharDotAll
        } else {
            Opcode::AnyChar
        });
    }

    fn assert_set(&mut self, set: &CharSet, ignore_case: bool) {
        self.emit_opcode(if ignore_case { Opcode::SetIc } else { Opcode::Set });
        self.emit_set(set);
    }

    fn assert_literal(&mut self, chars: &[char], ignore_case: bool) {
        self.emit_opcode(if ignore_case {
            Opcode::LiteralIc
        } else {
            Opcode::Literal
        });
        self.emit_varint(chars.len() as u32);
        for c in chars {
            self.emit_varint(*c as u32);
        }
    }

    fn assert_capture(&mut self, begin: Cell, end: Cell, ignore_case: bool) {
        self.emit_opcode(if ignore_case {
            Opcode::CaptureIc
        } else {
            Opcode::Capture
        });
        self.emit_cell(begin);
        self.emit_cell(end);
    }

    fn assert_external(&mut self, index: usize, ignore_case: bool) {
        self.emit_opcode(if ignore_case {
            Opcode::ExternalIc
        } else {
            Opcode::External
        });
        self.emit_varint(index as u32);
    }

    fn assert_boundary(&mut self, kind: AssertionKind) {
        self.emit_opcode(Opcode::Boundary);
        self.code.push(kind.to_byte());
    }

    fn dec_jump_if_positive(&mut self, cell: Cell, label: Label) {
        self.emit_opcode(Opcode::DecJumpIfPositive);
        self.emit_cell(cell);
        self.emit_label(label);
    }

    fn dec_fail_if_negative(&mut self, cell: Cell) {
        self.emit_opcode(Opcode::DecFailIfNegative);
        self.emit_cell(cell);
    }

    fn set_cell(&mut self, cell: Cell, value: isize, hard: bool) {
        self.emit_opcode(if hard {
            Opcode::SetCellHard
        } else {
            Opcode::SetCell
        });
        self.emit_cell(cell);
        self.emit_value(value);
    }

    fn set_cell_position(&mut self, cell: Cell) {
        self.emit_opcode(Opcode::SetCellPosition);
        self.emit_cell(cell);
    }

    fn fail_if_cell(&mut self, cell: Cell, value: isize) {
        self.emit_opcode(Opcode::FailIfCell);
        self.emit_cell(cell);
        self.emit_value(value);
    }

    fn jump_if_position(&mut self, cell: Cell, label: Label) {
        self.emit_opcode(Opcode::JumpIfPosition);
        self.emit_cell(cell);
        self.emit_label(label);
    }

    fn save_stack(&mut self, cell: Cell) {
        self.emit_opcode(Opcode::SaveStack);
        self.emit_cell(cell);
    }

    fn cut_fail(&mut self, cell: Cell) {
        self.emit_opcode(Opcode::CutFail);
        self.emit_cell(cell);
    }

    fn accept(&mut self) {
        self.emit_opcode(Opcode::Accept);
    }

    fn hint(&mut self, hint: &Hint) {
        if self.extensions.contains(Extensions::HINT) {
            self.hint = Some(hint.clone());
        }
    }

    fn repeat_start(&mut self, width: usize, exit: Label) -> bool {
        if !self.extensions.contains(Extensions::BATCHED_REPEAT) || width >= NONE_VALUE as usize {
            return false;
        }

        self.emit_opcode(Opcode::RepeatStart);
        self.emit_varint(width as u32);
        self.emit_label(exit);
        true
    }

    fn repeat_next(&mut self, limit: Option<u32>, body: Label) {
        self.emit_opcode(Opcode::RepeatNext);
        self.emit_varint(limit.unwrap_or(NONE_VALUE));
        self.emit_label(body);
    }

    fn jump_if_remaining_outside(
        &mut self,
        min: usize,
        max: Option<usize>,
        label: Label,
    ) -> bool {
        if !self.extensions.contains(Extensions::CONDITIONAL_JUMP) {
            return false;
        }

        // out of range bounds are weakened, never tightened
        let min = min.min(NONE_VALUE as usize - 1) as u32;
        let max = match max {
            Some(max) if max < NONE_VALUE as usize => max as u32,
            _ => NONE_VALUE,
        };

        self.emit_opcode(Opcode::JumpIfRemainingOutside);
        self.emit_varint(min);
        self.emit_varint(max);
        self.emit_label(label);
        true
    }

    fn jump_if_not_in_set(&mut self, set: &CharSet, label: Label) -> bool {
        if !self.extensions.contains(Extensions::CONDITIONAL_JUMP) {
            return false;
        }

        self.emit_opcode(Opcode::JumpIfNotInSet);
        self.emit_set(set);
        self.emit_label(label);
        true
    }

    fn jump_if_not_char(&mut self, c: char, label: Label) -> bool {
        if !self.extensions.contains(Extensions::CONDITIONAL_JUMP) {
            return false;
        }

        self.emit_opcode(Opcode::JumpIfNotChar);
        self.emit_varint(c as u32);
        self.emit_label(label);
        true
    }

    fn shift_table(&mut self, literal: &[char]) -> bool {
        if !self.extensions.contains(Extensions::SHIFT_TABLE) {
            return false;
        }

        self.shift = Some(ShiftTable::new(literal));
        true
    }
}

/// A cursor over the program code.
pub struct Decoder<'a> {
    code: &'a [u8],
    pc: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(code: &'a [u8], pc: usize) -> Self {
        Self { code, pc }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    fn truncated(&self) -> RegexError {
        RegexError::Internal(format!("Truncated instruction at offset {}.", self.pc))
    }

    pub fn read_u8(&mut self) -> Result<u8, RegexError> {
        let byte = *self.code.get(self.pc).ok_or_else(|| self.truncated())?;
        self.pc += 1;
        Ok(byte)
    }

    pub fn read_opcode(&mut self) -> Result<Opcode, RegexError> {
        let byte = self.read_u8()?;
        Opcode::from_u8(byte).ok_or_else(|| {
            RegexError::Internal(format!(
                "Unknown opcode {:#04x} at offset {}.",
                byte,
                self.pc - 1
            ))
        })
    }

    pub fn read_varint(&mut self) -> Result<u32, RegexError> {
        let first = self.read_u8()?;

        if first & 0x80 == 0 {
            Ok(first as u32)
        } else if first & 0xC0 == 0x80 {
            let second = self.read_u8()?;
            Ok((((first & 0x3F) as u32) << 8) | second as u32)
        } else if first == 0xC0 {
            let bytes = self
                .code
                .get(self.pc..self.pc + 4)
                .ok_or_else(|| self.truncated())?;
            let value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            self.pc += 4;
            Ok(value)
        } else {
            Err(RegexError::Internal(format!(
                "Malformed number at offset {}.",
                self.pc - 1
            )))
        }
    }

    pub fn read_usize(&mut self) -> Result<usize, RegexError> {
        Ok(self.read_varint()? as usize)
    }

    pub fn read_value(&mut self) -> Result<isize, RegexError> {
        let value = self.read_varint()?;
        Ok(if value == NONE_VALUE {
            -1
        } else {
            value as isize
        })
    }

    pub fn read_limit(&mut self) -> Result<Option<u32>, RegexError> {
        let value = self.read_varint()?;
        Ok(if value == NONE_VALUE { None } else { Some(value) })
    }

    pub fn read_label(&mut self) -> Result<usize, RegexError> {
        let bytes = self
            .code
            .get(self.pc..self.pc + 2)
            .ok_or_else(|| self.truncated())?;
        let target = u16::from_le_bytes([bytes[0], bytes[1]]);
        self.pc += 2;
        Ok(target as usize)
    }

    pub fn read_char(&mut self) -> Result<char, RegexError> {
        let code = self.read_varint()?;
        char::from_u32(code).ok_or_else(|| {
            RegexError::Internal(format!(
                "Invalid char {:#x} before offset {}.",
                code, self.pc
            ))
        })
    }

    pub fn read_literal(&mut self) -> Result<Vec<char>, RegexError> {
        let count = self.read_usize()?;
        (0..count).map(|_| self.read_char()).collect()
    }

    /// Reads a set operand and tests the char against it.
    pub fn read_set_contains(&mut self, c: char) -> Result<bool, RegexError> {
        let code = c as u32;
        let count = self.read_usize()?;

        let mut found = false;
        for _ in 0..count {
            let low = self.read_varint()?;
            let high = self.read_varint()?;
            found = found || (low <= code && code <= high);
        }

        let class = CharClass::from_bits_truncate(self.read_u8()?);
        Ok(found || (code > 0x7F && class.intersects(CharClass::of(c))))
    }

    pub fn read_set(&mut self) -> Result<CharSet, RegexError> {
        let count = self.read_usize()?;

        let mut ranges = Vec::with_capacity(count);
        for _ in 0..count {
            let low = self.read_varint()?;
            let high = self.read_varint()?;
            if low > high {
                return Err(RegexError::Internal(format!(
                    "Invalid range {:#x}-{:#x} before offset {}.",
                    low, high, self.pc
                )));
            }
            ranges.push((low, high));
        }

        let class = CharClass::from_bits_truncate(self.read_u8()?);
        Ok(CharSet::from_ranges(&ranges).merge(&CharSet::from_class(class)))
    }

    pub fn read_assertion(&mut self) -> Result<AssertionKind, RegexError> {
        let byte = self.read_u8()?;
        AssertionKind::from_byte(byte).ok_or_else(|| {
            RegexError::Internal(format!(
                "Unknown assertion {} at offset {}.",
                byte,
                self.pc - 1
            ))
        })
    }
}

fn format_bound(value: Option<impl Display>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "inf".to_owned(),
    }
}

// Writes the instruction at the decoder position.
fn write_instruction(f: &mut impl Write, decoder: &mut Decoder) -> Result<(), RegexError> {
    let opcode = decoder.read_opcode()?;

    let text = match opcode {
        Opcode::Jump => format!("jump {:04}", decoder.read_label()?),
        Opcode::Fail => "fail".to_owned(),
        Opcode::Fork => format!("fork {:04}", decoder.read_label()?),
        Opcode::AnyChar => "any_char".to_owned(),
        Opcode::AnyCharDotAll => "any_char_dot_all".to_owned(),
        Opcode::Set => format!("set {}", decoder.read_set()?),
        Opcode::SetIc => format!("set_ic {}", decoder.read_set()?),
        Opcode::Literal | Opcode::LiteralIc => {
            let s: String = decoder.read_literal()?.into_iter().collect();
            let name = if opcode == Opcode::Literal {
                "literal"
            } else {
                "literal_ic"
            };
            format!("{} {:?}", name, s)
        }
        Opcode::Capture | Opcode::CaptureIc => {
            let begin = decoder.read_usize()?;
            let end = decoder.read_usize()?;
            let name = if opcode == Opcode::Capture {
                "capture"
            } else {
                "capture_ic"
            };
            format!("{} c{}, c{}", name, begin, end)
        }
        Opcode::External => format!("external {}", decoder.read_usize()?),
        Opcode::ExternalIc => format!("external_ic {}", decoder.read_usize()?),
        Opcode::Boundary => format!("boundary {}", decoder.read_assertion()?),
        Opcode::DecJumpIfPositive => {
            let cell = decoder.read_usize()?;
            format!("dec_jump_if_positive c{}, {:04}", cell, decoder.read_label()?)
        }
        Opcode::DecFailIfNegative => format!("dec_fail_if_negative c{}", decoder.read_usize()?),
        Opcode::SetCell | Opcode::SetCellHard => {
            let cell = decoder.read_usize()?;
            let value = decoder.read_value()?;
            let name = if opcode == Opcode::SetCell {
                "set_cell"
            } else {
                "set_cell_hard"
            };
            format!("{} c{}, {}", name, cell, value)
        }
        Opcode::SetCellPosition => format!("set_cell_position c{}", decoder.read_usize()?),
        Opcode::FailIfCell => {
            let cell = decoder.read_usize()?;
            format!("fail_if_cell c{}, {}", cell, decoder.read_value()?)
        }
        Opcode::JumpIfPosition => {
            let cell = decoder.read_usize()?;
            format!("jump_if_position c{}, {:04}", cell, decoder.read_label()?)
        }
        Opcode::SaveStack => format!("save_stack c{}", decoder.read_usize()?),
        Opcode::CutFail => format!("cut_fail c{}", decoder.read_usize()?),
        Opcode::Accept => "accept".to_owned(),
        Opcode::RepeatStart => {
            let width = decoder.read_usize()?;
            format!("repeat_start {}, {:04}", width, decoder.read_label()?)
        }
        Opcode::RepeatNext => {
            let limit = decoder.read_limit()?;
            format!(
                "repeat_next {}, {:04}",
                format_bound(limit),
                decoder.read_label()?
            )
        }
        Opcode::JumpIfRemainingOutside => {
            let min = decoder.read_usize()?;
            let max = decoder.read_limit()?;
            format!(
                "jump_if_remaining_outside {}, {}, {:04}",
                min,
                format_bound(max),
                decoder.read_label()?
            )
        }
        Opcode::JumpIfNotInSet => {
            let set = decoder.read_set()?;
            format!("jump_if_not_in_set {}, {:04}", set, decoder.read_label()?)
        }
        Opcode::JumpIfNotChar => {
            let c = decoder.read_char()?;
            format!("jump_if_not_char {:?}, {:04}", c, decoder.read_label()?)
        }
    };

    f.write_str(&text)
        .map_err(|_| RegexError::Internal("Formatter error.".to_owned()))
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(hint) = &self.hint {
            write!(
                f,
                "; length {}..{}",
                hint.min_length,
                format_bound(hint.max_length)
            )?;
            if hint.start_anchored {
                f.write_str(", start anchored")?;
            }
            if hint.end_anchored {
                f.write_str(", end anchored")?;
            }
            if let Some(prefix) = &hint.prefix {
                write!(f, ", prefix {}", prefix)?;
            }
            f.write_char('\n')?;
        }

        if let Some(shift) = &self.shift {
            writeln!(f, "; shift {:?}", String::from_utf8_lossy(shift.needle()))?;
        }

        let mut decoder = Decoder::new(&self.code, 0);
        while decoder.pc() < self.code.len() {
            if decoder.pc() > 0 {
                f.write_char('\n')?;
            }
            write!(f, "{:04}: ", decoder.pc())?;

            if let Err(e) = write_instruction(f, &mut decoder) {
                return write!(f, "<{}>", e);
            }
        }

        Ok(())
    }
}
