// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! The instruction emission contract between the compiler and a backend.
//!
//! The compiler walks the AST once and calls these methods in program
//! order. A backend either records the instructions (see `instr::Assembler`)
//! or turns them into something else, e.g. a listing or native code.
//!
//! The optional extensions return `false` (or do nothing) by default,
//! in which case the compiler emits the plain choice-point form instead.

use crate::{ast::AssertionKind, charset::CharSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub usize);

/// An integer cell of the matcher state. Capture offsets, loop counters
/// and lookahead scratch values all live in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell(pub usize);

/// Static facts about the whole pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    /// The pattern can only match at the start of the text.
    pub start_anchored: bool,

    /// The pattern can only match up to the end of the text.
    pub end_anchored: bool,

    // in chars
    pub min_length: usize,
    pub max_length: Option<usize>,

    /// The chars a match can begin with, `None` when unknown.
    pub prefix: Option<CharSet>,
}

pub trait Machine {
    fn new_label(&mut self) -> Label;

    /// Allocates a cell, the cell is set to `initial` at the start
    /// of every match attempt.
    fn new_cell(&mut self, initial: isize) -> Cell;

    /// Binds the label to the position of the next instruction.
    fn mark(&mut self, label: Label);

    fn jump(&mut self, label: Label);

    /// Backtracks to the latest choice point.
    fn fail(&mut self);

    /// Pushes a choice point that resumes at `label` with the
    /// current position.
    fn fork(&mut self, label: Label);

    /// Consumes one char, line terminators excluded unless `dot_all`.
    fn any_char(&mut self, dot_all: bool);

    /// Consumes one char that is in the set. With `ignore_case` the
    /// subject char is folded before the test.
    fn assert_set(&mut self, set: &CharSet, ignore_case: bool);

    fn assert_literal(&mut self, chars: &[char], ignore_case: bool);

    /// Consumes the text captured between the offsets in the two cells,
    /// fails if the group has not been set.
    fn assert_capture(&mut self, begin: Cell, end: Cell, ignore_case: bool);

    /// Consumes the text of an external variable.
    fn assert_external(&mut self, index: usize, ignore_case: bool);

    fn assert_boundary(&mut self, kind: AssertionKind);

    /// Decrements the cell and jumps if it is still positive.
    fn dec_jump_if_positive(&mut self, cell: Cell, label: Label);

    /// Decrements the cell and fails if it became negative.
    fn dec_fail_if_negative(&mut self, cell: Cell);

    /// A soft write is undone by backtracking, a hard one is not.
    fn set_cell(&mut self, cell: Cell, value: isize, hard: bool);

    /// Writes the current position to the cell (soft).
    fn set_cell_position(&mut self, cell: Cell);

    fn fail_if_cell(&mut self, cell: Cell, value: isize);

    /// Jumps if the current position equals the value of the cell.
    fn jump_if_position(&mut self, cell: Cell, label: Label);

    /// Stores the depth of the backtrack stack in the cell (hard).
    fn save_stack(&mut self, cell: Cell);

    /// Pops the backtrack stack down to the depth stored in the cell,
    /// undoing the cell writes on the way, then fails.
    fn cut_fail(&mut self, cell: Cell);

    fn accept(&mut self);

    // Optional extensions.

    fn hint(&mut self, _hint: &Hint) {}

    /// Starts a batched repeat of a body that consumes exactly `width`
    /// chars and pushes nothing on the backtrack stack. `exit` is where
    /// to go after backtracking into the loop.
    ///
    /// Returns `false` if the backend does not support batched repeats.
    fn repeat_start(&mut self, _width: usize, _exit: Label) -> bool {
        false
    }

    /// Ends one iteration of a batched repeat: loops back to `body`
    /// unless `limit` iterations are done.
    fn repeat_next(&mut self, _limit: Option<u32>, _body: Label) {}

    /// Jumps if fewer than `min` or more than `max` chars remain.
    fn jump_if_remaining_outside(
        &mut self,
        _min: usize,
        _max: Option<usize>,
        _label: Label,
    ) -> bool {
        false
    }

    /// Jumps if the next char (unfolded) is not in the set, or if
    /// there is no next char.
    fn jump_if_not_in_set(&mut self, _set: &CharSet, _label: Label) -> bool {
        false
    }

    fn jump_if_not_char(&mut self, _c: char, _label: Label) -> bool {
        false
    }

    /// Declares the literal every match starts with, so that the
    /// search can skip ahead.
    fn shift_table(&mut self, _literal: &[char]) -> bool {
        false
    }
}
