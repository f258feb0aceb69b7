// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    ast::{Ast, NodeId, NodeKind},
    error::RegexError,
    flags::Flags,
    machine::{Cell, Hint, Label, Machine},
    variables::{Slot, Variables},
};

// The (min, max) length in chars of the part of the pattern that
// follows a chain, up to the accepting instruction.
type After = Option<(usize, Option<usize>)>;

/// Walks the AST and emits the program through the machine.
pub fn compile<M: Machine>(
    ast: &Ast,
    variables: &Variables,
    machine: &mut M,
) -> Result<(), RegexError> {
    let mut compiler = Compiler::new(ast, variables, machine);
    compiler.compile()
}

pub struct Compiler<'a, M: Machine> {
    ast: &'a Ast,
    variables: &'a Variables,

    // The compilation target
    machine: &'a mut M,

    // `capture_cells[n]` is cell `n` of the variable table
    capture_cells: Vec<Cell>,
}

impl<'a, M: Machine> Compiler<'a, M> {
    fn new(ast: &'a Ast, variables: &'a Variables, machine: &'a mut M) -> Self {
        Compiler {
            ast,
            variables,
            machine,
            capture_cells: vec![],
        }
    }

    fn compile(&mut self) -> Result<(), RegexError> {
        for _ in 0..self.variables.capture_cell_count() {
            let cell = self.machine.new_cell(-1);
            self.capture_cells.push(cell);
        }

        let root = self.ast.root;
        let (min_length, max_length) = self.ast.chain_lengths(root);

        self.machine.hint(&Hint {
            start_anchored: self.ast.is_start_anchored(),
            end_anchored: self.ast.is_end_anchored(),
            min_length,
            max_length,
            prefix: root.and_then(|id| self.ast.node(id).prefix.clone()),
        });

        if let Some(literal) = self.ast.leading_literal() {
            if literal.len() >= 3 {
                self.machine.shift_table(literal);
            }
        }

        // the whole match is group 0
        //
        // ```diagram
        // set_cell_position c0
        // ...chain...
        // set_cell_position c1
        // accept
        // ```
        self.machine.set_cell_position(self.capture_cells[0]);
        self.emit_chain(root, Some((0, Some(0))))?;
        self.machine.set_cell_position(self.capture_cells[1]);
        self.machine.accept();

        Ok(())
    }

    fn emit_chain(&mut self, head: Option<NodeId>, after: After) -> Result<(), RegexError> {
        for id in self.ast.chain(head) {
            self.emit_node(id, after)?;
        }
        Ok(())
    }

    fn emit_node(&mut self, id: NodeId, after: After) -> Result<(), RegexError> {
        let node = self.ast.node(id);
        let ignore_case = node.is_ignore_case();

        match &node.kind {
            NodeKind::Empty => {
                // pass
            }
            NodeKind::Literal(chars) => self.machine.assert_literal(chars, ignore_case),
            NodeKind::Class(set) => match set.single_char() {
                Some(c) => self.machine.assert_literal(&[c], ignore_case),
                None => self.machine.assert_set(set, ignore_case),
            },
            NodeKind::AnyChar => self
                .machine
                .any_char(node.flags.contains(Flags::DOT_ALL)),
            NodeKind::Assertion(kind) => self.machine.assert_boundary(*kind),
            NodeKind::Alternation { left, right } => {
                self.emit_alternation(id, *left, *right, after)?
            }
            NodeKind::Repeat {
                min,
                max,
                greedy,
                body,
            } => self.emit_repeat(*min, *max, *greedy, *body)?,
            NodeKind::CaptureBegin { group } => {
                self.machine.set_cell_position(self.capture_cells[group * 2])
            }
            NodeKind::CaptureEnd { group } => {
                self.machine.set_cell_position(self.capture_cells[group * 2 + 1])
            }
            NodeKind::BackReference { name } => match self.variables.slot_of(name) {
                Some(Slot::Capture { begin, end }) => self.machine.assert_capture(
                    self.capture_cells[begin],
                    self.capture_cells[end],
                    ignore_case,
                ),
                Some(Slot::External(index)) => self.machine.assert_external(index, ignore_case),
                None => {
                    return Err(RegexError::Internal(format!(
                        "Backreference \"{}\" is not in the variable table.",
                        name
                    )))
                }
            },
            NodeKind::LookAhead { negative, body } => self.emit_lookahead(*negative, *body)?,
        }

        Ok(())
    }

    fn emit_alternation(
        &mut self,
        id: NodeId,
        left: Option<NodeId>,
        right: Option<NodeId>,
        after: After,
    ) -> Result<(), RegexError> {
        // ```diagram
        //          [conditional jumps to right]
        //          fork right
        //          ...left...
        //          jump end
        // right:   ...right...
        // end:
        // ```

        let (tail_min, tail_max) = self.ast.chain_lengths(self.ast.node(id).tail);
        let branch_after = after.map(|(after_min, after_max)| {
            (tail_min.saturating_add(after_min), add_max(tail_max, after_max))
        });

        let label_right = self.machine.new_label();
        let label_end = self.machine.new_label();

        if let Some(left_id) = left {
            self.emit_skip_unless_start(left_id, label_right);

            if let Some((after_min, after_max)) = branch_after {
                let left_node = self.ast.node(left_id);
                let min = left_node.min_length.saturating_add(after_min);
                let max = if self.ast.is_end_anchored() {
                    add_max(left_node.max_length, after_max)
                } else {
                    None
                };

                if min > 0 || max.is_some() {
                    self.machine
                        .jump_if_remaining_outside(min, max, label_right);
                }
            }
        }

        self.machine.fork(label_right);
        self.emit_chain(left, branch_after)?;
        self.machine.jump(label_end);

        self.machine.mark(label_right);
        self.emit_chain(right, branch_after)?;
        self.machine.mark(label_end);

        Ok(())
    }

    // Jumps to the label when the next char cannot start the chain.
    fn emit_skip_unless_start(&mut self, head: NodeId, label: Label) {
        if let Some(prefix) = &self.ast.node(head).prefix {
            match prefix.single_char() {
                Some(c) => self.machine.jump_if_not_char(c, label),
                None => self.machine.jump_if_not_in_set(prefix, label),
            };
        }
    }

    fn emit_repeat(
        &mut self,
        min: u32,
        max: Option<u32>,
        greedy: bool,
        body: Option<NodeId>,
    ) -> Result<(), RegexError> {
        let Some(body_head) = body else {
            // nothing to repeat
            return Ok(());
        };

        // the mandatory part
        //
        // ```diagram
        //          set_cell c, min
        // loop:    ...body...
        //          dec_jump_if_positive c, loop
        // ```
        match min {
            0 => {}
            1 => self.emit_chain(body, None)?,
            _ => {
                let counter = self.machine.new_cell(0);
                let label_loop = self.machine.new_label();
                self.machine.set_cell(counter, min as isize, false);
                self.machine.mark(label_loop);
                self.emit_chain(body, None)?;
                self.machine.dec_jump_if_positive(counter, label_loop);
            }
        }

        // the optional part
        let optional = max.map(|max| max - min);
        if optional == Some(0) {
            return Ok(());
        }

        let (body_min, _) = self.ast.chain_lengths(body);
        let label_done = self.machine.new_label();

        if greedy && optional != Some(1) && self.ast.is_simple_fixed_chain(body) {
            // ```diagram
            //          repeat_start width, done
            // body:    ...body...
            //          repeat_next limit, body
            // done:
            // ```
            if self.machine.repeat_start(body_min, label_done) {
                let label_body = self.machine.new_label();
                self.machine.mark(label_body);
                self.emit_chain(body, None)?;
                self.machine.repeat_next(optional, label_body);
                self.machine.mark(label_done);
                return Ok(());
            }
        }

        if optional == Some(1) {
            // ```diagram
            //          fork done           fork body
            //          ...body...          jump done
            //                        body: ...body...
            // done:
            // ```
            if greedy {
                self.emit_skip_unless_start(body_head, label_done);
                self.machine.fork(label_done);
                self.emit_chain(body, None)?;
            } else {
                let label_body = self.machine.new_label();
                self.machine.fork(label_body);
                self.machine.jump(label_done);
                self.machine.mark(label_body);
                self.emit_chain(body, None)?;
            }
            self.machine.mark(label_done);
            return Ok(());
        }

        // ```diagram
        //          [set_cell c, limit]
        // loop:    fork done                   fork body
        //                                      jump done
        //                                body:
        //          [dec_fail_if_negative c]
        //          [set_cell_position p]
        //          ...body...
        //          [jump_if_position p, done]
        //          jump loop
        // done:
        // ```
        let counter = match optional {
            Some(limit) => {
                let counter = self.machine.new_cell(0);
                self.machine.set_cell(counter, limit as isize, false);
                Some(counter)
            }
            None => None,
        };

        let label_loop = self.machine.new_label();
        self.machine.mark(label_loop);

        if greedy {
            self.emit_skip_unless_start(body_head, label_done);
            self.machine.fork(label_done);
        } else {
            let label_body = self.machine.new_label();
            self.machine.fork(label_body);
            self.machine.jump(label_done);
            self.machine.mark(label_body);
        }

        if let Some(counter) = counter {
            self.machine.dec_fail_if_negative(counter);
        }

        // an iteration that consumes nothing leaves the loop, keeping
        // the captures it made
        let position = if body_min == 0 {
            let position = self.machine.new_cell(-1);
            self.machine.set_cell_position(position);
            Some(position)
        } else {
            None
        };

        self.emit_chain(body, None)?;

        if let Some(position) = position {
            self.machine.jump_if_position(position, label_done);
        }

        self.machine.jump(label_loop);
        self.machine.mark(label_done);

        Ok(())
    }

    fn emit_lookahead(&mut self, negative: bool, body: Option<NodeId>) -> Result<(), RegexError> {
        // ```diagram
        //          set_cell flag, 0 (hard)
        //          fork after
        //          save_stack depth
        //          ...body...
        //          set_cell flag, 1 (hard)
        //          cut_fail depth
        // after:   fail_if_cell flag, 0 (1 for the negative form)
        // ```
        let flag = self.machine.new_cell(0);
        let depth = self.machine.new_cell(0);
        let label_after = self.machine.new_label();

        self.machine.set_cell(flag, 0, true);
        self.machine.fork(label_after);
        self.machine.save_stack(depth);
        self.emit_chain(body, None)?;
        self.machine.set_cell(flag, 1, true);
        self.machine.cut_fail(depth);
        self.machine.mark(label_after);
        self.machine
            .fail_if_cell(flag, if negative { 1 } else { 0 });

        Ok(())
    }
}

fn add_max(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => a.checked_add(b),
        _ => None,
    }
}
