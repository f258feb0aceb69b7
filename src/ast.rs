// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

//! The pattern syntax tree.
//!
//! Nodes live in an arena (`Ast::nodes`) and are addressed by `NodeId`.
//! A sequence of atoms is a chain of nodes linked by `tail`, the
//! alternation, repetition and lookahead nodes own sub-chains:
//!
//! ```diagram
//! a(b|cd)*e
//!
//! "a" -> repeat -> "e"
//!          |
//!          +- body: begin(1) -> alt -> end(1)
//!                                |
//!                                +- left:  "b"
//!                                +- right: "cd"
//! ```

use std::fmt::{Display, Write};

use rustc_hash::FxHashSet;

use crate::{
    charset::{CharSet, ASCII_MAX},
    error::RegexError,
    flags::Flags,
    location::Location,
};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssertionKind {
    LineStart,       // `^` in multiline mode
    LineEnd,         // `$` in multiline mode
    TextStart,       // `\A`, `^`
    TextEnd,         // `\z`, `$`
    TextEndNewline,  // `\Z`
    WordBoundary,    // `\b`
    NotWordBoundary, // `\B`
}

impl AssertionKind {
    pub fn to_byte(self) -> u8 {
        match self {
            AssertionKind::LineStart => 0,
            AssertionKind::LineEnd => 1,
            AssertionKind::TextStart => 2,
            AssertionKind::TextEnd => 3,
            AssertionKind::TextEndNewline => 4,
            AssertionKind::WordBoundary => 5,
            AssertionKind::NotWordBoundary => 6,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        let kind = match byte {
            0 => AssertionKind::LineStart,
            1 => AssertionKind::LineEnd,
            2 => AssertionKind::TextStart,
            3 => AssertionKind::TextEnd,
            4 => AssertionKind::TextEndNewline,
            5 => AssertionKind::WordBoundary,
            6 => AssertionKind::NotWordBoundary,
            _ => return None,
        };
        Some(kind)
    }
}

impl Display for AssertionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssertionKind::LineStart => "line_start",
            AssertionKind::LineEnd => "line_end",
            AssertionKind::TextStart => "text_start",
            AssertionKind::TextEnd => "text_end",
            AssertionKind::TextEndNewline => "text_end_newline",
            AssertionKind::WordBoundary => "word_boundary",
            AssertionKind::NotWordBoundary => "not_word_boundary",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Empty,

    // the chars are already folded to lower case when the node
    // is case-insensitive.
    Literal(Vec<char>),

    // same as above, the set is folded before any negation.
    Class(CharSet),

    AnyChar,
    Assertion(AssertionKind),

    Alternation {
        left: Option<NodeId>,
        right: Option<NodeId>,
    },

    Repeat {
        min: u32,
        max: Option<u32>,
        greedy: bool,
        body: Option<NodeId>,
    },

    CaptureBegin {
        group: usize,
    },
    CaptureEnd {
        group: usize,
    },

    // a group number ("2"), a group name, or the name of
    // an external variable.
    BackReference {
        name: String,
    },

    LookAhead {
        negative: bool,
        body: Option<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub location: Location,
    pub tail: Option<NodeId>,
    pub flags: Flags,

    // the consumed length (in chars) of this node plus the rest
    // of its chain. `None` for unbounded.
    pub min_length: usize,
    pub max_length: Option<usize>,

    // the chars that can start a match from this node on.
    // `None` means any char, or nothing at all.
    pub prefix: Option<CharSet>,
}

impl Node {
    pub fn is_ignore_case(&self) -> bool {
        self.flags.contains(Flags::CASE_INSENSITIVE)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ast {
    pub nodes: Vec<Node>,
    pub root: Option<NodeId>,

    // `groups[n - 1]` is the name of group `n`, `None` for
    // the numbered-only groups.
    pub groups: Vec<Option<String>>,

    // names that are referenced by backreferences but defined by
    // no group, in order of first use.
    pub external_names: Vec<String>,

    // the groups that some backreference refers to.
    pub referenced_groups: FxHashSet<usize>,
}

impl Ast {
    pub fn add(&mut self, kind: NodeKind, location: Location, flags: Flags) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            location,
            tail: None,
            flags,
            min_length: 0,
            max_length: Some(0),
            prefix: None,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The group number for a backreference name, accepting both
    /// numbers and group names.
    pub fn resolve_group(&self, name: &str) -> Option<usize> {
        if let Ok(number) = name.parse::<usize>() {
            return if number >= 1 && number <= self.groups.len() {
                Some(number)
            } else {
                None
            };
        }

        self.groups
            .iter()
            .position(|group_name| group_name.as_deref() == Some(name))
            .map(|idx| idx + 1)
    }

    /// The node ids of a chain, head first.
    pub fn chain(&self, head: Option<NodeId>) -> Vec<NodeId> {
        let mut ids = vec![];
        let mut current = head;
        while let Some(id) = current {
            ids.push(id);
            current = self.nodes[id].tail;
        }
        ids
    }

    pub fn chain_lengths(&self, head: Option<NodeId>) -> (usize, Option<usize>) {
        match head {
            Some(id) => (self.nodes[id].min_length, self.nodes[id].max_length),
            None => (0, Some(0)),
        }
    }

    fn chain_prefix(&self, head: Option<NodeId>, follow: &Option<CharSet>) -> Option<CharSet> {
        match head {
            Some(id) => self.nodes[id].prefix.clone(),
            None => follow.clone(),
        }
    }
}

// Reference resolution.
impl Ast {
    /// Walks the tree in pattern order, checks that every backreference
    /// to a group comes after the group is closed, and collects the
    /// names of the external variables.
    pub fn resolve_references(&mut self) -> Result<(), RegexError> {
        let mut closed = FxHashSet::default();
        let root = self.root;
        self.resolve_references_in_chain(root, &mut closed)
    }

    fn resolve_references_in_chain(
        &mut self,
        head: Option<NodeId>,
        closed: &mut FxHashSet<usize>,
    ) -> Result<(), RegexError> {
        for id in self.chain(head) {
            match self.nodes[id].kind.clone() {
                NodeKind::CaptureEnd { group } => {
                    closed.insert(group);
                }
                NodeKind::BackReference { name } => match self.resolve_group(&name) {
                    Some(group) => {
                        if !closed.contains(&group) {
                            return Err(RegexError::pattern(
                                format!(
                                    "Backreference to group \"{}\" before the group is closed.",
                                    name
                                ),
                                &self.nodes[id].location,
                            ));
                        }
                        self.referenced_groups.insert(group);
                    }
                    None => {
                        if name.chars().all(|c| c.is_ascii_digit()) {
                            return Err(RegexError::pattern(
                                format!("Backreference to the unknown group {}.", name),
                                &self.nodes[id].location,
                            ));
                        }

                        if !self.external_names.contains(&name) {
                            self.external_names.push(name);
                        }
                    }
                },
                NodeKind::Alternation { left, right } => {
                    self.resolve_references_in_chain(left, closed)?;
                    self.resolve_references_in_chain(right, closed)?;
                }
                NodeKind::Repeat { body, .. } | NodeKind::LookAhead { body, .. } => {
                    self.resolve_references_in_chain(body, closed)?;
                }
                _ => {
                    // pass
                }
            }
        }

        Ok(())
    }

    /// Unlinks the capture markers of the numbered-only groups that
    /// no backreference refers to.
    pub fn elide_unreferenced_groups(&mut self) {
        let root = self.root;
        self.root = self.elide_in_chain(root);
    }

    fn is_elidable(&self, group: usize) -> bool {
        self.groups[group - 1].is_none() && !self.referenced_groups.contains(&group)
    }

    fn elide_in_chain(&mut self, head: Option<NodeId>) -> Option<NodeId> {
        let mut kept = vec![];

        for id in self.chain(head) {
            match self.nodes[id].kind.clone() {
                NodeKind::CaptureBegin { group } | NodeKind::CaptureEnd { group }
                    if self.is_elidable(group) =>
                {
                    continue;
                }
                NodeKind::Alternation { left, right } => {
                    let left = self.elide_in_chain(left);
                    let right = self.elide_in_chain(right);
                    self.nodes[id].kind = NodeKind::Alternation { left, right };
                }
                NodeKind::Repeat {
                    min,
                    max,
                    greedy,
                    body,
                } => {
                    let body = self.elide_in_chain(body);
                    self.nodes[id].kind = NodeKind::Repeat {
                        min,
                        max,
                        greedy,
                        body,
                    };
                }
                NodeKind::LookAhead { negative, body } => {
                    let body = self.elide_in_chain(body);
                    self.nodes[id].kind = NodeKind::LookAhead { negative, body };
                }
                _ => {
                    // pass
                }
            }

            kept.push(id);
        }

        // re-link the remaining nodes
        for pair in kept.windows(2) {
            self.nodes[pair[0]].tail = Some(pair[1]);
        }

        if let Some(last) = kept.last() {
            self.nodes[*last].tail = None;
        }

        kept.first().copied()
    }
}

// Static analysis: length bounds and prefix sets.
impl Ast {
    pub fn analyze(&mut self) {
        let root = self.root;
        self.analyze_chain(root, None);
    }

    // `follow` is the prefix of whatever comes after the chain
    // in the enclosing context.
    fn analyze_chain(&mut self, head: Option<NodeId>, follow: Option<CharSet>) {
        // a node depends on its tail, so go backwards
        for id in self.chain(head).into_iter().rev() {
            self.analyze_node(id, &follow);
        }
    }

    fn analyze_node(&mut self, id: NodeId, follow: &Option<CharSet>) {
        let tail = self.nodes[id].tail;
        let (tail_min, tail_max) = self.chain_lengths(tail);
        let tail_prefix = self.chain_prefix(tail, follow);
        let ignore_case = self.nodes[id].is_ignore_case();

        let (min_length, max_length, prefix) = match self.nodes[id].kind.clone() {
            NodeKind::Empty
            | NodeKind::Assertion(_)
            | NodeKind::CaptureBegin { .. }
            | NodeKind::CaptureEnd { .. } => (tail_min, tail_max, tail_prefix),
            NodeKind::Literal(chars) => {
                let prefix = chars
                    .first()
                    .and_then(|c| raw_prefix(&CharSet::from_char(*c), ignore_case));
                (
                    tail_min.saturating_add(chars.len()),
                    add_max(tail_max, Some(chars.len())),
                    prefix,
                )
            }
            NodeKind::Class(set) => (
                tail_min.saturating_add(1),
                add_max(tail_max, Some(1)),
                raw_prefix(&set, ignore_case),
            ),
            NodeKind::AnyChar => (tail_min.saturating_add(1), add_max(tail_max, Some(1)), None),
            NodeKind::BackReference { .. } => (tail_min, None, None),
            NodeKind::LookAhead { body, .. } => {
                self.analyze_chain(body, None);
                (tail_min, tail_max, tail_prefix)
            }
            NodeKind::Alternation { left, right } => {
                self.analyze_chain(left, tail_prefix.clone());
                self.analyze_chain(right, tail_prefix.clone());

                let (left_min, left_max) = self.chain_lengths(left);
                let (right_min, right_max) = self.chain_lengths(right);
                let left_prefix = self.chain_prefix(left, &tail_prefix);
                let right_prefix = self.chain_prefix(right, &tail_prefix);

                let branch_max = match (left_max, right_max) {
                    (Some(l), Some(r)) => Some(l.max(r)),
                    _ => None,
                };

                (
                    tail_min.saturating_add(left_min.min(right_min)),
                    add_max(tail_max, branch_max),
                    union_prefix(&left_prefix, &right_prefix),
                )
            }
            NodeKind::Repeat { min, max, body, .. } => {
                let body_follow = if max == Some(1) {
                    tail_prefix.clone()
                } else {
                    None
                };
                self.analyze_chain(body, body_follow.clone());

                let (body_min, body_max) = self.chain_lengths(body);
                let body_prefix = self.chain_prefix(body, &body_follow);

                let min_length = tail_min.saturating_add(body_min.saturating_mul(min as usize));
                let max_length = match (max, body_max) {
                    (_, Some(0)) => tail_max,
                    (Some(max), Some(body_max)) => {
                        add_max(tail_max, body_max.checked_mul(max as usize))
                    }
                    _ => None,
                };

                let prefix = if max == Some(0) {
                    tail_prefix
                } else if min > 0 && body_min > 0 {
                    body_prefix
                } else {
                    union_prefix(&body_prefix, &tail_prefix)
                };

                (min_length, max_length, prefix)
            }
        };

        let node = &mut self.nodes[id];
        node.min_length = min_length;
        node.max_length = max_length;
        node.prefix = prefix;
    }

    /// Whether a chain consumes a fixed, non-zero number of chars
    /// without pushing any choice point or writing any cell.
    pub fn is_simple_fixed_chain(&self, head: Option<NodeId>) -> bool {
        let (min, max) = self.chain_lengths(head);
        if min == 0 || max != Some(min) {
            return false;
        }

        self.chain(head).iter().all(|id| {
            matches!(
                self.nodes[*id].kind,
                NodeKind::Literal(_) | NodeKind::Class(_) | NodeKind::AnyChar | NodeKind::Assertion(_)
            )
        })
    }

    /// The first consuming node of the root chain, if it is a
    /// case-sensitive literal.
    pub fn leading_literal(&self) -> Option<&[char]> {
        for id in self.chain(self.root) {
            let node = &self.nodes[id];
            match &node.kind {
                NodeKind::Empty
                | NodeKind::Assertion(_)
                | NodeKind::CaptureBegin { .. }
                | NodeKind::CaptureEnd { .. }
                | NodeKind::LookAhead { .. } => {
                    // zero width
                }
                NodeKind::Literal(chars) if !node.is_ignore_case() => return Some(chars.as_slice()),
                _ => return None,
            }
        }
        None
    }

    pub fn is_start_anchored(&self) -> bool {
        self.chain(self.root)
            .into_iter()
            .find(|id| !is_marker(&self.nodes[*id].kind))
            .map(|id| self.nodes[id].kind == NodeKind::Assertion(AssertionKind::TextStart))
            .unwrap_or(false)
    }

    pub fn is_end_anchored(&self) -> bool {
        self.chain(self.root)
            .into_iter()
            .rev()
            .find(|id| !is_marker(&self.nodes[*id].kind))
            .map(|id| self.nodes[id].kind == NodeKind::Assertion(AssertionKind::TextEnd))
            .unwrap_or(false)
    }
}

fn is_marker(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Empty | NodeKind::CaptureBegin { .. } | NodeKind::CaptureEnd { .. }
    )
}

fn add_max(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => a.checked_add(b),
        _ => None,
    }
}

fn union_prefix(a: &Option<CharSet>, b: &Option<CharSet>) -> Option<CharSet> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.merge(b)),
        _ => None,
    }
}

/// The prefix set in terms of the subject chars.
///
/// A case-insensitive set holds folded chars, the subject chars that
/// fold into it are only worked out for the plain ASCII sets.
fn raw_prefix(set: &CharSet, ignore_case: bool) -> Option<CharSet> {
    if !ignore_case {
        return Some(set.clone());
    }

    if !set.class().is_empty() || set.ranges().iter().any(|(_, high)| *high > ASCII_MAX) {
        return None;
    }

    let mut extra = vec![];
    for (low, high) in set.ranges() {
        for code in *low..=*high {
            let c = code as u8 as char;
            if c.is_ascii_lowercase() {
                extra.push(c.to_ascii_uppercase());
            }
            if c == 'k' {
                // KELVIN SIGN
                extra.push('\u{212A}');
            }
        }
    }

    Some(set.merge(&CharSet::from_chars(&extra)))
}

impl Ast {
    fn write_chain(&self, f: &mut impl Write, head: Option<NodeId>) -> std::fmt::Result {
        for (idx, id) in self.chain(head).into_iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            self.write_node(f, id)?;
        }
        Ok(())
    }

    fn write_node(&self, f: &mut impl Write, id: NodeId) -> std::fmt::Result {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Empty => f.write_str("empty")?,
            NodeKind::Literal(chars) => {
                let s: String = chars.iter().collect();
                write!(f, "{:?}", s)?;
                if node.is_ignore_case() {
                    f.write_char('i')?;
                }
            }
            NodeKind::Class(set) => write!(f, "{}", set)?,
            NodeKind::AnyChar => f.write_char('.')?,
            NodeKind::Assertion(kind) => write!(f, "{}", kind)?,
            NodeKind::Alternation { left, right } => {
                f.write_char('(')?;
                self.write_chain(f, *left)?;
                f.write_str(" | ")?;
                self.write_chain(f, *right)?;
                f.write_char(')')?;
            }
            NodeKind::Repeat {
                min,
                max,
                greedy,
                body,
            } => {
                f.write_str(if *greedy { "repeat(" } else { "repeat_lazy(" })?;
                self.write_chain(f, *body)?;
                match max {
                    Some(max) => write!(f, "; {}, {})", min, max)?,
                    None => write!(f, "; {}, inf)", min)?,
                }
            }
            NodeKind::CaptureBegin { group } => write!(f, "begin({})", group)?,
            NodeKind::CaptureEnd { group } => write!(f, "end({})", group)?,
            NodeKind::BackReference { name } => write!(f, "backref({})", name)?,
            NodeKind::LookAhead { negative, body } => {
                f.write_str(if *negative { "not_lookahead(" } else { "lookahead(" })?;
                self.write_chain(f, *body)?;
                f.write_char(')')?;
            }
        }
        Ok(())
    }
}

impl Display for Ast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_chain(f, self.root)
    }
}
