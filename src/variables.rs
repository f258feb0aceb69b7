// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use rustc_hash::FxHashMap;

use crate::ast::Ast;

/// Where the value of a variable comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// A capture group, the two cells hold the begin and end offsets.
    Capture { begin: usize, end: usize },

    /// A value supplied by the caller, the index into the external
    /// value list of the matcher.
    External(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub slot: Slot,
}

/// The capture/variable table of a compiled pattern.
///
/// ```diagram
/// index   name     slot
/// 0       "0"      cells 0, 1     the whole match
/// 1..=n   "1".."n" cells 2n, 2n+1 (named groups use their name)
/// n+1..   "var"    external 0..   referenced but never captured
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Variables {
    variables: Vec<Variable>,
    group_count: usize,

    // both the number and the name of a named group are keys
    index: FxHashMap<String, usize>,
}

impl Variables {
    pub fn from_ast(ast: &Ast) -> Self {
        let mut variables = vec![];
        let mut index = FxHashMap::default();

        variables.push(Variable {
            name: "0".to_owned(),
            slot: Slot::Capture { begin: 0, end: 1 },
        });
        index.insert("0".to_owned(), 0);

        for (idx, name) in ast.groups.iter().enumerate() {
            let number = idx + 1;
            index.insert(number.to_string(), number);

            let name = match name {
                Some(name) => {
                    index.insert(name.clone(), number);
                    name.clone()
                }
                None => number.to_string(),
            };

            variables.push(Variable {
                name,
                slot: Slot::Capture {
                    begin: number * 2,
                    end: number * 2 + 1,
                },
            });
        }

        for (external_index, name) in ast.external_names.iter().enumerate() {
            index.insert(name.clone(), variables.len());
            variables.push(Variable {
                name: name.clone(),
                slot: Slot::External(external_index),
            });
        }

        Self {
            variables,
            group_count: ast.group_count(),
            index,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// The number of capture groups, not counting group 0.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// The number of cells the capture groups take.
    pub fn capture_cell_count(&self) -> usize {
        (self.group_count + 1) * 2
    }

    /// The `(begin, end)` cells of a group, `None` for an external
    /// variable or an unknown index.
    pub fn capture_cells(&self, index: usize) -> Option<(usize, usize)> {
        match self.variables.get(index)?.slot {
            Slot::Capture { begin, end } => Some((begin, end)),
            Slot::External(_) => None,
        }
    }

    /// Returns the slot for a backreference name, which is either a
    /// group number, a group name or the name of an external variable.
    pub fn slot_of(&self, name: &str) -> Option<Slot> {
        self.find(name).map(|index| self.variables[index].slot)
    }

    pub fn external_count(&self) -> usize {
        self.variables.len() - self.group_count - 1
    }

    pub fn external_names(&self) -> impl Iterator<Item = &str> {
        self.variables[self.group_count + 1..]
            .iter()
            .map(|variable| variable.name.as_str())
    }

    /// The names of the groups, `None` for the numbered-only groups.
    pub fn group_name(&self, group: usize) -> Option<&str> {
        let variable = self.variables.get(group)?;
        if group == 0 || group > self.group_count || variable.name == group.to_string() {
            None
        } else {
            Some(variable.name.as_str())
        }
    }
}
