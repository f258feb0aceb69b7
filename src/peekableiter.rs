// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::collections::VecDeque;

/// An iterator adapter that can look ahead up to `max_peek` items.
pub struct PeekableIter<I: Iterator> {
    upstream: I,
    buffer: VecDeque<I::Item>,
    max_peek: usize,
}

impl<I: Iterator> PeekableIter<I> {
    pub fn new(upstream: I, max_peek: usize) -> Self {
        Self {
            upstream,
            buffer: VecDeque::with_capacity(max_peek),
            max_peek,
        }
    }

    /// Peek the item at `offset` (0 is the next item) without consuming it.
    pub fn peek(&mut self, offset: usize) -> Option<&I::Item> {
        debug_assert!(offset < self.max_peek, "peek offset out of range");

        while self.buffer.len() <= offset {
            let item = self.upstream.next()?;
            self.buffer.push_back(item);
        }

        self.buffer.get(offset)
    }

    pub fn upstream(&self) -> &I {
        &self.upstream
    }
}

impl<I: Iterator> Iterator for PeekableIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match self.buffer.pop_front() {
            Some(item) => Some(item),
            None => self.upstream.next(),
        }
    }
}
