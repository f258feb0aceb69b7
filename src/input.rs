// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{borrow::Cow, io::Read};

use log::debug;

/// Supplies more input when the matcher reaches the end of its buffer.
///
/// The refiller appends text to `buffer` and returns the new logical
/// end. Returning a value that is not past `current_end` means there
/// is no more input, and the refiller is not called again. A refiller
/// that removes text before `current_end` also ends the input there.
pub trait Refill {
    fn refill(&mut self, buffer: &mut String, current_end: usize) -> usize;
}

impl<F> Refill for F
where
    F: FnMut(&mut String, usize) -> usize,
{
    fn refill(&mut self, buffer: &mut String, current_end: usize) -> usize {
        self(buffer, current_end)
    }
}

/// Refills from an iterator of text chunks.
pub struct IterRefill<I> {
    chunks: I,
}

impl<I> IterRefill<I> {
    pub fn new(chunks: I) -> Self {
        Self { chunks }
    }
}

impl<I, S> Refill for IterRefill<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    fn refill(&mut self, buffer: &mut String, current_end: usize) -> usize {
        for chunk in self.chunks.by_ref() {
            let chunk = chunk.as_ref();
            if !chunk.is_empty() {
                buffer.push_str(chunk);
                return buffer.len();
            }
        }
        current_end
    }
}

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Refills from a reader, decoding UTF-8 across chunk boundaries.
///
/// Invalid sequences are replaced with U+FFFD, and a read error is
/// treated as the end of input.
pub struct ReadRefill<R> {
    reader: R,

    // the bytes of an incomplete char at the end of the last chunk
    pending: Vec<u8>,
}

impl<R: Read> ReadRefill<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: vec![],
        }
    }
}

impl<R: Read> Refill for ReadRefill<R> {
    fn refill(&mut self, buffer: &mut String, current_end: usize) -> usize {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let count = match self.reader.read(&mut chunk) {
                Ok(count) => count,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Read error treated as the end of input: {}", e);
                    0
                }
            };

            if count == 0 {
                if self.pending.is_empty() {
                    return current_end;
                }

                let rest = std::mem::take(&mut self.pending);
                buffer.push_str(&String::from_utf8_lossy(&rest));
                return buffer.len();
            }

            self.pending.extend_from_slice(&chunk[..count]);

            let complete = match std::str::from_utf8(&self.pending) {
                Ok(_) => self.pending.len(),
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(e) => e.valid_up_to() + e.error_len().unwrap_or(1),
            };

            if complete > 0 {
                let bytes: Vec<u8> = self.pending.drain(..complete).collect();
                buffer.push_str(&String::from_utf8_lossy(&bytes));
                return buffer.len();
            }
        }
    }
}

/// The text a matcher works on.
///
/// Only `buffer[..end]` is visible. When an instruction looks at or past
/// `end`, the refiller (if any) is asked for more.
pub struct Input<'t> {
    buffer: Cow<'t, str>,
    end: usize,
    refill: Option<Box<dyn Refill + 't>>,
}

impl<'t> Input<'t> {
    pub fn new(text: impl Into<Cow<'t, str>>) -> Self {
        let buffer = text.into();
        let end = buffer.len();
        Self {
            buffer,
            end,
            refill: None,
        }
    }

    pub fn set_refill(&mut self, refill: Option<Box<dyn Refill + 't>>) {
        self.refill = refill;
    }

    pub fn has_refill(&self) -> bool {
        self.refill.is_some()
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn as_str(&self) -> &str {
        &self.buffer[..self.end]
    }

    /// Asks the refiller for more input once, returns whether the
    /// visible text grew.
    pub fn fill(&mut self) -> bool {
        let Some(refill) = self.refill.as_mut() else {
            return false;
        };

        let buffer = self.buffer.to_mut();
        let new_end = refill.refill(buffer, self.end);

        if buffer.len() < self.end {
            // the text already seen is gone, so is the rest of the input
            let mut end = buffer.len();
            while !buffer.is_char_boundary(end) {
                end -= 1;
            }
            debug!(
                "The refiller cut the buffer from offset {} down to {}, end of input.",
                self.end, end
            );
            self.end = end;
            self.refill = None;
            return false;
        }

        let mut new_end = new_end.min(buffer.len());
        while !buffer.is_char_boundary(new_end) {
            new_end -= 1;
        }

        if new_end <= self.end {
            debug!("End of input at offset {}.", self.end);
            self.refill = None;
            return false;
        }

        self.end = new_end;
        true
    }

    /// Pulls all the remaining input.
    pub fn drain(&mut self) {
        while self.fill() {}
    }

    /// Makes `count` bytes after `pos` visible if the input has them,
    /// returns whether it does.
    pub fn ensure(&mut self, pos: usize, count: usize) -> bool {
        let target = pos.saturating_add(count);
        while self.end < target {
            if !self.fill() {
                return false;
            }
        }
        true
    }

    /// The char at `pos`, `None` at the end of the input.
    pub fn char_at(&mut self, pos: usize) -> Option<char> {
        while pos >= self.end {
            if !self.fill() {
                return None;
            }
        }
        self.buffer[pos..self.end].chars().next()
    }

    pub fn char_before(&self, pos: usize) -> Option<char> {
        self.buffer.get(..pos)?.chars().next_back()
    }

    pub fn is_end(&mut self, pos: usize) -> bool {
        self.char_at(pos).is_none()
    }

    /// The position `count` chars before `pos`, stopping at `floor`.
    pub fn back(&self, pos: usize, count: usize, floor: usize) -> usize {
        let Some(text) = self.buffer.get(floor..pos) else {
            return pos;
        };

        let mut pos = pos;
        for c in text.chars().rev().take(count) {
            pos -= c.len_utf8();
        }
        pos
    }
}

impl Clone for Input<'_> {
    // the refiller is not cloned, a clone only sees the buffered text
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            end: self.end,
            refill: None,
        }
    }
}

impl std::fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("text", &self.as_str())
            .field("refill", &self.refill.is_some())
            .finish()
    }
}
