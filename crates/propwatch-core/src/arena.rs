#![forbid(unsafe_code)]

//! Bump storage for per-pass text.
//!
//! A draw pass formats thousands of short strings (column texts, joined
//! paths) that die with the row that made them. `TextArena` appends them to
//! one growing buffer and hands out small [`ArenaText`] handles instead of
//! owned `String`s.
//!
//! Rows nest, so release is LIFO: take a [`ArenaMark`] before a row,
//! [`rollback`](TextArena::rollback) after it. [`ArenaScope`] does the same
//! on drop. [`reset`](TextArena::reset) empties the arena at the end of a
//! pass.
//!
//! # Invariants
//!
//! 1. A handle is readable until a rollback cuts below its end or the
//!    arena is reset. After that, [`get`](TextArena::get) returns `None`;
//!    it never returns bytes written by a later allocation.
//! 2. Rolling back to a mark from before the last reset is a no-op.
//! 3. Capacity is kept across resets, so steady-state passes do not
//!    allocate.
//!
//! # Usage
//!
//! ```
//! use propwatch_core::arena::TextArena;
//!
//! let mut arena = TextArena::new();
//! let outer = arena.alloc("Player");
//! let mark = arena.checkpoint();
//! let inner = arena.alloc_fmt(format_args!("{} B", 16));
//! assert_eq!(arena.get(inner), Some("16 B"));
//! arena.rollback(mark);
//! assert_eq!(arena.get(inner), None);
//! assert_eq!(arena.get(outer), Some("Player"));
//! ```

use core::fmt::{self, Write as _};
use core::ops::{Deref, DerefMut};

/// Handle to text stored in a [`TextArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArenaText {
    start: u32,
    len: u32,
    generation: u64,
}

impl ArenaText {
    #[must_use]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    const fn end(self) -> usize {
        self.start as usize + self.len as usize
    }
}

/// Position to roll back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaMark {
    len: usize,
    generation: u64,
}

/// Counters for diagnostics and benches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    pub allocations: u64,
    pub rollbacks: u64,
    pub resets: u64,
    /// Largest buffer length seen since creation.
    pub high_water: usize,
}

#[derive(Clone, Copy, Debug)]
struct Cut {
    /// Last generation whose handles this cut applies to.
    generation: u64,
    len: usize,
}

/// Bump allocator for short-lived strings.
#[derive(Debug, Default)]
pub struct TextArena {
    buf: String,
    generation: u64,
    /// Handles from generations below this were invalidated by a reset.
    base_generation: u64,
    /// Rollbacks since the last reset, strictly increasing in `len`.
    cuts: Vec<Cut>,
    stats: ArenaStats,
}

impl TextArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: String::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Bytes currently in use.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    fn finish(&mut self, start: usize) -> ArenaText {
        self.stats.allocations += 1;
        self.stats.high_water = self.stats.high_water.max(self.buf.len());
        ArenaText {
            start: start as u32,
            len: (self.buf.len() - start) as u32,
            generation: self.generation,
        }
    }

    pub fn alloc(&mut self, text: &str) -> ArenaText {
        let start = self.buf.len();
        self.buf.push_str(text);
        self.finish(start)
    }

    pub fn alloc_fmt(&mut self, args: fmt::Arguments<'_>) -> ArenaText {
        let start = self.buf.len();
        // Writing into a String cannot fail.
        let _ = self.buf.write_fmt(args);
        self.finish(start)
    }

    /// Join `parts` with `sep` into one allocation.
    pub fn alloc_join<'s, I>(&mut self, parts: I, sep: &str) -> ArenaText
    where
        I: IntoIterator<Item = &'s str>,
    {
        let start = self.buf.len();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                self.buf.push_str(sep);
            }
            self.buf.push_str(part);
        }
        self.finish(start)
    }

    /// Text behind `handle`, or `None` if it has been released.
    #[must_use]
    pub fn get(&self, handle: ArenaText) -> Option<&str> {
        if handle.generation < self.base_generation || handle.end() > self.buf.len() {
            return None;
        }
        let first_later_cut = self
            .cuts
            .partition_point(|cut| cut.generation < handle.generation);
        if let Some(cut) = self.cuts.get(first_later_cut) {
            if cut.len < handle.end() {
                return None;
            }
        }
        self.buf.get(handle.start as usize..handle.end())
    }

    #[must_use]
    pub fn checkpoint(&self) -> ArenaMark {
        ArenaMark {
            len: self.buf.len(),
            generation: self.generation,
        }
    }

    /// Release everything allocated after `mark`.
    pub fn rollback(&mut self, mark: ArenaMark) {
        if mark.generation < self.base_generation || mark.len > self.buf.len() {
            return;
        }
        while self.cuts.last().is_some_and(|cut| cut.len >= mark.len) {
            self.cuts.pop();
        }
        self.cuts.push(Cut {
            generation: self.generation,
            len: mark.len,
        });
        self.generation += 1;
        self.buf.truncate(mark.len);
        self.stats.rollbacks += 1;
    }

    /// Release everything, keeping capacity.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.cuts.clear();
        self.generation += 1;
        self.base_generation = self.generation;
        self.stats.resets += 1;
    }

    /// Checkpoint now and roll back when the guard drops.
    pub fn scope(&mut self) -> ArenaScope<'_> {
        let mark = self.checkpoint();
        ArenaScope { arena: self, mark }
    }
}

/// Guard that rolls its arena back on drop.
#[derive(Debug)]
pub struct ArenaScope<'a> {
    arena: &'a mut TextArena,
    mark: ArenaMark,
}

impl Deref for ArenaScope<'_> {
    type Target = TextArena;

    fn deref(&self) -> &TextArena {
        self.arena
    }
}

impl DerefMut for ArenaScope<'_> {
    fn deref_mut(&mut self) -> &mut TextArena {
        self.arena
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        self.arena.rollback(self.mark);
    }
}
