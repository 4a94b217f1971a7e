#![forbid(unsafe_code)]

//! Mutations requested while drawing, applied once the pass is over.
//!
//! The draw pass only reads. Every user action that would change the
//! watch list or the host (remove, reorder, rename, drop-to-watch, value
//! edits, function calls) is recorded here and applied afterwards, so no
//! list is mutated while it is being iterated.

use crate::reflect::{FieldId, FunctionId, Value, ValueAddr};

/// A value edit for one field slot.
#[derive(Clone, Debug, PartialEq)]
pub struct EditRequest {
    pub slot: ValueAddr,
    pub field: FieldId,
    pub value: Value,
}

/// A parameterless function call on an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallRequest {
    pub object: ValueAddr,
    pub function: FunctionId,
}

/// Everything a pass asked for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassRequests {
    /// Watch entry to remove. One per pass; the last request wins.
    pub delete: Option<usize>,
    /// Watch entries to swap. One per pass; the last request wins.
    pub swap: Option<(usize, usize)>,
    pub renames: Vec<(usize, String)>,
    pub adds: Vec<String>,
    pub clear_watch: bool,
    pub edits: Vec<EditRequest>,
    pub calls: Vec<CallRequest>,
    pub wants_save: bool,
    pub wants_load: bool,
}

impl PassRequests {
    pub fn request_delete(&mut self, index: usize) {
        self.delete = Some(index);
    }

    pub fn request_swap(&mut self, from: usize, to: usize) {
        if from != to {
            self.swap = Some((from, to));
        }
    }

    pub fn request_rename(&mut self, index: usize, path: impl Into<String>) {
        self.renames.push((index, path.into()));
    }

    pub fn request_add(&mut self, path: impl Into<String>) {
        self.adds.push(path.into());
    }

    pub fn request_clear_watch(&mut self) {
        self.clear_watch = true;
    }

    pub fn request_edit(&mut self, slot: ValueAddr, field: FieldId, value: Value) {
        self.edits.push(EditRequest { slot, field, value });
    }

    pub fn request_call(&mut self, object: ValueAddr, function: FunctionId) {
        self.calls.push(CallRequest { object, function });
    }

    /// Fold requests from another pass section into this one. Single-slot
    /// requests from `other` win.
    pub fn merge(&mut self, other: Self) {
        if other.delete.is_some() {
            self.delete = other.delete;
        }
        if other.swap.is_some() {
            self.swap = other.swap;
        }
        self.renames.extend(other.renames);
        self.adds.extend(other.adds);
        self.clear_watch |= other.clear_watch;
        self.edits.extend(other.edits);
        self.calls.extend(other.calls);
        self.wants_save |= other.wants_save;
        self.wants_load |= other.wants_load;
    }

    /// Whether the watch list needs [`WatchList::apply`](crate::watch::WatchList::apply).
    #[must_use]
    pub fn touches_watch(&self) -> bool {
        self.delete.is_some()
            || self.swap.is_some()
            || !self.renames.is_empty()
            || !self.adds.is_empty()
            || self.clear_watch
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.touches_watch()
            && self.edits.is_empty()
            && self.calls.is_empty()
            && !self.wants_save
            && !self.wants_load
    }
}
