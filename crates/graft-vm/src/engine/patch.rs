//! Dispatched references and list-builder frames.
//!
//! A dispatched reference is a deferred write: `(target id, patch)`. The
//! patch names the exact slot to fill - an object field, a sequence slot, or
//! one side of a map entry - and is applied and discarded when the target's
//! scope closes. This is a symbol-relocation pattern, not a general graph
//! solver: it relies on the compiler closing every scope only after all of
//! that object's own members have been emitted.

use graft_core::Symbol;

use crate::construct::ResolvedType;
use crate::value::{MapRef, ObjRef, SeqRef, Value};

/// A deferred write awaiting its target instance.
pub(crate) struct Deferred {
    pub target: Symbol,
    pub patch: Patch,
}

/// The slot a deferred write fills.
pub(crate) enum Patch {
    Field { owner: ObjRef, field: String },
    SeqSlot { seq: SeqRef, index: usize },
    MapKey { map: MapRef, entry: usize },
    MapValue { map: MapRef, entry: usize },
}

impl Patch {
    pub fn apply(self, value: Value) {
        match self {
            Self::Field { owner, field } => owner.borrow_mut().set(&field, value),
            Self::SeqSlot { seq, index } => seq.borrow_mut().items[index] = value,
            Self::MapKey { map, entry } => map.borrow_mut().entries[entry].0 = value,
            Self::MapValue { map, entry } => map.borrow_mut().entries[entry].1 = value,
        }
    }
}

/// One open list literal: declared item type(s) and the growing collection.
///
/// Elements that could not resolve yet occupy a null placeholder slot and
/// are recorded here by flat index; LIST_END promotes them to engine-level
/// dispatched references against the finished collection.
pub(crate) struct ListFrame {
    pub types: Vec<ResolvedType>,
    pub items: Vec<Value>,
    pub deferred: Vec<(Symbol, usize)>,
}

impl ListFrame {
    pub fn new(types: Vec<ResolvedType>) -> Self {
        Self {
            types,
            items: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Declared type of the next element: multi-type frames cycle through
    /// their types (key, value, key, value, ...).
    pub fn next_item_type(&self) -> &ResolvedType {
        &self.types[self.items.len() % self.types.len()]
    }
}
