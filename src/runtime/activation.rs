//! Reference-counted activation records.
//!
//! An activation holds the local bindings of one lexical scope and a link to
//! its parent. Bindings live in the cell store as a chain of list nodes:
//! each node's `value` is the binding cell and its `name` the next node.
//! A binding cell carries the bound symbol in `name` and the bound value in
//! `ty`/`value`.

use crate::{
    error::Result,
    runtime::{
        cell::{Cell, CellIndex, CellStore, CellType},
        heap::ByteHeap,
        payload,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActId(u32);

impl ActId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Act {
    pub parent: Option<ActId>,
    pub refcount: u32,
    /// Head of the binding chain, 0 when empty.
    pub locals: CellIndex,
}

#[derive(Debug)]
enum ActSlot {
    Live(Act),
    Free { next: Option<ActId> },
}

/// Arena of activations with an intrusive free list.
///
/// Slot 0 is the root activation. It is never released and serves as the
/// global environment.
#[derive(Debug)]
pub struct ActivationPool {
    slots: Vec<ActSlot>,
    free_head: Option<ActId>,
    live: usize,
}

impl ActivationPool {
    pub fn new() -> Self {
        let root = Act {
            parent: None,
            refcount: 1,
            locals: 0,
        };
        Self {
            slots: vec![ActSlot::Live(root)],
            free_head: None,
            live: 1,
        }
    }

    pub fn root(&self) -> ActId {
        ActId(0)
    }

    /// Creates a child of `parent` with a reference count of one.
    pub fn create(&mut self, parent: ActId) -> ActId {
        self.add_ref(parent);
        let act = Act {
            parent: Some(parent),
            refcount: 1,
            locals: 0,
        };
        self.live += 1;
        match self.free_head {
            Some(id) => {
                if let ActSlot::Free { next } = self.slots[id.index()] {
                    self.free_head = next;
                }
                self.slots[id.index()] = ActSlot::Live(act);
                id
            }
            None => {
                self.slots.push(ActSlot::Live(act));
                ActId((self.slots.len() - 1) as u32)
            }
        }
    }

    pub fn get(&self, id: ActId) -> Option<&Act> {
        match self.slots.get(id.index()) {
            Some(ActSlot::Live(act)) => Some(act),
            _ => None,
        }
    }

    fn get_mut(&mut self, id: ActId) -> Option<&mut Act> {
        match self.slots.get_mut(id.index()) {
            Some(ActSlot::Live(act)) => Some(act),
            _ => None,
        }
    }

    pub fn parent(&self, id: ActId) -> Option<ActId> {
        self.get(id).and_then(|act| act.parent)
    }

    pub fn refcount(&self, id: ActId) -> u32 {
        self.get(id).map_or(0, |act| act.refcount)
    }

    pub fn add_ref(&mut self, id: ActId) {
        match self.get_mut(id) {
            Some(act) => act.refcount += 1,
            None => tracing::warn!(act = id.0, "add_ref on released activation"),
        }
    }

    /// Drops one reference. At exactly zero the activation is released and
    /// its parent dereferenced in turn. Returns whether `id` was released.
    pub fn deref(&mut self, id: ActId, cells: &mut CellStore, heap: &mut ByteHeap) -> bool {
        if !self.drop_ref(id) {
            return false;
        }
        let mut parent = self.release(id, cells, heap);
        while let Some(id) = parent {
            if !self.drop_ref(id) {
                break;
            }
            parent = self.release(id, cells, heap);
        }
        true
    }

    /// Decrements the count; true when it reached zero on a non-root act.
    fn drop_ref(&mut self, id: ActId) -> bool {
        let root = self.root();
        let Some(act) = self.get_mut(id) else {
            tracing::warn!(act = id.0, "deref on released activation");
            return false;
        };
        if act.refcount == 0 || (id == root && act.refcount == 1) {
            return false;
        }
        act.refcount -= 1;
        act.refcount == 0
    }

    /// Frees the bindings of `id` and returns its slot to the free list.
    /// Yields the parent, which the caller must dereference.
    fn release(&mut self, id: ActId, cells: &mut CellStore, heap: &mut ByteHeap) -> Option<ActId> {
        let (parent, mut node) = match self.get(id) {
            Some(act) => (act.parent, act.locals),
            None => return None,
        };
        while node != 0 {
            let Some(link) = cells.get(node) else { break };
            if let Some(binding) = cells.get(link.value) {
                payload::release_value(heap, binding);
            }
            // A binding may hold a symbol value, which release() would skip.
            cells.set_content(link.value, CellType::Void, 0, 0);
            cells.release(link.value);
            cells.release(node);
            node = link.name;
        }
        self.slots[id.index()] = ActSlot::Free {
            next: self.free_head,
        };
        self.free_head = Some(id);
        self.live -= 1;
        parent
    }

    fn find_binding(&self, id: ActId, sym: CellIndex, cells: &CellStore) -> Option<CellIndex> {
        let mut node = self.get(id)?.locals;
        while node != 0 {
            let link = cells.get(node)?;
            if cells.get(link.value).is_some_and(|binding| binding.name == sym) {
                return Some(link.value);
            }
            node = link.name;
        }
        None
    }

    /// Binds `sym` to `value` in `id`, taking over the value's reference.
    /// Rebinding releases the previous value.
    pub fn bind(
        &mut self,
        id: ActId,
        sym: CellIndex,
        value: Cell,
        cells: &mut CellStore,
        heap: &mut ByteHeap,
    ) -> Result<()> {
        if let Some(binding) = self.find_binding(id, sym, cells) {
            if let Some(old) = cells.get(binding) {
                payload::release_value(heap, old);
            }
            cells.set_value(binding, value.ty, value.value);
            return Ok(());
        }
        let Some(head) = self.get(id).map(|act| act.locals) else {
            payload::release_value(heap, value);
            return Ok(());
        };
        let binding = match cells.alloc(value.ty, sym, value.value) {
            Ok(binding) => binding,
            Err(err) => {
                payload::release_value(heap, value);
                return Err(err);
            }
        };
        let node = match cells.alloc(CellType::List, head, binding) {
            Ok(node) => node,
            Err(err) => {
                payload::release_value(heap, value);
                cells.set_content(binding, CellType::Void, 0, 0);
                cells.release(binding);
                return Err(err);
            }
        };
        if let Some(act) = self.get_mut(id) {
            act.locals = node;
        }
        Ok(())
    }

    /// Finds `sym` in `id` or the nearest ancestor that binds it. The
    /// returned cell is borrowed; callers that keep it must retain it.
    pub fn lookup(&self, id: ActId, sym: CellIndex, cells: &CellStore) -> Option<Cell> {
        let mut current = Some(id);
        while let Some(id) = current {
            if let Some(binding) = self.find_binding(id, sym, cells) {
                return cells
                    .get(binding)
                    .map(|cell| Cell::new(cell.ty, 0, cell.value));
            }
            current = self.parent(id);
        }
        None
    }

    /// Live activations, the root included.
    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl Default for ActivationPool {
    fn default() -> Self {
        Self::new()
    }
}
