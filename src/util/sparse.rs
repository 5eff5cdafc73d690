/*!
A sparse set of state identifiers.

This is the classic trick for O(1) insertion, membership testing and
clearing without touching more memory than the number of elements actually
inserted. Iteration yields elements in insertion order, which the PikeVM
relies on: threads seeded at earlier haystack offsets always come before
threads seeded later.
*/

use crate::util::primitives::StateID;

#[derive(Clone, Debug)]
pub(crate) struct SparseSet {
    /// Number of elements currently in the set.
    len: usize,
    /// Elements in insertion order. Only `dense[..len]` is meaningful.
    dense: Vec<StateID>,
    /// `sparse[id]` is the index of `id` in `dense`, when present.
    /// Stale entries are disambiguated by the membership check below.
    sparse: Vec<u32>,
}

impl SparseSet {
    pub(crate) fn new(capacity: usize) -> SparseSet {
        let mut set =
            SparseSet { len: 0, dense: Vec::new(), sparse: Vec::new() };
        set.resize(capacity);
        set
    }

    /// Grow the set's capacity. Clears the set.
    pub(crate) fn resize(&mut self, capacity: usize) {
        self.len = 0;
        self.dense.resize(capacity, StateID::ZERO);
        self.sparse.resize(capacity, 0);
    }

    pub(crate) fn capacity(&self) -> usize {
        self.dense.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `id` into the set. Returns false if it was already present.
    #[inline]
    pub(crate) fn insert(&mut self, id: StateID) -> bool {
        if self.contains(id) {
            return false;
        }
        let index = self.len;
        self.dense[index] = id;
        self.sparse[id.as_usize()] = index as u32;
        self.len = index + 1;
        true
    }

    #[inline]
    pub(crate) fn contains(&self, id: StateID) -> bool {
        let index = self.sparse[id.as_usize()] as usize;
        index < self.len && self.dense[index] == id
    }

    /// The `i`th element in insertion order.
    #[inline]
    pub(crate) fn get(&self, i: usize) -> StateID {
        self.dense[i]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = StateID> + '_ {
        self.dense[..self.len].iter().copied()
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.dense.len() * core::mem::size_of::<StateID>()
            + self.sparse.len() * core::mem::size_of::<u32>()
    }
}
