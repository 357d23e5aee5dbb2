// SPDX-License-Identifier: BSD-3-Clause
//! The pointer flow graph and the pending-propagation worklists.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::ir::ValueId;

use super::store::ObjectSet;

/// Directed graph among values. An edge `s → t` constrains
/// `pt[s] ⊆ pt[t]` at fixed point. Edges are inserted monotonically and
/// never pruned; self-edges are allowed and inert.
#[derive(Clone, Debug, Default)]
pub struct FlowGraph {
    edges: HashMap<ValueId, HashSet<ValueId>>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `s → t`; `false` if the edge was already present.
    pub fn insert(&mut self, s: ValueId, t: ValueId) -> bool {
        self.edges.entry(s).or_default().insert(t)
    }

    pub fn contains(&self, s: ValueId, t: ValueId) -> bool {
        self.edges.get(&s).is_some_and(|ts| ts.contains(&t))
    }

    pub fn successors(&self, n: ValueId) -> impl Iterator<Item = ValueId> + '_ {
        self.edges.get(&n).into_iter().flatten().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &HashSet<ValueId>)> {
        self.edges.iter().map(|(s, ts)| (*s, ts))
    }
}

/// Pending propagations, keyed by target value.
///
/// The two forms below are interchangeable: extraction order is
/// unspecified and the solver reaches the same fixed point either way.
pub trait Worklist: Default {
    /// Queue `pending` for `target`.
    fn push(&mut self, target: ValueId, pending: &ObjectSet);

    /// Queue the singleton `{object}` for `target` (alloca/GEP seeds).
    fn push_object(&mut self, target: ValueId, object: ValueId);

    /// Remove one entry, or `None` when drained.
    fn pop(&mut self) -> Option<(ValueId, ObjectSet)>;
}

/// FIFO of `(target, pending)` pairs; duplicates allowed, each entry
/// drained independently.
#[derive(Clone, Debug, Default)]
pub struct FifoWorklist {
    queue: VecDeque<(ValueId, ObjectSet)>,
}

impl Worklist for FifoWorklist {
    fn push(&mut self, target: ValueId, pending: &ObjectSet) {
        self.queue.push_back((target, pending.clone()));
    }

    fn push_object(&mut self, target: ValueId, object: ValueId) {
        self.queue.push_back((target, ObjectSet::from([object])));
    }

    fn pop(&mut self) -> Option<(ValueId, ObjectSet)> {
        self.queue.pop_front()
    }
}

/// One pending set per target; re-queued targets union into the existing
/// set, so each target is extracted at most once per accumulation.
#[derive(Clone, Debug, Default)]
pub struct CoalescingWorklist {
    pending: HashMap<ValueId, ObjectSet>,
}

impl Worklist for CoalescingWorklist {
    fn push(&mut self, target: ValueId, pending: &ObjectSet) {
        self.pending
            .entry(target)
            .or_default()
            .extend(pending.iter().copied());
    }

    fn push_object(&mut self, target: ValueId, object: ValueId) {
        self.pending.entry(target).or_default().insert(object);
    }

    fn pop(&mut self) -> Option<(ValueId, ObjectSet)> {
        let target = *self.pending.keys().next()?;
        let pending = self.pending.remove(&target)?;
        Some((target, pending))
    }
}
