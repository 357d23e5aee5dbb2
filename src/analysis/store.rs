// SPDX-License-Identifier: BSD-3-Clause
//! Per-value points-to sets.

use std::collections::{HashMap, HashSet};

use crate::ir::ValueId;

/// A set of abstract objects (allocation-site values).
pub type ObjectSet = HashSet<ValueId>;

/// Maps each touched value to the set of abstract objects it may
/// reference. An absent key is the empty set. Sets only grow over a run.
#[derive(Clone, Debug, Default)]
pub struct PointsToMap {
    map: HashMap<ValueId, ObjectSet>,
}

impl PointsToMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, v: ValueId) -> Option<&ObjectSet> {
        self.map.get(&v)
    }

    pub fn contains(&self, v: ValueId, object: ValueId) -> bool {
        self.map.get(&v).is_some_and(|s| s.contains(&object))
    }

    /// `pending ∖ pt[v]`: the part of `pending` that is new to `v`.
    pub fn delta(&self, v: ValueId, pending: &ObjectSet) -> ObjectSet {
        match self.map.get(&v) {
            None => pending.clone(),
            Some(have) => pending.difference(have).copied().collect(),
        }
    }

    /// Union `objects` into `pt[v]`.
    pub fn extend(&mut self, v: ValueId, objects: &ObjectSet) {
        self.map.entry(v).or_default().extend(objects.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &ObjectSet)> {
        self.map.iter().map(|(v, s)| (*v, s))
    }

    pub fn keys(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.map.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
