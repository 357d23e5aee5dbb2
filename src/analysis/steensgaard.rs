// SPDX-License-Identifier: BSD-3-Clause
//! Unification-based (Steensgaard-style) points-to analysis.
//!
//! One pass over every instruction of every defined function, merging
//! values into equivalence classes in a disjoint-set forest: assignments
//! unify rather than constrain, which makes the whole analysis
//! near-linear. Only `alloca` generates an abstract object here.
//!
//! The pointed-to target is tracked per value, not per representative:
//! `points_to[v]` is the single value `v`'s class was last observed to
//! reference through `v`, and the class-level relation is recovered by
//! closing over `find` when grouping. A class can therefore report more
//! than one points-to group.

use std::collections::{HashMap, HashSet};

use tracing::trace_span;

use crate::ir::{Module, Opcode, ValueId};

/// Disjoint-set forest over values. Values enter lazily: `find` on an
/// unseen value makes it a fresh rank-0 root.
#[derive(Clone, Debug, Default)]
pub struct UnionFind {
    parent: HashMap<ValueId, ValueId>,
    rank: HashMap<ValueId, u32>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Representative of `v`'s class, compressing the path to the root.
    pub fn find(&mut self, v: ValueId) -> ValueId {
        let Some(&parent) = self.parent.get(&v) else {
            self.parent.insert(v, v);
            self.rank.insert(v, 0);
            return v;
        };
        if parent == v {
            return v;
        }
        let mut root = parent;
        while let Some(&next) = self.parent.get(&root) {
            if next == root {
                break;
            }
            root = next;
        }
        let mut current = v;
        while current != root {
            let next = self.parent[&current];
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    /// Merge the classes of `a` and `b`, by rank. On equal ranks `a`'s
    /// root absorbs `b`'s and gains a rank.
    pub fn union(&mut self, a: ValueId, b: ValueId) {
        let x = self.find(a);
        let y = self.find(b);
        if x == y {
            return;
        }
        let rank_x = self.rank[&x];
        let rank_y = self.rank[&y];
        if rank_x < rank_y {
            self.parent.insert(x, y);
        } else if rank_x > rank_y {
            self.parent.insert(y, x);
        } else {
            self.parent.insert(y, x);
            self.rank.insert(x, rank_x + 1);
        }
    }

    /// Every value that ever entered the forest.
    pub fn values(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.parent.keys().copied()
    }
}

/// Equivalence classes produced by a unification run.
#[derive(Clone, Debug, Default)]
pub struct Classes {
    representative: HashMap<ValueId, ValueId>,
    groups: HashMap<ValueId, Vec<ValueId>>,
    group_points_to: HashMap<ValueId, HashSet<ValueId>>,
}

impl Classes {
    /// Representative of `v`'s class, if `v` was ever touched.
    pub fn representative(&self, v: ValueId) -> Option<ValueId> {
        self.representative.get(&v).copied()
    }

    /// Whether two touched values landed in the same class.
    pub fn same_class(&self, a: ValueId, b: ValueId) -> bool {
        match (self.representative(a), self.representative(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Classes as (representative, members) pairs.
    pub fn groups(&self) -> impl Iterator<Item = (ValueId, &[ValueId])> {
        self.groups.iter().map(|(root, members)| (*root, members.as_slice()))
    }

    /// Representatives of the classes `root`'s class points at.
    pub fn points_to(&self, root: ValueId) -> impl Iterator<Item = ValueId> + '_ {
        self.group_points_to.get(&root).into_iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One whole-module unification pass; state lives for the run only.
pub struct Unifier<'m> {
    module: &'m Module,
    forest: UnionFind,
    points_to: HashMap<ValueId, ValueId>,
}

impl<'m> Unifier<'m> {
    pub fn new(module: &'m Module) -> Self {
        Unifier {
            module,
            forest: UnionFind::new(),
            points_to: HashMap::new(),
        }
    }

    pub fn run(mut self) -> Classes {
        let _span = trace_span!("steensgaard").entered();
        for (_, function) in self.module.functions() {
            for v in function.instructions() {
                self.transfer(v);
            }
        }
        self.classes()
    }

    fn transfer(&mut self, v: ValueId) {
        let module = self.module;
        let Some(opcode) = module.value(v).opcode() else {
            return;
        };
        match opcode {
            Opcode::Alloca => {
                self.forest.find(v);
                self.points_to.insert(v, v);
            }
            // p := *q unifies p with whatever q's class references.
            Opcode::Load(load) => {
                let Some(q) = load.address else { return };
                match self.points_to.get(&q).copied() {
                    None => {
                        self.forest.find(q);
                        self.forest.find(v);
                        self.points_to.insert(q, v);
                    }
                    Some(target) => self.forest.union(target, v),
                }
            }
            // *p := q makes p's referent and q one class.
            Opcode::Store(store) => {
                let (Some(p), Some(q)) = (store.address, store.value) else {
                    return;
                };
                match self.points_to.get(&p).copied() {
                    None => {
                        self.forest.find(p);
                        self.forest.find(q);
                        self.points_to.insert(p, q);
                    }
                    Some(target) => self.forest.union(target, q),
                }
            }
            Opcode::Phi(phi) => {
                for &incoming in &phi.incoming {
                    if let Some(s) = incoming {
                        self.forest.union(v, s);
                    }
                }
            }
            Opcode::Select(select) => {
                if let Some(s) = select.true_value {
                    self.forest.union(s, v);
                }
                if let Some(s) = select.false_value {
                    self.forest.union(s, v);
                }
            }
            Opcode::Cast(cast) => {
                if let Some(s) = cast.operand {
                    self.forest.union(s, v);
                }
            }
            Opcode::Call(call) => {
                let Some(callee) = call.callee else { return };
                let target = module.function(callee);
                for (arg, formal) in call.args.iter().zip(target.params.iter()) {
                    if let Some(a) = arg {
                        self.forest.union(*a, *formal);
                    }
                }
                if !target.is_void {
                    for &r in &target.returns {
                        if let Some(Opcode::Ret(ret)) = module.value(r).opcode() {
                            if let Some(returned) = ret.value {
                                self.forest.union(returned, v);
                            }
                        }
                    }
                }
            }
            Opcode::GetElementPtr | Opcode::Ret(_) | Opcode::Other(_) => {}
        }
    }

    fn classes(mut self) -> Classes {
        let touched: Vec<ValueId> = self.forest.values().collect();
        let mut representative = HashMap::with_capacity(touched.len());
        let mut groups: HashMap<ValueId, Vec<ValueId>> = HashMap::new();
        for v in touched {
            let root = self.forest.find(v);
            representative.insert(v, root);
            groups.entry(root).or_default().push(v);
        }
        let mut group_points_to: HashMap<ValueId, HashSet<ValueId>> = HashMap::new();
        for (v, target) in &self.points_to {
            group_points_to
                .entry(representative[v])
                .or_default()
                .insert(representative[target]);
        }
        Classes {
            representative,
            groups,
            group_points_to,
        }
    }
}

/// Run the analysis over every defined function of the module.
pub fn analyze(module: &Module) -> Classes {
    Unifier::new(module).run()
}
