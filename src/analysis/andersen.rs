// SPDX-License-Identifier: BSD-3-Clause
//! Inclusion-based (Andersen-style) points-to analysis.
//!
//! Initialization seeds the worklist with allocation sites and builds the
//! initial pointer flow graph from copy-like instructions; the solve loop
//! then grows points-to sets and the graph together until fixed point.
//! Load and store edges are discovered on the fly: only once a pointer is
//! known to reach an object do the dereferences through it induce edges.
//!
//! Abstract objects are the `alloca` and `gep` instructions themselves. A
//! GEP is deliberately its own object rather than a projection of its
//! base, so derived pointers stay distinguishable from what they derive
//! from (field-insensitive, but not base-collapsed).

use std::collections::HashSet;

use tracing::{debug, trace_span};

use crate::ir::{FuncId, Module, Opcode, ValueId};

use super::flow::{CoalescingWorklist, FifoWorklist, FlowGraph, Worklist};
use super::store::{ObjectSet, PointsToMap};

/// Final state of one solver run.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    pub points_to: PointsToMap,
    pub flow: FlowGraph,
}

/// One run's worth of solver state; nothing outlives the run.
///
/// Generic over the worklist form: intra-procedural runs drain a FIFO,
/// the inter-procedural run coalesces pending sets per target. Both
/// reach the same fixed point.
pub struct Solver<'m, W> {
    module: &'m Module,
    points_to: PointsToMap,
    flow: FlowGraph,
    worklist: W,
    /// Functions already initialized (inter-procedural mode).
    reachable: HashSet<FuncId>,
    interprocedural: bool,
}

impl<'m, W: Worklist> Solver<'m, W> {
    /// Solver for single-function runs; calls are not wired.
    pub fn new(module: &'m Module) -> Self {
        Solver {
            module,
            points_to: PointsToMap::new(),
            flow: FlowGraph::new(),
            worklist: W::default(),
            reachable: HashSet::new(),
            interprocedural: false,
        }
    }

    /// Solver that wires direct calls and tracks reachable functions.
    pub fn new_interprocedural(module: &'m Module) -> Self {
        Solver {
            interprocedural: true,
            ..Self::new(module)
        }
    }

    /// Insert `s → t`, forwarding anything `s` already points to.
    fn add_edge(&mut self, s: ValueId, t: ValueId) {
        if self.flow.insert(s, t) {
            if let Some(pts) = self.points_to.get(s) {
                if !pts.is_empty() {
                    self.worklist.push(t, pts);
                }
            }
        }
    }

    /// Grow `pt[n]` by `pts` and queue the growth for `n`'s successors.
    fn propagate(&mut self, n: ValueId, pts: &ObjectSet) {
        if pts.is_empty() {
            return;
        }
        self.points_to.extend(n, pts);
        for t in self.flow.successors(n) {
            self.worklist.push(t, pts);
        }
    }

    /// Seed the worklist and flow graph from one function's instructions.
    ///
    /// Allocation sites seed their own points-to sets; phi, select, and
    /// cast results receive edges from their operands. Loads and stores
    /// contribute nothing here: their edges appear during the solve loop,
    /// once the pointed-to objects are known. In inter-procedural mode,
    /// direct calls to defined functions wire actuals to formals and
    /// returned values back to the call site, and mark the callee
    /// reachable.
    pub fn initialize(&mut self, f: FuncId) {
        let module = self.module;
        let function = module.function(f);
        for v in function.instructions() {
            match module.value(v).opcode() {
                Some(Opcode::Alloca) | Some(Opcode::GetElementPtr) => {
                    self.worklist.push_object(v, v);
                }
                Some(Opcode::Phi(phi)) => {
                    for &incoming in &phi.incoming {
                        if let Some(s) = incoming {
                            self.add_edge(s, v);
                        }
                    }
                }
                Some(Opcode::Select(select)) => {
                    if let Some(s) = select.true_value {
                        self.add_edge(s, v);
                    }
                    if let Some(s) = select.false_value {
                        self.add_edge(s, v);
                    }
                }
                Some(Opcode::Cast(cast)) => {
                    if let Some(s) = cast.operand {
                        self.add_edge(s, v);
                    }
                }
                Some(Opcode::Call(call)) if self.interprocedural => {
                    let Some(callee) = call.callee else { continue };
                    let target = module.function(callee);
                    for (arg, formal) in call.args.iter().zip(target.params.iter()) {
                        if let Some(a) = arg {
                            self.add_edge(*a, *formal);
                        }
                    }
                    if !target.is_void {
                        for &r in &target.returns {
                            if let Some(Opcode::Ret(ret)) = module.value(r).opcode() {
                                if let Some(returned) = ret.value {
                                    self.add_edge(returned, v);
                                }
                            }
                        }
                    }
                    self.reach(callee);
                }
                _ => {}
            }
        }
    }

    /// Mark `f` reachable, initializing it the first time.
    pub fn reach(&mut self, f: FuncId) {
        if !self.reachable.insert(f) {
            return;
        }
        debug!(function = %self.module.function(f).name, "reachable");
        self.initialize(f);
    }

    /// Run the monotone fixed-point loop. Termination follows from the
    /// finite value universe and the fact that `pt` and the flow graph
    /// only grow.
    pub fn solve(&mut self) {
        let module = self.module;
        while let Some((n, pending)) = self.worklist.pop() {
            let delta = self.points_to.delta(n, &pending);
            self.propagate(n, &delta);
            for &user in module.users(n) {
                match module.value(user).opcode() {
                    // store y, n: y's points-to must flow into every
                    // object n may name.
                    Some(Opcode::Store(store)) if store.address == Some(n) => {
                        if let Some(y) = store.value {
                            for &object in &delta {
                                self.add_edge(y, object);
                            }
                        }
                    }
                    // user = load n: whatever the named objects hold
                    // flows into the load result.
                    Some(Opcode::Load(load)) if load.address == Some(n) => {
                        for &object in &delta {
                            self.add_edge(object, user);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    pub fn finish(self) -> Analysis {
        Analysis {
            points_to: self.points_to,
            flow: self.flow,
        }
    }
}

/// Intra-procedural run over one function.
pub fn intra_function(module: &Module, f: FuncId) -> Analysis {
    let _span = trace_span!("andersen", function = %module.function(f).name).entered();
    let mut solver: Solver<'_, FifoWorklist> = Solver::new(module);
    solver.initialize(f);
    solver.solve();
    solver.finish()
}

/// Intra-procedural run over every defined function.
pub fn intra(module: &Module) -> Vec<(FuncId, Analysis)> {
    module
        .functions()
        .map(|(f, _)| (f, intra_function(module, f)))
        .collect()
}

/// Inter-procedural run over everything reachable from `main`, or `None`
/// when the module has no `main`. Initialization spreads through direct
/// calls before a single solve pass runs over the combined state.
pub fn inter(module: &Module) -> Option<Analysis> {
    let main = module.function_named("main")?;
    let _span = trace_span!("andersen", function = "main").entered();
    let mut solver: Solver<'_, CoalescingWorklist> = Solver::new_interprocedural(module);
    solver.reach(main);
    solver.solve();
    Some(solver.finish())
}
