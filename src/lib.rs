// SPDX-License-Identifier: BSD-3-Clause
//! Pointer (alias) analysis over LLVM modules.
//!
//! For each pointer-producing value of a module, computes a conservative
//! over-approximation of the abstract memory objects (allocation sites)
//! it may reference. Two analyses are provided: inclusion-based
//! (Andersen-style, [`analysis::andersen`], with a work-partitioned
//! parallel variant in [`analysis::parallel`]) and unification-based
//! (Steensgaard-style, [`analysis::steensgaard`]).

pub mod analysis;
pub mod ir;
pub mod print;

pub use ir::{FuncId, Module, ModuleBuilder, Opcode, Value, ValueId, ValueKind};
