// SPDX-License-Identifier: BSD-3-Clause
//! Analysis-facing view of an LLVM module. Both solvers key every map by
//! value identity, so the view flattens arguments and instructions into one
//! dense table of [`ValueId`]s and precomputes per-value use lists. Operand
//! slots hold `Option<ValueId>`: `None` stands for anything that is not an
//! instruction or argument (constants, globals, metadata), which is exactly
//! the set of operands the analyses ignore.
//!
//! The view is immutable once constructed and safe to share across threads.

mod build;
mod convert;
mod error;

pub use build::{FunctionBuilder, ModuleBuilder};
pub use error::Error;

/// Dense handle for a value (argument or instruction) of the module.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValueId(u32);

impl ValueId {
    pub(crate) fn new(index: usize) -> Self {
        ValueId(u32::try_from(index).expect("value table overflow"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense handle for a defined (non-declaration) function.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FuncId(u32);

impl FuncId {
    pub(crate) fn new(index: usize) -> Self {
        FuncId(u32::try_from(index).expect("function table overflow"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Load {
    pub address: Option<ValueId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Store {
    pub address: Option<ValueId>,
    pub value: Option<ValueId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Phi {
    pub incoming: Vec<Option<ValueId>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Select {
    pub condition: Option<ValueId>,
    pub true_value: Option<ValueId>,
    pub false_value: Option<ValueId>,
}

/// Any of the LLVM cast opcodes (`bitcast`, `ptrtoint`, `inttoptr`,
/// `trunc`, ..). The analyses treat them all as a straight copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cast {
    pub operand: Option<ValueId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    /// Statically-resolved defined callee. `None` for indirect calls,
    /// calls to declaration-only functions, and inline assembly; those
    /// are skipped by both analyses.
    pub callee: Option<FuncId>,
    /// Positional argument slots, `None` for non-value arguments.
    pub args: Vec<Option<ValueId>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ret {
    pub value: Option<ValueId>,
}

/// Instructions with no pointer semantics. Operands are kept only so the
/// instruction shows up in use lists, where the solve loop skips it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Other {
    pub operands: Vec<ValueId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    Alloca,
    GetElementPtr,
    Load(Load),
    Store(Store),
    Phi(Phi),
    Select(Select),
    Cast(Cast),
    Call(Call),
    Ret(Ret),
    Other(Other),
}

impl Opcode {
    /// Value operands, for use-list assembly.
    pub(crate) fn operands(&self) -> Vec<ValueId> {
        match self {
            Opcode::Alloca | Opcode::GetElementPtr => Vec::new(),
            Opcode::Load(l) => l.address.into_iter().collect(),
            Opcode::Store(s) => s.value.into_iter().chain(s.address).collect(),
            Opcode::Phi(p) => p.incoming.iter().copied().flatten().collect(),
            Opcode::Select(s) => [s.condition, s.true_value, s.false_value]
                .into_iter()
                .flatten()
                .collect(),
            Opcode::Cast(c) => c.operand.into_iter().collect(),
            Opcode::Call(c) => c.args.iter().copied().flatten().collect(),
            Opcode::Ret(r) => r.value.into_iter().collect(),
            Opcode::Other(o) => o.operands.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Function argument, by position.
    Argument(u32),
    Instruction(Opcode),
}

#[derive(Clone, Debug)]
pub struct Value {
    pub kind: ValueKind,
    /// The function this value belongs to.
    pub func: FuncId,
    /// Whether the value has pointer type. Advisory: neither solver
    /// consults types beyond the void-return test on callees.
    pub is_pointer: bool,
    name: String,
}

impl Value {
    pub fn is_argument(&self) -> bool {
        matches!(self.kind, ValueKind::Argument(_))
    }

    pub fn is_instruction(&self) -> bool {
        matches!(self.kind, ValueKind::Instruction(_))
    }

    pub fn opcode(&self) -> Option<&Opcode> {
        match &self.kind {
            ValueKind::Instruction(op) => Some(op),
            ValueKind::Argument(_) => None,
        }
    }

    /// Textual form, e.g. `@main:%p`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    /// Formal parameters, in order.
    pub params: Vec<ValueId>,
    /// Instruction ids per basic block, in source order.
    pub blocks: Vec<Vec<ValueId>>,
    /// Every `ret` instruction of the body.
    pub returns: Vec<ValueId>,
    /// Whether the return type is `void`.
    pub is_void: bool,
}

impl Function {
    /// Basic-block count; the scheduling size hint for parallel mode.
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    pub fn instructions(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.blocks.iter().flatten().copied()
    }
}

#[derive(Clone, Debug)]
pub struct Module {
    functions: Vec<Function>,
    /// Names of declaration-only functions. Never analyzed, but counted
    /// by the banner.
    declarations: Vec<String>,
    values: Vec<Value>,
    users: Vec<Vec<ValueId>>,
}

impl Module {
    /// Tie values and functions together, computing use lists. Both the
    /// LLVM conversion and the programmatic builder end up here.
    pub(crate) fn assemble(
        functions: Vec<Function>,
        declarations: Vec<String>,
        values: Vec<Value>,
    ) -> Self {
        let mut users: Vec<Vec<ValueId>> = vec![Vec::new(); values.len()];
        for (index, value) in values.iter().enumerate() {
            if let ValueKind::Instruction(opcode) = &value.kind {
                for operand in opcode.operands() {
                    users[operand.index()].push(ValueId::new(index));
                }
            }
        }
        Module {
            functions,
            declarations,
            values,
            users,
        }
    }

    /// Defined functions, in module order.
    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FuncId::new(i), f))
    }

    pub fn function(&self, f: FuncId) -> &Function {
        &self.functions[f.index()]
    }

    pub fn function_named(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(FuncId::new)
    }

    pub fn value(&self, v: ValueId) -> &Value {
        &self.values[v.index()]
    }

    /// Instructions that use `v` as an operand. An instruction appears
    /// once per use, as in LLVM's use lists.
    pub fn users(&self, v: ValueId) -> &[ValueId] {
        &self.users[v.index()]
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Definitions plus declarations, the count the banner reports.
    pub fn num_functions(&self) -> usize {
        self.functions.len() + self.declarations.len()
    }
}
