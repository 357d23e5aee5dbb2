// SPDX-License-Identifier: BSD-3-Clause
//! Programmatic module construction, used by tests and benchmarks to set up
//! small synthetic programs without an LLVM toolchain.

use super::{
    Call, Cast, FuncId, Function, Load, Module, Opcode, Other, Phi, Ret, Select, Store, Value,
    ValueId, ValueKind,
};

/// Builds a [`Module`] one function at a time.
///
/// Functions are declared up front (so calls can target functions whose
/// bodies come later, e.g. mutual recursion) and filled in through
/// [`ModuleBuilder::body`].
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    functions: Vec<Function>,
    declarations: Vec<String>,
    values: Vec<Value>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a defined function with `params` arguments.
    pub fn function(&mut self, name: &str, params: usize, is_void: bool) -> FuncId {
        let func = FuncId::new(self.functions.len());
        self.functions.push(Function {
            name: name.to_owned(),
            params: Vec::with_capacity(params),
            blocks: Vec::new(),
            returns: Vec::new(),
            is_void,
        });
        for i in 0..params {
            let id = self.push_value(func, ValueKind::Argument(i as u32), true);
            self.functions[func.index()].params.push(id);
        }
        func
    }

    /// Record a declaration-only function (counted, never analyzed).
    pub fn declaration(&mut self, name: &str) {
        self.declarations.push(name.to_owned());
    }

    pub fn param(&self, func: FuncId, index: usize) -> ValueId {
        self.functions[func.index()].params[index]
    }

    /// Start (or resume) appending instructions to `func`'s body.
    pub fn body(&mut self, func: FuncId) -> FunctionBuilder<'_> {
        FunctionBuilder {
            builder: self,
            func,
        }
    }

    pub fn finish(self) -> Module {
        Module::assemble(self.functions, self.declarations, self.values)
    }

    fn push_value(&mut self, func: FuncId, kind: ValueKind, is_pointer: bool) -> ValueId {
        let id = ValueId::new(self.values.len());
        let fname = &self.functions[func.index()].name;
        let name = match &kind {
            ValueKind::Argument(i) => format!("@{}:%arg{}", fname, i),
            ValueKind::Instruction(_) => format!("@{}:%v{}", fname, id.index()),
        };
        self.values.push(Value {
            kind,
            func,
            is_pointer,
            name,
        });
        id
    }
}

/// Appends instructions to one function. Instructions land in the current
/// basic block; [`FunctionBuilder::block`] starts a new one.
#[derive(Debug)]
pub struct FunctionBuilder<'b> {
    builder: &'b mut ModuleBuilder,
    func: FuncId,
}

impl FunctionBuilder<'_> {
    pub fn param(&self, index: usize) -> ValueId {
        self.builder.param(self.func, index)
    }

    /// Start a new basic block.
    pub fn block(&mut self) {
        self.builder.functions[self.func.index()]
            .blocks
            .push(Vec::new());
    }

    pub fn alloca(&mut self) -> ValueId {
        self.push(Opcode::Alloca, true)
    }

    pub fn gep(&mut self) -> ValueId {
        self.push(Opcode::GetElementPtr, true)
    }

    pub fn load(&mut self, address: ValueId) -> ValueId {
        self.push(
            Opcode::Load(Load {
                address: Some(address),
            }),
            false,
        )
    }

    pub fn store(&mut self, value: ValueId, address: ValueId) -> ValueId {
        self.push(
            Opcode::Store(Store {
                address: Some(address),
                value: Some(value),
            }),
            false,
        )
    }

    pub fn phi(&mut self, incoming: &[ValueId]) -> ValueId {
        self.push(
            Opcode::Phi(Phi {
                incoming: incoming.iter().copied().map(Some).collect(),
            }),
            false,
        )
    }

    pub fn select(&mut self, true_value: ValueId, false_value: ValueId) -> ValueId {
        self.push(
            Opcode::Select(Select {
                condition: None,
                true_value: Some(true_value),
                false_value: Some(false_value),
            }),
            false,
        )
    }

    pub fn cast(&mut self, operand: ValueId) -> ValueId {
        self.push(
            Opcode::Cast(Cast {
                operand: Some(operand),
            }),
            false,
        )
    }

    /// Direct call to a defined function.
    pub fn call(&mut self, callee: FuncId, args: &[ValueId]) -> ValueId {
        self.push(
            Opcode::Call(Call {
                callee: Some(callee),
                args: args.iter().copied().map(Some).collect(),
            }),
            false,
        )
    }

    /// Call whose callee cannot be resolved statically (function pointer
    /// or declaration-only target).
    pub fn call_unknown(&mut self, args: &[ValueId]) -> ValueId {
        self.push(
            Opcode::Call(Call {
                callee: None,
                args: args.iter().copied().map(Some).collect(),
            }),
            false,
        )
    }

    pub fn ret(&mut self, value: Option<ValueId>) -> ValueId {
        let id = self.push(Opcode::Ret(Ret { value }), false);
        self.builder.functions[self.func.index()].returns.push(id);
        id
    }

    /// An instruction the analyses do not interpret (arithmetic,
    /// comparison, ..). Shows up in its operands' use lists.
    pub fn other(&mut self, operands: &[ValueId]) -> ValueId {
        self.push(
            Opcode::Other(Other {
                operands: operands.to_vec(),
            }),
            false,
        )
    }

    fn push(&mut self, opcode: Opcode, is_pointer: bool) -> ValueId {
        let id = self
            .builder
            .push_value(self.func, ValueKind::Instruction(opcode), is_pointer);
        let function = &mut self.builder.functions[self.func.index()];
        if function.blocks.is_empty() {
            function.blocks.push(Vec::new());
        }
        if let Some(block) = function.blocks.last_mut() {
            block.push(id);
        }
        id
    }
}
