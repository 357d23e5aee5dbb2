// SPDX-License-Identifier: BSD-3-Clause
//! Conversion from a parsed [`llvm_ir::Module`]. Two passes per function:
//! the first assigns a [`ValueId`] to every argument and instruction
//! (LLVM references locals before their definitions, e.g. in phis), the
//! second resolves operands and lowers opcodes.

use std::collections::HashMap;

use either::Either;
use llvm_ir::types::Typed;

use super::{
    Call, Cast, Error, FuncId, Function, Load, Module, Opcode, Other, Phi, Ret, Select, Store,
    Value, ValueId, ValueKind,
};

fn is_pointer_type(ty: &llvm_ir::Type) -> bool {
    matches!(ty, llvm_ir::Type::PointerType { .. })
}

/// Defined callee of a call operand, if it has one.
fn callee_function(op: &llvm_ir::Operand, by_name: &HashMap<String, FuncId>) -> Option<FuncId> {
    if let llvm_ir::Operand::ConstantOperand(c) = op {
        if let llvm_ir::Constant::GlobalReference { name, .. } = &**c {
            return by_name.get(name.as_str()).copied();
        }
    }
    None
}

struct FunctionLowering<'m> {
    /// Result name -> id, covering arguments and result-bearing
    /// instructions of one function.
    locals: HashMap<&'m llvm_ir::Name, ValueId>,
}

impl<'m> FunctionLowering<'m> {
    fn resolve(&self, op: &llvm_ir::Operand) -> Option<ValueId> {
        match op {
            llvm_ir::Operand::LocalOperand { name, .. } => self.locals.get(name).copied(),
            llvm_ir::Operand::ConstantOperand(_) | llvm_ir::Operand::MetadataOperand => None,
        }
    }

    fn lower_instruction(
        &self,
        by_name: &HashMap<String, FuncId>,
        i: &llvm_ir::Instruction,
    ) -> Opcode {
        use llvm_ir::Instruction as I;
        match i {
            I::Alloca(_) => Opcode::Alloca,
            I::GetElementPtr(_) => Opcode::GetElementPtr,
            I::Load(l) => Opcode::Load(Load {
                address: self.resolve(&l.address),
            }),
            I::Store(s) => Opcode::Store(Store {
                address: self.resolve(&s.address),
                value: self.resolve(&s.value),
            }),
            I::Phi(p) => Opcode::Phi(Phi {
                incoming: p
                    .incoming_values
                    .iter()
                    .map(|(v, _)| self.resolve(v))
                    .collect(),
            }),
            I::Select(s) => Opcode::Select(Select {
                condition: self.resolve(&s.condition),
                true_value: self.resolve(&s.true_value),
                false_value: self.resolve(&s.false_value),
            }),
            I::Trunc(c) => self.cast(&c.operand),
            I::ZExt(c) => self.cast(&c.operand),
            I::SExt(c) => self.cast(&c.operand),
            I::FPTrunc(c) => self.cast(&c.operand),
            I::FPExt(c) => self.cast(&c.operand),
            I::FPToUI(c) => self.cast(&c.operand),
            I::FPToSI(c) => self.cast(&c.operand),
            I::UIToFP(c) => self.cast(&c.operand),
            I::SIToFP(c) => self.cast(&c.operand),
            I::PtrToInt(c) => self.cast(&c.operand),
            I::IntToPtr(c) => self.cast(&c.operand),
            I::BitCast(c) => self.cast(&c.operand),
            I::AddrSpaceCast(c) => self.cast(&c.operand),
            I::Call(c) => Opcode::Call(Call {
                callee: match &c.function {
                    Either::Left(_asm) => None,
                    Either::Right(op) => callee_function(op, by_name),
                },
                args: c.arguments.iter().map(|(op, _)| self.resolve(op)).collect(),
            }),
            _ => Opcode::Other(Other::default()),
        }
    }

    fn cast(&self, operand: &llvm_ir::Operand) -> Opcode {
        Opcode::Cast(Cast {
            operand: self.resolve(operand),
        })
    }
}

impl Module {
    pub fn from_llvm(m: &llvm_ir::Module) -> Result<Self, Error> {
        let mut values: Vec<Value> = Vec::new();
        let mut functions: Vec<Function> = Vec::with_capacity(m.functions.len());

        let mut by_name: HashMap<String, FuncId> = HashMap::with_capacity(m.functions.len());
        for (i, f) in m.functions.iter().enumerate() {
            if by_name.insert(f.name.clone(), FuncId::new(i)).is_some() {
                return Err(Error::DuplicateFunction(f.name.clone()));
            }
        }

        // Pass 1: ids for arguments and every instruction, including
        // result-less ones (they appear in use lists).
        let mut lowerings: Vec<FunctionLowering> = Vec::with_capacity(m.functions.len());
        for (fi, f) in m.functions.iter().enumerate() {
            let func = FuncId::new(fi);
            let mut locals = HashMap::new();

            let mut params = Vec::with_capacity(f.parameters.len());
            for (pi, p) in f.parameters.iter().enumerate() {
                let id = ValueId::new(values.len());
                values.push(Value {
                    kind: ValueKind::Argument(pi as u32),
                    func,
                    is_pointer: is_pointer_type(&p.ty),
                    name: format!("@{}:{}", f.name, p.name),
                });
                locals.insert(&p.name, id);
                params.push(id);
            }

            let mut blocks = Vec::with_capacity(f.basic_blocks.len());
            for b in &f.basic_blocks {
                let mut instrs = Vec::with_capacity(b.instrs.len() + 1);
                for (idx, i) in b.instrs.iter().enumerate() {
                    let id = ValueId::new(values.len());
                    let name = match i.try_get_result() {
                        Some(n) => {
                            locals.insert(n, id);
                            format!("@{}:{}", f.name, n)
                        }
                        None => format!("@{}:{}:{}", f.name, b.name, idx),
                    };
                    values.push(Value {
                        // Placeholder, replaced in pass 2.
                        kind: ValueKind::Instruction(Opcode::Other(Other::default())),
                        func,
                        is_pointer: is_pointer_type(&i.get_type(&m.types)),
                        name,
                    });
                    instrs.push(id);
                }
                {
                    let id = ValueId::new(values.len());
                    let name = match b.term.try_get_result() {
                        Some(n) => {
                            locals.insert(n, id);
                            format!("@{}:{}", f.name, n)
                        }
                        None => format!("@{}:{}:{}", f.name, b.name, b.instrs.len()),
                    };
                    values.push(Value {
                        kind: ValueKind::Instruction(Opcode::Other(Other::default())),
                        func,
                        is_pointer: false,
                        name,
                    });
                    instrs.push(id);
                }
                blocks.push(instrs);
            }

            functions.push(Function {
                name: f.name.clone(),
                params,
                blocks,
                returns: Vec::new(),
                is_void: matches!(*f.return_type, llvm_ir::Type::VoidType),
            });
            lowerings.push(FunctionLowering { locals });
        }

        // Pass 2: lower opcodes with every local now resolvable.
        for (fi, f) in m.functions.iter().enumerate() {
            let lowering = &lowerings[fi];
            for (bi, b) in f.basic_blocks.iter().enumerate() {
                for (idx, i) in b.instrs.iter().enumerate() {
                    let id = functions[fi].blocks[bi][idx];
                    values[id.index()].kind =
                        ValueKind::Instruction(lowering.lower_instruction(&by_name, i));
                }
                let term_id = functions[fi].blocks[bi][b.instrs.len()];
                if let llvm_ir::Terminator::Ret(r) = &b.term {
                    values[term_id.index()].kind = ValueKind::Instruction(Opcode::Ret(Ret {
                        value: r.return_operand.as_ref().and_then(|op| lowering.resolve(op)),
                    }));
                    functions[fi].returns.push(term_id);
                }
            }
        }

        let declarations = m.func_declarations.iter().map(|d| d.name.clone()).collect();
        Ok(Module::assemble(functions, declarations, values))
    }
}
