//! A backend that records the module as [`IrModule`].
//!
//! Nothing is compiled: every contract call becomes an entry in the
//! recorded module, and `finalize` returns it after verification. This is
//! the backend used when LLVM is unavailable and the one tests inspect to
//! check block structure, terminators and debug locations.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::backend::{Backend, BackendError, Linkage};
use crate::debug::{DebugLevel, DebugLoc, ScopeKind};
use crate::ids::{BlockId, FunctionId, ScopeId, ValueId};
use crate::module::{
    InstKind, IrBlock, IrFunction, IrInst, IrLocal, IrModule, IrScope, NativeFn, Terminator,
    ValueDef,
};
use crate::ops::{BinaryOp, CmpOp, UnaryOp};
use crate::scalar::Scalar;
use crate::types::{IntTy, Signature, Type};
use crate::verify::verify_module;

/// Backend that builds an [`IrModule`].
pub struct RecordingBackend {
    module: IrModule,
    current_block: Option<BlockId>,
    current_loc: Option<DebugLoc>,
}

impl RecordingBackend {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module: IrModule::new(module_name),
            current_block: None,
            current_loc: None,
        }
    }

    /// The module recorded so far.
    pub fn module(&self) -> &IrModule {
        &self.module
    }

    fn push_value(&mut self, def: ValueDef) -> ValueId {
        let id = ValueId::new(self.module.values.len() as u32);
        self.module.values.push(def);
        id
    }

    fn insert_block(&self) -> BlockId {
        match self.current_block {
            Some(block) => block,
            None => panic!("recording backend: no insertion block"),
        }
    }

    /// Append `kind` to the current block, creating a result of `result_ty`.
    fn push_inst(&mut self, kind: InstKind, result_ty: Option<Type>) -> Option<ValueId> {
        let block = self.insert_block();
        let result = result_ty.map(|ty| self.push_value(ValueDef::Inst { block, ty }));
        let loc = self.current_loc;
        self.module.blocks[block.index()]
            .insts
            .push(IrInst { kind, result, loc });
        result
    }

    fn push_value_inst(&mut self, kind: InstKind, ty: Type) -> ValueId {
        match self.push_inst(kind, Some(ty)) {
            Some(v) => v,
            None => unreachable!("instruction with a result type always yields a value"),
        }
    }

    fn terminate(&mut self, term: Terminator) {
        let block = self.insert_block();
        let loc = self.current_loc;
        let b = &mut self.module.blocks[block.index()];
        b.terminator_count += 1;
        if b.terminator.is_none() {
            b.terminator = Some(term);
            b.terminator_loc = loc;
        }
        trace!(block = %b.name, ?term, "terminator");
    }

    fn push_scope(&mut self, scope: IrScope) -> ScopeId {
        let id = ScopeId::new(self.module.scopes.len() as u32);
        self.module.scopes.push(scope);
        id
    }
}

impl Backend for RecordingBackend {
    type Artifact = IrModule;
    type Symbol = NativeFn;

    fn name(&self) -> &'static str {
        "recording"
    }

    fn module_name(&self) -> &str {
        &self.module.name
    }

    fn set_debug_level(&mut self, level: DebugLevel) {
        self.module.debug_level = level;
    }

    fn declare_function(&mut self, name: &str, sig: &Signature, linkage: Linkage) -> FunctionId {
        let func = FunctionId::new(self.module.functions.len() as u32);
        let params = sig
            .params
            .iter()
            .enumerate()
            .map(|(index, p)| {
                self.push_value(ValueDef::Param {
                    func,
                    index,
                    ty: p.ty.clone(),
                })
            })
            .collect();
        self.module.functions.push(IrFunction {
            name: name.to_owned(),
            sig: sig.clone(),
            linkage,
            blocks: Vec::new(),
            params,
            alloca_count: 0,
        });
        debug!(name, %linkage, "declared function");
        func
    }

    fn param(&mut self, func: FunctionId, index: usize) -> ValueId {
        self.module.function(func).params[index]
    }

    fn append_block(&mut self, func: FunctionId, name: &str) -> BlockId {
        let id = BlockId::new(self.module.blocks.len() as u32);
        self.module.blocks.push(IrBlock {
            name: name.to_owned(),
            func,
            insts: Vec::new(),
            terminator: None,
            terminator_loc: None,
            terminator_count: 0,
        });
        self.module.functions[func.index()].blocks.push(id);
        id
    }

    fn position_at_end(&mut self, block: BlockId) {
        self.current_block = Some(block);
    }

    fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    fn block_terminated(&self, block: BlockId) -> bool {
        self.module.block(block).terminator.is_some()
    }

    fn set_debug_location(&mut self, loc: DebugLoc) {
        self.current_loc = Some(loc);
        self.module.location_events.push(loc);
    }

    fn file_scope(&self) -> ScopeId {
        ScopeId::new(0)
    }

    fn open_function_scope(
        &mut self,
        _func: FunctionId,
        name: &str,
        _sig: &Signature,
        line: u32,
    ) -> ScopeId {
        self.push_scope(IrScope {
            kind: ScopeKind::Function {
                name: name.to_owned(),
            },
            parent: Some(self.file_scope()),
            line,
        })
    }

    fn open_lexical_scope(&mut self, parent: ScopeId, line: u32, _column: u32) -> ScopeId {
        self.push_scope(IrScope {
            kind: ScopeKind::Lexical,
            parent: Some(parent),
            line,
        })
    }

    fn declare_local(&mut self, scope: ScopeId, name: &str, ty: &Type, line: u32, slot: ValueId) {
        if !self.module.debug_level.has_variables() {
            return;
        }
        self.module.locals.push(IrLocal {
            name: name.to_owned(),
            ty: ty.clone(),
            scope,
            line,
            slot,
        });
    }

    fn const_int(&mut self, ty: IntTy, bits: u64) -> ValueId {
        self.push_value(ValueDef::Const(Scalar::from_bits(ty, bits)))
    }

    fn const_bool(&mut self, value: bool) -> ValueId {
        self.push_value(ValueDef::Const(Scalar::Bool(value)))
    }

    fn const_float(&mut self, ty: &Type, value: f64) -> ValueId {
        let scalar = if *ty == Type::F32 {
            Scalar::F32(value as f32)
        } else {
            Scalar::F64(value)
        };
        self.push_value(ValueDef::Const(scalar))
    }

    fn entry_alloca(&mut self, func: FunctionId, ty: &Type, name: &str) -> ValueId {
        let Some(entry) = self.module.function(func).entry() else {
            panic!("recording backend: alloca in function without an entry block");
        };
        let slot = self.push_value(ValueDef::Inst {
            block: entry,
            ty: Type::ptr(ty.clone()),
        });
        let at = self.module.functions[func.index()].alloca_count;
        self.module.blocks[entry.index()].insts.insert(
            at,
            IrInst {
                kind: InstKind::Alloca {
                    ty: ty.clone(),
                    name: name.to_owned(),
                },
                result: Some(slot),
                loc: None,
            },
        );
        self.module.functions[func.index()].alloca_count += 1;
        slot
    }

    fn load(&mut self, ty: &Type, ptr: ValueId, _name: &str) -> ValueId {
        self.push_value_inst(
            InstKind::Load {
                ty: ty.clone(),
                ptr,
            },
            ty.clone(),
        )
    }

    fn store(&mut self, ty: &Type, value: ValueId, ptr: ValueId) {
        self.push_inst(
            InstKind::Store {
                ty: ty.clone(),
                value,
                ptr,
            },
            None,
        );
    }

    fn element_address(&mut self, array_ty: &Type, base: ValueId, index: ValueId) -> ValueId {
        let elem = array_ty.element().cloned().unwrap_or(Type::Void);
        self.push_value_inst(
            InstKind::ElementAddr {
                array_ty: array_ty.clone(),
                base,
                index,
            },
            Type::ptr(elem),
        )
    }

    fn binary(&mut self, op: BinaryOp, ty: &Type, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.push_value_inst(
            InstKind::Binary {
                op,
                ty: ty.clone(),
                lhs,
                rhs,
            },
            ty.clone(),
        )
    }

    fn compare(&mut self, op: CmpOp, ty: &Type, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.push_value_inst(
            InstKind::Compare {
                op,
                ty: ty.clone(),
                lhs,
                rhs,
            },
            Type::Bool,
        )
    }

    fn unary(&mut self, op: UnaryOp, ty: &Type, operand: ValueId) -> ValueId {
        self.push_value_inst(
            InstKind::Unary {
                op,
                ty: ty.clone(),
                operand,
            },
            ty.clone(),
        )
    }

    fn extend(&mut self, value: ValueId, from: IntTy, to: IntTy) -> ValueId {
        self.push_value_inst(InstKind::Extend { value, from, to }, Type::Int(to))
    }

    fn call(&mut self, callee: FunctionId, args: &[ValueId], ret: &Type) -> Option<ValueId> {
        let result_ty = (!ret.is_void()).then(|| ret.clone());
        self.push_inst(
            InstKind::Call {
                callee,
                args: SmallVec::from_slice(args),
            },
            result_ty,
        )
    }

    fn register_symbol(&mut self, name: &str, symbol: NativeFn) {
        self.module.symbols.insert(name.to_owned(), symbol);
    }

    fn br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br(target));
    }

    fn cond_br(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    fn ret(&mut self, value: Option<ValueId>) {
        self.terminate(Terminator::Ret(value));
    }

    fn unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }

    fn ir_text(&self) -> String {
        self.module.to_string()
    }

    fn finalize(self) -> Result<IrModule, BackendError> {
        let errors = verify_module(&self.module);
        if errors.is_empty() {
            debug!(module = %self.module.name, "recorded module verified");
            Ok(self.module)
        } else {
            Err(BackendError {
                module: self.module.name.clone(),
                diagnostics: errors.iter().map(ToString::to_string).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests;
