//! [`Backend`] implementation over inkwell.
//!
//! IDs handed to the code generator index dense vectors of LLVM handles:
//! `ValueId` into `values`, `BlockId` into `blocks`, and so on. Scope 0 is
//! the file scope; a scope slot is `None` when it resolves to the compile
//! unit or when debug info is disabled.

use std::path::{Path, PathBuf};

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::debug_info::DIScope;
use inkwell::module::Module;
use inkwell::values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue, IntValue};
use inkwell::{FloatPredicate, IntPredicate};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use weave_ir::{
    Backend, BackendError, BinaryOp, BlockId, CmpOp, DebugLevel, DebugLoc, FunctionId, IntTy,
    Linkage, ScopeId, Signature, Type, UnaryOp, ValueId,
};

use crate::config::{dump_ir_requested, LlvmConfig};
use crate::debug::DebugInfo;
use crate::jit::JitModule;
use crate::types::{function_type, int_type, value_type};

/// Lowers backend operations to an LLVM module and JIT-compiles it.
///
/// # Missing Host Symbols
///
/// An external function declared without a registered address fails
/// [`finalize`](Backend::finalize) with a [`BackendError`] naming it, even
/// if no generated code would ever call it. The interpreter backend only
/// reports such a function when a call reaches it. MCJIT resolves every
/// symbol while compiling and aborts the process on one it cannot find,
/// so the check cannot wait until invocation.
pub struct LlvmBackend<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    config: LlvmConfig,
    source_path: PathBuf,
    /// Created on first use so the session's debug level applies.
    debug: Option<DebugInfo<'ctx>>,
    functions: Vec<FunctionValue<'ctx>>,
    blocks: Vec<BasicBlock<'ctx>>,
    values: Vec<BasicValueEnum<'ctx>>,
    scopes: Vec<Option<DIScope<'ctx>>>,
    current_block: Option<BlockId>,
    /// Host addresses for external functions.
    symbols: FxHashMap<String, usize>,
}

impl<'ctx> LlvmBackend<'ctx> {
    /// A backend for module `name`, describing `source_path` in its
    /// debug info.
    pub fn new(
        context: &'ctx Context,
        name: &str,
        config: LlvmConfig,
        source_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            context,
            module: context.create_module(name),
            builder: context.create_builder(),
            config,
            source_path: source_path.as_ref().to_owned(),
            debug: None,
            functions: Vec::new(),
            blocks: Vec::new(),
            values: Vec::new(),
            scopes: vec![None],
            current_block: None,
            symbols: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &LlvmConfig {
        &self.config
    }

    fn ensure_debug(&mut self) {
        if self.debug.is_none() {
            self.debug = DebugInfo::new(
                &self.module,
                self.context,
                self.config.debug_level,
                &self.source_path,
            );
        }
    }

    fn push(&mut self, value: impl BasicValue<'ctx>) -> ValueId {
        let id = ValueId::new(self.values.len() as u32);
        self.values.push(value.as_basic_value_enum());
        id
    }

    fn value(&self, id: ValueId) -> BasicValueEnum<'ctx> {
        self.values[id.index()]
    }

    fn int(&self, id: ValueId) -> IntValue<'ctx> {
        self.value(id).into_int_value()
    }

    fn push_scope(&mut self, scope: Option<DIScope<'ctx>>) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    fn int_binary(
        &self,
        op: BinaryOp,
        signed: bool,
        l: IntValue<'ctx>,
        r: IntValue<'ctx>,
    ) -> IntValue<'ctx> {
        let b = &self.builder;
        match op {
            BinaryOp::Add => b.build_int_add(l, r, "add"),
            BinaryOp::Sub => b.build_int_sub(l, r, "sub"),
            BinaryOp::Mul => b.build_int_mul(l, r, "mul"),
            BinaryOp::Div if signed => b.build_int_signed_div(l, r, "div"),
            BinaryOp::Div => b.build_int_unsigned_div(l, r, "div"),
            BinaryOp::Rem if signed => b.build_int_signed_rem(l, r, "rem"),
            BinaryOp::Rem => b.build_int_unsigned_rem(l, r, "rem"),
            BinaryOp::And => b.build_and(l, r, "and"),
            BinaryOp::Or => b.build_or(l, r, "or"),
            BinaryOp::Xor => b.build_xor(l, r, "xor"),
            BinaryOp::Shl | BinaryOp::Shr => {
                // Shift amounts wrap at the width, matching the evaluator.
                let ty = l.get_type();
                let mask = ty.const_int(u64::from(ty.get_bit_width() - 1), false);
                let amount = b.build_and(r, mask, "shamt").expect("and");
                match op {
                    BinaryOp::Shl => b.build_left_shift(l, amount, "shl"),
                    _ => b.build_right_shift(l, amount, signed, "shr"),
                }
            }
        }
        .expect("integer binary op")
    }

    fn float_binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let (l, r) = (
            self.value(lhs).into_float_value(),
            self.value(rhs).into_float_value(),
        );
        let b = &self.builder;
        let result = match op {
            BinaryOp::Add => b.build_float_add(l, r, "fadd"),
            BinaryOp::Sub => b.build_float_sub(l, r, "fsub"),
            BinaryOp::Mul => b.build_float_mul(l, r, "fmul"),
            BinaryOp::Div => b.build_float_div(l, r, "fdiv"),
            BinaryOp::Rem => b.build_float_rem(l, r, "frem"),
            _ => unreachable!("'{}' on a float", op.symbol()),
        }
        .expect("float binary op");
        self.push(result)
    }
}

fn int_predicate(op: CmpOp, signed: bool) -> IntPredicate {
    match (op, signed) {
        (CmpOp::Eq, _) => IntPredicate::EQ,
        (CmpOp::Ne, _) => IntPredicate::NE,
        (CmpOp::Lt, true) => IntPredicate::SLT,
        (CmpOp::Lt, false) => IntPredicate::ULT,
        (CmpOp::Le, true) => IntPredicate::SLE,
        (CmpOp::Le, false) => IntPredicate::ULE,
        (CmpOp::Gt, true) => IntPredicate::SGT,
        (CmpOp::Gt, false) => IntPredicate::UGT,
        (CmpOp::Ge, true) => IntPredicate::SGE,
        (CmpOp::Ge, false) => IntPredicate::UGE,
    }
}

fn float_predicate(op: CmpOp) -> FloatPredicate {
    match op {
        CmpOp::Eq => FloatPredicate::OEQ,
        CmpOp::Ne => FloatPredicate::UNE,
        CmpOp::Lt => FloatPredicate::OLT,
        CmpOp::Le => FloatPredicate::OLE,
        CmpOp::Gt => FloatPredicate::OGT,
        CmpOp::Ge => FloatPredicate::OGE,
    }
}

fn is_signed(ty: &Type) -> bool {
    ty.int_ty().is_some_and(IntTy::is_signed)
}

impl<'ctx> Backend for LlvmBackend<'ctx> {
    type Artifact = JitModule<'ctx>;
    type Symbol = usize;

    fn name(&self) -> &'static str {
        "llvm"
    }

    fn module_name(&self) -> &str {
        self.module.get_name().to_str().unwrap_or("<non-utf8>")
    }

    fn set_debug_level(&mut self, level: DebugLevel) {
        self.config.debug_level = level;
    }

    // -- Functions --

    fn declare_function(&mut self, name: &str, sig: &Signature, linkage: Linkage) -> FunctionId {
        let fn_type = function_type(self.context, sig);
        let func = self.module.add_function(name, fn_type, None);
        for (param, decl) in func.get_param_iter().zip(&sig.params) {
            param.set_name(&decl.name);
        }
        let id = FunctionId::new(self.functions.len() as u32);
        self.functions.push(func);
        debug!(name, %linkage, "declared function");
        id
    }

    fn param(&mut self, func: FunctionId, index: usize) -> ValueId {
        let value = self.functions[func.index()]
            .get_nth_param(index as u32)
            .expect("parameter index in range");
        self.push(value)
    }

    // -- Blocks --

    fn append_block(&mut self, func: FunctionId, name: &str) -> BlockId {
        let block = self
            .context
            .append_basic_block(self.functions[func.index()], name);
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    fn position_at_end(&mut self, block: BlockId) {
        self.builder.position_at_end(self.blocks[block.index()]);
        self.current_block = Some(block);
    }

    fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    fn block_terminated(&self, block: BlockId) -> bool {
        self.blocks[block.index()].get_terminator().is_some()
    }

    // -- Debug info --

    fn set_debug_location(&mut self, loc: DebugLoc) {
        match (&self.debug, self.scopes[loc.scope.index()]) {
            (Some(di), Some(scope)) => {
                let location = di.location(loc.line, loc.column, scope);
                self.builder.set_current_debug_location(location);
            }
            // Lines outside any function belong to no subprogram.
            _ => self.builder.unset_current_debug_location(),
        }
    }

    fn file_scope(&self) -> ScopeId {
        ScopeId::new(0)
    }

    fn open_function_scope(
        &mut self,
        func: FunctionId,
        name: &str,
        sig: &Signature,
        line: u32,
    ) -> ScopeId {
        self.ensure_debug();
        let function = self.functions[func.index()];
        let scope = self
            .debug
            .as_mut()
            .map(|di| di.function(function, name, sig, line));
        self.push_scope(scope)
    }

    fn open_lexical_scope(&mut self, parent: ScopeId, line: u32, column: u32) -> ScopeId {
        let scope = self.debug.as_ref().map(|di| {
            let parent = self.scopes[parent.index()].unwrap_or_else(|| di.file_scope());
            di.lexical_block(parent, line, column)
        });
        self.push_scope(scope)
    }

    fn declare_local(&mut self, scope: ScopeId, name: &str, ty: &Type, line: u32, slot: ValueId) {
        let block = self.builder.get_insert_block();
        let (Some(scope), Some(block)) = (self.scopes[scope.index()], block) else {
            return;
        };
        let storage = self.value(slot).into_pointer_value();
        if let Some(di) = self.debug.as_mut() {
            di.declare_local(scope, name, ty, line, storage, block);
        }
    }

    // -- Constants --

    fn const_int(&mut self, ty: IntTy, bits: u64) -> ValueId {
        let value = int_type(self.context, ty).const_int(bits & ty.mask(), false);
        self.push(value)
    }

    fn const_bool(&mut self, value: bool) -> ValueId {
        let value = self.context.bool_type().const_int(u64::from(value), false);
        self.push(value)
    }

    fn const_float(&mut self, ty: &Type, value: f64) -> ValueId {
        let float = match ty {
            Type::F32 => self.context.f32_type(),
            _ => self.context.f64_type(),
        };
        self.push(float.const_float(value))
    }

    // -- Memory --

    fn entry_alloca(&mut self, func: FunctionId, ty: &Type, name: &str) -> ValueId {
        let entry = self.functions[func.index()]
            .get_first_basic_block()
            .expect("function has entry block");

        if let Some(first) = entry.get_first_instruction() {
            self.builder.position_before(&first);
        } else {
            self.builder.position_at_end(entry);
        }
        let slot = self
            .builder
            .build_alloca(value_type(self.context, ty), name)
            .expect("alloca");
        if let Some(block) = self.current_block {
            self.builder.position_at_end(self.blocks[block.index()]);
        }
        self.push(slot)
    }

    fn load(&mut self, ty: &Type, ptr: ValueId, name: &str) -> ValueId {
        let loaded = self
            .builder
            .build_load(value_type(self.context, ty), self.value(ptr).into_pointer_value(), name)
            .expect("load");
        self.push(loaded)
    }

    fn store(&mut self, _ty: &Type, value: ValueId, ptr: ValueId) {
        self.builder
            .build_store(self.value(ptr).into_pointer_value(), self.value(value))
            .expect("store");
    }

    fn element_address(&mut self, array_ty: &Type, base: ValueId, index: ValueId) -> ValueId {
        let zero = self.context.i64_type().const_zero();
        // SAFETY: the indices address the array type the slot was allocated
        // with; out-of-range element indices are the generated program's
        // responsibility, as in C.
        let address = unsafe {
            self.builder.build_in_bounds_gep(
                value_type(self.context, array_ty),
                self.value(base).into_pointer_value(),
                &[zero, self.int(index)],
                "elem",
            )
        }
        .expect("gep");
        self.push(address)
    }

    // -- Arithmetic --

    fn binary(&mut self, op: BinaryOp, ty: &Type, lhs: ValueId, rhs: ValueId) -> ValueId {
        if ty.is_float() {
            return self.float_binary(op, lhs, rhs);
        }
        let result = self.int_binary(op, is_signed(ty), self.int(lhs), self.int(rhs));
        self.push(result)
    }

    fn compare(&mut self, op: CmpOp, ty: &Type, lhs: ValueId, rhs: ValueId) -> ValueId {
        let b = &self.builder;
        let result = match ty {
            Type::F32 | Type::F64 => b.build_float_compare(
                float_predicate(op),
                self.value(lhs).into_float_value(),
                self.value(rhs).into_float_value(),
                "fcmp",
            ),
            Type::Ptr(_) => {
                let i64_type = self.context.i64_type();
                let l = b
                    .build_ptr_to_int(self.value(lhs).into_pointer_value(), i64_type, "lhs")
                    .expect("ptrtoint");
                let r = b
                    .build_ptr_to_int(self.value(rhs).into_pointer_value(), i64_type, "rhs")
                    .expect("ptrtoint");
                b.build_int_compare(int_predicate(op, false), l, r, "pcmp")
            }
            _ => b.build_int_compare(
                int_predicate(op, is_signed(ty)),
                self.int(lhs),
                self.int(rhs),
                "icmp",
            ),
        }
        .expect("compare");
        self.push(result)
    }

    fn unary(&mut self, op: UnaryOp, ty: &Type, operand: ValueId) -> ValueId {
        let b = &self.builder;
        let result: BasicValueEnum<'ctx> = match (op, ty.is_float()) {
            (UnaryOp::Neg, true) => b
                .build_float_neg(self.value(operand).into_float_value(), "fneg")
                .expect("fneg")
                .into(),
            (UnaryOp::Neg, false) => b.build_int_neg(self.int(operand), "neg").expect("neg").into(),
            (UnaryOp::Not, _) => b.build_not(self.int(operand), "not").expect("not").into(),
        };
        self.push(result)
    }

    fn extend(&mut self, value: ValueId, from: IntTy, to: IntTy) -> ValueId {
        if to.bits() == from.bits() {
            return value;
        }
        let target = int_type(self.context, to);
        let v = self.int(value);
        let b = &self.builder;
        let result = if to.bits() < from.bits() {
            b.build_int_truncate(v, target, "trunc")
        } else if from.is_signed() {
            b.build_int_s_extend(v, target, "sext")
        } else {
            b.build_int_z_extend(v, target, "zext")
        }
        .expect("extend");
        self.push(result)
    }

    // -- Calls --

    fn call(&mut self, callee: FunctionId, args: &[ValueId], ret: &Type) -> Option<ValueId> {
        let function = self.functions[callee.index()];
        let args: Vec<BasicMetadataValueEnum<'ctx>> =
            args.iter().map(|&a| self.value(a).into()).collect();
        let name = if ret.is_void() { "" } else { "call" };
        let site = self
            .builder
            .build_call(function, &args, name)
            .expect("call");
        site.try_as_basic_value().basic().map(|v| self.push(v))
    }

    fn register_symbol(&mut self, name: &str, symbol: usize) {
        self.symbols.insert(name.to_owned(), symbol);
    }

    // -- Terminators --

    fn br(&mut self, target: BlockId) {
        self.builder
            .build_unconditional_branch(self.blocks[target.index()])
            .expect("br");
    }

    fn cond_br(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId) {
        self.builder
            .build_conditional_branch(
                self.int(cond),
                self.blocks[then_block.index()],
                self.blocks[else_block.index()],
            )
            .expect("cond_br");
    }

    fn ret(&mut self, value: Option<ValueId>) {
        let value = value.map(|v| self.value(v));
        self.builder
            .build_return(value.as_ref().map(|v| v as &dyn BasicValue<'ctx>))
            .expect("ret");
    }

    fn unreachable(&mut self) {
        self.builder.build_unreachable().expect("unreachable");
    }

    // -- Output --

    fn ir_text(&self) -> String {
        self.module.print_to_string().to_string()
    }

    fn finalize(self) -> Result<JitModule<'ctx>, BackendError> {
        let name = self.module_name().to_owned();
        if let Some(di) = &self.debug {
            di.finalize();
        }
        let ir = self.ir_text();
        if dump_ir_requested() {
            eprintln!("=== LLVM IR for {name} ===");
            eprintln!("{ir}");
            eprintln!("=== END IR ===");
        }

        self.module
            .verify()
            .map_err(|e| BackendError::new(&name, e.to_string()))?;

        // MCJIT aborts on unresolved symbols, so catch them here.
        let missing: Vec<String> = self
            .functions
            .iter()
            .filter(|f| f.count_basic_blocks() == 0)
            .map(|f| f.get_name().to_string_lossy().into_owned())
            .filter(|n| !self.symbols.contains_key(n))
            .map(|n| format!("no symbol registered for external function '{n}'"))
            .collect();
        if !missing.is_empty() {
            return Err(BackendError {
                module: name,
                diagnostics: missing,
            });
        }

        let engine = self
            .module
            .create_jit_execution_engine(self.config.opt_level)
            .map_err(|e| BackendError::new(&name, e.to_string()))?;
        for (symbol, &address) in &self.symbols {
            if let Some(function) = self.module.get_function(symbol) {
                engine.add_global_mapping(&function, address);
            }
        }
        debug!(module = %name, functions = self.functions.len(), "module compiled");
        trace!(%ir, "final IR");
        Ok(JitModule::new(name, self.module, engine, ir))
    }
}
