//! Basic-block interpreter over a recorded module.
//!
//! A [`Program`] owns a verified [`IrModule`] and executes its functions
//! directly: SSA values live in a per-call frame, allocas are carved from a
//! [`Memory`] stack, and external functions dispatch to the host closures
//! registered as the module's symbols.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, instrument, trace};
use weave_ir::{
    FunctionId, InstKind, IrFunction, IrInst, IrModule, Linkage, NativeFn, Scalar, Terminator,
    Type, ValueDef, ValueId,
};

use crate::error::{EvalError, EvalResult};
use crate::memory::Memory;
use crate::ops;

/// Minimum host stack to keep free before a nested call (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Host stack to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Execution limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Instructions plus terminators executed before giving up.
    pub max_steps: u64,
    /// Bytes available for stack frames.
    pub stack_size: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000_000,
            stack_size: 1 << 20,
        }
    }
}

impl EvalConfig {
    #[must_use]
    pub fn max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }
}

/// An executable module.
#[derive(Debug)]
pub struct Program {
    module: IrModule,
    config: EvalConfig,
}

impl Program {
    pub fn new(module: IrModule) -> Self {
        Self::with_config(module, EvalConfig::default())
    }

    pub fn with_config(module: IrModule, config: EvalConfig) -> Self {
        Self { module, config }
    }

    pub fn module(&self) -> &IrModule {
        &self.module
    }

    /// Provide (or replace) the host function behind external `name`.
    pub fn register_symbol(&mut self, name: impl Into<String>, symbol: NativeFn) {
        self.module.symbols.insert(name.into(), symbol);
    }

    /// Call the function named `name`.
    pub fn call(&self, name: &str, args: &[Scalar]) -> EvalResult<Option<Scalar>> {
        let Some((func, _)) = self.module.function_by_name(name) else {
            return Err(EvalError::UnknownFunction {
                name: name.to_owned(),
            });
        };
        self.run_function(func, args)
    }

    /// Call `func` with `args`, which must match its signature.
    #[instrument(level = "debug", skip_all, fields(func = %self.module.function(func).name))]
    pub fn run_function(&self, func: FunctionId, args: &[Scalar]) -> EvalResult<Option<Scalar>> {
        check_args(self.module.function(func), args)?;
        let mut machine = Machine {
            module: &self.module,
            memory: Memory::new(self.config.stack_size),
            steps: 0,
            max_steps: self.config.max_steps,
        };
        let result = machine.invoke(func, args);
        debug!(steps = machine.steps, ok = result.is_ok(), "call finished");
        result
    }
}

fn accepts(expected: &Type, value: &Scalar) -> bool {
    match (expected, value) {
        (Type::Ptr(_), Scalar::Ptr(_)) => true,
        _ => value.ty() == *expected,
    }
}

fn check_args(func: &IrFunction, args: &[Scalar]) -> EvalResult<()> {
    if func.sig.params.len() != args.len() {
        return Err(EvalError::ArgumentCount {
            func: func.name.clone(),
            expected: func.sig.params.len(),
            found: args.len(),
        });
    }
    for (index, (param, arg)) in func.sig.params.iter().zip(args).enumerate() {
        if !accepts(&param.ty, arg) {
            return Err(EvalError::ArgumentMismatch {
                func: func.name.clone(),
                index,
                expected: param.ty.clone(),
                found: arg.ty(),
            });
        }
    }
    Ok(())
}

type Frame = FxHashMap<ValueId, Scalar>;

/// State of one top-level call.
struct Machine<'p> {
    module: &'p IrModule,
    memory: Memory,
    steps: u64,
    max_steps: u64,
}

impl Machine<'_> {
    fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(EvalError::StepLimit {
                limit: self.max_steps,
            });
        }
        Ok(())
    }

    fn invoke(&mut self, fid: FunctionId, args: &[Scalar]) -> EvalResult<Option<Scalar>> {
        let func = self.module.function(fid);
        trace!(func = %func.name, ?args, "invoke");
        match func.linkage {
            Linkage::External => self.call_native(func, args),
            Linkage::Defined => {
                let mark = self.memory.mark();
                let result = self.exec(fid, args);
                self.memory.release(mark);
                result
            }
        }
    }

    fn call_native(&self, func: &IrFunction, args: &[Scalar]) -> EvalResult<Option<Scalar>> {
        let Some(native) = self.module.symbols.get(&func.name) else {
            return Err(EvalError::UnresolvedSymbol {
                name: func.name.clone(),
            });
        };
        let result = native.invoke(args);
        match (result, &func.sig.ret) {
            (None, Type::Void) => Ok(None),
            (Some(value), ret) if accepts(ret, &value) => Ok(Some(value)),
            (found, expected) => Err(EvalError::NativeReturn {
                name: func.name.clone(),
                expected: expected.clone(),
                found: found.map_or(Type::Void, |v| v.ty()),
            }),
        }
    }

    fn exec(&mut self, fid: FunctionId, args: &[Scalar]) -> EvalResult<Option<Scalar>> {
        let module = self.module;
        let func = module.function(fid);
        let mut frame: Frame = func.params.iter().copied().zip(args.iter().copied()).collect();
        let Some(mut block) = func.entry() else {
            return Err(EvalError::malformed(format!("'{}' has no body", func.name)));
        };

        loop {
            let current = module.block(block);
            for inst in &current.insts {
                self.tick()?;
                let value = self.exec_inst(&frame, inst)?;
                if let (Some(result), Some(value)) = (inst.result, value) {
                    frame.insert(result, value);
                }
            }
            self.tick()?;
            match current.terminator {
                Some(Terminator::Br(target)) => block = target,
                Some(Terminator::CondBr {
                    cond,
                    then_block,
                    else_block,
                }) => {
                    let cond = operand(module, &frame, cond)?;
                    let Some(taken) = cond.as_bool() else {
                        return Err(EvalError::malformed(format!(
                            "branch on non-bool {}",
                            cond.ty()
                        )));
                    };
                    block = if taken { then_block } else { else_block };
                }
                Some(Terminator::Ret(value)) => {
                    return value.map(|v| operand(module, &frame, v)).transpose();
                }
                Some(Terminator::Unreachable) => {
                    return Err(EvalError::Unreachable {
                        func: func.name.clone(),
                        block: current.name.clone(),
                    });
                }
                None => {
                    return Err(EvalError::malformed(format!(
                        "block '{}' of '{}' has no terminator",
                        current.name, func.name
                    )));
                }
            }
        }
    }

    fn exec_inst(&mut self, frame: &Frame, inst: &IrInst) -> EvalResult<Option<Scalar>> {
        let module = self.module;
        let value = |id| operand(module, frame, id);
        let result = match &inst.kind {
            InstKind::Alloca { ty, .. } => Scalar::Ptr(self.memory.alloc(ty.size(), ty.align())?),
            InstKind::Load { ty, ptr } => self.memory.load(ty, address(value(*ptr)?)?)?,
            InstKind::Store { value: v, ptr, .. } => {
                let addr = address(value(*ptr)?)?;
                self.memory.store(value(*v)?, addr)?;
                return Ok(None);
            }
            InstKind::ElementAddr {
                array_ty,
                base,
                index,
            } => {
                let stride = array_ty.element().map_or(0, Type::size);
                let base = address(value(*base)?)?;
                let Some(index) = value(*index)?.as_i64() else {
                    return Err(EvalError::malformed("non-integer element index"));
                };
                Scalar::Ptr(base.wrapping_add_signed(index.wrapping_mul(stride as i64)))
            }
            InstKind::Binary { op, lhs, rhs, .. } => ops::binary(*op, value(*lhs)?, value(*rhs)?)?,
            InstKind::Compare { op, lhs, rhs, .. } => {
                ops::compare(*op, value(*lhs)?, value(*rhs)?)?
            }
            InstKind::Unary { op, operand, .. } => ops::unary(*op, value(*operand)?)?,
            InstKind::Extend { value: v, from, to } => ops::extend(value(*v)?, *from, *to)?,
            InstKind::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|&a| value(a))
                    .collect::<EvalResult<SmallVec<[Scalar; 4]>>>()?;
                return stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
                    self.invoke(*callee, &args)
                });
            }
        };
        Ok(Some(result))
    }
}

fn operand(module: &IrModule, frame: &Frame, id: ValueId) -> EvalResult<Scalar> {
    match module.value(id) {
        ValueDef::Const(scalar) => Ok(*scalar),
        ValueDef::Param { .. } | ValueDef::Inst { .. } => frame.get(&id).copied().ok_or_else(|| {
            EvalError::malformed(format!("value %{} used before definition", id.raw()))
        }),
    }
}

fn address(ptr: Scalar) -> EvalResult<u64> {
    match ptr {
        Scalar::Ptr(addr) => Ok(addr),
        other => Err(EvalError::malformed(format!(
            "dereference of non-pointer {}",
            other.ty()
        ))),
    }
}

#[cfg(test)]
mod tests;
