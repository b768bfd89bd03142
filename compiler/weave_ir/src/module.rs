//! Recorded IR — the backend-independent basic-block form of a module.
//!
//! [`RecordingBackend`](crate::RecordingBackend) builds this structure as
//! the code generator drives it. It follows the same shape as LLVM IR:
//!
//! - **[`IrFunction`]** — signature, linkage, blocks in layout order
//! - **[`IrBlock`]** — straight-line instructions plus at most one terminator
//! - **[`IrInst`]** — one instruction, its optional result and debug location
//! - **[`Terminator`]** — branch, conditional branch, return, unreachable
//!
//! Blocks, values and scopes are numbered module-wide, so an ID alone is
//! enough to find any entity.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::backend::Linkage;
use crate::debug::{DebugLevel, DebugLoc, ScopeKind};
use crate::ids::{BlockId, FunctionId, ScopeId, ValueId};
use crate::ops::{BinaryOp, CmpOp, UnaryOp};
use crate::scalar::Scalar;
use crate::types::{IntTy, Signature, Type};

// ── Native symbols ──────────────────────────────────────────────────

/// A host function callable from generated code by an executor.
///
/// Receives the call arguments and returns the result (`None` for void).
#[derive(Clone)]
pub struct NativeFn(Arc<dyn Fn(&[Scalar]) -> Option<Scalar> + Send + Sync>);

impl NativeFn {
    pub fn new(f: impl Fn(&[Scalar]) -> Option<Scalar> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn invoke(&self, args: &[Scalar]) -> Option<Scalar> {
        (self.0)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFn(..)")
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// Where an SSA value comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueDef {
    Const(Scalar),
    Param {
        func: FunctionId,
        index: usize,
        ty: Type,
    },
    /// Result of an instruction in `block`.
    Inst { block: BlockId, ty: Type },
}

impl ValueDef {
    pub fn ty(&self) -> Type {
        match self {
            ValueDef::Const(s) => s.ty(),
            ValueDef::Param { ty, .. } | ValueDef::Inst { ty, .. } => ty.clone(),
        }
    }
}

// ── Instructions ────────────────────────────────────────────────────

/// A non-terminator instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstKind {
    /// Stack slot for one `ty`. Always at the top of the entry block.
    Alloca { ty: Type, name: String },
    Load { ty: Type, ptr: ValueId },
    Store { ty: Type, value: ValueId, ptr: ValueId },
    /// `&base[index]` where `base` points to an `array_ty`.
    ElementAddr {
        array_ty: Type,
        base: ValueId,
        index: ValueId,
    },
    Binary {
        op: BinaryOp,
        ty: Type,
        lhs: ValueId,
        rhs: ValueId,
    },
    Compare {
        op: CmpOp,
        ty: Type,
        lhs: ValueId,
        rhs: ValueId,
    },
    Unary {
        op: UnaryOp,
        ty: Type,
        operand: ValueId,
    },
    Extend {
        value: ValueId,
        from: IntTy,
        to: IntTy,
    },
    Call {
        callee: FunctionId,
        args: SmallVec<[ValueId; 4]>,
    },
}

/// An instruction with its result and debug location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrInst {
    pub kind: InstKind,
    pub result: Option<ValueId>,
    pub loc: Option<DebugLoc>,
}

/// Block exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(Option<ValueId>),
    Unreachable,
}

impl Terminator {
    /// Blocks this terminator can transfer control to.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match *self {
            Terminator::Br(target) => SmallVec::from_slice(&[target]),
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => SmallVec::from_slice(&[then_block, else_block]),
            Terminator::Ret(_) | Terminator::Unreachable => SmallVec::new(),
        }
    }
}

// ── Blocks and functions ────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrBlock {
    pub name: String,
    pub func: FunctionId,
    pub insts: Vec<IrInst>,
    pub terminator: Option<Terminator>,
    pub terminator_loc: Option<DebugLoc>,
    /// How many times a terminator was set. A well-formed block has one.
    pub terminator_count: u32,
}

impl IrBlock {
    /// Number of non-alloca instructions.
    pub fn body_len(&self) -> usize {
        self.insts
            .iter()
            .filter(|inst| !matches!(inst.kind, InstKind::Alloca { .. }))
            .count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrFunction {
    pub name: String,
    pub sig: Signature,
    pub linkage: Linkage,
    /// Blocks in layout order; the first is the entry block.
    pub blocks: Vec<BlockId>,
    /// Parameter values, in order.
    pub params: Vec<ValueId>,
    /// Number of allocas grouped at the top of the entry block.
    pub alloca_count: usize,
}

impl IrFunction {
    pub fn entry(&self) -> Option<BlockId> {
        self.blocks.first().copied()
    }
}

// ── Debug metadata ──────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrScope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub line: u32,
}

/// A debugger-visible local bound to a stack slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrLocal {
    pub name: String,
    pub ty: Type,
    pub scope: ScopeId,
    pub line: u32,
    pub slot: ValueId,
}

// ── Module ──────────────────────────────────────────────────────────

/// A complete recorded module.
#[derive(Clone, Debug)]
pub struct IrModule {
    pub name: String,
    pub debug_level: DebugLevel,
    pub functions: Vec<IrFunction>,
    pub blocks: Vec<IrBlock>,
    pub values: Vec<ValueDef>,
    pub scopes: Vec<IrScope>,
    pub locals: Vec<IrLocal>,
    /// Every `set_debug_location` call, in order.
    pub location_events: Vec<DebugLoc>,
    pub symbols: FxHashMap<String, NativeFn>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            debug_level: DebugLevel::default(),
            functions: Vec::new(),
            blocks: Vec::new(),
            values: Vec::new(),
            // Scope 0 is always the file scope.
            scopes: vec![IrScope {
                kind: ScopeKind::File,
                parent: None,
                line: 0,
            }],
            locals: Vec::new(),
            location_events: Vec::new(),
            symbols: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn function(&self, id: FunctionId) -> &IrFunction {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &IrBlock {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn value(&self, id: ValueId) -> &ValueDef {
        &self.values[id.index()]
    }

    pub fn function_by_name(&self, name: &str) -> Option<(FunctionId, &IrFunction)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .map(|(i, f)| (FunctionId::new(i as u32), f))
    }

    /// A block of `func` by its (first matching) name.
    pub fn block_named(&self, func: FunctionId, name: &str) -> Option<BlockId> {
        self.function(func)
            .blocks
            .iter()
            .copied()
            .find(|&b| self.block(b).name == name)
    }

    /// Blocks with an edge into `target`.
    pub fn predecessors(&self, target: BlockId) -> Vec<BlockId> {
        let func = self.block(target).func;
        self.function(func)
            .blocks
            .iter()
            .copied()
            .filter(|&b| {
                self.block(b)
                    .terminator
                    .is_some_and(|t| t.successors().contains(&target))
            })
            .collect()
    }

    /// Blocks reachable from the entry of `func`, in discovery order.
    pub fn reachable_blocks(&self, func: FunctionId) -> Vec<BlockId> {
        let Some(entry) = self.function(func).entry() else {
            return Vec::new();
        };
        let mut seen = vec![false; self.blocks.len()];
        let mut order = Vec::new();
        let mut stack = vec![entry];
        while let Some(block) = stack.pop() {
            if std::mem::replace(&mut seen[block.index()], true) {
                continue;
            }
            order.push(block);
            if let Some(term) = self.block(block).terminator {
                for succ in term.successors().into_iter().rev() {
                    stack.push(succ);
                }
            }
        }
        order
    }
}

// ── Printing ────────────────────────────────────────────────────────

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for func in &self.functions {
            writeln!(f)?;
            let params: Vec<String> = func
                .params
                .iter()
                .zip(&func.sig.params)
                .map(|(v, p)| format!("{} %{}", p.ty, v.raw()))
                .collect();
            write!(
                f,
                "{} {} @{}({})",
                func.linkage,
                func.sig.ret,
                func.name,
                params.join(", ")
            )?;
            if func.linkage == Linkage::External {
                writeln!(f)?;
                continue;
            }
            writeln!(f, " {{")?;
            for &bid in &func.blocks {
                self.fmt_block(f, bid)?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

impl IrModule {
    fn fmt_operand(&self, id: ValueId) -> String {
        match self.value(id) {
            ValueDef::Const(s) => s.to_string(),
            _ => format!("%{}", id.raw()),
        }
    }

    fn fmt_block(&self, f: &mut fmt::Formatter<'_>, bid: BlockId) -> fmt::Result {
        let block = self.block(bid);
        writeln!(f, "{}.{}:", block.name, bid.raw())?;
        for inst in &block.insts {
            write!(f, "  ")?;
            if let Some(r) = inst.result {
                write!(f, "%{} = ", r.raw())?;
            }
            let op = |v| self.fmt_operand(v);
            match &inst.kind {
                InstKind::Alloca { ty, name } => write!(f, "alloca {ty} ; {name}")?,
                InstKind::Load { ty, ptr } => write!(f, "load {ty}, {}", op(*ptr))?,
                InstKind::Store { ty, value, ptr } => {
                    write!(f, "store {ty} {}, {}", op(*value), op(*ptr))?;
                }
                InstKind::ElementAddr {
                    array_ty,
                    base,
                    index,
                } => write!(f, "elemaddr {array_ty}, {}[{}]", op(*base), op(*index))?,
                InstKind::Binary { op: o, ty, lhs, rhs } => {
                    write!(f, "{o} {ty} {}, {}", op(*lhs), op(*rhs))?;
                }
                InstKind::Compare { op: o, ty, lhs, rhs } => {
                    write!(f, "cmp {o} {ty} {}, {}", op(*lhs), op(*rhs))?;
                }
                InstKind::Unary { op: o, ty, operand } => write!(f, "{o}{ty} {}", op(*operand))?,
                InstKind::Extend { value, from, to } => {
                    write!(f, "extend {} {} to {}", from.c_name(), op(*value), to.c_name())?;
                }
                InstKind::Call { callee, args } => {
                    let args: Vec<String> = args.iter().map(|a| op(*a)).collect();
                    write!(f, "call @{}({})", self.function(*callee).name, args.join(", "))?;
                }
            }
            if let Some(loc) = inst.loc {
                write!(f, "  !{}", loc.line)?;
            }
            writeln!(f)?;
        }
        match block.terminator {
            Some(Terminator::Br(t)) => writeln!(f, "  br {}.{}", self.block(t).name, t.raw()),
            Some(Terminator::CondBr {
                cond,
                then_block,
                else_block,
            }) => writeln!(
                f,
                "  br {}, {}.{}, {}.{}",
                self.fmt_operand(cond),
                self.block(then_block).name,
                then_block.raw(),
                self.block(else_block).name,
                else_block.raw()
            ),
            Some(Terminator::Ret(Some(v))) => writeln!(f, "  ret {}", self.fmt_operand(v)),
            Some(Terminator::Ret(None)) => writeln!(f, "  ret void"),
            Some(Terminator::Unreachable) => writeln!(f, "  unreachable"),
            None => writeln!(f, "  ; <no terminator>"),
        }
    }
}
