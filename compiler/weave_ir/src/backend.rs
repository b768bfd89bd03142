//! The contract between the code generator and a backend.
//!
//! A backend owns instruction encoding, debug metadata and final
//! compilation. The code generator drives it exclusively through this
//! trait and the opaque IDs it hands out, so the same structured
//! constructs can target LLVM, the recording backend, or anything else
//! that implements these operations.
//!
//! # Method Organization
//!
//! | Category | Methods |
//! |----------|---------|
//! | Functions | `declare_function`, `param` |
//! | Blocks | `append_block`, `position_at_end`, `current_block`, `block_terminated` |
//! | Debug info | `set_debug_location`, `file_scope`, `open_function_scope`, `open_lexical_scope`, `declare_local` |
//! | Constants | `const_int`, `const_bool`, `const_float` |
//! | Memory | `entry_alloca`, `load`, `store`, `element_address` |
//! | Arithmetic | `binary`, `compare`, `unary`, `extend` |
//! | Calls | `call`, `register_symbol` |
//! | Terminators | `br`, `cond_br`, `ret`, `unreachable` |
//! | Output | `ir_text`, `finalize` |

use std::fmt;

use crate::debug::{DebugLevel, DebugLoc};
use crate::ids::{BlockId, FunctionId, ScopeId, ValueId};
use crate::ops::{BinaryOp, CmpOp, UnaryOp};
use crate::types::{IntTy, Signature, Type};

/// Whether a declared function gets a body in this module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// Defined by the code generator.
    Defined,
    /// Provided by the host; resolved through a registered symbol.
    External,
}

/// A backend rejected the module during finalization.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("backend rejected module '{module}': {}", diagnostics.join("; "))]
pub struct BackendError {
    /// Name of the module being compiled.
    pub module: String,
    /// Backend diagnostics, most relevant first.
    pub diagnostics: Vec<String>,
}

impl BackendError {
    pub fn new(module: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            diagnostics: vec![diagnostic.into()],
        }
    }
}

/// Instruction-level backend operations.
///
/// Emitting methods append to the block selected by the last
/// `position_at_end`, tagged with the location from the last
/// `set_debug_location`. Callers are responsible for never appending to a
/// block that already has a terminator.
pub trait Backend {
    /// What `finalize` produces (a JIT handle, a verified module, ...).
    type Artifact;
    /// How a host function is identified when registered.
    type Symbol;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Name of the module under construction.
    fn module_name(&self) -> &str;

    /// Set the debug detail level. Called once, before any emission.
    fn set_debug_level(&mut self, level: DebugLevel);

    // -- Functions --

    fn declare_function(&mut self, name: &str, sig: &Signature, linkage: Linkage) -> FunctionId;

    /// The SSA value of parameter `index` of `func`.
    fn param(&mut self, func: FunctionId, index: usize) -> ValueId;

    // -- Blocks --

    fn append_block(&mut self, func: FunctionId, name: &str) -> BlockId;

    fn position_at_end(&mut self, block: BlockId);

    fn current_block(&self) -> Option<BlockId>;

    /// True once `block` has a terminator.
    fn block_terminated(&self, block: BlockId) -> bool;

    // -- Debug info --

    /// Location attached to every instruction emitted from now on.
    fn set_debug_location(&mut self, loc: DebugLoc);

    /// Root scope: the synthetic source file.
    fn file_scope(&self) -> ScopeId;

    fn open_function_scope(
        &mut self,
        func: FunctionId,
        name: &str,
        sig: &Signature,
        line: u32,
    ) -> ScopeId;

    fn open_lexical_scope(&mut self, parent: ScopeId, line: u32, column: u32) -> ScopeId;

    /// Describe a stack slot as a debugger-visible local.
    fn declare_local(&mut self, scope: ScopeId, name: &str, ty: &Type, line: u32, slot: ValueId);

    // -- Constants --

    /// Integer constant; `bits` is truncated to the width of `ty`.
    fn const_int(&mut self, ty: IntTy, bits: u64) -> ValueId;

    fn const_bool(&mut self, value: bool) -> ValueId;

    /// Floating-point constant; `ty` is `F32` or `F64`.
    fn const_float(&mut self, ty: &Type, value: f64) -> ValueId;

    // -- Memory --

    /// Stack slot at the top of `func`'s entry block.
    fn entry_alloca(&mut self, func: FunctionId, ty: &Type, name: &str) -> ValueId;

    /// Aligned load of a `ty` through `ptr`.
    fn load(&mut self, ty: &Type, ptr: ValueId, name: &str) -> ValueId;

    /// Aligned store of `value` (of type `ty`) through `ptr`.
    fn store(&mut self, ty: &Type, value: ValueId, ptr: ValueId);

    /// Address of element `index` of the array of type `array_ty` at `base`.
    ///
    /// `index` must already be an address-width integer.
    fn element_address(&mut self, array_ty: &Type, base: ValueId, index: ValueId) -> ValueId;

    // -- Arithmetic --

    fn binary(&mut self, op: BinaryOp, ty: &Type, lhs: ValueId, rhs: ValueId) -> ValueId;

    /// Comparison of two `ty` operands, producing a `bool`.
    fn compare(&mut self, op: CmpOp, ty: &Type, lhs: ValueId, rhs: ValueId) -> ValueId;

    fn unary(&mut self, op: UnaryOp, ty: &Type, operand: ValueId) -> ValueId;

    /// Integer width conversion. Widening follows `from`'s signedness
    /// (sign- or zero-extension); narrowing truncates.
    fn extend(&mut self, value: ValueId, from: IntTy, to: IntTy) -> ValueId;

    // -- Calls --

    /// Call `callee`. Returns `None` for void callees.
    fn call(&mut self, callee: FunctionId, args: &[ValueId], ret: &Type) -> Option<ValueId>;

    /// Make a host symbol available to external functions named `name`.
    fn register_symbol(&mut self, name: &str, symbol: Self::Symbol);

    // -- Terminators --

    fn br(&mut self, target: BlockId);

    fn cond_br(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId);

    fn ret(&mut self, value: Option<ValueId>);

    fn unreachable(&mut self);

    // -- Output --

    /// Human-readable dump of the module built so far.
    fn ir_text(&self) -> String;

    /// Hand the finished module to the backend pipeline.
    fn finalize(self) -> Result<Self::Artifact, BackendError>;
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined => write!(f, "define"),
            Self::External => write!(f, "declare"),
        }
    }
}
