//! Shared vocabulary of the weave code generator.
//!
//! This crate provides:
//!
//! - **Semantic types** ([`Type`], [`IntTy`], [`Signature`]) — the closed set
//!   of type tags every value and variable carries.
//! - **Opaque IDs** ([`ValueId`], [`BlockId`], [`FunctionId`], [`ScopeId`]) —
//!   `Copy` handles issued by a backend.
//! - **The backend contract** ([`Backend`]) — everything the code generator
//!   needs from an IR/JIT infrastructure.
//! - **Recorded IR** ([`IrModule`]) and [`RecordingBackend`] — a
//!   backend-independent basic-block form with a verifier, used for testing
//!   and as input to the reference executor.
//!
//! # Crate Dependencies
//!
//! No LLVM dependency. `weave_llvm` implements [`Backend`] on top of
//! inkwell; `weave_eval` executes an [`IrModule`] directly.

pub mod backend;
pub mod debug;
mod ids;
pub mod module;
pub mod ops;
mod recording;
mod scalar;
pub mod types;
pub mod verify;

pub use backend::{Backend, BackendError, Linkage};
pub use debug::{DebugLevel, DebugLoc, ScopeKind};
pub use ids::{BlockId, FunctionId, ScopeId, ValueId};
pub use module::{
    InstKind, IrBlock, IrFunction, IrInst, IrLocal, IrModule, IrScope, NativeFn, Terminator,
    ValueDef,
};
pub use ops::{BinaryOp, CmpOp, UnaryOp};
pub use recording::RecordingBackend;
pub use scalar::{sign_extend, Scalar};
pub use types::{IntTy, Param, Signature, Type, ADDRESS_TYPE};
pub use verify::{verify_module, VerifyError};
