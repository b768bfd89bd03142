//! LLVM JIT backend for weave.
//!
//! [`LlvmBackend`] implements [`weave_ir::Backend`] with inkwell. Each
//! location the code generator sets becomes a `DILocation` in the
//! function's subprogram or one of its lexical blocks, so native frames
//! map back to lines of the synthetic `.c` file. `finalize` verifies the
//! module, binds registered host symbols and returns a [`JitModule`].
//!
//! # Debug Environment Variables
//!
//! - `WEAVE_DEBUG_LLVM`: Print LLVM IR to stderr before JIT compilation.
//!   Any non-empty value enables this.
//!   Example: `WEAVE_DEBUG_LLVM=1 cargo test`
//!
//! - `RUST_LOG=weave_llvm=debug`: Function declarations and module
//!   compilation.
//!
//! - `RUST_LOG=weave_llvm=trace`: Also dumps the final IR through tracing.
//!
//! # Host Functions
//!
//! External functions are bound to raw addresses (`fn as usize`). A module
//! that declares an external function without registering an address is
//! rejected by `finalize`, before the engine would try to resolve it.

#![allow(
    // LLVM uses u32 for parameter indices and alignments, we use usize/u64
    clippy::cast_possible_truncation,
    // One `impl Backend` method per operation
    clippy::too_many_arguments,
)]

mod backend;
mod config;
mod debug;
mod jit;
mod types;

pub use backend::LlvmBackend;
pub use config::{LlvmConfig, ENV_DEBUG_LLVM};
pub use inkwell::context::Context;
pub use inkwell::OptimizationLevel;
pub use jit::JitModule;
