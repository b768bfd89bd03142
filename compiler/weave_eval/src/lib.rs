//! Reference executor for recorded weave modules.
//!
//! Runs an [`IrModule`](weave_ir::IrModule) produced by
//! [`RecordingBackend`](weave_ir::RecordingBackend) without any native code
//! generation. Semantics follow what the LLVM backend produces: integer
//! arithmetic wraps at the operand width, allocas live in a per-call stack
//! frame, and external functions resolve to registered host closures when
//! they are invoked.
//!
//! ```text
//! let program = Program::new(module);
//! let ten = program.call("sum", &[Scalar::i64(5)])?;
//! ```

mod error;
mod interp;
mod memory;
mod ops;

pub use error::{EvalError, EvalResult};
pub use interp::{EvalConfig, Program};
pub use memory::{Mark, Memory};
