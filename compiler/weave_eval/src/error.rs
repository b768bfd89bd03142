//! Execution failures.

use weave_ir::Type;

/// Result of executing generated code.
pub type EvalResult<T> = Result<T, EvalError>;

/// Why a call into a [`Program`](crate::Program) failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("no function named '{name}' in module")]
    UnknownFunction { name: String },

    #[error("'{func}' expects {expected} arguments, got {found}")]
    ArgumentCount {
        func: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {index} of '{func}' must be {expected}, got {found}")]
    ArgumentMismatch {
        func: String,
        index: usize,
        expected: Type,
        found: Type,
    },

    /// An external function was called but no host symbol was registered.
    #[error("unresolved external symbol '{name}'")]
    UnresolvedSymbol { name: String },

    #[error("host function '{name}' returned {found}, expected {expected}")]
    NativeReturn {
        name: String,
        expected: Type,
        found: Type,
    },

    #[error("step limit of {limit} exceeded")]
    StepLimit { limit: u64 },

    #[error("stack exhausted: {requested} bytes requested with {available} available")]
    StackOverflow { requested: u64, available: u64 },

    #[error("out-of-bounds access of {len} bytes at {addr:#x}")]
    OutOfBounds { addr: u64, len: u64 },

    #[error("division by zero")]
    DivisionByZero,

    #[error("reached unreachable code in block '{block}' of '{func}'")]
    Unreachable { func: String, block: String },

    /// The module is not well formed (an unverified module was executed).
    #[error("malformed module: {0}")]
    Malformed(String),
}

impl EvalError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        EvalError::Malformed(detail.into())
    }
}
