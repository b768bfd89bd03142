//! Error types for code generation sessions.
//!
//! Two families:
//!
//! - [`UsageError`] describes a mistake in the program being generated
//!   (break outside a loop, a store of the wrong type, ...). These are
//!   programmer errors: they are raised through [`violation`], which panics
//!   at the offending call site.
//! - [`BuildError`] is the recoverable failure of [`build`]: the synthetic
//!   source could not be written or the backend rejected the module.
//!
//! [`build`]: crate::ModuleBuilder::build

use std::path::PathBuf;

use weave_ir::{BackendError, Type};

/// An invariant of the generated program was violated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("a code generation session is already active on this thread")]
    SessionActive,

    #[error("cannot begin '{requested}': function '{open}' is still being built")]
    FunctionAlreadyOpen { open: String, requested: String },

    #[error("no function is being built")]
    NoCurrentFunction,

    #[error("function '{name}' ends on a block without a terminator")]
    UnterminatedFunction { name: String },

    #[error("function '{name}' ended inside {depth} active loop(s)")]
    LoopStillActive { name: String, depth: usize },

    #[error("function '{name}' ended inside a nested block")]
    EndInsideBlock { name: String },

    #[error("'{statement}' outside of a loop")]
    OutsideLoop { statement: &'static str },

    #[error("cannot emit into a block that already has a terminator")]
    ClosedBlock,

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: Type,
        found: Type,
    },

    #[error("{context} requires a bool, found {found}")]
    NotBool { context: String, found: Type },

    #[error("{context} requires a numeric operand, found {found}")]
    NotNumeric { context: String, found: Type },

    #[error("{context} requires an integer, found {found}")]
    NotInteger { context: String, found: Type },

    #[error("'{name}' is not an array (declared as {found})")]
    NotArray { name: String, found: Type },

    #[error("array '{name}' can only be read by element")]
    WholeArray { name: String },

    #[error("{context} requires a pointer, found {found}")]
    NotPointer { context: String, found: Type },

    #[error("'{callee}' takes {expected} arguments, {found} given")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("variable '{name}' belongs to function '{owner}', not the current one")]
    ForeignVariable { name: String, owner: String },

    #[error("variable '{name}' cannot have type void")]
    VoidVariable { name: String },

    #[error("'{name}' returns {expected}, but the return statement has {found}")]
    ReturnMismatch {
        name: String,
        expected: Type,
        found: Type,
    },

    #[error("cannot build: function '{name}' is still open")]
    FunctionStillOpen { name: String },

    #[error("scope stack underflow: no lexical scope to leave")]
    ScopeUnderflow,

    #[error("value '{repr}' only exists in rendered text and was never emitted")]
    DetachedValue { repr: String },

    #[error("loop conditions may only compute values, not open constructs")]
    ConstructInCondition,

    #[error("loop conditions may only compute values, not add the statement '{statement}'")]
    StatementInCondition { statement: String },
}

/// Abort the session on a usage error.
///
/// The panic location is the caller's, so the message points at the line
/// of generator code that described an invalid program.
#[cold]
#[track_caller]
pub fn violation(err: UsageError) -> ! {
    panic!("{err}")
}

/// A session could not be turned into an artifact.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
