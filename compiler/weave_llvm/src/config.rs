//! Backend configuration.

use inkwell::OptimizationLevel;
use weave_ir::DebugLevel;

/// Print each module's LLVM IR to stderr before JIT compilation.
pub const ENV_DEBUG_LLVM: &str = "WEAVE_DEBUG_LLVM";

/// Settings for one [`LlvmBackend`](crate::LlvmBackend).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LlvmConfig {
    /// Optimization level handed to the execution engine.
    pub opt_level: OptimizationLevel,
    /// Initial debug level. The code generator overrides it with the
    /// session's level before emitting anything.
    pub debug_level: DebugLevel,
}

impl Default for LlvmConfig {
    fn default() -> Self {
        Self {
            opt_level: OptimizationLevel::None,
            debug_level: DebugLevel::Full,
        }
    }
}

impl LlvmConfig {
    #[must_use]
    pub fn opt_level(mut self, level: OptimizationLevel) -> Self {
        self.opt_level = level;
        self
    }

    #[must_use]
    pub fn debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = level;
        self
    }
}

/// Whether `WEAVE_DEBUG_LLVM` asks for IR dumps.
pub(crate) fn dump_ir_requested() -> bool {
    std::env::var_os(ENV_DEBUG_LLVM).is_some_and(|v| !v.is_empty())
}
