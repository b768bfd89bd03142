//! Handle to a JIT-compiled module.

use inkwell::execution_engine::{
    ExecutionEngine, FunctionLookupError, JitFunction, UnsafeFunctionPointer,
};
use inkwell::module::Module;

/// A verified module owned by an MCJIT execution engine.
pub struct JitModule<'ctx> {
    name: String,
    engine: ExecutionEngine<'ctx>,
    // Owned by the engine after creation; kept alive alongside it.
    _module: Module<'ctx>,
    ir: String,
}

impl<'ctx> JitModule<'ctx> {
    pub(crate) fn new(
        name: String,
        module: Module<'ctx>,
        engine: ExecutionEngine<'ctx>,
        ir: String,
    ) -> Self {
        Self {
            name,
            engine,
            _module: module,
            ir,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// LLVM IR as it was handed to the engine.
    pub fn ir_text(&self) -> &str {
        &self.ir
    }

    /// Look up compiled function `name`.
    ///
    /// # Safety
    ///
    /// `F` must be an `unsafe extern "C" fn` type matching the function's
    /// signature exactly.
    pub unsafe fn get_function<F: UnsafeFunctionPointer>(
        &self,
        name: &str,
    ) -> Result<JitFunction<'ctx, F>, FunctionLookupError> {
        self.engine.get_function(name)
    }

    /// Address of compiled function `name`, if the module defines it.
    pub fn function_address(&self, name: &str) -> Option<usize> {
        self.engine.get_function_address(name).ok()
    }
}
