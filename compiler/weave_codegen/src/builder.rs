//! The module builder: one code generation session.
//!
//! [`ModuleBuilder`] owns everything a session mutates: the backend, the
//! [`SourceRecorder`], the function under construction, the loop stack and
//! the state of the current block. Constructs, values and variables are
//! methods that take `&mut ModuleBuilder`, so the session is always explicit.
//!
//! # Line and Location Pairing
//!
//! Every synthetic line is appended through [`ModuleBuilder::line`], which
//! makes it the debug location of subsequent instructions. Expressions are
//! emitted before the statement that consumes them exists, so expression
//! operations first call [`ModuleBuilder::locate_expression`]: it sets the
//! location of the next line, in the current scope, ahead of time. `line`
//! then skips the event it would repeat. Lines and location events stay
//! 1:1 and strictly increasing.
//!
//! A `while_` condition is emitted a second time in the loop guard, after
//! its header line. There the location stays on the header.
//!
//! # Block State
//!
//! The builder knows whether the current block is [`BlockState::Open`] or
//! already terminated. All instruction emission goes through
//! [`ModuleBuilder::emit`], which rejects emission into a closed block.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, trace, warn};
use weave_ir::{Backend, BlockId, FunctionId, Linkage, Signature, Type, ValueId};

use crate::config::SessionConfig;
use crate::control_flow::LoopContext;
use crate::error::{violation, BuildError, UsageError};
use crate::session::SessionGuard;
use crate::source::SourceRecorder;
use crate::value::{Value, DETACHED};

/// Whether the current basic block still accepts instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
    /// No terminator yet.
    Open,
    /// Terminated by a branch or return.
    Closed,
}

/// Which evaluation of a `while_` condition is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConditionPass {
    /// Rendering the header text: no instructions.
    Render,
    /// Emitting the test into the guard block.
    Emit,
}

impl BlockState {
    pub fn is_open(self) -> bool {
        self == BlockState::Open
    }

    pub fn is_closed(self) -> bool {
        self == BlockState::Closed
    }
}

/// A function of the module, usable as a call target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionRef {
    id: FunctionId,
    name: String,
    sig: Signature,
}

impl FunctionRef {
    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }
}

/// The result of a successful [`ModuleBuilder::build`].
#[derive(Debug)]
pub struct CompiledModule<A> {
    /// What the backend produced.
    pub artifact: A,
    /// Where the synthetic source was written.
    pub source_path: PathBuf,
    /// The synthetic source text.
    pub source: String,
}

struct CurrentFunction {
    func: FunctionRef,
    params: Vec<Value>,
}

/// A code generation session over backend `B`.
///
/// Only one builder may be alive per thread; creating a second one panics.
pub struct ModuleBuilder<B: Backend> {
    backend: B,
    source: SourceRecorder,
    config: SessionConfig,
    source_path: PathBuf,
    current: Option<CurrentFunction>,
    state: BlockState,
    /// Enclosing loops, innermost last.
    pub(crate) loops: Vec<LoopContext>,
    /// Set while a loop condition runs.
    condition: Option<ConditionPass>,
    /// Line whose location was set ahead of it by an expression.
    pending_line: Option<u32>,
    temp_counter: u32,
    _session: SessionGuard,
}

impl<B: Backend> ModuleBuilder<B> {
    /// Start a session.
    ///
    /// Creates the directory the synthetic source will be written to.
    ///
    /// # Panics
    ///
    /// If another builder is alive on this thread.
    #[track_caller]
    pub fn new(mut backend: B, config: SessionConfig) -> Result<Self, BuildError> {
        let session = SessionGuard::acquire();
        let dir = config.source_dir();
        fs::create_dir_all(&dir).map_err(|e| BuildError::io(&dir, e))?;
        let source_path = config.source_path();

        backend.set_debug_level(config.debug_level);
        let source = SourceRecorder::new(backend.file_scope(), config.live_dump);
        debug!(
            module = %config.module_name,
            backend = backend.name(),
            path = %source_path.display(),
            "session started"
        );
        Ok(Self {
            backend,
            source,
            config,
            source_path,
            current: None,
            state: BlockState::Closed,
            loops: Vec::new(),
            condition: None,
            pending_line: None,
            temp_counter: 0,
            _session: session,
        })
    }

    // -- Functions --

    /// Start defining `name` and position at its entry block.
    ///
    /// Parameters are available through [`param`](Self::param).
    #[track_caller]
    #[instrument(level = "debug", skip_all, fields(name = %name))]
    pub fn begin_function(&mut self, name: &str, sig: &Signature) -> FunctionRef {
        if let Some(open) = &self.current {
            violation(UsageError::FunctionAlreadyOpen {
                open: open.func.name.clone(),
                requested: name.to_owned(),
            });
        }

        let id = self.backend.declare_function(name, sig, Linkage::Defined);
        let entry = self.backend.append_block(id, "entry");
        self.backend.position_at_end(entry);

        let line = self.source.add_line(&format!("{} {{", sig.c_prototype(name)));
        self.source
            .enter_function_scope(&mut self.backend, id, name, sig);
        self.backend.set_debug_location(self.source.location(line));

        let params = sig
            .params
            .iter()
            .enumerate()
            .map(|(index, p)| Value::new(self.backend.param(id, index), p.ty.clone(), &p.name))
            .collect();
        let func = FunctionRef {
            id,
            name: name.to_owned(),
            sig: sig.clone(),
        };
        self.current = Some(CurrentFunction {
            func: func.clone(),
            params,
        });
        self.state = BlockState::Open;
        self.loops.clear();
        func
    }

    /// Parameter `index` of the current function.
    #[track_caller]
    pub fn param(&self, index: usize) -> Value {
        let Some(current) = &self.current else {
            violation(UsageError::NoCurrentFunction);
        };
        match current.params.get(index) {
            Some(value) => value.clone(),
            None => violation(UsageError::ArityMismatch {
                callee: current.func.name.clone(),
                expected: current.params.len(),
                found: index + 1,
            }),
        }
    }

    /// Finish the current function.
    ///
    /// Every path must already end in a terminator: the current block has
    /// to be closed and no loop may be active.
    #[track_caller]
    #[instrument(level = "debug", skip_all)]
    pub fn end_function(&mut self) -> FunctionRef {
        let name = self.function().name.clone();
        if !self.loops.is_empty() {
            violation(UsageError::LoopStillActive {
                name,
                depth: self.loops.len(),
            });
        }
        if self.source.depth() > 1 {
            violation(UsageError::EndInsideBlock { name });
        }
        if self.state.is_open() {
            violation(UsageError::UnterminatedFunction { name });
        }

        self.source.leave_function_scope();
        self.line("}");
        let Some(current) = self.current.take() else {
            violation(UsageError::NoCurrentFunction);
        };
        debug!(name = %current.func.name, "function finished");
        current.func
    }

    /// Declare a host function and bind it to `symbol`.
    pub fn declare_external_function(
        &mut self,
        name: &str,
        sig: &Signature,
        symbol: B::Symbol,
    ) -> FunctionRef {
        let id = self.backend.declare_function(name, sig, Linkage::External);
        self.backend.register_symbol(name, symbol);
        debug!(name, "external function declared");
        FunctionRef {
            id,
            name: name.to_owned(),
            sig: sig.clone(),
        }
    }

    // -- Inspection --

    pub fn block_state(&self) -> BlockState {
        self.state
    }

    pub fn current_function(&self) -> Option<&FunctionRef> {
        self.current.as_ref().map(|c| &c.func)
    }

    /// Number of enclosing loops at the cursor.
    pub fn loop_depth(&self) -> usize {
        self.loops.len()
    }

    pub fn source_text(&self) -> &str {
        self.source.text()
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Debug scopes open above the file scope.
    pub fn scope_depth(&self) -> usize {
        self.source.depth()
    }

    pub fn line_count(&self) -> u32 {
        self.source.line_count()
    }

    pub fn ir_text(&self) -> String {
        self.backend.ir_text()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -- Finalization --

    /// Write the synthetic source and hand the module to the backend.
    ///
    /// Consumes the session. A backend rejection is returned as
    /// [`BuildError::Backend`]; no partial artifact is produced.
    #[track_caller]
    #[instrument(level = "debug", skip_all, fields(module = %self.config.module_name))]
    pub fn build(self) -> Result<CompiledModule<B::Artifact>, BuildError> {
        if let Some(open) = &self.current {
            violation(UsageError::FunctionStillOpen {
                name: open.func.name.clone(),
            });
        }
        let ModuleBuilder {
            backend,
            source,
            source_path,
            ..
        } = self;

        let source = source.into_text();
        fs::write(&source_path, &source).map_err(|e| BuildError::io(&source_path, e))?;
        debug!(path = %source_path.display(), bytes = source.len(), "synthetic source written");

        let artifact = backend.finalize().map_err(|err| {
            warn!(%err, "backend rejected module");
            BuildError::Backend(err)
        })?;
        debug!("module finalized");
        Ok(CompiledModule {
            artifact,
            source_path,
            source,
        })
    }

    // -- Emission core (crate-internal) --

    /// The function under construction.
    #[track_caller]
    pub(crate) fn function(&self) -> &FunctionRef {
        match &self.current {
            Some(current) => &current.func,
            None => violation(UsageError::NoCurrentFunction),
        }
    }

    #[track_caller]
    pub(crate) fn require_open(&self) {
        if self.state.is_closed() {
            violation(UsageError::ClosedBlock);
        }
    }

    /// Checks shared by every construct: a function, an open block, and not
    /// inside a loop condition.
    #[track_caller]
    pub(crate) fn require_construct(&self) {
        if self.condition.is_some() {
            violation(UsageError::ConstructInCondition);
        }
        self.function();
        self.require_open();
    }

    /// Append a synthetic line and make it the current debug location.
    pub(crate) fn line(&mut self, text: &str) -> Option<u32> {
        if self.condition.is_some() {
            return None;
        }
        let line = self.source.add_line(text);
        if self.pending_line.take() != Some(line) {
            self.backend.set_debug_location(self.source.location(line));
        }
        Some(line)
    }

    /// [`line`](Self::line) for a statement inside an open block.
    #[track_caller]
    pub(crate) fn statement(&mut self, text: &str) -> Option<u32> {
        if self.condition.is_some() {
            violation(UsageError::StatementInCondition {
                statement: text.to_owned(),
            });
        }
        self.function();
        self.require_open();
        self.line(text)
    }

    /// Point the instructions of an expression at the line that will
    /// consume it: the next one, in the current scope.
    ///
    /// No-op inside a loop condition. The guard keeps the header location.
    #[track_caller]
    pub(crate) fn locate_expression(&mut self) {
        if self.condition.is_some() {
            return;
        }
        self.function();
        self.require_open();
        let next = self.source.current_line() + 1;
        if self.pending_line != Some(next) {
            self.backend.set_debug_location(self.source.location(next));
            self.pending_line = Some(next);
        }
    }

    /// Run a non-terminator emission against the backend.
    ///
    /// Returns `None` while rendering a condition's text.
    #[track_caller]
    pub(crate) fn emit<R>(&mut self, f: impl FnOnce(&mut B) -> R) -> Option<R> {
        if self.condition == Some(ConditionPass::Render) {
            return None;
        }
        self.function();
        self.require_open();
        Some(f(&mut self.backend))
    }

    #[track_caller]
    pub(crate) fn emit_value(&mut self, f: impl FnOnce(&mut B) -> ValueId) -> ValueId {
        self.emit(f).unwrap_or(DETACHED)
    }

    /// Constants are not instructions and may be created at any time.
    pub(crate) fn constant(&mut self, f: impl FnOnce(&mut B) -> ValueId) -> ValueId {
        f(&mut self.backend)
    }

    /// Backend operand of `value`.
    #[track_caller]
    pub(crate) fn operand(&self, value: &Value) -> ValueId {
        if value.is_detached() && self.condition != Some(ConditionPass::Render) {
            violation(UsageError::DetachedValue {
                repr: value.repr().to_owned(),
            });
        }
        value.id()
    }

    /// Emit a terminator and close the block.
    #[track_caller]
    pub(crate) fn terminate(&mut self, f: impl FnOnce(&mut B)) -> BlockState {
        self.require_construct();
        f(&mut self.backend);
        debug_assert!(
            self.backend
                .current_block()
                .is_some_and(|b| self.backend.block_terminated(b)),
            "backend did not record the terminator"
        );
        self.state = BlockState::Closed;
        BlockState::Closed
    }

    /// Branch to `target` unless the block is already closed.
    pub(crate) fn branch_if_open(&mut self, target: BlockId) {
        if self.state.is_open() {
            self.backend.br(target);
            self.state = BlockState::Closed;
        }
    }

    /// Emit `unreachable` into a block no edge leads to.
    pub(crate) fn seal_dead_block(&mut self) {
        self.backend.unreachable();
        self.state = BlockState::Closed;
    }

    pub(crate) fn new_block(&mut self, name: &str) -> BlockId {
        let func = self.function().id;
        self.backend.append_block(func, name)
    }

    /// Continue emission at the end of `block`.
    pub(crate) fn switch_to(&mut self, block: BlockId) {
        trace!(block = block.raw(), "switch block");
        self.backend.position_at_end(block);
        self.state = if self.backend.block_terminated(block) {
            BlockState::Closed
        } else {
            BlockState::Open
        };
    }

    /// Run `body` one lexical scope deeper.
    pub(crate) fn nested(&mut self, body: impl FnOnce(&mut Self)) {
        self.source.enter_scope(&mut self.backend);
        body(self);
        self.source.leave_scope();
    }

    /// Run a loop condition in `pass`. Conditions add no lines.
    pub(crate) fn in_condition<T>(
        &mut self,
        pass: ConditionPass,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let outer = self.condition.replace(pass);
        let out = f(self);
        self.condition = outer;
        out
    }

    /// Describe a stack slot as a debugger-visible local declared on `line`.
    pub(crate) fn declare_local(&mut self, name: &str, ty: &Type, line: u32, slot: ValueId) {
        let scope = self.source.current_scope();
        self.backend.declare_local(scope, name, ty, line, slot);
    }

    /// Fresh name for a temporary in the synthetic source.
    pub(crate) fn temp_name(&mut self) -> String {
        let name = format!("val{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }
}

#[cfg(test)]
mod tests;
