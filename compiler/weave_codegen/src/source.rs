//! Synthetic source text and the debug scope stack.
//!
//! The recorder renders generated code as C-like text, one statement per
//! line, and tracks the lexical scope every line belongs to. Debug
//! locations are derived from it, so the line a debugger shows for an
//! instruction is exactly the line of text recorded for it.
//!
//! # Scope Stack
//!
//! The bottom entry is the backend's file scope and is never popped.
//! Functions push a subprogram scope, nested blocks push lexical blocks.
//! Indentation follows the stack: 4 spaces per entry above the root.

use weave_ir::{Backend, DebugLoc, FunctionId, ScopeId, Signature};

use crate::error::{violation, UsageError};

const INDENT: &str = "    ";

/// Append-only synthetic source plus its scope stack.
#[derive(Debug)]
pub struct SourceRecorder {
    text: String,
    /// Number of the next line to append (1-based).
    next_line: u32,
    scopes: Vec<ScopeId>,
    live_dump: bool,
}

impl SourceRecorder {
    pub fn new(file_scope: ScopeId, live_dump: bool) -> Self {
        Self {
            text: String::new(),
            next_line: 1,
            scopes: vec![file_scope],
            live_dump,
        }
    }

    /// Append one indented line and return its line number.
    pub fn add_line(&mut self, line: &str) -> u32 {
        let number = self.next_line;
        let start = self.text.len();
        for _ in 0..self.depth() {
            self.text.push_str(INDENT);
        }
        self.text.push_str(line);
        if self.live_dump {
            eprintln!("{number:>5} | {}", &self.text[start..]);
        }
        self.text.push('\n');
        self.next_line += 1;
        tracing::trace!(line = number, text = line, "source line");
        number
    }

    /// Open a lexical block at the current line, nested in the top scope.
    pub fn enter_scope<B: Backend>(&mut self, backend: &mut B) -> ScopeId {
        let scope = backend.open_lexical_scope(self.current_scope(), self.current_line(), 1);
        self.scopes.push(scope);
        scope
    }

    /// Close the innermost lexical block.
    #[track_caller]
    pub fn leave_scope(&mut self) {
        if self.scopes.len() <= 1 {
            violation(UsageError::ScopeUnderflow);
        }
        self.scopes.pop();
    }

    /// Open the subprogram scope of `func` at the current line.
    pub fn enter_function_scope<B: Backend>(
        &mut self,
        backend: &mut B,
        func: FunctionId,
        name: &str,
        sig: &Signature,
    ) -> ScopeId {
        let scope = backend.open_function_scope(func, name, sig, self.current_line());
        self.scopes.push(scope);
        scope
    }

    #[track_caller]
    pub fn leave_function_scope(&mut self) {
        self.leave_scope();
    }

    /// Location of `line` in the innermost scope.
    pub fn location(&self, line: u32) -> DebugLoc {
        DebugLoc {
            line,
            column: 1,
            scope: self.current_scope(),
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        // The root is never popped.
        self.scopes[self.scopes.len() - 1]
    }

    /// Scopes above the file scope.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Number of the last line appended (0 before the first).
    pub fn current_line(&self) -> u32 {
        self.next_line - 1
    }

    pub fn line_count(&self) -> u32 {
        self.current_line()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests;
